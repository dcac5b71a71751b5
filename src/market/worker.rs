//! Background thread that drains a command channel into a [`Marketplace`].
//!
//! `CommandWorker` owns one consumer thread. Producers keep the
//! `Sender<Command>` and submit at will; the worker executes each command in
//! arrival order and counts outcomes until it is stopped.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::command::Command;
use super::coordinator::Marketplace;

/// Statistics from the worker thread.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    /// Commands executed successfully.
    pub handled: usize,
    /// Commands that returned an error.
    pub failed: usize,
    /// Poll cycles completed.
    pub polls: usize,
}

/// A background thread executing commands received on a channel.
///
/// ## Example
///
/// ```ignore
/// let market = Arc::new(Marketplace::new(MarketConfig::default())?);
/// let (tx, rx) = std::sync::mpsc::channel();
/// let worker = CommandWorker::spawn(market.clone(), rx, Duration::from_millis(10));
///
/// tx.send(Command::CreateCart { partition_id: 0 })?;
///
/// let stats = worker.stop();
/// println!("Handled {} commands", stats.handled);
/// ```
pub struct CommandWorker {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<WorkerStats>>,
}

impl CommandWorker {
    pub fn spawn(market: Arc<Marketplace>, commands: Receiver<Command>, poll_interval: Duration) -> Self {
        let (stop_tx, stop_rx) = channel();

        let handle = thread::spawn(move || {
            let mut stats = WorkerStats::default();

            loop {
                match stop_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                stats.polls += 1;

                match commands.recv_timeout(poll_interval) {
                    Ok(command) => {
                        let name = command.name();
                        match market.execute(command) {
                            Ok(_) => stats.handled += 1,
                            Err(error) => {
                                warn!(command = name, %error, "command failed");
                                stats.failed += 1;
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    // Every producer is gone; keep polling until told to stop.
                    Err(RecvTimeoutError::Disconnected) => thread::sleep(poll_interval),
                }
            }

            debug!(?stats, "command worker stopped");
            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the worker to stop and wait for it to finish.
    ///
    /// Commands still queued when the signal arrives are not executed.
    pub fn stop(mut self) -> WorkerStats {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => WorkerStats::default(),
        }
    }

    /// Signal the worker to stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for CommandWorker {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
