//! Extension point for durability.
//!
//! The marketplace calls [`Checkpoint::checkpoint`] after every command that
//! mutates state and ignores the outcome. Nothing in the crate depends on a
//! checkpoint having happened.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::ids::PartitionId;

pub trait Checkpoint: Send + Sync {
    /// `partition` is the partition the command touched, or `None` for
    /// catalog-only and broadcast commands.
    fn checkpoint(&self, partition: Option<PartitionId>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCheckpoint;

impl Checkpoint for NoopCheckpoint {
    fn checkpoint(&self, _partition: Option<PartitionId>) {}
}

/// Counts checkpoint calls; useful to observe which commands reach the hook.
#[derive(Debug, Default)]
pub struct CountingCheckpoint {
    calls: AtomicU64,
}

impl CountingCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Checkpoint for CountingCheckpoint {
    fn checkpoint(&self, _partition: Option<PartitionId>) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

impl<C: Checkpoint + ?Sized> Checkpoint for std::sync::Arc<C> {
    fn checkpoint(&self, partition: Option<PartitionId>) {
        (**self).checkpoint(partition)
    }
}
