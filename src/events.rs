//! Post-command notifications.
//!
//! After a command succeeds the marketplace emits a small serializable
//! event naming what changed. Listeners run on the emitter's own threads,
//! so a slow listener never holds a partition lock.
//!
//! ```ignore
//! market.on(ORDER_CONFIRMED, |event: OrderConfirmed| {
//!     println!("order {} total {}", event.order_id, event.total);
//! })?;
//! ```

use std::sync::Mutex;

use event_emitter_rs::EventEmitter;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::ids::{BookId, CustomerId, OrderId, PartitionId};

pub const CUSTOMER_CREATED: &str = "customer_created";
pub const ORDER_CONFIRMED: &str = "order_confirmed";
pub const BOOK_UPDATED: &str = "book_updated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCreated {
    pub customer_id: CustomerId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmed {
    pub partition_id: PartitionId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookUpdated {
    pub partition_id: PartitionId,
    pub book_id: BookId,
    pub cost: f64,
}

/// Listener registry shared by every caller of the marketplace.
pub struct MarketEvents {
    emitter: Mutex<EventEmitter>,
}

impl MarketEvents {
    pub fn new() -> Self {
        Self {
            emitter: Mutex::new(EventEmitter::new()),
        }
    }

    /// Register a listener; returns its id for [`MarketEvents::remove`].
    pub fn on<T, F>(&self, event: &str, listener: F) -> Result<String>
    where
        for<'de> T: Deserialize<'de>,
        F: Fn(T) + Send + Sync + 'static,
    {
        let mut emitter = self.lock()?;
        Ok(emitter.on(event, listener))
    }

    pub fn remove(&self, listener_id: &str) -> Result<bool> {
        let mut emitter = self.lock()?;
        Ok(emitter.remove_listener(listener_id).is_some())
    }

    pub fn emit<T: Serialize>(&self, event: &str, payload: T) -> Result<()> {
        let mut emitter = self.lock()?;
        emitter.emit(event, payload);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, EventEmitter>> {
        self.emitter
            .lock()
            .map_err(|_| MarketError::LockPoisoned("event emitter"))
    }
}

impl Default for MarketEvents {
    fn default() -> Self {
        Self::new()
    }
}
