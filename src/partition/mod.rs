//! Partitions: independently locked shards holding carts, stock and orders.
//!
//! All partition-local state lives in one [`PartitionState`] behind a single
//! mutex. Cart mutation, stock updates and checkout therefore serialize per
//! partition, while readers of the order history copy `Arc<Order>` handles
//! and release the lock before doing any real work.

mod cart;
mod inventory;
mod order;
mod workflow;

use std::sync::{Arc, Mutex, MutexGuard};

pub use cart::{Cart, CartLine, CartPricing, CartStore, SHIPPING_BASE, SHIPPING_PER_ITEM, TAX_RATE};
pub use inventory::{InventoryLedger, RestockPolicy, Stock, INITIAL_QTY_MAX, INITIAL_QTY_MIN};
pub use order::{
    CCTransaction, CardDetails, CardType, Order, OrderBook, OrderLine, OrderStatus, ShippingType,
};
pub use workflow::{confirm_buy, CheckoutContext, ConfirmBuy};

use crate::error::{MarketError, Result};
use crate::ids::{AddressId, OrderId, PartitionId};

pub struct PartitionState {
    pub carts: CartStore,
    pub inventory: InventoryLedger,
    pub orders: OrderBook,
}

pub struct Partition {
    id: PartitionId,
    address_id: Option<AddressId>,
    state: Mutex<PartitionState>,
}

impl Partition {
    pub fn new(id: PartitionId, address_id: Option<AddressId>, policy: RestockPolicy) -> Self {
        Partition {
            id,
            address_id,
            state: Mutex::new(PartitionState {
                carts: CartStore::new(),
                inventory: InventoryLedger::new(id, address_id, policy),
                orders: OrderBook::new(),
            }),
        }
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    pub fn address_id(&self) -> Option<AddressId> {
        self.address_id
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, PartitionState>> {
        self.state
            .lock()
            .map_err(|_| MarketError::LockPoisoned("partition state"))
    }

    /// Run `f` with exclusive access to this partition's state.
    pub fn with_state<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PartitionState) -> Result<T>,
    {
        let mut state = self.lock()?;
        f(&mut state)
    }

    /// Copy up to `limit` of the most recent orders, newest first. The lock
    /// is held only for the copy.
    pub fn recent_orders(&self, limit: usize) -> Result<Vec<Arc<Order>>> {
        Ok(self.lock()?.orders.recent(limit))
    }

    pub fn order(&self, id: OrderId) -> Result<Arc<Order>> {
        self.lock()?
            .orders
            .get(id)
            .ok_or_else(|| MarketError::not_found("order", id))
    }

    pub fn order_count(&self) -> Result<usize> {
        Ok(self.lock()?.orders.len())
    }
}
