use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MarketError, Result};
use crate::ids::{AddressId, BookId, PartitionId};

/// Range for the quantity of a lazily created stock record.
pub const INITIAL_QTY_MIN: i64 = 10;
pub const INITIAL_QTY_MAX: i64 = 30;

/// Replenishment rule applied after every purchase of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestockPolicy {
    /// A quantity strictly below this triggers a restock.
    pub threshold: i64,
    /// Units added by one restock.
    pub batch: i64,
}

impl Default for RestockPolicy {
    fn default() -> Self {
        Self {
            threshold: 10,
            batch: 21,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub partition_id: PartitionId,
    pub address_id: Option<AddressId>,
    pub book_id: BookId,
    pub cost: f64,
    /// May be negative between a purchase and its restock.
    pub quantity: i64,
}

/// Per-partition stock records, keyed by book.
pub struct InventoryLedger {
    partition_id: PartitionId,
    address_id: Option<AddressId>,
    policy: RestockPolicy,
    stocks: BTreeMap<BookId, Stock>,
}

impl InventoryLedger {
    pub fn new(partition_id: PartitionId, address_id: Option<AddressId>, policy: RestockPolicy) -> Self {
        Self {
            partition_id,
            address_id,
            policy,
            stocks: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> RestockPolicy {
        self.policy
    }

    pub fn stock(&self, book_id: BookId) -> Result<&Stock> {
        self.stocks
            .get(&book_id)
            .ok_or_else(|| MarketError::not_found("stock", book_id))
    }

    pub fn contains(&self, book_id: BookId) -> bool {
        self.stocks.contains_key(&book_id)
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    pub fn book_ids(&self) -> impl Iterator<Item = BookId> + '_ {
        self.stocks.keys().copied()
    }

    pub fn stocks(&self) -> impl Iterator<Item = &Stock> {
        self.stocks.values()
    }

    /// Overwrite the cost of a book, creating its stock record with a random
    /// quantity in `[INITIAL_QTY_MIN, INITIAL_QTY_MAX]` on first reference.
    pub fn update_stock<R: Rng + ?Sized>(
        &mut self,
        book_id: BookId,
        cost: f64,
        rng: &mut R,
    ) -> Result<&Stock> {
        validate_cost(book_id, cost)?;
        let partition_id = self.partition_id;
        let address_id = self.address_id;
        let stock = self.stocks.entry(book_id).or_insert_with(|| Stock {
            partition_id,
            address_id,
            book_id,
            cost,
            quantity: rng.gen_range(INITIAL_QTY_MIN..=INITIAL_QTY_MAX),
        });
        stock.cost = cost;
        Ok(stock)
    }

    /// Insert or replace a stock record with an explicit quantity.
    pub fn set_stock(&mut self, book_id: BookId, cost: f64, quantity: i64) -> Result<&Stock> {
        validate_cost(book_id, cost)?;
        let stock = Stock {
            partition_id: self.partition_id,
            address_id: self.address_id,
            book_id,
            cost,
            quantity,
        };
        self.stocks.insert(book_id, stock);
        self.stock(book_id)
    }

    pub fn add_qty(&mut self, book_id: BookId, delta: i64) -> Result<i64> {
        let stock = self
            .stocks
            .get_mut(&book_id)
            .ok_or_else(|| MarketError::not_found("stock", book_id))?;
        stock.quantity = checked_quantity(book_id, stock.quantity.checked_add(delta))?;
        Ok(stock.quantity)
    }

    /// Quantity a purchase of `qty` units would leave, restock included,
    /// without touching the record.
    pub fn quantity_after_purchase(&self, book_id: BookId, qty: i64) -> Result<i64> {
        self.purchase_outcome(book_id, qty).map(|(_, quantity)| quantity)
    }

    /// Remove `qty` units, then add one restock batch if the result fell
    /// below the threshold. The stock may pass through a negative quantity.
    pub fn purchase(&mut self, book_id: BookId, qty: i64) -> Result<i64> {
        let (remaining, quantity) = self.purchase_outcome(book_id, qty)?;
        if remaining != quantity {
            debug!(
                partition_id = self.partition_id,
                book_id,
                remaining,
                batch = self.policy.batch,
                "restocking"
            );
        }
        let stock = self
            .stocks
            .get_mut(&book_id)
            .ok_or_else(|| MarketError::not_found("stock", book_id))?;
        stock.quantity = quantity;
        Ok(quantity)
    }

    fn purchase_outcome(&self, book_id: BookId, qty: i64) -> Result<(i64, i64)> {
        let RestockPolicy { threshold, batch } = self.policy;
        let current = self.stock(book_id)?.quantity;
        let remaining = checked_quantity(book_id, current.checked_sub(qty))?;
        if remaining < threshold {
            let restocked = checked_quantity(book_id, remaining.checked_add(batch))?;
            return Ok((remaining, restocked));
        }
        Ok((remaining, remaining))
    }
}

fn validate_cost(book_id: BookId, cost: f64) -> Result<()> {
    if !(cost.is_finite() && cost >= 0.0) {
        return Err(MarketError::invalid(format!(
            "cost {cost} for book {book_id} is not a non-negative number"
        )));
    }
    Ok(())
}

fn checked_quantity(book_id: BookId, quantity: Option<i64>) -> Result<i64> {
    quantity
        .ok_or_else(|| MarketError::invalid(format!("stock quantity for book {book_id} overflows")))
}
