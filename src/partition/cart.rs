use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::inventory::{InventoryLedger, Stock};
use crate::catalog::Customer;
use crate::error::{MarketError, Result};
use crate::ids::{BookId, CartId, Timestamp};

pub const TAX_RATE: f64 = 0.0825;
pub const SHIPPING_BASE: f64 = 3.00;
pub const SHIPPING_PER_ITEM: f64 = 1.00;

/// A line refers to the partition's stock record for `book_id`; its cost is
/// read from there whenever the cart is priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub book_id: BookId,
    pub quantity: i64,
}

/// Amounts owed for a cart at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartPricing {
    pub sub_total: f64,
    pub tax: f64,
    pub shipping_cost: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub time: Timestamp,
    lines: BTreeMap<BookId, CartLine>,
}

impl Cart {
    pub fn new(id: CartId, time: Timestamp) -> Self {
        Self {
            id,
            time,
            lines: BTreeMap::new(),
        }
    }

    /// Add `qty` to the line for the stock's book. A `qty` of zero, or a
    /// result of exactly zero, removes the line; a negative or overflowing
    /// result is rejected.
    pub fn increase_line(&mut self, stock: &Stock, qty: i64) -> Result<()> {
        if qty == 0 {
            self.lines.remove(&stock.book_id);
            return Ok(());
        }
        let current = self.lines.get(&stock.book_id).map_or(0, |line| line.quantity);
        let quantity = current.checked_add(qty).ok_or_else(|| {
            MarketError::invalid(format!(
                "cart {} line for book {} overflows at {current} + {qty}",
                self.id, stock.book_id
            ))
        })?;
        self.put_line(stock, quantity)
    }

    /// Set the line for the stock's book to `qty`, with the same zero rule.
    pub fn change_line(&mut self, stock: &Stock, qty: i64) -> Result<()> {
        self.put_line(stock, qty)
    }

    fn put_line(&mut self, stock: &Stock, quantity: i64) -> Result<()> {
        if quantity < 0 {
            return Err(MarketError::invalid(format!(
                "cart {} line for book {} would hold {quantity} units",
                self.id, stock.book_id
            )));
        }
        if quantity == 0 {
            self.lines.remove(&stock.book_id);
        } else {
            self.lines.insert(
                stock.book_id,
                CartLine {
                    book_id: stock.book_id,
                    quantity,
                },
            );
        }
        Ok(())
    }

    pub fn line(&self, book_id: BookId) -> Option<&CartLine> {
        self.lines.get(&book_id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total_quantity(&self) -> Result<i64> {
        self.lines.values().try_fold(0i64, |sum, line| {
            sum.checked_add(line.quantity).ok_or_else(|| {
                MarketError::invalid(format!("cart {} holds more units than fit in i64", self.id))
            })
        })
    }

    /// Price every line through the current stock record of its book.
    pub fn pricing(&self, inventory: &InventoryLedger, discount: f64) -> Result<CartPricing> {
        let mut raw_cost = 0.0;
        for line in self.lines.values() {
            raw_cost += line.quantity as f64 * inventory.stock(line.book_id)?.cost;
        }
        let sub_total = raw_cost * (1.0 - discount / 100.0);
        let tax = sub_total * TAX_RATE;
        let shipping_cost = SHIPPING_BASE + SHIPPING_PER_ITEM * self.total_quantity()? as f64;
        Ok(CartPricing {
            sub_total,
            tax,
            shipping_cost,
            total: sub_total + tax + shipping_cost,
        })
    }

    pub fn pricing_for(
        &self,
        inventory: &InventoryLedger,
        customer: &Customer,
    ) -> Result<CartPricing> {
        self.pricing(inventory, customer.discount)
    }
}

/// Carts of one partition. Ids are dense; carts are never deleted.
#[derive(Default)]
pub struct CartStore {
    carts: Vec<Cart>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_cart(&mut self, time: Timestamp) -> &mut Cart {
        let id = self.carts.len() as CartId;
        self.carts.push(Cart::new(id, time));
        let last = self.carts.len() - 1;
        &mut self.carts[last]
    }

    pub fn cart(&self, id: CartId) -> Result<&Cart> {
        self.carts
            .get(id as usize)
            .ok_or_else(|| MarketError::not_found("cart", id))
    }

    pub fn cart_mut(&mut self, id: CartId) -> Result<&mut Cart> {
        self.carts
            .get_mut(id as usize)
            .ok_or_else(|| MarketError::not_found("cart", id))
    }

    pub fn next_id(&self) -> CartId {
        self.carts.len() as CartId
    }

    /// Write back a cart: replaces an existing id, or appends when the id is
    /// the next one to be assigned.
    pub fn store(&mut self, cart: Cart) -> Result<()> {
        let index = cart.id as usize;
        if index == self.carts.len() {
            self.carts.push(cart);
            return Ok(());
        }
        let slot = self
            .carts
            .get_mut(index)
            .ok_or_else(|| MarketError::not_found("cart", cart.id))?;
        *slot = cart;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.carts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carts.is_empty()
    }
}
