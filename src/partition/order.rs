use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::ids::{AddressId, BookId, CountryId, CustomerId, OrderId, PartitionId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Processing,
    Shipped,
    #[default]
    Pending,
    Denied,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Pending,
        OrderStatus::Denied,
    ];
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Pending => "PENDING",
            OrderStatus::Denied => "DENIED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShippingType {
    Air,
    Ups,
    Fedex,
    Ship,
    Courier,
    Mail,
}

impl ShippingType {
    pub const ALL: [ShippingType; 6] = [
        ShippingType::Air,
        ShippingType::Ups,
        ShippingType::Fedex,
        ShippingType::Ship,
        ShippingType::Courier,
        ShippingType::Mail,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardType {
    Visa,
    MasterCard,
    Discover,
    Amex,
    Diners,
}

impl CardType {
    pub const ALL: [CardType; 5] = [
        CardType::Visa,
        CardType::MasterCard,
        CardType::Discover,
        CardType::Amex,
        CardType::Diners,
    ];
}

/// Card details supplied at checkout, before the amount is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDetails {
    pub card_type: CardType,
    /// Four groups of digits.
    pub number: Vec<u32>,
    pub name: String,
    pub expiry: NaiveDate,
    pub auth_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CCTransaction {
    pub card_type: CardType,
    pub number: [u32; 4],
    pub name: String,
    pub expiry: NaiveDate,
    pub auth_id: String,
    pub amount: f64,
    pub date: Timestamp,
    pub country_id: CountryId,
}

impl CCTransaction {
    pub fn new(
        card: &CardDetails,
        amount: f64,
        date: Timestamp,
        country_id: CountryId,
    ) -> Result<Self> {
        let number: [u32; 4] = card.number.as_slice().try_into().map_err(|_| {
            MarketError::invalid(format!(
                "card number has {} groups, expected 4",
                card.number.len()
            ))
        })?;
        if amount < 0.0 {
            return Err(MarketError::invalid(format!("negative transaction amount {amount}")));
        }
        Ok(Self {
            card_type: card.card_type,
            number,
            name: card.name.clone(),
            expiry: card.expiry,
            auth_id: card.auth_id.clone(),
            amount,
            date,
            country_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub book_id: BookId,
    pub quantity: i64,
    pub discount: f64,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub partition_id: PartitionId,
    pub customer_id: CustomerId,
    pub date: Timestamp,
    pub sub_total: f64,
    pub tax: f64,
    pub total: f64,
    pub ship_type: ShippingType,
    pub ship_date: Timestamp,
    pub status: OrderStatus,
    pub billing_address_id: AddressId,
    pub shipping_address_id: AddressId,
    pub cc: CCTransaction,
    pub lines: Vec<OrderLine>,
}

/// Order history of one partition: an id-indexed list plus a
/// most-recent-first list, both holding shared, immutable orders.
#[derive(Default)]
pub struct OrderBook {
    by_id: Vec<Arc<Order>>,
    recent: VecDeque<Arc<Order>>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> OrderId {
        self.by_id.len() as OrderId
    }

    pub(crate) fn insert(&mut self, order: Order) -> Arc<Order> {
        debug_assert_eq!(order.id, self.next_id());
        let order = Arc::new(order);
        self.by_id.push(Arc::clone(&order));
        self.recent.push_front(Arc::clone(&order));
        order
    }

    pub fn get(&self, id: OrderId) -> Option<Arc<Order>> {
        self.by_id.get(id as usize).cloned()
    }

    /// Point-in-time copy of up to `limit` orders, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<Arc<Order>> {
        self.recent.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
