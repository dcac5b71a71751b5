//! Identifier aliases shared across the catalog and the partitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CountryId = u64;
pub type AddressId = u64;
pub type CustomerId = u64;
pub type AuthorId = u64;
pub type BookId = u64;
pub type PartitionId = u64;
pub type CartId = u64;
pub type OrderId = u64;
pub type EvaluationId = u64;

pub type Timestamp = DateTime<Utc>;

/// Orders are numbered per partition, so a reference to one needs both ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderRef {
    pub partition_id: PartitionId,
    pub order_id: OrderId,
}
