use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Book, Customer, NewCustomer};
use crate::ids::{BookId, CartId, CustomerId, PartitionId};
use crate::partition::{Cart, ConfirmBuy, Order};
use crate::recommender::Evaluation;

/// Where a command is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Routed to the partition with this id.
    Partition(PartitionId),
    /// Applied to every partition in order.
    AllPartitions,
    /// Touches only the shared catalog (and the evaluation log).
    Catalog,
}

impl Target {
    pub fn partition_id(&self) -> Option<PartitionId> {
        match self {
            Target::Partition(id) => Some(*id),
            Target::AllPartitions | Target::Catalog => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineUpdate {
    pub book_id: BookId,
    pub quantity: i64,
}

/// Cart mutation: create the cart if needed, add one unit of `add_book`,
/// then set each listed line to its quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartUpdate {
    pub partition_id: PartitionId,
    #[serde(default)]
    pub cart_id: Option<CartId>,
    #[serde(default)]
    pub add_book: Option<BookId>,
    #[serde(default)]
    pub lines: Vec<LineUpdate>,
}

/// Administrative book update: new cost in one partition, new media and
/// publication date in the catalog, then a related-books recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBook {
    pub partition_id: PartitionId,
    pub book_id: BookId,
    pub cost: f64,
    pub image: String,
    pub thumbnail: String,
    pub pub_date: NaiveDate,
}

/// Every operation the marketplace accepts, each carrying its own payload.
///
/// Commands are plain data, so they can be built in code or decoded from
/// JSON (`{"command": "create_cart", "partition_id": 0}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    CreateCustomer {
        customer: NewCustomer,
    },
    RefreshSession {
        customer_id: CustomerId,
    },
    AddEvaluation {
        customer_id: CustomerId,
        book_id: BookId,
        rating: f64,
    },
    CreateCart {
        partition_id: PartitionId,
    },
    CartUpdate(CartUpdate),
    ConfirmBuy(ConfirmBuy),
    UpdateBook(UpdateBook),
    /// Stock every catalog book in every partition, then replay
    /// `orders_per_partition` random checkouts in each.
    Populate {
        #[serde(default)]
        orders_per_partition: usize,
    },
}

impl Command {
    pub fn target(&self) -> Target {
        match self {
            Command::CreateCustomer { .. }
            | Command::RefreshSession { .. }
            | Command::AddEvaluation { .. } => Target::Catalog,
            Command::CreateCart { partition_id } => Target::Partition(*partition_id),
            Command::CartUpdate(update) => Target::Partition(update.partition_id),
            Command::ConfirmBuy(request) => Target::Partition(request.partition_id),
            Command::UpdateBook(update) => Target::Partition(update.partition_id),
            Command::Populate { .. } => Target::AllPartitions,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateCustomer { .. } => "create_customer",
            Command::RefreshSession { .. } => "refresh_session",
            Command::AddEvaluation { .. } => "add_evaluation",
            Command::CreateCart { .. } => "create_cart",
            Command::CartUpdate(_) => "cart_update",
            Command::ConfirmBuy(_) => "confirm_buy",
            Command::UpdateBook(_) => "update_book",
            Command::Populate { .. } => "populate",
        }
    }
}

#[derive(Debug, Clone)]
pub enum CommandOutput {
    Customer(Customer),
    Cart(Cart),
    Order(Arc<Order>),
    Book(Book),
    Evaluation(Evaluation),
    Populated { partitions: usize, orders: usize },
}

impl CommandOutput {
    pub fn into_customer(self) -> Option<Customer> {
        match self {
            CommandOutput::Customer(customer) => Some(customer),
            _ => None,
        }
    }

    pub fn into_cart(self) -> Option<Cart> {
        match self {
            CommandOutput::Cart(cart) => Some(cart),
            _ => None,
        }
    }

    pub fn into_order(self) -> Option<Arc<Order>> {
        match self {
            CommandOutput::Order(order) => Some(order),
            _ => None,
        }
    }

    pub fn into_book(self) -> Option<Book> {
        match self {
            CommandOutput::Book(book) => Some(book),
            _ => None,
        }
    }
}
