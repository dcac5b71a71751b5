//! Read-only analytics over a partition's order history.
//!
//! Both passes work on a point-in-time `Vec<Arc<Order>>` copied under the
//! partition lock; neither holds any lock while aggregating.

mod best_sellers;
mod related;

pub use best_sellers::{best_sellers, rank, sort_by_cost, BestSeller};
pub use related::related_books;
