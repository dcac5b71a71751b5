//! In-memory bookstore marketplace.
//!
//! A shared [`EntityCatalog`] holds countries, addresses, customers, authors
//! and books. Carts, stock and orders live in independently locked
//! [`Partition`]s. A [`Marketplace`] routes [`Command`]s to partitions and
//! answers the cross-partition queries (best-sellers, related books, stock
//! comparisons).

pub mod analytics;
pub mod catalog;
mod checkpoint;
mod config;
mod error;
#[cfg(feature = "emitter")]
pub mod events;
mod ids;
pub mod market;
pub mod partition;
pub mod populate;
mod recommender;

pub use catalog::{
    Address, Author, Book, Country, Customer, EntityCatalog, NewAddress, NewAuthor, NewBook,
    NewCustomer,
};
pub use checkpoint::{Checkpoint, CountingCheckpoint, NoopCheckpoint};
pub use config::{MarketConfig, DEFAULT_BEST_SELLER_COUNT, DEFAULT_RELATED_WINDOW};
pub use error::{MarketError, Result};
pub use ids::{
    AddressId, AuthorId, BookId, CartId, CountryId, CustomerId, EvaluationId, OrderId, OrderRef,
    PartitionId, Timestamp,
};
pub use market::{
    CartUpdate, Command, CommandOutput, CommandWorker, LineUpdate, Marketplace, Target,
    UpdateBook, WorkerStats,
};
pub use partition::{
    Cart, CartPricing, CardDetails, CardType, ConfirmBuy, Order, OrderStatus, Partition,
    RestockPolicy, ShippingType, Stock,
};
pub use populate::{populate_catalog, CatalogScale};
pub use recommender::{
    Evaluation, PopularityRecommender, Recommender, RecommenderSettings, Similarity,
};
