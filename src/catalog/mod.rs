//! Global catalog: countries, addresses, customers, authors and books.
//!
//! Countries and addresses are get-or-create by value; customers, authors
//! and books always insert. The catalog is built once and shared by handle
//! (`Arc<EntityCatalog>`) with every partition.

mod entities;
mod store;
mod username;

pub use entities::{
    Address, Author, Book, Country, Customer, NewAddress, NewAuthor, NewBook, NewCustomer,
    RELATED_SLOTS,
};
pub use store::EntityCatalog;
pub use username::{password_for, username_for};
