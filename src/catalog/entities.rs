use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::ids::{
    AddressId, AuthorId, BookId, CountryId, CustomerId, OrderRef, Timestamp,
};

pub const RELATED_SLOTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub currency: String,
    pub exchange: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub street1: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country_id: CountryId,
}

/// Address fields as supplied by a caller, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewAddress {
    pub street1: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// Dedup key for the address table: every field except the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct AddressKey {
    pub street1: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country_id: CountryId,
}

impl AddressKey {
    pub(crate) fn new(address: &NewAddress, country_id: CountryId) -> Self {
        Self {
            street1: address.street1.clone(),
            street2: address.street2.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            zip: address.zip.clone(),
            country_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub since: Timestamp,
    pub last_visit: Timestamp,
    pub login: Timestamp,
    pub expiration: Timestamp,
    /// Percentage in `[0, 100]`.
    pub discount: f64,
    pub balance: f64,
    pub ytd_payment: f64,
    pub birthdate: NaiveDate,
    pub data: String,
    pub address_id: AddressId,
    pub most_recent_order: Option<OrderRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub discount: f64,
    pub balance: f64,
    pub ytd_payment: f64,
    pub birthdate: NaiveDate,
    pub data: String,
    pub address: NewAddress,
}

impl NewCustomer {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.discount) {
            return Err(MarketError::invalid(format!(
                "customer discount {} outside [0, 100]",
                self.discount
            )));
        }
        if self.ytd_payment < 0.0 {
            return Err(MarketError::invalid("negative ytd payment"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub birthdate: NaiveDate,
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub birthdate: NaiveDate,
    pub bio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub pub_date: NaiveDate,
    pub publisher: String,
    pub subject: String,
    pub description: String,
    pub thumbnail: String,
    pub image: String,
    /// Suggested retail price.
    pub srp: f64,
    pub avail: NaiveDate,
    pub isbn: String,
    pub page_count: u32,
    pub backing: String,
    pub dimensions: String,
    pub author_id: AuthorId,
    pub related: [BookId; RELATED_SLOTS],
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Book {}

impl std::hash::Hash for Book {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub pub_date: NaiveDate,
    pub publisher: String,
    pub subject: String,
    pub description: String,
    pub thumbnail: String,
    pub image: String,
    pub srp: f64,
    pub avail: NaiveDate,
    pub isbn: String,
    pub page_count: u32,
    pub backing: String,
    pub dimensions: String,
    pub author_id: AuthorId,
}

impl NewBook {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(MarketError::invalid("book title is empty"));
        }
        if self.subject.trim().is_empty() {
            return Err(MarketError::invalid("book subject is empty"));
        }
        if !(self.srp.is_finite() && self.srp >= 0.0) {
            return Err(MarketError::invalid(format!(
                "book price {} is not a non-negative number",
                self.srp
            )));
        }
        Ok(())
    }
}
