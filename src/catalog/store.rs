use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::entities::{
    Address, AddressKey, Author, Book, Country, Customer, NewAddress, NewAuthor, NewBook,
    NewCustomer, RELATED_SLOTS,
};
use super::username::{password_for, username_for};
use crate::error::{MarketError, Result};
use crate::ids::{AddressId, AuthorId, BookId, CountryId, CustomerId, OrderRef, Timestamp};

const DEFAULT_CURRENCY: &str = "Dollars";
const DEFAULT_EXCHANGE: f64 = 1.0;

#[derive(Default)]
struct CountryTable {
    rows: Vec<Arc<Country>>,
    by_name: HashMap<String, CountryId>,
}

#[derive(Default)]
struct AddressTable {
    rows: Vec<Arc<Address>>,
    by_key: HashMap<AddressKey, AddressId>,
}

#[derive(Default)]
struct CustomerTable {
    rows: Vec<Customer>,
    by_username: HashMap<String, CustomerId>,
}

/// Process-wide catalog shared by every partition.
///
/// Each table sits behind its own `RwLock`. Get-or-create operations hold the
/// table's write lock across lookup and insert, so two callers racing on the
/// same key always receive the same row. Ids are dense and sequential, which
/// lets lookups index straight into the row vectors.
pub struct EntityCatalog {
    countries: RwLock<CountryTable>,
    addresses: RwLock<AddressTable>,
    customers: RwLock<CustomerTable>,
    authors: RwLock<Vec<Author>>,
    books: RwLock<Vec<Book>>,
    session_ttl: Duration,
}

impl Default for EntityCatalog {
    fn default() -> Self {
        Self::new(Duration::hours(2))
    }
}

impl EntityCatalog {
    pub fn new(session_ttl: Duration) -> Self {
        EntityCatalog {
            countries: RwLock::new(CountryTable::default()),
            addresses: RwLock::new(AddressTable::default()),
            customers: RwLock::new(CustomerTable::default()),
            authors: RwLock::new(Vec::new()),
            books: RwLock::new(Vec::new()),
            session_ttl,
        }
    }

    // ------------------------------------------------------------------
    // Countries
    // ------------------------------------------------------------------

    pub fn get_or_create_country(&self, name: &str) -> Result<Arc<Country>> {
        if name.trim().is_empty() {
            return Err(MarketError::invalid("country name is empty"));
        }
        let mut table = self
            .countries
            .write()
            .map_err(|_| MarketError::LockPoisoned("country write"))?;

        if let Some(&id) = table.by_name.get(name) {
            return Ok(Arc::clone(&table.rows[id as usize]));
        }

        let country = Arc::new(Country {
            id: table.rows.len() as CountryId,
            name: name.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            exchange: DEFAULT_EXCHANGE,
        });
        table.by_name.insert(name.to_string(), country.id);
        table.rows.push(Arc::clone(&country));
        Ok(country)
    }

    pub fn country(&self, id: CountryId) -> Result<Option<Arc<Country>>> {
        let table = self
            .countries
            .read()
            .map_err(|_| MarketError::LockPoisoned("country read"))?;
        Ok(table.rows.get(id as usize).cloned())
    }

    pub fn country_by_name(&self, name: &str) -> Result<Option<Arc<Country>>> {
        let table = self
            .countries
            .read()
            .map_err(|_| MarketError::LockPoisoned("country read"))?;
        Ok(table
            .by_name
            .get(name)
            .map(|&id| Arc::clone(&table.rows[id as usize])))
    }

    // ------------------------------------------------------------------
    // Addresses
    // ------------------------------------------------------------------

    pub fn get_or_create_address(&self, address: &NewAddress) -> Result<Arc<Address>> {
        let country = self.get_or_create_country(&address.country)?;
        let key = AddressKey::new(address, country.id);

        let mut table = self
            .addresses
            .write()
            .map_err(|_| MarketError::LockPoisoned("address write"))?;

        if let Some(&id) = table.by_key.get(&key) {
            return Ok(Arc::clone(&table.rows[id as usize]));
        }

        let created = Arc::new(Address {
            id: table.rows.len() as AddressId,
            street1: key.street1.clone(),
            street2: key.street2.clone(),
            city: key.city.clone(),
            state: key.state.clone(),
            zip: key.zip.clone(),
            country_id: country.id,
        });
        table.by_key.insert(key, created.id);
        table.rows.push(Arc::clone(&created));
        Ok(created)
    }

    pub fn address(&self, id: AddressId) -> Result<Option<Arc<Address>>> {
        let table = self
            .addresses
            .read()
            .map_err(|_| MarketError::LockPoisoned("address read"))?;
        Ok(table.rows.get(id as usize).cloned())
    }

    // ------------------------------------------------------------------
    // Customers
    // ------------------------------------------------------------------

    /// Insert a customer. Never deduplicates: two identical requests create
    /// two customers with distinct ids and usernames.
    pub fn create_customer(&self, customer: NewCustomer, now: Timestamp) -> Result<Customer> {
        customer.validate()?;
        let address = self.get_or_create_address(&customer.address)?;

        let mut table = self
            .customers
            .write()
            .map_err(|_| MarketError::LockPoisoned("customer write"))?;

        let id = table.rows.len() as CustomerId;
        let username = username_for(id);
        let created = Customer {
            id,
            password: password_for(&username),
            username: username.clone(),
            first_name: customer.first_name,
            last_name: customer.last_name,
            phone: customer.phone,
            email: customer.email,
            since: now,
            last_visit: now,
            login: now,
            expiration: now + self.session_ttl,
            discount: customer.discount,
            balance: customer.balance,
            ytd_payment: customer.ytd_payment,
            birthdate: customer.birthdate,
            data: customer.data,
            address_id: address.id,
            most_recent_order: None,
        };
        table.by_username.insert(username, id);
        table.rows.push(created.clone());
        debug!(customer_id = id, username = %created.username, "customer created");
        Ok(created)
    }

    pub fn customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let table = self
            .customers
            .read()
            .map_err(|_| MarketError::LockPoisoned("customer read"))?;
        Ok(table.rows.get(id as usize).cloned())
    }

    pub fn customer_by_username(&self, username: &str) -> Result<Option<Customer>> {
        let table = self
            .customers
            .read()
            .map_err(|_| MarketError::LockPoisoned("customer read"))?;
        Ok(table
            .by_username
            .get(username)
            .map(|&id| table.rows[id as usize].clone()))
    }

    pub fn customer_count(&self) -> Result<usize> {
        let table = self
            .customers
            .read()
            .map_err(|_| MarketError::LockPoisoned("customer read"))?;
        Ok(table.rows.len())
    }

    /// Start a new login window for the customer.
    pub fn refresh_session(&self, id: CustomerId, now: Timestamp) -> Result<Customer> {
        let ttl = self.session_ttl;
        self.with_customer_mut(id, |customer| {
            customer.last_visit = customer.login;
            customer.login = now;
            customer.expiration = now + ttl;
        })
    }

    pub fn set_most_recent_order(&self, id: CustomerId, order: OrderRef) -> Result<Customer> {
        self.with_customer_mut(id, |customer| customer.most_recent_order = Some(order))
    }

    fn with_customer_mut<F>(&self, id: CustomerId, update: F) -> Result<Customer>
    where
        F: FnOnce(&mut Customer),
    {
        let mut table = self
            .customers
            .write()
            .map_err(|_| MarketError::LockPoisoned("customer write"))?;
        let customer = table
            .rows
            .get_mut(id as usize)
            .ok_or_else(|| MarketError::not_found("customer", id))?;
        update(customer);
        Ok(customer.clone())
    }

    // ------------------------------------------------------------------
    // Authors
    // ------------------------------------------------------------------

    pub fn create_author(&self, author: NewAuthor) -> Result<Author> {
        let mut authors = self
            .authors
            .write()
            .map_err(|_| MarketError::LockPoisoned("author write"))?;
        let created = Author {
            id: authors.len() as AuthorId,
            first_name: author.first_name,
            middle_name: author.middle_name,
            last_name: author.last_name,
            birthdate: author.birthdate,
            bio: author.bio,
        };
        authors.push(created.clone());
        Ok(created)
    }

    pub fn author(&self, id: AuthorId) -> Result<Option<Author>> {
        let authors = self
            .authors
            .read()
            .map_err(|_| MarketError::LockPoisoned("author read"))?;
        Ok(authors.get(id as usize).cloned())
    }

    // ------------------------------------------------------------------
    // Books
    // ------------------------------------------------------------------

    /// Insert a book. Its related-book slots start out pointing at itself.
    pub fn create_book(&self, book: NewBook) -> Result<Book> {
        book.validate()?;
        if self.author(book.author_id)?.is_none() {
            return Err(MarketError::not_found("author", book.author_id));
        }

        let mut books = self
            .books
            .write()
            .map_err(|_| MarketError::LockPoisoned("book write"))?;
        let id = books.len() as BookId;
        let created = Book {
            id,
            title: book.title,
            pub_date: book.pub_date,
            publisher: book.publisher,
            subject: book.subject,
            description: book.description,
            thumbnail: book.thumbnail,
            image: book.image,
            srp: book.srp,
            avail: book.avail,
            isbn: book.isbn,
            page_count: book.page_count,
            backing: book.backing,
            dimensions: book.dimensions,
            author_id: book.author_id,
            related: [id; RELATED_SLOTS],
        };
        books.push(created.clone());
        Ok(created)
    }

    pub fn book(&self, id: BookId) -> Result<Option<Book>> {
        let books = self
            .books
            .read()
            .map_err(|_| MarketError::LockPoisoned("book read"))?;
        Ok(books.get(id as usize).cloned())
    }

    pub fn require_book(&self, id: BookId) -> Result<Book> {
        self.book(id)?.ok_or_else(|| MarketError::not_found("book", id))
    }

    pub fn book_count(&self) -> Result<usize> {
        let books = self
            .books
            .read()
            .map_err(|_| MarketError::LockPoisoned("book read"))?;
        Ok(books.len())
    }

    pub fn books_by_subject(&self, subject: &str) -> Result<Vec<Book>> {
        let books = self
            .books
            .read()
            .map_err(|_| MarketError::LockPoisoned("book read"))?;
        Ok(books
            .iter()
            .filter(|book| book.subject == subject)
            .cloned()
            .collect())
    }

    /// Subject of every book, indexed by book id.
    pub fn subjects(&self) -> Result<Vec<String>> {
        let books = self
            .books
            .read()
            .map_err(|_| MarketError::LockPoisoned("book read"))?;
        Ok(books.iter().map(|book| book.subject.clone()).collect())
    }

    /// Resolve a book's related-book ids to full books.
    pub fn related_books(&self, id: BookId) -> Result<Vec<Book>> {
        let books = self
            .books
            .read()
            .map_err(|_| MarketError::LockPoisoned("book read"))?;
        let book = books
            .get(id as usize)
            .ok_or_else(|| MarketError::not_found("book", id))?;
        Ok(book
            .related
            .iter()
            .filter_map(|related| books.get(*related as usize).cloned())
            .collect())
    }

    pub fn set_related_books(&self, id: BookId, related: [BookId; RELATED_SLOTS]) -> Result<Book> {
        let mut books = self
            .books
            .write()
            .map_err(|_| MarketError::LockPoisoned("book write"))?;
        if let Some(missing) = related.iter().find(|r| **r as usize >= books.len()) {
            return Err(MarketError::not_found("book", missing));
        }
        let book = books
            .get_mut(id as usize)
            .ok_or_else(|| MarketError::not_found("book", id))?;
        book.related = related;
        Ok(book.clone())
    }

    pub fn update_book_media(
        &self,
        id: BookId,
        image: String,
        thumbnail: String,
        pub_date: NaiveDate,
    ) -> Result<Book> {
        let mut books = self
            .books
            .write()
            .map_err(|_| MarketError::LockPoisoned("book write"))?;
        let book = books
            .get_mut(id as usize)
            .ok_or_else(|| MarketError::not_found("book", id))?;
        book.image = image;
        book.thumbnail = thumbnail;
        book.pub_date = pub_date;
        Ok(book.clone())
    }
}
