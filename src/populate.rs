//! Seeded catalog population for demos, tests and load simulation.
//!
//! Stocking partitions and replaying orders is done by the marketplace
//! itself (`Command::Populate`); this module only fills the shared catalog.

use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{EntityCatalog, NewAddress, NewAuthor, NewBook, NewCustomer};
use crate::error::{MarketError, Result};
use crate::ids::AuthorId;

pub const SUBJECTS: [&str; 24] = [
    "ARTS", "BIOGRAPHIES", "BUSINESS", "CHILDREN", "COMPUTERS", "COOKING", "HEALTH", "HISTORY",
    "HOME", "HUMOR", "LITERATURE", "MYSTERY", "NON-FICTION", "PARENTING", "POLITICS",
    "REFERENCE", "RELIGION", "ROMANCE", "SELF-HELP", "SCIENCE-NATURE", "SCIENCE-FICTION",
    "SPORTS", "YOUTH", "TRAVEL",
];

const COUNTRIES: [&str; 12] = [
    "United States", "United Kingdom", "Canada", "Germany", "France", "Japan", "Netherlands",
    "Italy", "Switzerland", "Australia", "Brazil", "Portugal",
];

const BACKINGS: [&str; 5] = ["HARDBACK", "PAPERBACK", "USED", "AUDIO", "LIMITED-EDITION"];

/// How many rows of each kind to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogScale {
    pub countries: usize,
    pub authors: usize,
    pub books: usize,
    pub customers: usize,
}

impl Default for CatalogScale {
    fn default() -> Self {
        Self {
            countries: 10,
            authors: 25,
            books: 100,
            customers: 50,
        }
    }
}

/// Fill `catalog` with random countries, authors, books and customers.
///
/// Every customer lives in one of the created countries and every book has
/// one of the created authors, so `authors` must be non-zero when `books`
/// is, and `countries` must be non-zero when `customers` is.
pub fn populate_catalog<R: Rng + ?Sized>(
    catalog: &EntityCatalog,
    rng: &mut R,
    scale: CatalogScale,
) -> Result<CatalogScale> {
    if scale.books > 0 && scale.authors == 0 {
        return Err(MarketError::invalid("books need at least one author"));
    }
    if scale.customers > 0 && scale.countries == 0 {
        return Err(MarketError::invalid("customers need at least one country"));
    }
    if scale.countries > COUNTRIES.len() {
        return Err(MarketError::invalid(format!(
            "at most {} countries are available",
            COUNTRIES.len()
        )));
    }

    let today = Utc::now();
    let countries = &COUNTRIES[..scale.countries];
    for name in countries {
        catalog.get_or_create_country(name)?;
    }

    let mut author_ids: Vec<AuthorId> = Vec::with_capacity(scale.authors);
    for _ in 0..scale.authors {
        let author = catalog.create_author(NewAuthor {
            first_name: word(rng, 3, 10),
            middle_name: word(rng, 1, 1),
            last_name: word(rng, 4, 12),
            birthdate: today.date_naive() - Duration::days(rng.gen_range(20 * 365..=90 * 365)),
            bio: sentence(rng, 100, 300),
        })?;
        author_ids.push(author.id);
    }

    for i in 0..scale.books {
        let pub_date = today.date_naive() - Duration::days(rng.gen_range(0..=30 * 365));
        let srp = (rng.gen_range(1.0..=999.99_f64) * 100.0).round() / 100.0;
        catalog.create_book(NewBook {
            title: sentence(rng, 14, 60),
            pub_date,
            publisher: sentence(rng, 14, 60),
            subject: pick(rng, &SUBJECTS, "subject")?.to_string(),
            description: sentence(rng, 100, 500),
            thumbnail: format!("img{}/thumb_{i}.gif", i % 100),
            image: format!("img{}/image_{i}.gif", i % 100),
            srp,
            avail: pub_date + Duration::days(rng.gen_range(1..=30)),
            isbn: word(rng, 13, 13),
            page_count: rng.gen_range(20..=9999),
            backing: pick(rng, &BACKINGS, "backing")?.to_string(),
            dimensions: format!(
                "{:.2}x{:.2}x{:.2}",
                rng.gen_range(1.0..100.0_f64),
                rng.gen_range(1.0..100.0_f64),
                rng.gen_range(1.0..100.0_f64)
            ),
            author_id: pick(rng, &author_ids, "author")?,
        })?;
    }

    for _ in 0..scale.customers {
        let first_name = word(rng, 8, 15);
        let last_name = word(rng, 8, 15);
        catalog.create_customer(
            NewCustomer {
                email: format!("{first_name}@{last_name}.com"),
                first_name,
                last_name,
                phone: digits(rng, 9, 16),
                discount: rng.gen_range(0..=50) as f64,
                balance: 0.0,
                ytd_payment: 0.0,
                birthdate: today.date_naive() - Duration::days(rng.gen_range(18 * 365..=90 * 365)),
                data: sentence(rng, 100, 500),
                address: NewAddress {
                    street1: sentence(rng, 15, 40),
                    street2: sentence(rng, 15, 40),
                    city: word(rng, 4, 30),
                    state: word(rng, 2, 20),
                    zip: digits(rng, 5, 10),
                    country: pick(rng, countries, "country")?.to_string(),
                },
            },
            today,
        )?;
    }

    info!(
        countries = scale.countries,
        authors = scale.authors,
        books = scale.books,
        customers = scale.customers,
        "catalog populated"
    );
    Ok(scale)
}

fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, items: &[T], what: &str) -> Result<T> {
    items
        .choose(rng)
        .copied()
        .ok_or_else(|| MarketError::invalid(format!("no {what} to pick from")))
}

fn word<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> String {
    let len = rng.gen_range(min..=max);
    (0..len)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

fn sentence<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> String {
    let len = rng.gen_range(min..=max);
    let mut out = String::with_capacity(len);
    while out.len() < len {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&word(rng, 2, 10));
    }
    out.truncate(len);
    out.trim_end().to_string()
}

fn digits<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> String {
    let len = rng.gen_range(min..=max);
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
