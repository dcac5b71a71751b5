use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::Book;
use crate::error::{MarketError, Result};
use crate::ids::BookId;
use crate::partition::{Order, OrderStatus, Stock};

/// One ranked best-seller together with every partition's offer for it.
#[derive(Debug, Clone, Serialize)]
pub struct BestSeller {
    pub book: Book,
    pub quantity: i64,
    /// Stock records for the book across all partitions, cheapest first.
    pub stocks: Vec<Stock>,
}

/// Sum shipped quantities per book of `subject` over an order snapshot.
///
/// `subjects` maps book id to subject (see `EntityCatalog::subjects`); a line
/// whose book id has no entry there is skipped.
pub fn best_sellers(
    orders: &[Arc<Order>],
    subjects: &[String],
    subject: &str,
) -> Result<HashMap<BookId, i64>> {
    if subject.trim().is_empty() {
        return Err(MarketError::invalid("best-seller subject is empty"));
    }

    let mut totals: HashMap<BookId, i64> = HashMap::new();
    let lines = orders
        .iter()
        .filter(|order| order.status == OrderStatus::Shipped)
        .flat_map(|order| order.lines.iter());
    for line in lines {
        let matches = subjects
            .get(line.book_id as usize)
            .is_some_and(|s| s == subject);
        if matches {
            *totals.entry(line.book_id).or_insert(0) += line.quantity;
        }
    }
    Ok(totals)
}

/// Order best-seller totals by quantity descending, then book id ascending,
/// keeping at most `top_n`.
pub fn rank(totals: &HashMap<BookId, i64>, top_n: usize) -> Vec<(BookId, i64)> {
    let mut ranked: Vec<(BookId, i64)> = totals.iter().map(|(id, qty)| (*id, *qty)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(top_n);
    ranked
}

/// Sort stock offers for one book ascending by cost, then partition id.
pub fn sort_by_cost(stocks: &mut [Stock]) {
    stocks.sort_by(|a, b| {
        a.cost
            .total_cmp(&b.cost)
            .then(a.partition_id.cmp(&b.partition_id))
    });
}
