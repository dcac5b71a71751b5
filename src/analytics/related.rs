use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::catalog::RELATED_SLOTS;
use crate::ids::{BookId, CustomerId};
use crate::partition::Order;

/// "Customers who bought `target` also bought ...".
///
/// `orders` must be most-recent-first; only the first `window` are scanned.
/// Co-purchased books are ranked by summed quantity (descending, ties by
/// ascending id). Slots without a co-purchase hold `target` itself.
pub fn related_books(orders: &[Arc<Order>], target: BookId, window: usize) -> [BookId; RELATED_SLOTS] {
    let window = &orders[..orders.len().min(window)];

    let buyers: HashSet<CustomerId> = window
        .iter()
        .filter(|order| order.lines.iter().any(|line| line.book_id == target))
        .map(|order| order.customer_id)
        .collect();

    let mut counters: HashMap<BookId, i64> = HashMap::new();
    for order in window.iter().filter(|order| buyers.contains(&order.customer_id)) {
        for line in order.lines.iter().filter(|line| line.book_id != target) {
            *counters.entry(line.book_id).or_insert(0) += line.quantity;
        }
    }

    let mut ranked: Vec<(BookId, i64)> = counters.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut related = [target; RELATED_SLOTS];
    for (slot, (book_id, _)) in related.iter_mut().zip(ranked) {
        *slot = book_id;
    }
    related
}
