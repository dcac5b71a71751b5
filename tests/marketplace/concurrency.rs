//! Concurrent clients against one marketplace, directly and through the
//! background command worker.

use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bookmarket::{Command, CommandWorker, OrderStatus};

use crate::support::{add_books, add_customer, buy, confirm, market, set_stock};

const THREADS: usize = 4;
const ORDERS_PER_THREAD: usize = 25;

// ============================================================================
// Test 1: Parallel checkouts on shared partitions lose no updates
// ============================================================================

#[test]
fn parallel_checkouts_keep_stock_consistent() {
    let market = Arc::new(market(2));
    let books = add_books(&market, "HEALTH", 1);
    let book = books[0];
    let customer = add_customer(&market, "1 Busy St", 0.0);
    // High enough that the restock rule never fires.
    set_stock(&market, 0, book, 2.0, 10_000);
    set_stock(&market, 1, book, 2.0, 10_000);

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let market = Arc::clone(&market);
            thread::spawn(move || {
                let partition_id = (i % 2) as u64;
                for _ in 0..ORDERS_PER_THREAD {
                    buy(&market, partition_id, customer, &[(book, 2)], OrderStatus::Shipped);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let per_partition = (THREADS / 2 * ORDERS_PER_THREAD) as i64;
    for partition_id in 0..2 {
        assert_eq!(
            market.partition(partition_id).unwrap().order_count().unwrap() as i64,
            per_partition
        );
        assert_eq!(
            market.stock(partition_id, book).unwrap().quantity,
            10_000 - 2 * per_partition
        );
        let mut ids: Vec<u64> = market
            .recent_orders(partition_id, usize::MAX)
            .unwrap()
            .iter()
            .map(|order| order.id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..per_partition as u64).collect::<Vec<_>>());
    }

    let shipped = market.best_sellers(0, "HEALTH").unwrap();
    assert_eq!(shipped[&book], 2 * per_partition);
}

// ============================================================================
// Test 2: Analytics run while checkouts are in flight
// ============================================================================

#[test]
fn analytics_alongside_checkouts() {
    let market = Arc::new(market(1));
    let books = add_books(&market, "HEALTH", 2);
    let customer = add_customer(&market, "2 Busy St", 0.0);
    set_stock(&market, 0, books[0], 2.0, 10_000);
    set_stock(&market, 0, books[1], 2.0, 10_000);

    let writer = {
        let market = Arc::clone(&market);
        let books = books.clone();
        thread::spawn(move || {
            for _ in 0..50 {
                buy(&market, 0, customer, &[(books[0], 1), (books[1], 1)], OrderStatus::Shipped);
            }
        })
    };
    let reader = {
        let market = Arc::clone(&market);
        let books = books.clone();
        let target = books[0];
        thread::spawn(move || {
            for _ in 0..50 {
                let book = market.update_related_books(0, target).unwrap();
                assert!(book.related[0] == books[1] || book.related[0] == target);
                let totals = market.best_sellers(0, "HEALTH").unwrap();
                assert_eq!(totals.get(&books[0]), totals.get(&books[1]));
            }
        })
    };
    writer.join().unwrap();
    reader.join().unwrap();

    let book = market.update_related_books(0, books[0]).unwrap();
    assert_eq!(book.related[0], books[1]);
}

// ============================================================================
// Test 3: Command worker drains a channel
// ============================================================================

#[test]
fn worker_executes_submitted_commands() {
    let market = Arc::new(market(1));
    let books = add_books(&market, "TRAVEL", 1);
    let customer = add_customer(&market, "3 Queue St", 0.0);
    set_stock(&market, 0, books[0], 2.0, 100);

    let (tx, rx) = channel();
    let worker = CommandWorker::spawn(Arc::clone(&market), rx, Duration::from_millis(10));

    tx.send(Command::CreateCart { partition_id: 0 }).unwrap();
    tx.send(Command::CartUpdate(bookmarket::CartUpdate {
        partition_id: 0,
        cart_id: Some(0),
        add_book: Some(books[0]),
        lines: Vec::new(),
    }))
    .unwrap();
    tx.send(confirm(0, customer, 0, OrderStatus::Pending)).unwrap();
    tx.send(Command::CreateCart { partition_id: 3 }).unwrap();

    thread::sleep(Duration::from_millis(300));

    let stats = worker.stop();
    assert_eq!(stats.handled, 3);
    assert_eq!(stats.failed, 1);
    assert!(stats.polls >= 4);
    assert_eq!(market.partition(0).unwrap().order_count().unwrap(), 1);
    assert_eq!(market.stock(0, books[0]).unwrap().quantity, 99);
}

#[test]
fn worker_stops_when_idle() {
    let market = Arc::new(market(1));
    let (_tx, rx) = channel::<Command>();
    let worker = CommandWorker::spawn(market, rx, Duration::from_millis(5));

    thread::sleep(Duration::from_millis(50));
    let stats = worker.stop();
    assert_eq!(stats.handled, 0);
    assert_eq!(stats.failed, 0);
    assert!(stats.polls > 0);
}
