//! Best-sellers and related books over real checkouts.

use bookmarket::{Command, MarketError, OrderStatus, UpdateBook};

use crate::support::{add_author, add_book, add_books, add_customer, buy, date, market, now, set_stock};

// ============================================================================
// Test 1: Only shipped lines of the subject count
// ============================================================================

#[test]
fn best_sellers_count_shipped_lines_of_subject() {
    let market = market(1);
    let author = add_author(market.catalog());
    let mystery_a = add_book(market.catalog(), author, "MYSTERY", 10.0);
    let mystery_b = add_book(market.catalog(), author, "MYSTERY", 10.0);
    let travel = add_book(market.catalog(), author, "TRAVEL", 10.0);
    let customer = add_customer(&market, "1 Rank Rd", 0.0);
    for book in [mystery_a, mystery_b, travel] {
        set_stock(&market, 0, book, 4.0, 500);
    }

    buy(&market, 0, customer, &[(mystery_a, 3), (travel, 9)], OrderStatus::Shipped);
    buy(&market, 0, customer, &[(mystery_a, 2), (mystery_b, 1)], OrderStatus::Shipped);
    buy(&market, 0, customer, &[(mystery_b, 50)], OrderStatus::Pending);
    buy(&market, 0, customer, &[(mystery_b, 50)], OrderStatus::Denied);

    let totals = market.best_sellers(0, "MYSTERY").unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[&mystery_a], 5);
    assert_eq!(totals[&mystery_b], 1);
    assert!(!totals.contains_key(&travel));

    assert!(market.best_sellers(0, "ROMANCE").unwrap().is_empty());
}

#[test]
fn blank_subject_is_invalid() {
    let market = market(1);
    let err = market.best_sellers(0, "  ").unwrap_err();
    assert!(matches!(err, MarketError::InvalidArgument(_)));
}

// ============================================================================
// Test 2: Ranked best-sellers carry every partition's stock, cheapest first
// ============================================================================

#[test]
fn best_sellers_with_stock_across_partitions() {
    let market = market(3);
    let books = add_books(&market, "SCIENCE-FICTION", 3);
    let customer = add_customer(&market, "2 Rank Rd", 0.0);
    for book in &books {
        set_stock(&market, 0, *book, 10.0, 500);
    }
    set_stock(&market, 1, books[0], 7.5, 20);
    set_stock(&market, 2, books[0], 12.0, 20);

    buy(&market, 0, customer, &[(books[1], 4), (books[2], 4)], OrderStatus::Shipped);
    buy(&market, 0, customer, &[(books[0], 6)], OrderStatus::Shipped);

    let ranked = market.best_sellers_with_stock(0, "SCIENCE-FICTION", 2).unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].book.id, books[0]);
    assert_eq!(ranked[0].quantity, 6);
    // Tie at 4: lower id first, and the third book falls off.
    assert_eq!(ranked[1].book.id, books[1]);

    let partitions: Vec<u64> = ranked[0].stocks.iter().map(|s| s.partition_id).collect();
    assert_eq!(partitions, vec![1, 0, 2]);
    assert_eq!(ranked[1].stocks.len(), 1);

    let costs = market.costs_for_book(books[0]).unwrap();
    assert_eq!(costs, vec![(0, 10.0), (1, 7.5), (2, 12.0)]);
}

// ============================================================================
// Test 3: Related books rank co-purchases by quantity and pad with the target
// ============================================================================

#[test]
fn related_books_rank_co_purchases() {
    let market = market(1);
    let books = add_books(&market, "ARTS", 4);
    let (target, x, y, unrelated) = (books[0], books[1], books[2], books[3]);
    let a = add_customer(&market, "A St", 0.0);
    let b = add_customer(&market, "B St", 0.0);
    let c = add_customer(&market, "C St", 0.0);
    for book in &books {
        set_stock(&market, 0, *book, 2.0, 500);
    }

    buy(&market, 0, a, &[(target, 1)], OrderStatus::Pending);
    buy(&market, 0, a, &[(x, 3)], OrderStatus::Pending);
    buy(&market, 0, b, &[(target, 1), (x, 2), (y, 1)], OrderStatus::Pending);
    buy(&market, 0, c, &[(unrelated, 40)], OrderStatus::Pending);

    let book = market.update_related_books(0, target).unwrap();
    assert_eq!(book.related, [x, y, target, target, target]);

    let resolved: Vec<u64> = market
        .catalog()
        .related_books(target)
        .unwrap()
        .iter()
        .map(|book| book.id)
        .collect();
    assert_eq!(resolved, vec![x, y, target, target, target]);
}

#[test]
fn related_books_without_buyers_point_at_self() {
    let market = market(1);
    let books = add_books(&market, "ARTS", 2);
    let book = market.update_related_books(0, books[1]).unwrap();
    assert_eq!(book.related, [books[1]; 5]);

    assert!(market.update_related_books(0, 77).unwrap_err().is_not_found());
}

// ============================================================================
// Test 4: UpdateBook reprices, refreshes media and recomputes related books
// ============================================================================

#[test]
fn update_book_command() {
    let market = market(2);
    let books = add_books(&market, "POLITICS", 2);
    let customer = add_customer(&market, "3 Admin Rd", 0.0);
    set_stock(&market, 1, books[0], 5.0, 100);
    set_stock(&market, 1, books[1], 5.0, 100);
    buy(&market, 1, customer, &[(books[0], 1), (books[1], 2)], OrderStatus::Shipped);

    let book = market
        .execute_at(
            Command::UpdateBook(UpdateBook {
                partition_id: 1,
                book_id: books[0],
                cost: 6.25,
                image: "new.gif".into(),
                thumbnail: "new_thumb.gif".into(),
                pub_date: date(2020, 2, 2),
            }),
            now(),
        )
        .unwrap()
        .into_book()
        .unwrap();

    assert_eq!(book.image, "new.gif");
    assert_eq!(book.pub_date, date(2020, 2, 2));
    assert_eq!(book.related[0], books[1]);
    assert_eq!(market.stock(1, books[0]).unwrap().cost, 6.25);
    assert!(market.stock(0, books[0]).unwrap_err().is_not_found());
}

#[test]
fn update_book_creates_stock_lazily() {
    let market = market(1);
    let books = add_books(&market, "POLITICS", 1);

    market
        .execute_at(
            Command::UpdateBook(UpdateBook {
                partition_id: 0,
                book_id: books[0],
                cost: 3.0,
                image: "i.gif".into(),
                thumbnail: "t.gif".into(),
                pub_date: date(2019, 1, 1),
            }),
            now(),
        )
        .unwrap();

    let stock = market.stock(0, books[0]).unwrap();
    assert_eq!(stock.cost, 3.0);
    assert!((10..=30).contains(&stock.quantity));
}
