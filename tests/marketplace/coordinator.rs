//! Dispatch, cart safeguards, population, checkpoints and recommendations.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use bookmarket::{
    populate_catalog, CartUpdate, CatalogScale, Command, CommandOutput, CountingCheckpoint,
    LineUpdate, MarketConfig, MarketError, Marketplace, PopularityRecommender, Target,
};

use crate::support::{add_books, add_customer, fill_cart, market, now, set_stock};

fn cart_update(partition_id: u64, cart_id: Option<u64>, lines: Vec<LineUpdate>) -> Command {
    Command::CartUpdate(CartUpdate {
        partition_id,
        cart_id,
        add_book: None,
        lines,
    })
}

// ============================================================================
// Test 1: Routing
// ============================================================================

#[test]
fn routed_command_to_unknown_partition_is_not_found() {
    let market = market(2);
    let err = market
        .execute_at(Command::CreateCart { partition_id: 2 }, now())
        .unwrap_err();
    assert!(matches!(err, MarketError::NotFound { kind: "partition", .. }));
}

#[test]
fn create_cart_assigns_ids_per_partition() {
    let market = market(2);
    let ids: Vec<u64> = [0, 1, 0]
        .into_iter()
        .map(|partition_id| {
            market
                .execute_at(Command::CreateCart { partition_id }, now())
                .unwrap()
                .into_cart()
                .unwrap()
                .id
        })
        .collect();
    assert_eq!(ids, vec![0, 0, 1]);
}

#[test]
fn command_targets() {
    assert_eq!(
        Command::CreateCart { partition_id: 4 }.target(),
        Target::Partition(4)
    );
    assert_eq!(
        Command::Populate {
            orders_per_partition: 1
        }
        .target(),
        Target::AllPartitions
    );
    assert_eq!(
        Command::RefreshSession { customer_id: 0 }.target(),
        Target::Catalog
    );
}

// ============================================================================
// Test 2: An emptied cart receives a placeholder book
// ============================================================================

#[test]
fn emptied_cart_gets_placeholder_book() {
    let market = market(1);
    let books = add_books(&market, "HOME", 3);
    for book in &books {
        set_stock(&market, 0, *book, 1.0, 50);
    }

    let cart = fill_cart(&market, 0, &[(books[0], 2)]);
    let emptied = market
        .execute_at(
            cart_update(
                0,
                Some(cart.id),
                vec![LineUpdate {
                    book_id: books[0],
                    quantity: 0,
                }],
            ),
            now(),
        )
        .unwrap()
        .into_cart()
        .unwrap();

    assert_eq!(emptied.id, cart.id);
    assert_eq!(emptied.len(), 1);
    assert_eq!(emptied.total_quantity().unwrap(), 1);
    let line = emptied.lines().next().unwrap();
    assert!(books.contains(&line.book_id));
}

#[test]
fn empty_update_on_unstocked_partition_fails_cleanly() {
    let market = market(1);
    let err = market
        .execute_at(cart_update(0, None, Vec::new()), now())
        .unwrap_err();
    assert!(matches!(err, MarketError::StateInconsistency(_)));
    assert!(market.cart(0, 0).unwrap_err().is_not_found());
}

#[test]
fn failed_cart_update_keeps_previous_lines() {
    let market = market(1);
    let books = add_books(&market, "HOME", 2);
    set_stock(&market, 0, books[0], 1.0, 50);

    let cart = fill_cart(&market, 0, &[(books[0], 2)]);
    let err = market
        .execute_at(
            cart_update(
                0,
                Some(cart.id),
                vec![
                    LineUpdate {
                        book_id: books[0],
                        quantity: 9,
                    },
                    LineUpdate {
                        book_id: books[1],
                        quantity: 1,
                    },
                ],
            ),
            now(),
        )
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(market.cart(0, cart.id).unwrap().line(books[0]).unwrap().quantity, 2);
}

// ============================================================================
// Test 3: Population broadcasts to every partition
// ============================================================================

#[test]
fn populate_stocks_every_partition_and_replays_orders() {
    let market = market(3);
    let mut rng = StdRng::seed_from_u64(7);
    populate_catalog(
        market.catalog(),
        &mut rng,
        CatalogScale {
            countries: 2,
            authors: 3,
            books: 12,
            customers: 5,
        },
    )
    .unwrap();

    let output = market
        .execute_at(
            Command::Populate {
                orders_per_partition: 4,
            },
            now(),
        )
        .unwrap();
    assert!(matches!(
        output,
        CommandOutput::Populated {
            partitions: 3,
            orders: 12
        }
    ));

    for partition in market.partitions() {
        assert_eq!(partition.order_count().unwrap(), 4);
        partition
            .with_state(|state| {
                assert_eq!(state.inventory.len(), 12);
                Ok(())
            })
            .unwrap();
    }

    for book_id in 0..12 {
        let srp = market.catalog().require_book(book_id).unwrap().srp;
        for (_, cost) in market.costs_for_book(book_id).unwrap() {
            assert!(cost >= (srp * 0.5 * 100.0).floor() / 100.0);
            assert!(cost <= srp);
        }
    }
}

#[test]
fn populate_without_customers_only_stocks() {
    let market = market(2);
    add_books(&market, "YOUTH", 3);

    let output = market
        .execute_at(
            Command::Populate {
                orders_per_partition: 10,
            },
            now(),
        )
        .unwrap();
    assert!(matches!(output, CommandOutput::Populated { orders: 0, .. }));
    assert_eq!(market.stocks_for_book(2).unwrap().len(), 2);
}

#[test]
fn populate_touches_nothing_when_a_partition_is_poisoned() {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    let market = market(2);
    add_books(&market, "GARDEN", 3);
    add_customer(&market, "4 Seed St", 0.0);

    let poisoned = catch_unwind(AssertUnwindSafe(|| {
        let _state = market.partition(1).unwrap().lock().unwrap();
        panic!("poison partition 1");
    }));
    assert!(poisoned.is_err());

    let err = market
        .execute_at(
            Command::Populate {
                orders_per_partition: 2,
            },
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, MarketError::LockPoisoned(_)));

    let first = market.partition(0).unwrap();
    assert_eq!(first.order_count().unwrap(), 0);
    assert!(market.stock(0, 0).unwrap_err().is_not_found());
}

// ============================================================================
// Test 4: Checkpoint hook runs after every executed command
// ============================================================================

#[test]
fn checkpoint_called_per_successful_command() {
    let checkpoint = Arc::new(CountingCheckpoint::new());
    let market = Marketplace::new(MarketConfig::default())
        .unwrap()
        .checkpoint(Arc::clone(&checkpoint));

    market
        .execute_at(Command::CreateCart { partition_id: 0 }, now())
        .unwrap();
    add_customer(&market, "1 Hook St", 0.0);
    market
        .execute_at(Command::CreateCart { partition_id: 9 }, now())
        .unwrap_err();

    assert_eq!(checkpoint.calls(), 2);
}

// ============================================================================
// Test 5: Evaluations feed the recommender
// ============================================================================

#[test]
fn evaluations_drive_recommendations() {
    let market = market(1).recommender(PopularityRecommender::default());
    let books = add_books(&market, "REFERENCE", 3);
    let reader = add_customer(&market, "1 Read St", 0.0);
    let critic = add_customer(&market, "2 Read St", 0.0);

    for (customer_id, book_id, rating) in [
        (critic, books[0], 2.0),
        (critic, books[1], 5.0),
        (critic, books[2], 4.0),
        (reader, books[1], 3.0),
    ] {
        market
            .execute_at(
                Command::AddEvaluation {
                    customer_id,
                    book_id,
                    rating,
                },
                now(),
            )
            .unwrap();
    }

    assert_eq!(market.evaluations().unwrap().len(), 4);
    assert_eq!(market.recommend(reader, 10).unwrap(), vec![books[2], books[0]]);
    assert!(market.recommend(critic, 10).unwrap().is_empty());
    assert!(market.recommend(99, 1).unwrap_err().is_not_found());
}

#[test]
fn out_of_range_rating_rejected() {
    let market = market(1);
    let books = add_books(&market, "REFERENCE", 1);
    let reader = add_customer(&market, "3 Read St", 0.0);

    let err = market
        .execute_at(
            Command::AddEvaluation {
                customer_id: reader,
                book_id: books[0],
                rating: 5.5,
            },
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidArgument(_)));
    assert!(market.evaluations().unwrap().is_empty());
}

// ============================================================================
// Test 6: Configuration and JSON commands
// ============================================================================

#[test]
fn config_and_commands_from_json() {
    let config = MarketConfig::from_json(r#"{ "partitions": 2, "seed": 3 }"#).unwrap();
    let market = Marketplace::new(config).unwrap();
    assert_eq!(market.partitions().len(), 2);

    let command: Command =
        serde_json::from_str(r#"{ "command": "create_cart", "partition_id": 1 }"#).unwrap();
    let cart = market.execute_at(command, now()).unwrap().into_cart().unwrap();
    assert_eq!(cart.id, 0);
    assert!(cart.is_empty());

    assert!(MarketConfig::from_json(r#"{ "partitions": 0 }"#).is_err());
}

// ============================================================================
// Test 7: Listeners hear about confirmed orders
// ============================================================================

#[cfg(feature = "emitter")]
#[test]
fn order_confirmed_event_reaches_listener() {
    use std::sync::mpsc::channel;
    use std::sync::Mutex;
    use std::time::Duration;

    use bookmarket::events::{OrderConfirmed, ORDER_CONFIRMED};
    use bookmarket::OrderStatus;

    let market = market(1);
    let books = add_books(&market, "MYSTERY", 1);
    let customer = add_customer(&market, "1 Event St", 0.0);
    set_stock(&market, 0, books[0], 10.0, 50);

    let (tx, rx) = channel();
    let tx = Mutex::new(tx);
    market
        .on(ORDER_CONFIRMED, move |event: OrderConfirmed| {
            let _ = tx.lock().unwrap().send(event);
        })
        .unwrap();

    let order = crate::support::buy(&market, 0, customer, &[(books[0], 2)], OrderStatus::Pending);

    let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(event.order_id, order.id);
    assert_eq!(event.customer_id, customer);
    assert_eq!(event.total, order.total);
}
