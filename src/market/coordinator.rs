//! The marketplace coordinator: routes commands to partitions and offers
//! the cross-partition queries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{Duration, Utc};
use rand::Rng;
use tracing::{debug, info};

use super::command::{CartUpdate, Command, CommandOutput, UpdateBook};
use super::random::MarketRandom;
use crate::analytics::{self, BestSeller};
use crate::catalog::{Book, EntityCatalog};
use crate::checkpoint::{Checkpoint, NoopCheckpoint};
use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
#[cfg(feature = "emitter")]
use crate::events::{
    BookUpdated, CustomerCreated, MarketEvents, OrderConfirmed, BOOK_UPDATED, CUSTOMER_CREATED,
    ORDER_CONFIRMED,
};
use crate::ids::{BookId, CartId, CustomerId, OrderId, PartitionId, Timestamp};
use crate::partition::{
    self, Cart, CardDetails, CheckoutContext, ConfirmBuy, InventoryLedger, Order, Partition,
    PartitionState, Stock,
};
use crate::recommender::{Evaluation, PopularityRecommender, Recommender};

const POPULATE_MAX_LINES: i64 = 5;
const POPULATE_MAX_QTY: i64 = 10;

/// Shared entry point for every marketplace operation.
///
/// `Marketplace` is `Send + Sync`; wrap it in an `Arc` and call
/// [`Marketplace::execute`] from as many threads as needed.
///
/// Lock order is partition (several only in ascending id order), then the
/// random source, then catalog tables.
/// Catalog locks never outlive a single `EntityCatalog` call, and nothing
/// acquires a partition lock while holding one of the others.
pub struct Marketplace {
    config: MarketConfig,
    catalog: Arc<EntityCatalog>,
    partitions: Vec<Partition>,
    random: Mutex<MarketRandom>,
    evaluations: RwLock<Vec<Evaluation>>,
    recommender: Box<dyn Recommender>,
    checkpoint: Box<dyn Checkpoint>,
    #[cfg(feature = "emitter")]
    events: MarketEvents,
}

impl Marketplace {
    /// Build a marketplace with a fresh catalog.
    pub fn new(config: MarketConfig) -> Result<Self> {
        let catalog = Arc::new(EntityCatalog::new(config.session_ttl()));
        Self::with_catalog(config, catalog)
    }

    /// Build a marketplace around an existing catalog.
    pub fn with_catalog(config: MarketConfig, catalog: Arc<EntityCatalog>) -> Result<Self> {
        config.validate()?;
        let partitions = (0..config.partitions as PartitionId)
            .map(|id| Partition::new(id, None, config.restock))
            .collect();
        let recommender = PopularityRecommender::new(config.recommender.clone());
        Ok(Self {
            random: Mutex::new(MarketRandom::seeded(config.seed)),
            config,
            catalog,
            partitions,
            evaluations: RwLock::new(Vec::new()),
            recommender: Box::new(recommender),
            checkpoint: Box::new(NoopCheckpoint),
            #[cfg(feature = "emitter")]
            events: MarketEvents::new(),
        })
    }

    /// Replace the recommender. Builder style, returns `self`.
    pub fn recommender<R: Recommender + 'static>(mut self, recommender: R) -> Self {
        self.recommender = Box::new(recommender);
        self
    }

    /// Replace the checkpoint hook. Builder style, returns `self`.
    pub fn checkpoint<C: Checkpoint + 'static>(mut self, checkpoint: C) -> Self {
        self.checkpoint = Box::new(checkpoint);
        self
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<EntityCatalog> {
        &self.catalog
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn partition(&self, id: PartitionId) -> Result<&Partition> {
        self.partitions
            .iter()
            .find(|partition| partition.id() == id)
            .ok_or_else(|| MarketError::not_found("partition", id))
    }

    fn random(&self) -> Result<MutexGuard<'_, MarketRandom>> {
        self.random
            .lock()
            .map_err(|_| MarketError::LockPoisoned("random source"))
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    pub fn execute(&self, command: Command) -> Result<CommandOutput> {
        self.execute_at(command, Utc::now())
    }

    /// Execute a command with an explicit clock reading.
    pub fn execute_at(&self, command: Command, now: Timestamp) -> Result<CommandOutput> {
        let target = command.target();
        let name = command.name();
        debug!(command = name, ?target, "dispatching command");

        let output = match command {
            Command::CreateCustomer { customer } => {
                CommandOutput::Customer(self.catalog.create_customer(customer, now)?)
            }
            Command::RefreshSession { customer_id } => {
                CommandOutput::Customer(self.catalog.refresh_session(customer_id, now)?)
            }
            Command::AddEvaluation {
                customer_id,
                book_id,
                rating,
            } => CommandOutput::Evaluation(self.add_evaluation(customer_id, book_id, rating)?),
            Command::CreateCart { partition_id } => {
                let partition = self.partition(partition_id)?;
                let cart = partition.with_state(|state| Ok(state.carts.create_cart(now).clone()))?;
                CommandOutput::Cart(cart)
            }
            Command::CartUpdate(update) => CommandOutput::Cart(self.do_cart(&update, now)?),
            Command::ConfirmBuy(request) => CommandOutput::Order(self.confirm_buy(&request, now)?),
            Command::UpdateBook(update) => CommandOutput::Book(self.update_book(&update)?),
            Command::Populate {
                orders_per_partition,
            } => {
                let orders = self.populate(orders_per_partition, now)?;
                CommandOutput::Populated {
                    partitions: self.partitions.len(),
                    orders,
                }
            }
        };

        self.checkpoint.checkpoint(target.partition_id());
        #[cfg(feature = "emitter")]
        if let Err(error) = self.notify(name, target, &output) {
            tracing::warn!(command = name, %error, "event notification failed");
        }
        Ok(output)
    }

    /// Listen for one kind of post-command event (see [`crate::events`]).
    #[cfg(feature = "emitter")]
    pub fn on<T, F>(&self, event: &str, listener: F) -> Result<String>
    where
        for<'de> T: serde::Deserialize<'de>,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.events.on(event, listener)
    }

    #[cfg(feature = "emitter")]
    pub fn remove_listener(&self, listener_id: &str) -> Result<bool> {
        self.events.remove(listener_id)
    }

    #[cfg(feature = "emitter")]
    fn notify(&self, name: &str, target: super::Target, output: &CommandOutput) -> Result<()> {
        match output {
            CommandOutput::Customer(customer) if name == "create_customer" => {
                self.events.emit(
                    CUSTOMER_CREATED,
                    CustomerCreated {
                        customer_id: customer.id,
                        username: customer.username.clone(),
                    },
                )
            }
            CommandOutput::Order(order) => self.events.emit(
                ORDER_CONFIRMED,
                OrderConfirmed {
                    partition_id: order.partition_id,
                    order_id: order.id,
                    customer_id: order.customer_id,
                    total: order.total,
                },
            ),
            CommandOutput::Book(book) => {
                let Some(partition_id) = target.partition_id() else {
                    return Ok(());
                };
                let cost = self.stock(partition_id, book.id)?.cost;
                self.events.emit(
                    BOOK_UPDATED,
                    BookUpdated {
                        partition_id,
                        book_id: book.id,
                        cost,
                    },
                )
            }
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Partition commands
    // ------------------------------------------------------------------

    /// Apply a cart update as one unit: the cart is edited as a copy and
    /// written back only if every step succeeds. A cart left empty receives
    /// one unit of a random book stocked in the partition.
    fn do_cart(&self, update: &CartUpdate, now: Timestamp) -> Result<Cart> {
        let partition = self.partition(update.partition_id)?;
        partition.with_state(|state| {
            let mut cart = match update.cart_id {
                Some(id) => state.carts.cart(id)?.clone(),
                None => Cart::new(state.carts.next_id(), now),
            };

            if let Some(book_id) = update.add_book {
                cart.increase_line(state.inventory.stock(book_id)?, 1)?;
            }
            for line in &update.lines {
                cart.change_line(state.inventory.stock(line.book_id)?, line.quantity)?;
            }
            if cart.is_empty() {
                let book_id = self.random_stocked_book(&state.inventory)?;
                debug!(
                    partition_id = partition.id(),
                    cart_id = cart.id,
                    book_id,
                    "cart emptied, adding placeholder book"
                );
                cart.increase_line(state.inventory.stock(book_id)?, 1)?;
            }

            cart.time = now;
            state.carts.store(cart.clone())?;
            Ok(cart)
        })
    }

    fn random_stocked_book(&self, inventory: &InventoryLedger) -> Result<BookId> {
        let stocked: Vec<BookId> = inventory.book_ids().collect();
        self.random()?
            .pick(&stocked)
            .copied()
            .ok_or_else(|| MarketError::StateInconsistency("partition stocks no books".into()))
    }

    fn confirm_buy(&self, request: &ConfirmBuy, now: Timestamp) -> Result<Arc<Order>> {
        let partition = self.partition(request.partition_id)?;
        let ctx = {
            let mut random = self.random()?;
            CheckoutContext {
                now,
                ship_date: now + random.ship_delay(),
                comment: random.comment(),
            }
        };
        partition.with_state(|state| {
            partition::confirm_buy(state, &self.catalog, partition.id(), request, ctx)
        })
    }

    fn update_book(&self, update: &UpdateBook) -> Result<Book> {
        let partition = self.partition(update.partition_id)?;
        self.catalog.require_book(update.book_id)?;

        partition.with_state(|state| {
            let mut random = self.random()?;
            state
                .inventory
                .update_stock(update.book_id, update.cost, random.rng())?;
            Ok(())
        })?;
        self.catalog.update_book_media(
            update.book_id,
            update.image.clone(),
            update.thumbnail.clone(),
            update.pub_date,
        )?;
        self.update_related_books(update.partition_id, update.book_id)
    }

    // ------------------------------------------------------------------
    // Population
    // ------------------------------------------------------------------

    /// Catalog rows are read and every partition lock is taken, in id
    /// order, before the first partition is stocked.
    fn populate(&self, orders: usize, now: Timestamp) -> Result<usize> {
        let books: Vec<Book> = (0..self.catalog.book_count()? as BookId)
            .filter_map(|id| self.catalog.book(id).transpose())
            .collect::<Result<_>>()?;
        let customers = self.catalog.customer_count()? as i64;

        let mut guards = self
            .partitions
            .iter()
            .map(Partition::lock)
            .collect::<Result<Vec<_>>>()?;
        let mut placed = 0;
        for (partition, state) in self.partitions.iter().zip(guards.iter_mut()) {
            placed += self.populate_partition(partition.id(), state, &books, customers, orders, now)?;
        }
        Ok(placed)
    }

    fn populate_partition(
        &self,
        partition_id: PartitionId,
        state: &mut PartitionState,
        books: &[Book],
        customers: i64,
        orders: usize,
        now: Timestamp,
    ) -> Result<usize> {
        let mut random = self.random()?;
        for book in books {
            let factor = random.rng().gen_range(0.5..=1.0_f64);
            let cost = (book.srp * factor * 100.0).round() / 100.0;
            state.inventory.update_stock(book.id, cost, random.rng())?;
        }

        if books.is_empty() || customers == 0 {
            return Ok(0);
        }

        let mut placed = 0;
        for _ in 0..orders {
            let customer_id = random.int(0, customers - 1) as CustomerId;
            let mut cart = state.carts.create_cart(now).clone();
            for _ in 0..random.int(1, POPULATE_MAX_LINES) {
                let book = &books[random.int(0, books.len() as i64 - 1) as usize];
                let qty = random.int(1, POPULATE_MAX_QTY);
                cart.change_line(state.inventory.stock(book.id)?, qty)?;
            }
            state.carts.store(cart.clone())?;

            let request = ConfirmBuy {
                partition_id,
                customer_id,
                cart_id: cart.id,
                card: CardDetails {
                    card_type: random.card_type(),
                    number: (0..4).map(|_| random.int(1000, 9999) as u32).collect(),
                    name: random.string(10, 20),
                    expiry: (now + Duration::days(random.int(10, 730))).date_naive(),
                    auth_id: random.string(15, 15),
                },
                ship_type: random.ship_type(),
                shipping_address_id: None,
                status: random.status(),
            };
            let ctx = CheckoutContext {
                now,
                ship_date: now + random.ship_delay(),
                comment: random.comment(),
            };
            partition::confirm_buy(state, &self.catalog, partition_id, &request, ctx)?;
            placed += 1;
        }

        info!(
            partition_id,
            books = books.len(),
            orders = placed,
            "partition populated"
        );
        Ok(placed)
    }

    // ------------------------------------------------------------------
    // Evaluations and recommendations
    // ------------------------------------------------------------------

    fn add_evaluation(&self, customer_id: CustomerId, book_id: BookId, rating: f64) -> Result<Evaluation> {
        if self.catalog.customer(customer_id)?.is_none() {
            return Err(MarketError::not_found("customer", customer_id));
        }
        self.catalog.require_book(book_id)?;

        let mut evaluations = self
            .evaluations
            .write()
            .map_err(|_| MarketError::LockPoisoned("evaluation write"))?;
        let evaluation = Evaluation::new(evaluations.len() as u64, customer_id, book_id, rating)?;
        evaluations.push(evaluation.clone());
        self.recommender.refresh(&evaluations)?;
        Ok(evaluation)
    }

    pub fn evaluations(&self) -> Result<Vec<Evaluation>> {
        let evaluations = self
            .evaluations
            .read()
            .map_err(|_| MarketError::LockPoisoned("evaluation read"))?;
        Ok(evaluations.clone())
    }

    pub fn recommend(&self, customer_id: CustomerId, count: usize) -> Result<Vec<BookId>> {
        if self.catalog.customer(customer_id)?.is_none() {
            return Err(MarketError::not_found("customer", customer_id));
        }
        self.recommender.recommend(customer_id, count)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn cart(&self, partition_id: PartitionId, cart_id: CartId) -> Result<Cart> {
        self.partition(partition_id)?
            .with_state(|state| Ok(state.carts.cart(cart_id)?.clone()))
    }

    pub fn stock(&self, partition_id: PartitionId, book_id: BookId) -> Result<Stock> {
        self.partition(partition_id)?
            .with_state(|state| Ok(state.inventory.stock(book_id)?.clone()))
    }

    pub fn order(&self, partition_id: PartitionId, order_id: OrderId) -> Result<Arc<Order>> {
        self.partition(partition_id)?.order(order_id)
    }

    pub fn recent_orders(&self, partition_id: PartitionId, limit: usize) -> Result<Vec<Arc<Order>>> {
        self.partition(partition_id)?.recent_orders(limit)
    }

    /// Every partition's stock record for a book, in partition order.
    pub fn stocks_for_book(&self, book_id: BookId) -> Result<Vec<Stock>> {
        let mut stocks = Vec::new();
        for partition in &self.partitions {
            let stock = partition.with_state(|state| Ok(state.inventory.stock(book_id).ok().cloned()))?;
            stocks.extend(stock);
        }
        Ok(stocks)
    }

    /// Cost of a book in every partition that stocks it.
    pub fn costs_for_book(&self, book_id: BookId) -> Result<Vec<(PartitionId, f64)>> {
        Ok(self
            .stocks_for_book(book_id)?
            .into_iter()
            .map(|stock| (stock.partition_id, stock.cost))
            .collect())
    }

    /// Shipped quantity per book of `subject` in one partition.
    pub fn best_sellers(&self, partition_id: PartitionId, subject: &str) -> Result<HashMap<BookId, i64>> {
        let snapshot = self.partition(partition_id)?.recent_orders(usize::MAX)?;
        let subjects = self.catalog.subjects()?;
        analytics::best_sellers(&snapshot, &subjects, subject)
    }

    /// Top `top_n` best-sellers of a partition, each with every
    /// partition's stock for the book sorted by cost.
    pub fn best_sellers_with_stock(
        &self,
        partition_id: PartitionId,
        subject: &str,
        top_n: usize,
    ) -> Result<Vec<BestSeller>> {
        let totals = self.best_sellers(partition_id, subject)?;
        let mut ranked = Vec::new();
        for (book_id, quantity) in analytics::rank(&totals, top_n) {
            let book = self.catalog.require_book(book_id)?;
            let mut stocks = self.stocks_for_book(book_id)?;
            analytics::sort_by_cost(&mut stocks);
            ranked.push(BestSeller {
                book,
                quantity,
                stocks,
            });
        }
        Ok(ranked)
    }

    /// [`Marketplace::best_sellers_with_stock`] with the configured count.
    pub fn top_sellers(&self, partition_id: PartitionId, subject: &str) -> Result<Vec<BestSeller>> {
        self.best_sellers_with_stock(partition_id, subject, self.config.best_seller_count)
    }

    /// Recompute a book's related books from one partition's recent orders
    /// and store them in the catalog.
    pub fn update_related_books(&self, partition_id: PartitionId, book_id: BookId) -> Result<Book> {
        self.catalog.require_book(book_id)?;
        let snapshot = self
            .partition(partition_id)?
            .recent_orders(self.config.related_window)?;
        let related = analytics::related_books(&snapshot, book_id, self.config.related_window);
        debug!(partition_id, book_id, ?related, "related books updated");
        self.catalog.set_related_books(book_id, related)
    }
}
