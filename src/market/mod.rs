//! The command surface: one [`Command`] enum, one [`Marketplace`] that
//! routes it, and a [`CommandWorker`] for feeding commands from a channel.

mod command;
mod coordinator;
mod random;
mod worker;

pub use command::{CartUpdate, Command, CommandOutput, LineUpdate, Target, UpdateBook};
pub use coordinator::Marketplace;
pub use random::{MarketRandom, COMMENT_MAX_LEN, COMMENT_MIN_LEN, SHIP_DAYS_MAX, SHIP_DAYS_MIN};
pub use worker::{CommandWorker, WorkerStats};
