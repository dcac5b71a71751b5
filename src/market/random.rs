use chrono::Duration;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::partition::{CardType, OrderStatus, ShippingType};

pub const COMMENT_MIN_LEN: usize = 20;
pub const COMMENT_MAX_LEN: usize = 100;
pub const SHIP_DAYS_MIN: i64 = 1;
pub const SHIP_DAYS_MAX: i64 = 7;

/// Seeded source for the reproducible-but-arbitrary values the coordinator
/// needs: order comments, ship dates, placeholder books.
pub struct MarketRandom {
    rng: StdRng,
}

impl MarketRandom {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn string(&mut self, min: usize, max: usize) -> String {
        let len = self.rng.gen_range(min..=max);
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    pub fn comment(&mut self) -> String {
        self.string(COMMENT_MIN_LEN, COMMENT_MAX_LEN)
    }

    pub fn ship_delay(&mut self) -> Duration {
        Duration::days(self.rng.gen_range(SHIP_DAYS_MIN..=SHIP_DAYS_MAX))
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    pub fn status(&mut self) -> OrderStatus {
        *OrderStatus::ALL
            .choose(&mut self.rng)
            .unwrap_or(&OrderStatus::Pending)
    }

    pub fn ship_type(&mut self) -> ShippingType {
        *ShippingType::ALL
            .choose(&mut self.rng)
            .unwrap_or(&ShippingType::Mail)
    }

    pub fn card_type(&mut self) -> CardType {
        *CardType::ALL.choose(&mut self.rng).unwrap_or(&CardType::Visa)
    }

    pub fn int(&mut self, min: i64, max: i64) -> i64 {
        self.rng.gen_range(min..=max)
    }
}
