//! Marketplace configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration:
//!
//! ```ignore
//! use bookmarket::MarketConfig;
//!
//! let config = MarketConfig::from_json(r#"{ "partitions": 4, "seed": 42 }"#)?;
//! assert_eq!(config.restock.batch, 21);
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::partition::RestockPolicy;
use crate::recommender::RecommenderSettings;

pub const DEFAULT_RELATED_WINDOW: usize = 10_000;
pub const DEFAULT_BEST_SELLER_COUNT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Number of partitions; ids are assigned `0..partitions`.
    pub partitions: usize,
    /// Seed for the coordinator's random source.
    pub seed: u64,
    pub restock: RestockPolicy,
    /// How many of the most recent orders the related-books scan considers.
    pub related_window: usize,
    pub best_seller_count: usize,
    /// Lifetime of a customer login, in minutes.
    pub session_ttl_minutes: i64,
    pub recommender: RecommenderSettings,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            partitions: 1,
            seed: 0,
            restock: RestockPolicy::default(),
            related_window: DEFAULT_RELATED_WINDOW,
            best_seller_count: DEFAULT_BEST_SELLER_COUNT,
            session_ttl_minutes: 120,
            recommender: RecommenderSettings::default(),
        }
    }
}

impl MarketConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: MarketConfig = serde_json::from_str(json)
            .map_err(|e| MarketError::invalid(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.partitions == 0 {
            return Err(MarketError::invalid("at least one partition is required"));
        }
        if self.restock.batch <= 0 {
            return Err(MarketError::invalid("restock batch must be positive"));
        }
        if self.related_window == 0 {
            return Err(MarketError::invalid("related window must be positive"));
        }
        if self.session_ttl_minutes <= 0 {
            return Err(MarketError::invalid("session ttl must be positive"));
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::minutes(self.session_ttl_minutes)
    }
}
