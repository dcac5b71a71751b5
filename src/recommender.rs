//! Recommendation seam.
//!
//! The marketplace keeps the append-only evaluation log and hands it to a
//! [`Recommender`] after every new evaluation. How recommendations are
//! computed is up to the implementation; [`PopularityRecommender`] is the
//! built-in default and simply ranks books by mean rating.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::ids::{BookId, CustomerId, EvaluationId};

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    Pearson,
    Euclidean,
    Cosine,
    Tanimoto,
    LogLikelihood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderSettings {
    pub similarity: Similarity,
    pub neighborhood: usize,
    /// Minimum score for a book to be recommended.
    pub threshold: f64,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            similarity: Similarity::Pearson,
            neighborhood: 10,
            threshold: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub customer_id: CustomerId,
    pub book_id: BookId,
    pub rating: f64,
}

impl Evaluation {
    pub fn new(id: EvaluationId, customer_id: CustomerId, book_id: BookId, rating: f64) -> Result<Self> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(MarketError::invalid(format!(
                "rating {rating} outside [{MIN_RATING}, {MAX_RATING}]"
            )));
        }
        Ok(Self {
            id,
            customer_id,
            book_id,
            rating,
        })
    }
}

pub trait Recommender: Send + Sync {
    /// Rebuild whatever model the implementation keeps from the full log.
    fn refresh(&self, evaluations: &[Evaluation]) -> Result<()>;

    /// Up to `count` book ids for the customer, best first.
    fn recommend(&self, customer_id: CustomerId, count: usize) -> Result<Vec<BookId>>;
}

#[derive(Default)]
struct PopularityModel {
    ranking: Vec<(BookId, f64)>,
    rated: HashMap<CustomerId, HashSet<BookId>>,
}

/// Ranks books by mean rating and skips books the customer already rated.
pub struct PopularityRecommender {
    settings: RecommenderSettings,
    model: RwLock<PopularityModel>,
}

impl PopularityRecommender {
    pub fn new(settings: RecommenderSettings) -> Self {
        Self {
            settings,
            model: RwLock::new(PopularityModel::default()),
        }
    }

    pub fn settings(&self) -> &RecommenderSettings {
        &self.settings
    }
}

impl Default for PopularityRecommender {
    fn default() -> Self {
        Self::new(RecommenderSettings::default())
    }
}

impl Recommender for PopularityRecommender {
    fn refresh(&self, evaluations: &[Evaluation]) -> Result<()> {
        let mut sums: HashMap<BookId, (f64, u32)> = HashMap::new();
        let mut rated: HashMap<CustomerId, HashSet<BookId>> = HashMap::new();
        for evaluation in evaluations {
            let entry = sums.entry(evaluation.book_id).or_insert((0.0, 0));
            entry.0 += evaluation.rating;
            entry.1 += 1;
            rated
                .entry(evaluation.customer_id)
                .or_default()
                .insert(evaluation.book_id);
        }

        let mut ranking: Vec<(BookId, f64)> = sums
            .into_iter()
            .map(|(book_id, (sum, n))| (book_id, sum / f64::from(n)))
            .filter(|(_, mean)| *mean >= self.settings.threshold)
            .collect();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut model = self
            .model
            .write()
            .map_err(|_| MarketError::LockPoisoned("recommender write"))?;
        *model = PopularityModel { ranking, rated };
        Ok(())
    }

    fn recommend(&self, customer_id: CustomerId, count: usize) -> Result<Vec<BookId>> {
        let model = self
            .model
            .read()
            .map_err(|_| MarketError::LockPoisoned("recommender read"))?;
        let seen = model.rated.get(&customer_id);
        Ok(model
            .ranking
            .iter()
            .map(|(book_id, _)| *book_id)
            .filter(|book_id| seen.map_or(true, |seen| !seen.contains(book_id)))
            .take(count)
            .collect())
    }
}
