use thiserror::Error;

/// Error type shared by every marketplace operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// A referenced customer, book, cart, order, address or partition does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    /// Null, negative or out-of-range input to a constructor or query.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The request is well-formed but the current state cannot honour it
    /// (e.g. confirming a cart that has already been cleared).
    #[error("state inconsistency: {0}")]
    StateInconsistency(String),
    #[error("lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

impl MarketError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        MarketError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        MarketError::InvalidArgument(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MarketError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
