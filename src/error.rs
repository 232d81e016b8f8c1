//! Error types for the rewards engine.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, RewardsError>;

/// Errors that can occur during engine operation.
///
/// The first six variants are the domain error kinds surfaced by the
/// core API; the remaining ones belong to the CSV batch front-end.
/// A failing operation leaves every touched entity unchanged.
#[derive(Error, Debug)]
pub enum RewardsError {
    /// Malformed input: blank fields, non-positive amounts, bad email format.
    /// Rejected before any mutation.
    #[error("invalid input: {message}")]
    Invalid { message: String },

    /// Referenced account, product, or redemption does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Uniqueness violation (duplicate employee id or email)
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Operation not legal in the entity's current state
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Account balance too low for the requested spend
    #[error("insufficient points: available {available}, required {required}")]
    InsufficientPoints { available: i64, required: i64 },

    /// Product has no stock left to reserve
    #[error("product {product} is out of stock")]
    OutOfStock { product: String },

    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: rewards-engine <operations.csv>")]
    MissingArgument,
}

impl RewardsError {
    /// Shorthand for [`RewardsError::Invalid`] with the given message.
    pub fn invalid(message: impl Into<String>) -> Self {
        RewardsError::Invalid {
            message: message.into(),
        }
    }

    /// Shorthand for [`RewardsError::NotFound`] for the given entity.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        RewardsError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for [`RewardsError::Conflict`] with the given message.
    pub fn conflict(message: impl Into<String>) -> Self {
        RewardsError::Conflict {
            message: message.into(),
        }
    }

    /// Shorthand for [`RewardsError::InvalidState`] with the given message.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        RewardsError::InvalidState {
            message: message.into(),
        }
    }
}
