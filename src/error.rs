use thiserror::Error;

/// Errors that can occur in relgae.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested model name has no registered constructor.
    #[error("{requested} is not implemented. Choose a model in the list: [{}]", .available.join(", "))]
    UnknownModel {
        /// The name that was requested.
        requested: String,
        /// Every name the registry knows about.
        available: Vec<String>,
    },

    /// A batch or configuration value violates a construction contract.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Tensor-library failure, propagated unmodified.
    #[error(transparent)]
    Tensor(#[from] candle_core::Error),
}

/// Result type alias for relgae.
pub type Result<T> = std::result::Result<T, Error>;
