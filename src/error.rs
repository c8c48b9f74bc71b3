use thiserror::Error;

/// Result alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers.
///
/// Numeric degeneracy (zero variance, empty label sets, zero probability mass)
/// is never an error; those cases fall back to floors and sentinels.
/// Shape mismatches between layers are contract violations and panic.
#[derive(Error, Debug)]
pub enum Error {
    /// Ingested data is not rectangular, has unparsable cells, or otherwise
    /// cannot be turned into a dataset.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No persisted model exists at the given path. Callers may treat this
    /// as "start from scratch".
    #[error("Model not found: {0}")]
    ModelNotFound(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ModelNotFound(_))
    }
}
