//! Error types for subpiece

use thiserror::Error;

/// Result type alias using subpiece's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for subpiece operations
#[derive(Error, Debug)]
pub enum Error {
    /// The caller referenced a model identifier that was never loaded or has
    /// been unloaded. Recoverable: load the model first.
    #[error("model not loaded: {model_id}")]
    ModelNotLoaded { model_id: String },

    /// The supplied bytes could not be parsed into a valid tokenizer
    /// instance. Surfaced verbatim; never retried.
    #[error("malformed model {model_id}: {reason}")]
    ModelFormat { model_id: String, reason: String },

    /// Decode input referenced an id outside the vocabulary range. The whole
    /// decode call is aborted; no partial text is returned.
    #[error("token id {id} out of range for vocabulary of size {vocab_size}")]
    InvalidTokenId { id: u32, vocab_size: usize },

    /// Input text contains data the instance's character model cannot
    /// represent (e.g. a byte with no fallback piece).
    #[error("encoding error: {0}")]
    Encoding(String),
}
