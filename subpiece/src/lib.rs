//! subpiece: subword tokenizer sessions
//!
//! This crate owns the lifecycle of independently loadable subword
//! tokenization models and the deterministic text ⇄ token-id round trip:
//!
//! - [`Vocab`] — immutable, dense-indexed piece collection parsed from a
//!   serialized model blob.
//! - [`SpmTokenizer`] — SentencePiece-style codec over one vocabulary
//!   (whitespace-marking normalization, score-maximising segmentation,
//!   byte/unknown fallback, strict decode).
//! - [`ModelRegistry`] — load-once, reuse-many registry keyed by an opaque
//!   model identifier; instances are immutable and swapped atomically so
//!   concurrent reload is safe.
//!
//! The request/response boundary (method-call surface and wire error
//! codes) lives in the `subpiece-bridge` crate.

pub mod error;
pub mod registry;
pub mod tokenizer;
pub mod vocab;

pub use error::{Error, Result};
pub use registry::ModelRegistry;
pub use tokenizer::SpmTokenizer;
pub use vocab::{Piece, PieceType, Vocab};
