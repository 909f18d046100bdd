//! Tokenizer codec
//!
//! Text ⇄ token-id conversion against an immutable [`Vocab`](crate::vocab::Vocab).

mod spm;

pub use spm::SpmTokenizer;
