//! subpiece-bridge: the request/response boundary for subpiece.
//!
//! Exposes the three logical calls a generic method-call transport
//! dispatches into this subsystem — `loadModel`, `tokenize`,
//! `detokenize` — over a process-wide [`ModelRegistry`](subpiece::ModelRegistry),
//! plus the serde wire types for the response envelope. Transport concerns
//! (carrying the calls, sourcing model bytes) stay outside this crate;
//! model bytes arrive as in-memory buffers.

pub mod handlers;
pub mod types;

pub use handlers::{clear_models, detokenize, load_model, registry, tokenize, unload_model};
pub use types::{BridgeError, ErrorCode, MethodResponse};
