//! Boundary call handlers over the process-wide model registry.
//!
//! Models are expensive to load and naturally singleton-per-process, so
//! the registry lives in a process-global: empty at start, populated by
//! [`load_model`], clearable by [`unload_model`]/[`clear_models`], and
//! discarded at process teardown. Core errors are mapped to the wire
//! codes here; messages pass through verbatim.

use std::sync::LazyLock;

use tracing::warn;

use subpiece::ModelRegistry;

use crate::types::{BridgeError, ErrorCode};

static REGISTRY: LazyLock<ModelRegistry> = LazyLock::new(ModelRegistry::new);

/// The process-wide registry backing the boundary calls.
///
/// Exposed for hosts that need direct access (diagnostics, teardown).
#[must_use]
pub fn registry() -> &'static ModelRegistry {
    &REGISTRY
}

/// `loadModel(modelId, modelBytes)`: parse and register a tokenizer
/// instance, replacing any prior instance under the same identifier.
///
/// # Errors
/// Returns a [`BridgeError`] with code `LOAD_ERROR` if the bytes are not a
/// well-formed model blob. A failed load leaves any previous instance for
/// the identifier untouched.
pub fn load_model(model_id: &str, model_bytes: &[u8]) -> Result<bool, BridgeError> {
    REGISTRY
        .load(model_id, model_bytes)
        .map(|()| true)
        .map_err(|e| fail(ErrorCode::LoadError, model_id, &e))
}

/// `tokenize(modelId, text)`: encode text into token ids with the model's
/// codec.
///
/// # Errors
/// Returns a [`BridgeError`] with code `TOKENIZE_ERROR` if the model is
/// not loaded or the input contains data the model's character model
/// cannot represent.
pub fn tokenize(model_id: &str, text: &str) -> Result<Vec<u32>, BridgeError> {
    REGISTRY
        .get(model_id)
        .and_then(|tok| tok.encode(text))
        .map_err(|e| fail(ErrorCode::TokenizeError, model_id, &e))
}

/// `detokenize(modelId, ids)`: decode token ids back into text.
///
/// # Errors
/// Returns a [`BridgeError`] with code `DETOKENIZE_ERROR` if the model is
/// not loaded or any id lies outside the vocabulary range. The whole call
/// aborts; no partial text is returned.
pub fn detokenize(model_id: &str, ids: &[u32]) -> Result<String, BridgeError> {
    REGISTRY
        .get(model_id)
        .and_then(|tok| tok.decode(ids))
        .map_err(|e| fail(ErrorCode::DetokenizeError, model_id, &e))
}

/// Remove one model from the registry. Returns whether it was loaded.
pub fn unload_model(model_id: &str) -> bool {
    REGISTRY.unload(model_id)
}

/// Remove every model from the registry.
pub fn clear_models() {
    REGISTRY.clear();
}

fn fail(code: ErrorCode, model_id: &str, err: &subpiece::Error) -> BridgeError {
    warn!(model_id, %code, error = %err, "bridge call failed");
    BridgeError {
        code,
        message: err.to_string(),
    }
}
