//! Wire types for the method-call boundary
//!
//! Hand-rolled serde structs matching the envelope the transport ships
//! verbatim: a success payload or an `error{code,message}` object.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Error codes surfaced to the transport, one per boundary call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Any failure during `loadModel`, including malformed model bytes.
    LoadError,
    /// `tokenize` failure: model not loaded, or unencodable input.
    TokenizeError,
    /// `detokenize` failure: model not loaded, or an id outside the
    /// vocabulary range.
    DetokenizeError,
}

impl ErrorCode {
    /// The wire spelling of the code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadError => "LOAD_ERROR",
            Self::TokenizeError => "TOKENIZE_ERROR",
            Self::DetokenizeError => "DETOKENIZE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Bridge error
// ---------------------------------------------------------------------------

/// A boundary failure: wire code plus the underlying message, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{code}: {message}")]
pub struct BridgeError {
    pub code: ErrorCode,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Response envelope for one method call.
///
/// Serializes as `{"ok": <payload>}` on success and
/// `{"error": {"code": "...", "message": "..."}}` on failure.
#[derive(Debug, Serialize)]
pub enum MethodResponse<T> {
    #[serde(rename = "ok")]
    Ok(T),
    #[serde(rename = "error")]
    Err(BridgeError),
}

impl<T> From<Result<T, BridgeError>> for MethodResponse<T> {
    fn from(result: Result<T, BridgeError>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) => Self::Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::LoadError).unwrap(),
            "\"LOAD_ERROR\""
        );
        assert_eq!(ErrorCode::DetokenizeError.as_str(), "DETOKENIZE_ERROR");
    }

    #[test]
    fn test_ok_envelope() {
        let resp: MethodResponse<Vec<u32>> = Ok(vec![5, 12]).into();
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"ok":[5,12]}"#
        );
    }

    #[test]
    fn test_error_envelope() {
        let resp: MethodResponse<bool> = Err(BridgeError {
            code: ErrorCode::TokenizeError,
            message: "model not loaded: tl_en".to_string(),
        })
        .into();
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"error":{"code":"TOKENIZE_ERROR","message":"model not loaded: tl_en"}}"#
        );
    }

    #[test]
    fn test_bridge_error_display() {
        let err = BridgeError {
            code: ErrorCode::LoadError,
            message: "empty model data".to_string(),
        };
        assert_eq!(err.to_string(), "LOAD_ERROR: empty model data");
    }
}
