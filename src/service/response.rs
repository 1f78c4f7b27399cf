//! Framework-agnostic response for the decrement operation.
//!
//! Bridges `BalanceService` outcomes to whatever transport serves them. The
//! axum router in this crate uses it; other servers can too.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::DecrementError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// `{"success": true}` or `{"error": "<message>"}`.
    pub body: serde_json::Value,
}

impl BalanceResponse {
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: json!({ "success": true }),
        }
    }

    /// Malformed request body.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn from_error(err: DecrementError) -> Self {
        Self {
            status: err.status_code(),
            body: json!({ "error": err.to_string() }),
        }
    }
}

impl From<DecrementError> for BalanceResponse {
    fn from(err: DecrementError) -> Self {
        Self::from_error(err)
    }
}

impl<T> From<Result<T, DecrementError>> for BalanceResponse {
    fn from(result: Result<T, DecrementError>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(err) => Self::from_error(err),
        }
    }
}
