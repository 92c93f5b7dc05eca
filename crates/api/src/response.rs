//! Structured handler responses
//!
//! Every handler completes its response cycle: errors are classified into
//! an HTTP-style code and a short message, never thrown past the API
//! boundary.

use serde::Serialize;
use serde_json::Value;

use scrawl_core::{Error, Result};

/// Coarse outcome of a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The operation ran
    Success,
    /// The operation failed; see code and message
    Error,
    /// The operation was already done or already in progress
    Skipped,
}

/// The JSON-shaped result handed back to the hosting runtime
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    /// Coarse outcome
    pub status: Status,
    /// HTTP-style code: 200, 400, 409, or 500
    pub code: u16,
    /// Short user-facing message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Operation-specific payload
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl ApiResponse {
    /// Success with a payload
    pub fn success(data: Value) -> Self {
        Self {
            status: Status::Success,
            code: 200,
            message: None,
            data,
        }
    }

    /// Success with a message only
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            code: 200,
            message: Some(message.into()),
            data: Value::Null,
        }
    }

    /// Operation already done or in progress
    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            status: Status::Skipped,
            code: 200,
            message: Some(message.into()),
            data: Value::Null,
        }
    }

    /// Classified failure
    pub fn error(err: &Error) -> Self {
        Self {
            status: Status::Error,
            code: err.http_status(),
            message: Some(err.to_string()),
            data: Value::Null,
        }
    }

    /// Fold a handler result into a response
    pub fn from_result<T: Serialize>(result: Result<T>) -> Self {
        match result {
            Ok(value) => match serde_json::to_value(value) {
                Ok(data) => Self::success(data),
                Err(e) => Self::error(&Error::Serialization(e.to_string())),
            },
            Err(e) => Self::error(&e),
        }
    }
}
