//! Success classification for OpenAdmin API responses
//!
//! The panel signals failure three different ways (a body `error`, a body
//! `success: false`, or a plain HTTP status), checked here in that order.

use openpanel_provider::{ApiResponse, ProviderError};
use serde_json::Value;

/// Message used when a failed response carries neither `message` nor `error`.
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "The OpenPanel API returned an unexpected response.";

/// Loose truthiness: `null`, `false`, `0`, `0.0`, `""`, `"0"` and empty
/// arrays/objects are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Whether the exchange succeeded.
///
/// 1. a non-null `error` field means failure;
/// 2. otherwise a non-null `success` field decides by truthiness;
/// 3. otherwise the HTTP status must be 2xx.
pub fn is_successful_response(response: &ApiResponse) -> bool {
    if response.body.field("error").is_some() {
        return false;
    }

    if let Some(success) = response.body.field("success") {
        return is_truthy(success);
    }

    response.is_http_success()
}

/// Remote `message`, else remote `error`, else a generic message.
pub fn error_message(response: &ApiResponse) -> String {
    response
        .body
        .text_field("message")
        .or_else(|| response.body.text_field("error"))
        .unwrap_or_else(|| UNEXPECTED_RESPONSE_MESSAGE.to_string())
}

/// Build the error for a response rejected by [`is_successful_response`].
pub fn remote_error(response: &ApiResponse) -> ProviderError {
    ProviderError::RemoteOperation {
        status: response.status,
        message: error_message(response),
    }
}

/// Whether a failed status change means the account is already in the
/// requested state.
///
/// The panel has no structured code for this; its messages contain "already"
/// (any case). Only remote rejections qualify.
pub fn is_already_in_state(error: &ProviderError) -> bool {
    match error {
        ProviderError::RemoteOperation { message, .. } => {
            message.to_lowercase().contains("already")
        }
        _ => false,
    }
}
