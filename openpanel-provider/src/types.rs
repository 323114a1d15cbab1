use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============ Request Types ============

/// HTTP verbs used against the OpenAdmin API.
///
/// `Connect` is the remote API's application-level name for the login-link
/// RPC; it is not used for proxy tunnelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Connect,
}

impl HttpMethod {
    /// Upper-case wire name of the verb.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Response Types ============

/// Parsed body of an API response.
///
/// The OpenAdmin API answers with JSON objects on most endpoints but can
/// return plain text (proxy error pages, empty bodies). Callers must handle
/// the raw-text case explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ResponseBody {
    /// The body decoded as JSON (object, array or scalar).
    Json(Value),
    /// The body was empty or not valid JSON.
    RawText(String),
}

impl ResponseBody {
    /// Decode `raw` as JSON, falling back to the raw text when decoding fails
    /// or the input is empty.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::RawText(String::new());
        }
        serde_json::from_str(raw).map_or_else(|_| Self::RawText(raw.to_string()), Self::Json)
    }

    /// The decoded JSON value, if any.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::RawText(_) => None,
        }
    }

    /// A top-level field of a JSON object body. Explicit `null` counts as absent.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.as_json()
            .and_then(|value| value.get(key))
            .filter(|value| !value.is_null())
    }

    /// A top-level field rendered as text; non-string values are rendered as JSON.
    pub fn text_field(&self, key: &str) -> Option<String> {
        self.field(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Textual form of the body, as JSON for decoded bodies and verbatim otherwise.
    pub fn dump(&self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::RawText(text) => text.clone(),
        }
    }
}

/// Envelope for a completed HTTP exchange.
///
/// The client never interprets `status`; success classification happens one
/// layer up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed body.
    pub body: ResponseBody,
    /// Body exactly as received.
    pub raw: String,
}

impl ApiResponse {
    /// Build a response from the status and the raw body text.
    pub fn from_raw(status: u16, raw: String) -> Self {
        Self {
            status,
            body: ResponseBody::parse(&raw),
            raw,
        }
    }

    /// Whether the HTTP status is in `[200, 300)`.
    pub fn is_http_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============ Host Records ============

/// A key/value record handed to the host for persistence.
///
/// `encrypted` marks values the host must store encrypted and never log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceField {
    pub key: String,
    pub value: Option<String>,
    pub encrypted: bool,
}

impl ServiceField {
    /// A plain field.
    pub fn plain(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
            encrypted: false,
        }
    }

    /// A field the host must store encrypted.
    pub fn secret(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
            encrypted: true,
        }
    }
}
