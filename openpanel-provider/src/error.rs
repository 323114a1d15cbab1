use serde::{Deserialize, Serialize};

/// Unified error type for all OpenPanel API operations.
///
/// All variants are serializable for structured error reporting to the host.
/// None of them are retried internally; every failure surfaces to the
/// immediate caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// The login exchange completed but returned no usable access token.
    Authentication {
        /// Remote-supplied message, or a generic fallback.
        message: String,
    },

    /// A connection-level failure (DNS resolution, TLS handshake, refused
    /// connection, unreadable body, etc.).
    Transport {
        /// Underlying transport error text.
        detail: String,
    },

    /// The HTTP request exceeded the fixed per-request timeout.
    Timeout {
        /// Underlying transport error text.
        detail: String,
    },

    /// A completed HTTP exchange that the success classifier rejected.
    RemoteOperation {
        /// HTTP status of the exchange.
        status: u16,
        /// Remote `message`/`error` field, or a generic internal-error string.
        message: String,
    },

    /// A successful-looking exchange whose body violates the endpoint's contract
    /// (for example `plans` missing from the plan catalog).
    InvalidResponse {
        /// Description including a truncated dump of the offending body.
        detail: String,
    },
}

impl ProviderError {
    /// 是否为预期行为（远端拒绝、凭证错误等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::RemoteOperation { .. }
        )
    }

    /// Whether the failure happened below HTTP (no response was received).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    /// The message reported by the remote side, if the exchange completed.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Authentication { message } | Self::RemoteOperation { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication { message } | Self::RemoteOperation { message, .. } => {
                write!(f, "{message}")
            }
            Self::Transport { detail } => write!(f, "Network error: {detail}"),
            Self::Timeout { detail } => write!(f, "Request timeout: {detail}"),
            Self::InvalidResponse { detail } => write!(f, "{detail}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;
