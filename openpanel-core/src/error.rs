//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use openpanel_provider::{ConnectionValidationError, ProviderError};

use crate::types::InvalidTransition;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Caller-supplied input failed validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Server connection settings are incomplete or malformed
    #[error("Invalid server configuration: {}", join_errors(.0))]
    InvalidConnection(Vec<ConnectionValidationError>),

    /// The host's client directory failed
    #[error("Client lookup failed: {0}")]
    ClientLookup(String),

    /// Lifecycle action not allowed from the current state
    #[error("{0}")]
    InvalidTransition(#[from] InvalidTransition),

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

fn join_errors(errors: &[ConnectionValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CoreError {
    /// Whether it is expected behavior (user input, remote refusal, etc.), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ValidationError(_) | Self::InvalidConnection(_) | Self::InvalidTransition(_) => {
                true
            }
            Self::Provider(e) => e.is_expected(),
            Self::ClientLookup(_) => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
