//! Remote panel connection settings and their validation.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::ServiceField;
use crate::utils::log_sanitizer::MASK;

/// Default OpenAdmin API port.
pub const DEFAULT_PORT: u16 = 2087;

static DOMAIN_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}$").ok()
});

/// Whether `name` looks like a fully-qualified domain name (`panel.example.com`).
pub fn is_valid_domain_name(name: &str) -> bool {
    DOMAIN_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(name))
}

/// Whether `hostname` is an IP address or a domain name.
pub fn is_valid_hostname(hostname: &str) -> bool {
    hostname.parse::<IpAddr>().is_ok() || is_valid_domain_name(hostname)
}

/// Validation error for connection settings.
///
/// Returned when a setting is missing, empty, or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConnectionValidationError {
    /// A required field is missing entirely.
    MissingField {
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
    /// A field is present but empty/whitespace-only.
    EmptyField {
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
    /// A field is present but has an invalid format.
    InvalidFormat {
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
        /// Description of what's wrong with the format.
        reason: String,
    },
}

impl ConnectionValidationError {
    /// Machine-readable key of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field, .. }
            | Self::EmptyField { field, .. }
            | Self::InvalidFormat { field, .. } => field,
        }
    }

    fn empty(field: &str, label: &str) -> Self {
        Self::EmptyField {
            field: field.to_string(),
            label: label.to_string(),
        }
    }

    fn invalid(field: &str, label: &str, reason: &str) -> Self {
        Self::InvalidFormat {
            field: field.to_string(),
            label: label.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for ConnectionValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { label, .. } => write!(f, "Missing required field: {label}"),
            Self::EmptyField { label, .. } => write!(f, "Field must not be empty: {label}"),
            Self::InvalidFormat { label, reason, .. } => write!(f, "{label}: {reason}"),
        }
    }
}

impl std::error::Error for ConnectionValidationError {}

/// One configured OpenPanel backend.
///
/// Immutable once constructed. `Debug` never prints the admin password.
///
/// # Deserialization
///
/// ```json
/// { "host": "panel.example.com", "port": 2087, "use_tls": true, "verify_tls": true,
///   "admin_username": "admin", "admin_password": "..." }
/// ```
#[derive(Clone, Deserialize)]
pub struct ServerConnection {
    #[serde(default)]
    server_name: Option<String>,
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_true")]
    use_tls: bool,
    #[serde(default = "default_true")]
    verify_tls: bool,
    admin_username: String,
    admin_password: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

impl ServerConnection {
    /// Connection over HTTPS with certificate verification on the default port.
    pub fn new(
        host: impl Into<String>,
        admin_username: impl Into<String>,
        admin_password: impl Into<String>,
    ) -> Self {
        Self {
            server_name: None,
            host: host.into(),
            port: DEFAULT_PORT,
            use_tls: true,
            verify_tls: true,
            admin_username: admin_username.into(),
            admin_password: admin_password.into(),
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    #[must_use]
    pub fn with_tls_verification(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    #[must_use]
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    pub(crate) fn admin_password(&self) -> &str {
        &self.admin_password
    }

    /// `scheme://host:port`, scheme chosen by [`use_tls`](Self::use_tls).
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Check every setting, collecting all failures.
    pub fn validate(&self) -> Result<(), Vec<ConnectionValidationError>> {
        let mut errors = Vec::new();

        if let Some(name) = &self.server_name
            && name.trim().is_empty()
        {
            errors.push(ConnectionValidationError::empty("server_name", "Server Label"));
        }

        if self.host.trim().is_empty() {
            errors.push(ConnectionValidationError::empty("hostname", "Hostname"));
        } else if !is_valid_hostname(&self.host) {
            errors.push(ConnectionValidationError::invalid(
                "hostname",
                "Hostname",
                "must be a valid domain name (e.g. panel.example.com) or an IP address",
            ));
        }

        if self.port == 0 {
            errors.push(ConnectionValidationError::invalid(
                "port",
                "Port",
                "must be a number between 1 and 65535",
            ));
        }

        if self.admin_username.trim().is_empty() {
            errors.push(ConnectionValidationError::empty(
                "admin_username",
                "Admin Username",
            ));
        }

        if self.admin_password.trim().is_empty() {
            errors.push(ConnectionValidationError::empty(
                "admin_password",
                "Admin Password",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Construct from the host's flat key/value meta store and validate it.
    ///
    /// Keys: `server_name`, `hostname`, `port`, `use_ssl`, `verify_ssl`,
    /// `admin_username`, `admin_password`. Flags accept `"1"`/`"true"` and
    /// default to enabled; the port defaults to [`DEFAULT_PORT`].
    pub fn from_meta(meta: &HashMap<String, String>) -> Result<Self, Vec<ConnectionValidationError>> {
        let mut errors = Vec::new();

        let port = match meta.get("port").map(|p| p.trim()) {
            None | Some("") => DEFAULT_PORT,
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                errors.push(ConnectionValidationError::invalid(
                    "port",
                    "Port",
                    "must be a number between 1 and 65535",
                ));
                DEFAULT_PORT
            }),
        };

        let text = |key: &str| meta.get(key).cloned().unwrap_or_default();

        let connection = Self {
            server_name: Some(text("server_name")),
            host: text("hostname"),
            port,
            use_tls: meta_flag(meta, "use_ssl"),
            verify_tls: meta_flag(meta, "verify_ssl"),
            admin_username: text("admin_username"),
            admin_password: text("admin_password"),
        };

        if let Err(mut more) = connection.validate() {
            errors.append(&mut more);
        }

        if errors.is_empty() {
            Ok(connection)
        } else {
            Err(errors)
        }
    }

    /// Flat meta records for the host to persist, with the admin password
    /// marked for encrypted storage.
    pub fn to_meta_fields(&self) -> Vec<ServiceField> {
        let flag = |value: bool| Some(if value { "1" } else { "0" }.to_string());
        vec![
            ServiceField::plain("server_name", self.server_name.clone()),
            ServiceField::plain("hostname", Some(self.host.clone())),
            ServiceField::plain("port", Some(self.port.to_string())),
            ServiceField::plain("use_ssl", flag(self.use_tls)),
            ServiceField::plain("verify_ssl", flag(self.verify_tls)),
            ServiceField::plain("admin_username", Some(self.admin_username.clone())),
            ServiceField::secret("admin_password", Some(self.admin_password.clone())),
        ]
    }
}

fn meta_flag(meta: &HashMap<String, String>, key: &str) -> bool {
    meta.get(key)
        .is_none_or(|value| matches!(value.as_str(), "1" | "true"))
}

impl std::fmt::Debug for ServerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConnection")
            .field("server_name", &self.server_name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("verify_tls", &self.verify_tls)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &MASK)
            .finish()
    }
}
