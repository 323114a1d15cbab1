//! # openpanel-provider
//!
//! An authenticated HTTP client for the [OpenPanel](https://openpanel.com/)
//! OpenAdmin API.
//!
//! The client owns three concerns and nothing else:
//!
//! - **Authentication**: `POST /api/` with the admin credentials, caching the
//!   returned bearer token for the lifetime of the client.
//! - **Request signing**: every call carries `Authorization: Bearer <token>`
//!   and a JSON content type.
//! - **Response normalization**: bodies are decoded as JSON where possible and
//!   kept as raw text otherwise ([`ResponseBody`]).
//!
//! `CONNECT` (used by the login-link RPC) bypasses reqwest: hyper would send it
//! in authority form and treat the reply as a tunnel, so it is written as a
//! plain HTTP/1.1 exchange by [`RawHttpTransport`].
//!
//! It never decides whether a response is a success; that policy belongs to
//! the caller.
//!
//! ## Feature Flags
//!
//! - **`native-tls`** *(default)*: Use the platform's native TLS implementation.
//! - **`rustls`**: Use rustls. Recommended for cross-compilation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use openpanel_provider::{ApiClient, HttpMethod, ServerConnection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = ServerConnection::new("panel.example.com", "admin", "secret")
//!         .with_port(2087);
//!     let client = ApiClient::new(connection)?;
//!
//!     let response = client.call(HttpMethod::Get, "plans", None).await?;
//!     println!("HTTP {} -> {}", response.status, response.body.dump());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, ProviderError>`](ProviderError):
//!
//! - [`ProviderError::Authentication`]: login returned no usable token
//! - [`ProviderError::Transport`] / [`ProviderError::Timeout`]: no response received
//! - [`ProviderError::RemoteOperation`]: the caller classified a response as failed
//! - [`ProviderError::InvalidResponse`]: a response violated the endpoint contract
//!
//! Nothing is retried.

mod client;
mod connection;
mod error;
mod http_client;
mod raw_http;
mod types;
mod utils;

pub use client::ApiClient;
pub use connection::{
    ConnectionValidationError, DEFAULT_PORT, ServerConnection, is_valid_domain_name,
    is_valid_hostname,
};
pub use error::{ProviderError, Result};
pub use http_client::{HttpRequest, HttpTransport, ReqwestTransport};
pub use raw_http::RawHttpTransport;
pub use types::{ApiResponse, HttpMethod, ResponseBody, ServiceField};

// Re-export utils module
pub use utils::log_sanitizer;
