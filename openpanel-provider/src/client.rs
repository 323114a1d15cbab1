//! OpenAdmin API client

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::connection::ServerConnection;
use crate::error::{ProviderError, Result};
use crate::http_client::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::types::{ApiResponse, HttpMethod};
use crate::utils::log_sanitizer::mask_payload;

/// Fallback detail when the login response carries no `message`.
const AUTH_FAILED_MESSAGE: &str = "Authentication failed";

/// Authenticated client for one OpenPanel server.
///
/// The bearer token is fetched lazily on first use and cached for the
/// lifetime of the instance. The cache is guarded by an async mutex held
/// across the login exchange, so an `Arc<ApiClient>` shared between tasks
/// still performs a single login.
pub struct ApiClient {
    connection: ServerConnection,
    transport: Arc<dyn HttpTransport>,
    token: Mutex<Option<String>>,
}

impl ApiClient {
    /// Create a client backed by [`ReqwestTransport`].
    pub fn new(connection: ServerConnection) -> Result<Self> {
        let transport = ReqwestTransport::new(&connection)?;
        Ok(Self::with_transport(connection, Arc::new(transport)))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(connection: ServerConnection, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            connection,
            transport,
            token: Mutex::new(None),
        }
    }

    pub fn connection(&self) -> &ServerConnection {
        &self.connection
    }

    /// `scheme://host:port` of the remote panel. No I/O.
    pub fn base_url(&self) -> String {
        self.connection.base_url()
    }

    /// Absolute URL for a path relative to `/api/`; leading slashes are dropped.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Return the cached bearer token, logging in first if necessary.
    ///
    /// # Errors
    /// * `ProviderError::Authentication` - the login response lacks `access_token`
    /// * `ProviderError::Transport` / `ProviderError::Timeout` - the login request failed
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        log::debug!(
            "[openpanel] Authenticating as {} against {}",
            self.connection.admin_username(),
            self.base_url()
        );

        let credentials = json!({
            "username": self.connection.admin_username(),
            "password": self.connection.admin_password(),
        });
        let (status, raw) = self
            .transport
            .execute(HttpRequest {
                method: HttpMethod::Post,
                url: self.endpoint_url(""),
                bearer_token: None,
                body: Some(credentials.to_string()),
            })
            .await?;
        let response = ApiResponse::from_raw(status, raw);

        let token = response
            .body
            .text_field("access_token")
            .filter(|token| !token.is_empty());

        let Some(token) = token else {
            let message = response
                .body
                .text_field("message")
                .unwrap_or_else(|| AUTH_FAILED_MESSAGE.to_string());
            log::warn!("[openpanel] Authentication failed (HTTP {status}): {message}");
            return Err(ProviderError::Authentication { message });
        };

        *cached = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token so the next request logs in again.
    pub async fn invalidate_token(&self) {
        self.token.lock().await.take();
    }

    /// Drop the cached token only if it is still `rejected`; a token fetched
    /// by another task in the meantime is kept.
    async fn discard_token(&self, rejected: &str) -> bool {
        let mut cached = self.token.lock().await;
        if cached.as_deref() == Some(rejected) {
            cached.take();
            true
        } else {
            false
        }
    }

    /// Perform an authenticated request and return the raw envelope.
    ///
    /// The HTTP status is not interpreted here, with one exception: a `401`
    /// clears the cached token (if it is still the one that was sent) so that
    /// a later call re-authenticates. The current request is not retried.
    pub async fn call(
        &self,
        method: HttpMethod,
        path: &str,
        data: Option<&Value>,
    ) -> Result<ApiResponse> {
        let url = self.endpoint_url(path);
        let token = self.token().await?;

        log::debug!("[openpanel] {method} {url} {}", mask_payload(data));

        let (status, raw) = self
            .transport
            .execute(HttpRequest {
                method,
                url,
                bearer_token: Some(token.clone()),
                body: data.map(Value::to_string),
            })
            .await?;

        if status == 401 && self.discard_token(&token).await {
            log::warn!("[openpanel] Token rejected (HTTP 401), cleared cached token");
        }

        Ok(ApiResponse::from_raw(status, raw))
    }
}
