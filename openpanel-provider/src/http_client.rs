//! HTTP transport
//!
//! The [`HttpTransport`] trait is the seam between the API client and the
//! network. [`ReqwestTransport`] is the production implementation; tests plug
//! in scripted transports.
//!
//! `CONNECT` is handed to [`RawHttpTransport`] so its path and reply body
//! survive.
//!
//! # design principles
//! - **No status interpretation** - any completed exchange is returned as `(status, body)`
//! - **No retries** - transport failures surface immediately
//! - **Fixed limits** - 30s per request, at most 10 redirects

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::{Client, Method};

use crate::connection::ServerConnection;
use crate::error::{ProviderError, Result};
use crate::raw_http::RawHttpTransport;
use crate::types::HttpMethod;
use crate::utils::log_sanitizer::{MASK, truncate_for_log};

/// 默认请求超时（秒）
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// 最大重定向次数
const MAX_REDIRECTS: usize = 10;

/// A fully-built request ready to be sent.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub bearer_token: Option<String>,
    /// JSON payload text.
    pub body: Option<String>,
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| MASK))
            .field("body", &self.body.as_ref().map(|b| truncate_for_log(b)))
            .finish()
    }
}

/// Sends requests and returns `(status_code, response_text)`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one HTTP exchange.
    ///
    /// # Errors
    /// * `ProviderError::Timeout` - the request exceeded the timeout
    /// * `ProviderError::Transport` - any other connection-level failure
    async fn execute(&self, request: HttpRequest) -> Result<(u16, String)>;
}

/// `reqwest`-backed transport bound to one [`ServerConnection`]'s TLS policy.
pub struct ReqwestTransport {
    client: Client,
    raw: RawHttpTransport,
}

impl ReqwestTransport {
    /// Build a client honouring the connection's TLS verification flag.
    ///
    /// When verification is disabled both the certificate chain and the
    /// hostname checks are skipped.
    pub fn new(connection: &ServerConnection) -> Result<Self> {
        #[allow(unused_mut)]
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .redirect(Policy::limited(MAX_REDIRECTS));

        #[cfg(any(feature = "native-tls", feature = "rustls"))]
        if !connection.verify_tls() {
            log::warn!(
                "TLS verification disabled for {}",
                connection.base_url()
            );
            builder = builder.danger_accept_invalid_certs(true);
            #[cfg(feature = "native-tls")]
            {
                builder = builder.danger_accept_invalid_hostnames(true);
            }
        }

        let client = builder.build().map_err(|e| ProviderError::Transport {
            detail: format!("Failed to create HTTP client: {e}"),
        })?;

        let raw = RawHttpTransport::new(
            connection,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )?;

        Ok(Self { client, raw })
    }
}

/// `None` for verbs reqwest cannot send as an ordinary request.
fn to_reqwest_method(method: HttpMethod) -> Option<Method> {
    match method {
        HttpMethod::Get => Some(Method::GET),
        HttpMethod::Post => Some(Method::POST),
        HttpMethod::Put => Some(Method::PUT),
        HttpMethod::Patch => Some(Method::PATCH),
        HttpMethod::Delete => Some(Method::DELETE),
        HttpMethod::Connect => None,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<(u16, String)> {
        let Some(reqwest_method) = to_reqwest_method(request.method) else {
            return self.raw.execute(&request).await;
        };

        let HttpRequest {
            method,
            url,
            bearer_token,
            body,
        } = request;

        let mut request_builder = self
            .client
            .request(reqwest_method, &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = bearer_token {
            request_builder = request_builder.bearer_auth(token);
        }
        if let Some(body) = body {
            request_builder = request_builder.body(body);
        }

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    detail: e.to_string(),
                }
            } else {
                ProviderError::Transport {
                    detail: e.to_string(),
                }
            }
        })?;

        let status_code = response.status().as_u16();
        log::debug!("[openpanel] {method} {url} -> {status_code}");

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport {
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!(
            "[openpanel] Response Body: {}",
            truncate_for_log(&response_text)
        );

        Ok((status_code, response_text))
    }
}
