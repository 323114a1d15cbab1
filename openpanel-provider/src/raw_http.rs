//! Single-shot HTTP/1.1 exchange over a plain or rustls stream.
//!
//! The panel's login-link RPC is `CONNECT /api/users/{username}` with a
//! normal JSON reply. reqwest rewrites CONNECT to authority form and treats a
//! 2xx reply as a tunnel, so that verb is sent through here instead: the
//! request line keeps the origin-form path and the body is read back.
//!
//! One connection per request (`Connection: close`), no redirects.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{self, CryptoProvider};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    ClientConfig, DigitallySignedStruct, Error as TlsError, RootCertStore, SignatureScheme,
};

use crate::connection::ServerConnection;
use crate::error::{ProviderError, Result};
use crate::http_client::HttpRequest;
use crate::utils::log_sanitizer::truncate_for_log;

const READ_CHUNK: usize = 8 * 1024;

/// Accepts any certificate for any name. Signatures are still checked so the
/// handshake itself stays sound.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, TlsError> {
        crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, TlsError> {
        crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

fn tls_config(verify_tls: bool) -> Result<ClientConfig> {
    let provider = Arc::new(crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| ProviderError::Transport {
            detail: format!("Failed to configure TLS: {e}"),
        })?;

    let config = if verify_tls {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder
            .with_root_certificates(root_store)
            .with_no_client_auth()
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
            .with_no_client_auth()
    };
    Ok(config)
}

fn transport_error(detail: impl std::fmt::Display) -> ProviderError {
    ProviderError::Transport {
        detail: detail.to_string(),
    }
}

/// Where a request goes, split out of its absolute URL.
#[derive(Debug, PartialEq, Eq)]
struct Target {
    secure: bool,
    host: String,
    port: u16,
    /// Origin-form path including any query.
    path: String,
}

impl Target {
    fn parse(url: &str) -> Result<Self> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| transport_error(format!("Invalid URL {url}: {e}")))?;
        let secure = match parsed.scheme() {
            "https" => true,
            "http" => false,
            other => return Err(transport_error(format!("Unsupported scheme: {other}"))),
        };
        let host = parsed
            .host_str()
            .ok_or_else(|| transport_error(format!("URL has no host: {url}")))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| transport_error(format!("URL has no port: {url}")))?;
        let path = match parsed.query() {
            Some(query) => format!("{}?{query}", parsed.path()),
            None => parsed.path().to_string(),
        };

        Ok(Self {
            secure,
            host,
            port,
            path,
        })
    }

    fn host_header(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Serialize the request head and body.
fn encode_request(request: &HttpRequest, target: &Target) -> Vec<u8> {
    let body = request.body.as_deref().unwrap_or_default();
    let mut head = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\nAccept: */*\r\nContent-Type: application/json\r\n",
        request.method,
        target.path,
        target.host_header()
    );
    if let Some(token) = &request.bearer_token {
        head.push_str(&format!("Authorization: Bearer {token}\r\n"));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    ));

    let mut bytes = head.into_bytes();
    bytes.extend_from_slice(body.as_bytes());
    bytes
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Parsed response head.
struct Head {
    status: u16,
    /// Offset of the first body byte.
    body_start: usize,
    content_length: Option<usize>,
    chunked: bool,
}

fn parse_head(raw: &[u8]) -> Option<Head> {
    let end = find(raw, b"\r\n\r\n")?;
    let text = String::from_utf8_lossy(&raw[..end]);
    let mut lines = text.split("\r\n");

    let status = lines
        .next()
        .filter(|line| line.starts_with("HTTP/"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())?;

    let mut content_length = None;
    let mut chunked = false;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse().ok();
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value.to_ascii_lowercase().contains("chunked");
        }
    }

    Some(Head {
        status,
        body_start: end + 4,
        content_length,
        chunked,
    })
}

/// Whether `raw` already holds the whole response.
fn is_complete(raw: &[u8]) -> bool {
    match parse_head(raw) {
        Some(head) if head.chunked => raw[head.body_start..].ends_with(b"0\r\n\r\n"),
        Some(head) => head
            .content_length
            .is_some_and(|len| raw.len() >= head.body_start + len),
        None => false,
    }
}

fn decode_chunked(mut body: &[u8]) -> Option<Vec<u8>> {
    let mut decoded = Vec::new();
    loop {
        let line_end = find(body, b"\r\n")?;
        let size_line = String::from_utf8_lossy(&body[..line_end]);
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16).ok()?;
        body = &body[line_end + 2..];
        if size == 0 {
            return Some(decoded);
        }
        decoded.extend_from_slice(body.get(..size)?);
        body = body.get(size + 2..)?;
    }
}

/// Split a raw response into `(status, body text)`.
fn parse_response(raw: &[u8]) -> Result<(u16, String)> {
    let head = parse_head(raw).ok_or_else(|| {
        transport_error(format!(
            "Malformed HTTP response: {}",
            truncate_for_log(&String::from_utf8_lossy(raw))
        ))
    })?;
    let body = &raw[head.body_start..];

    let body = if head.chunked {
        decode_chunked(body)
            .ok_or_else(|| transport_error("Malformed chunked response body"))?
    } else if let Some(len) = head.content_length {
        body.get(..len)
            .ok_or_else(|| transport_error("Response body shorter than Content-Length"))?
            .to_vec()
    } else {
        body.to_vec()
    };

    Ok((head.status, String::from_utf8_lossy(&body).into_owned()))
}

async fn exchange<S>(stream: &mut S, request: &[u8]) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(request).await?;
    stream.flush().await?;

    let mut raw = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let read = match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            // Servers often close TLS without close_notify.
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof && !raw.is_empty() => break,
            Err(e) => return Err(e),
        };
        raw.extend_from_slice(&chunk[..read]);
        if is_complete(&raw) {
            break;
        }
    }
    Ok(raw)
}

/// Sends one request per connection, writing the request line verbatim.
pub struct RawHttpTransport {
    connector: TlsConnector,
    request_timeout: Duration,
}

impl RawHttpTransport {
    /// Build a transport honouring the connection's TLS verification flag.
    pub fn new(connection: &ServerConnection, request_timeout: Duration) -> Result<Self> {
        let config = tls_config(connection.verify_tls())?;
        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            request_timeout,
        })
    }

    /// Perform one exchange and return `(status_code, response_text)`.
    pub async fn execute(&self, request: &HttpRequest) -> Result<(u16, String)> {
        let target = Target::parse(&request.url)?;
        let payload = encode_request(request, &target);

        let raw = timeout(self.request_timeout, self.send(&target, &payload))
            .await
            .map_err(|_| ProviderError::Timeout {
                detail: format!(
                    "{} {} exceeded {}s",
                    request.method,
                    request.url,
                    self.request_timeout.as_secs()
                ),
            })??;

        let (status, body) = parse_response(&raw)?;
        log::debug!("[openpanel] {} {} -> {status}", request.method, request.url);
        log::debug!("[openpanel] Response Body: {}", truncate_for_log(&body));
        Ok((status, body))
    }

    async fn send(&self, target: &Target, payload: &[u8]) -> Result<Vec<u8>> {
        let mut stream = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(|e| transport_error(format!("Connection to {} failed: {e}", target.host)))?;

        if !target.secure {
            return exchange(&mut stream, payload).await.map_err(transport_error);
        }

        let server_name = ServerName::try_from(target.host.clone())
            .map_err(|e| transport_error(format!("Invalid TLS server name {}: {e}", target.host)))?;
        let mut tls_stream = self
            .connector
            .connect(server_name, stream)
            .await
            .map_err(|e| transport_error(format!("TLS handshake failed: {e}")))?;

        exchange(&mut tls_stream, payload)
            .await
            .map_err(transport_error)
    }
}
