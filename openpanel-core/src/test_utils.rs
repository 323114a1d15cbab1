//! 测试辅助模块
//!
//! In-memory transport and client directory for service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use openpanel_provider::{
    ApiClient, HttpMethod, HttpRequest, HttpTransport, ProviderError, Result as ProviderResult,
    ServerConnection,
};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::services::ProvisioningService;
use crate::traits::ClientDirectory;
use crate::types::ClientIdentity;

pub const BASE_URL: &str = "https://panel.example.com:2087";

// ===== MockTransport =====

/// Answers requests from a route table keyed by `(method, path)`.
///
/// Login (`POST /api/`) answers with a token unless overridden; unknown
/// routes answer `404 {"error":"Not found"}`.
pub struct MockTransport {
    routes: Mutex<HashMap<(HttpMethod, String), ProviderResult<(u16, String)>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        let transport = Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        });
        transport.respond(HttpMethod::Post, "", 200, r#"{"access_token":"test-token"}"#);
        transport
    }

    /// Answer `method /api/{path}` with `status` and `body`.
    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Ok((status, body.to_string())));
    }

    /// Fail `method /api/{path}` below HTTP.
    pub fn fail(&self, method: HttpMethod, path: &str, error: ProviderError) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Err(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests sent to `method /api/{path}`.
    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        let url = format!("{BASE_URL}/api/{path}");
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    /// JSON body of the last request sent to `method /api/{path}`.
    pub fn last_body(&self, method: HttpMethod, path: &str) -> Option<Value> {
        let url = format!("{BASE_URL}/api/{path}");
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.method == method && r.url == url)
            .and_then(|r| r.body.as_deref())
            .and_then(|body| serde_json::from_str(body).ok())
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> ProviderResult<(u16, String)> {
        let path = request
            .url
            .strip_prefix(&format!("{BASE_URL}/api/"))
            .unwrap_or(&request.url)
            .to_string();
        let method = request.method;
        self.requests.lock().unwrap().push(request);

        self.routes
            .lock()
            .unwrap()
            .get(&(method, path))
            .cloned()
            .unwrap_or_else(|| Ok((404, r#"{"error":"Not found"}"#.to_string())))
    }
}

// ===== MockClientDirectory =====

pub struct MockClientDirectory {
    clients: HashMap<String, ClientIdentity>,
    fail: bool,
}

impl MockClientDirectory {
    pub fn with_client(client_id: &str, identity: ClientIdentity) -> Arc<Self> {
        Arc::new(Self {
            clients: HashMap::from([(client_id.to_string(), identity)]),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            clients: HashMap::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl ClientDirectory for MockClientDirectory {
    async fn find_client(&self, client_id: &str) -> CoreResult<Option<ClientIdentity>> {
        if self.fail {
            return Err(CoreError::ClientLookup("directory unavailable".to_string()));
        }
        Ok(self.clients.get(client_id).cloned())
    }
}

// ===== Factories =====

pub fn test_connection() -> ServerConnection {
    ServerConnection::new("panel.example.com", "admin", "admin-pw")
}

pub fn create_test_service(transport: &Arc<MockTransport>) -> ProvisioningService {
    let client = ApiClient::with_transport(test_connection(), transport.clone());
    ProvisioningService::new(Arc::new(client))
}
