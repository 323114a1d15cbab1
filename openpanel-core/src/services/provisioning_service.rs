//! 账户开通服务
//!
//! Maps the host's lifecycle verbs onto OpenAdmin API calls. Every operation
//! performs at most two sequential requests and never retries.

use std::sync::Arc;

use openpanel_provider::log_sanitizer::{mask_payload, truncate_to};
use openpanel_provider::{ApiClient, HttpMethod, ProviderError, ResponseBody, ServerConnection};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{CoreError, CoreResult};
use crate::traits::ClientDirectory;
use crate::types::{
    Account, ClientIdentity, CreateAccountRequest, LifecycleAction, Plan, ServiceField,
    StatusAction, StatusChange,
};
use crate::utils::credentials::{generate_password, generate_username};
use crate::utils::validation::{
    USERNAME_FORMAT_MESSAGE, validate_domain, validate_password, validate_username,
};

use super::response::{is_already_in_state, is_successful_response, remote_error};

/// Bytes of the offending body quoted in a plan catalog error.
const PLANS_DUMP_LIMIT: usize = 255;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn require_username(username: &str) -> CoreResult<()> {
    if username.is_empty() {
        return Err(CoreError::ValidationError(USERNAME_FORMAT_MESSAGE.to_string()));
    }
    Ok(())
}

fn log_failure(operation: &str, username: &str, error: &CoreError) {
    if error.is_expected() {
        log::warn!("[openpanel] {operation} failed for {username}: {error}");
    } else {
        log::error!("[openpanel] {operation} failed for {username}: {error}");
    }
}

/// Account provisioning against one OpenPanel server
pub struct ProvisioningService {
    client: Arc<ApiClient>,
    client_directory: Option<Arc<dyn ClientDirectory>>,
}

impl ProvisioningService {
    /// 创建开通服务实例
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            client_directory: None,
        }
    }

    /// Validate `connection` and build a service over a reqwest-backed client.
    pub fn from_connection(connection: ServerConnection) -> CoreResult<Self> {
        connection.validate().map_err(CoreError::InvalidConnection)?;
        let client = ApiClient::new(connection)?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Attach the host's client lookup, used for emails and username generation.
    #[must_use]
    pub fn with_client_directory(mut self, directory: Arc<dyn ClientDirectory>) -> Self {
        self.client_directory = Some(directory);
        self
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Send one request and classify the response.
    ///
    /// Rejected responses become `ProviderError::RemoteOperation`.
    async fn api_request(
        &self,
        method: HttpMethod,
        path: &str,
        data: Option<Value>,
    ) -> CoreResult<ResponseBody> {
        let url = self.client.endpoint_url(path);
        log::debug!("[openpanel] input {method} {url} {}", mask_payload(data.as_ref()));

        let response = self.client.call(method, path, data.as_ref()).await?;

        let success = is_successful_response(&response);
        log::debug!(
            "[openpanel] output {method} {url} success={success} status={}",
            response.status
        );

        if !success {
            return Err(remote_error(&response).into());
        }

        Ok(response.body)
    }

    async fn lookup_client(&self, client_id: Option<&str>) -> CoreResult<Option<ClientIdentity>> {
        match (client_id, &self.client_directory) {
            (Some(id), Some(directory)) => directory.find_client(id).await,
            _ => Ok(None),
        }
    }

    /// Force a login to check the connection's credentials.
    pub async fn authenticate(&self) -> CoreResult<()> {
        self.client.token().await?;
        Ok(())
    }

    /// Create a panel account unless one with the same username already exists.
    ///
    /// Missing usernames and passwords are generated. The returned account is
    /// `Active` in both cases.
    ///
    /// # Errors
    /// * `CoreError::ValidationError` - the supplied username or domain is malformed
    /// * `CoreError::Provider` - the create call failed
    pub async fn create(&self, request: CreateAccountRequest) -> CoreResult<Account> {
        let username = non_empty(request.username);
        let password = non_empty(request.password);
        let domain = non_empty(request.domain);
        let plan_name = non_empty(request.plan_name);
        let client_id = non_empty(request.client_id);

        if let Some(username) = &username {
            validate_username(username)?;
        }
        if let Some(domain) = &domain {
            validate_domain(domain)?;
        }

        let client = self.lookup_client(client_id.as_deref()).await?;
        let username =
            username.unwrap_or_else(|| generate_username(domain.as_deref(), client.as_ref()));
        let password = password.unwrap_or_else(generate_password);
        let email = client.and_then(|c| c.email);

        let path = format!("users/{username}");
        // Any failed lookup counts as absent; the POST reports real problems.
        let exists = match self.api_request(HttpMethod::Get, &path, None).await {
            Ok(_) => true,
            Err(e) => {
                log::debug!("[openpanel] Existence check for {username} failed, creating: {e}");
                false
            }
        };

        if exists {
            log::info!("[openpanel] Account {username} already exists, skipping create");
        } else {
            log::info!("[openpanel] Creating account {username}");
            let payload = json!({
                "username": username,
                "password": password,
                "email": email,
                "plan_name": plan_name,
            });
            if let Err(e) = self.api_request(HttpMethod::Post, "users", Some(payload)).await {
                log_failure("Create", &username, &e);
                return Err(e);
            }
        }

        let mut account = Account::new(username, password, domain, plan_name);
        account.apply(LifecycleAction::Create)?;
        Ok(account)
    }

    /// Set a new password. No existence check is made.
    ///
    /// Returns the fields to persist (`username`, encrypted `password`).
    pub async fn change_password(
        &self,
        username: &str,
        password: &str,
    ) -> CoreResult<Vec<ServiceField>> {
        require_username(username)?;
        validate_password(password)?;

        self.api_request(
            HttpMethod::Patch,
            &format!("users/{username}"),
            Some(json!({ "password": password })),
        )
        .await
        .inspect_err(|e| log_failure("Password change", username, e))?;

        log::info!("[openpanel] Password changed for {username}");
        Ok(vec![
            ServiceField::plain("username", Some(username.to_string())),
            ServiceField::secret("password", Some(password.to_string())),
        ])
    }

    /// Move an account to another plan.
    ///
    /// Returns `Ok(None)` without contacting the panel when either argument is
    /// empty.
    pub async fn change_plan(
        &self,
        username: &str,
        plan_name: &str,
    ) -> CoreResult<Option<Vec<ServiceField>>> {
        if username.is_empty() || plan_name.is_empty() {
            log::debug!("[openpanel] Plan change skipped: username or plan missing");
            return Ok(None);
        }

        self.api_request(
            HttpMethod::Put,
            &format!("users/{username}"),
            Some(json!({ "plan_name": plan_name })),
        )
        .await
        .inspect_err(|e| log_failure("Plan change", username, e))?;

        log::info!("[openpanel] Account {username} moved to plan {plan_name}");
        Ok(Some(vec![
            ServiceField::plain("username", Some(username.to_string())),
            ServiceField::plain("plan_name", Some(plan_name.to_string())),
        ]))
    }

    pub async fn suspend(&self, username: &str) -> CoreResult<Option<StatusChange>> {
        self.set_status(username, StatusAction::Suspend).await
    }

    pub async fn unsuspend(&self, username: &str) -> CoreResult<Option<StatusChange>> {
        self.set_status(username, StatusAction::Unsuspend).await
    }

    /// `PATCH users/{username}` with `{"action": ...}`.
    ///
    /// A rejection saying the account is already in the target state counts
    /// as success. Returns `Ok(None)` without contacting the panel when no
    /// username is recorded.
    async fn set_status(
        &self,
        username: &str,
        action: StatusAction,
    ) -> CoreResult<Option<StatusChange>> {
        if username.is_empty() {
            log::debug!("[openpanel] {} skipped: no username recorded", action.as_str());
            return Ok(None);
        }

        let result = self
            .api_request(
                HttpMethod::Patch,
                &format!("users/{username}"),
                Some(json!({ "action": action.as_str() })),
            )
            .await;

        let already_in_state = match result {
            Ok(_) => false,
            Err(CoreError::Provider(e)) if is_already_in_state(&e) => {
                log::info!("[openpanel] {} {username}: {e}", action.as_str());
                true
            }
            Err(e) => {
                log_failure(action.as_str(), username, &e);
                return Err(e);
            }
        };

        Ok(Some(StatusChange {
            action,
            state: action.target_state(),
            already_in_state,
        }))
    }

    /// Delete the account. An empty username is a no-op.
    ///
    /// Failures are returned; whether the host still removes its own record is
    /// up to the host.
    pub async fn cancel(&self, username: &str) -> CoreResult<()> {
        if username.is_empty() {
            log::debug!("[openpanel] Cancel skipped: no username recorded");
            return Ok(());
        }

        self.api_request(HttpMethod::Delete, &format!("users/{username}"), None)
            .await
            .inspect_err(|e| log_failure("Cancel", username, e))?;

        log::info!("[openpanel] Account {username} deleted");
        Ok(())
    }

    /// Fetch a one-time login link (`CONNECT users/{username}`).
    pub async fn get_login_link(&self, username: &str) -> CoreResult<Option<String>> {
        require_username(username)?;
        let body = self
            .api_request(HttpMethod::Connect, &format!("users/{username}"), None)
            .await?;
        Ok(body.text_field("link"))
    }

    /// Best-effort [`get_login_link`](Self::get_login_link) for service info pages.
    pub async fn login_link_or_none(&self, username: &str) -> Option<String> {
        match self.get_login_link(username).await {
            Ok(link) => link,
            Err(e) => {
                log::warn!("[openpanel] Login link unavailable for {username}: {e}");
                None
            }
        }
    }

    /// List the panel's plans.
    ///
    /// Entries that do not decode as a plan are logged and skipped.
    ///
    /// # Errors
    /// * `ProviderError::InvalidResponse` - the body has no `plans` array
    pub async fn get_plans(&self) -> CoreResult<Vec<Plan>> {
        let body = self.api_request(HttpMethod::Get, "plans", None).await?;

        let Some(Value::Array(items)) = body.field("plans") else {
            let dump = body.dump();
            return Err(ProviderError::InvalidResponse {
                detail: format!(
                    "Invalid response from OpenPanel API (plans missing): {}",
                    truncate_to(&dump, PLANS_DUMP_LIMIT)
                ),
            }
            .into());
        };

        let plans = items
            .iter()
            .filter_map(|item| match Plan::deserialize(item) {
                Ok(plan) => Some(plan),
                Err(e) => {
                    log::warn!("[openpanel] Skipping plan entry {item}: {e}");
                    None
                }
            })
            .collect();
        Ok(plans)
    }
}
