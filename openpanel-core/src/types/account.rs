use serde::{Deserialize, Serialize};

use super::ServiceField;

// ============ Lifecycle ============

/// Lifecycle state of a panel account.
///
/// The remote panel is the source of truth; this is the state implied by the
/// last successful operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountState {
    Absent,
    Active,
    Suspended,
}

/// Operations that move an account between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleAction {
    Create,
    Suspend,
    Unsuspend,
    ChangePlan,
    Cancel,
}

/// A lifecycle action that is not allowed from the given state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("Cannot {action:?} an account that is {from:?}")]
pub struct InvalidTransition {
    pub from: AccountState,
    pub action: LifecycleAction,
}

impl AccountState {
    /// State after applying `action`.
    ///
    /// Repeating `Create`, `Suspend` or `Unsuspend` on an account already in
    /// the target state is allowed and leaves the state unchanged.
    pub fn transition(self, action: LifecycleAction) -> Result<Self, InvalidTransition> {
        use AccountState::{Absent, Active, Suspended};
        use LifecycleAction::{Cancel, ChangePlan, Create, Suspend, Unsuspend};

        match (self, action) {
            (Absent | Active, Create) | (Active | Suspended, Unsuspend) => Ok(Active),
            (Suspended, Create) | (Active | Suspended, Suspend) => Ok(Suspended),
            (state @ (Active | Suspended), ChangePlan) => Ok(state),
            (Active | Suspended, Cancel) => Ok(Absent),
            (Absent, Suspend | Unsuspend | ChangePlan | Cancel) => Err(InvalidTransition {
                from: self,
                action,
            }),
        }
    }
}

/// The two status toggles sent as `{"action": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusAction {
    Suspend,
    Unsuspend,
}

impl StatusAction {
    /// Wire value of the `action` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suspend => "suspend",
            Self::Unsuspend => "unsuspend",
        }
    }

    /// State the account is in once the action succeeded.
    pub fn target_state(self) -> AccountState {
        match self {
            Self::Suspend => AccountState::Suspended,
            Self::Unsuspend => AccountState::Active,
        }
    }
}

/// Result of a suspend/unsuspend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub action: StatusAction,
    /// State the account is now in.
    pub state: AccountState,
    /// The panel reported the account was already in `state`.
    pub already_in_state: bool,
}

// ============ Account ============

/// A provisioned panel account.
///
/// The username is fixed for the life of the account; there is no rename.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    username: String,
    pub password: String,
    pub domain: Option<String>,
    pub plan_name: Option<String>,
    pub state: AccountState,
}

impl Account {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        domain: Option<String>,
        plan_name: Option<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            domain,
            plan_name,
            state: AccountState::Absent,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Move the account through the lifecycle.
    pub fn apply(&mut self, action: LifecycleAction) -> Result<AccountState, InvalidTransition> {
        self.state = self.state.transition(action)?;
        Ok(self.state)
    }

    /// Records for the host to persist; the password is marked encrypted.
    pub fn service_fields(&self) -> Vec<ServiceField> {
        vec![
            ServiceField::plain("username", Some(self.username.clone())),
            ServiceField::secret("password", Some(self.password.clone())),
            ServiceField::plain("domain", self.domain.clone()),
            ServiceField::plain("plan_name", self.plan_name.clone()),
        ]
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &openpanel_provider::log_sanitizer::MASK)
            .field("domain", &self.domain)
            .field("plan_name", &self.plan_name)
            .field("state", &self.state)
            .finish()
    }
}

// ============ Requests ============

/// Client details the host can look up; used for the account email and for
/// username generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdentity {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
}

/// Input for account creation. Empty strings count as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Desired username; generated when absent.
    pub username: Option<String>,
    /// Desired password; generated when absent.
    pub password: Option<String>,
    pub domain: Option<String>,
    pub plan_name: Option<String>,
    /// Host-side client id, resolved through the configured client directory.
    pub client_id: Option<String>,
}
