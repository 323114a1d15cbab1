//! # openpanel-core
//!
//! Account provisioning workflow for OpenPanel servers, built on
//! [`openpanel_provider`].
//!
//! [`ProvisioningService`] exposes the verbs a billing host calls:
//! `create`, `change_password`, `change_plan`, `suspend`, `unsuspend`,
//! `cancel`, `get_login_link`, `get_plans` and `authenticate`. Results are
//! either domain types ([`Account`], [`Plan`], [`StatusChange`]) or
//! [`ServiceField`] records for the host to persist.
//!
//! Policy lives here rather than in the client:
//! - responses are classified with [`services::response::is_successful_response`];
//! - `create` skips accounts that already exist;
//! - a suspend/unsuspend rejection saying the account is "already" in that
//!   state is a success.
//!
//! The host's client records are reached through the [`ClientDirectory`] trait.

pub mod error;
pub mod services;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::ProvisioningService;
pub use traits::ClientDirectory;
pub use types::{
    Account, AccountState, ClientIdentity, CreateAccountRequest, LifecycleAction, Plan, PlanId,
    ServiceField, StatusAction, StatusChange,
};
