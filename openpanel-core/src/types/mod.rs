//! Core type definitions

mod account;
mod plan;

pub use account::{
    Account, AccountState, ClientIdentity, CreateAccountRequest, InvalidTransition,
    LifecycleAction, StatusAction, StatusChange,
};
pub use plan::{Plan, PlanId};

// Re-export library types
pub use openpanel_provider::ServiceField;
