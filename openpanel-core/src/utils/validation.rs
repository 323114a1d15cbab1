//! Input checks for provisioning requests.

use std::sync::LazyLock;

use openpanel_provider::is_valid_domain_name;
use regex::Regex;

use crate::error::{CoreError, CoreResult};

pub const USERNAME_FORMAT_MESSAGE: &str =
    "A username is required and may only include letters, numbers, dots, dashes, or underscores.";
pub const DOMAIN_FORMAT_MESSAGE: &str = "Please enter a valid domain name (e.g., example.com).";
pub const PASSWORD_REQUIRED_MESSAGE: &str = "A password is required for provisioning.";
pub const PLAN_REQUIRED_MESSAGE: &str = "Please select an OpenPanel plan.";

static USERNAME_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]{1,32}$").ok());

/// 1 to 32 characters of letters, digits, `.`, `_` or `-`.
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(username))
}

pub fn validate_username(username: &str) -> CoreResult<()> {
    if is_valid_username(username) {
        Ok(())
    } else {
        Err(CoreError::ValidationError(USERNAME_FORMAT_MESSAGE.to_string()))
    }
}

/// An empty domain is accepted; anything else must look like `example.com`.
pub fn validate_domain(domain: &str) -> CoreResult<()> {
    if domain.is_empty() || is_valid_domain_name(domain) {
        Ok(())
    } else {
        Err(CoreError::ValidationError(DOMAIN_FORMAT_MESSAGE.to_string()))
    }
}

pub fn validate_password(password: &str) -> CoreResult<()> {
    if password.is_empty() {
        Err(CoreError::ValidationError(PASSWORD_REQUIRED_MESSAGE.to_string()))
    } else {
        Ok(())
    }
}

/// Package-level check: every package must name a plan.
pub fn validate_plan_name(plan_name: Option<&str>) -> CoreResult<()> {
    match plan_name {
        Some(name) if !name.trim().is_empty() => Ok(()),
        _ => Err(CoreError::ValidationError(PLAN_REQUIRED_MESSAGE.to_string())),
    }
}
