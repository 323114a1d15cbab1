//! Utility modules

pub mod credentials;
pub mod validation;
