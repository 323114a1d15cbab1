//! Client identity lookup Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::ClientIdentity;

/// Read-only view of the host's client records.
///
/// Used for the account email on create and for username generation when no
/// domain is available.
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    /// Look up a client by the host's id
    ///
    /// # Arguments
    /// * `client_id` - Host-side client id
    ///
    /// Returns `Ok(None)` when the client does not exist.
    async fn find_client(&self, client_id: &str) -> CoreResult<Option<ClientIdentity>>;
}
