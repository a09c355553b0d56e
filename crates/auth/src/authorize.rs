use thiserror::Error;

use crate::permissions::Capability;
use crate::principal::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing capability '{0}'")]
    Forbidden(Capability),
}

/// Authorize a principal for one capability.
///
/// - No IO
/// - No panics
/// - Pure policy check
pub fn authorize(principal: &Principal, required: Capability) -> Result<(), AuthzError> {
    if principal.can(required) {
        Ok(())
    } else {
        tracing::debug!(user_id = %principal.user_id, capability = %required, "capability denied");
        Err(AuthzError::Forbidden(required))
    }
}
