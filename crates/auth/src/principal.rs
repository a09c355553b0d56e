use wareops_core::UserId;

use crate::permissions::{Capability, CapabilitySet};
use crate::roles::Role;

/// The logged-in user with capabilities resolved from their roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub roles: Vec<Role>,
    capabilities: CapabilitySet,
}

impl Principal {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        let capabilities = roles
            .iter()
            .fold(CapabilitySet::empty(), |acc, role| acc.union(role.capabilities()));
        Self {
            user_id,
            roles,
            capabilities,
        }
    }

    /// Resolve server role strings; unknown names grant nothing.
    pub fn from_role_names<S: AsRef<str>>(user_id: UserId, names: &[S]) -> Self {
        let mut roles = Vec::new();
        for name in names {
            match name.as_ref().parse::<Role>() {
                Ok(role) if !roles.contains(&role) => roles.push(role),
                Ok(_) => {}
                Err(unknown) => {
                    tracing::warn!(user_id = %user_id, role = %unknown, "ignoring unknown role");
                }
            }
        }
        Self::new(user_id, roles)
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_roles_once_and_ignores_unknown_names() {
        let principal = Principal::from_role_names(UserId::new(3), &["storekeeper", "auditor", "STOREKEEPER"]);
        assert_eq!(principal.roles, vec![Role::Storekeeper]);
        assert!(principal.can(Capability::RunStocktake));
        assert!(!principal.can(Capability::ApproveTickets));
    }

    #[test]
    fn capabilities_accumulate_across_roles() {
        let principal = Principal::new(UserId::new(1), vec![Role::Viewer, Role::Manager]);
        assert!(principal.can(Capability::ExecuteWriteOffs));
        assert!(principal.can(Capability::ViewCapacity));
    }
}
