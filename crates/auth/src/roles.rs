use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::permissions::{Capability, CapabilitySet};

/// Console roles as issued by the server.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Storekeeper,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Storekeeper => "storekeeper",
            Role::Viewer => "viewer",
        }
    }

    /// Capabilities granted by this role alone.
    pub fn capabilities(&self) -> CapabilitySet {
        use Capability::*;
        match self {
            Role::Admin => CapabilitySet::all(),
            Role::Manager => CapabilitySet::from_iter([
                ViewCapacity,
                RunStocktake,
                ViewTickets,
                ApproveTickets,
                ExecuteWriteOffs,
            ]),
            Role::Storekeeper => CapabilitySet::from_iter([ViewCapacity, RunStocktake, ViewTickets]),
            Role::Viewer => CapabilitySet::from_iter([ViewCapacity, ViewTickets]),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts `admin`, `ROLE_ADMIN`, ` Admin ` and similar spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let name = normalized.strip_prefix("role_").unwrap_or(&normalized);
        match name {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "storekeeper" => Ok(Role::Storekeeper),
            "viewer" => Ok(Role::Viewer),
            _ => Err(s.to_string()),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
