use serde::{Deserialize, Serialize};

/// A single thing a console user may do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewCapacity,
    ManageZones,
    RunStocktake,
    ViewTickets,
    ApproveTickets,
    ExecuteWriteOffs,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::ViewCapacity,
        Capability::ManageZones,
        Capability::RunStocktake,
        Capability::ViewTickets,
        Capability::ApproveTickets,
        Capability::ExecuteWriteOffs,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewCapacity => "view_capacity",
            Capability::ManageZones => "manage_zones",
            Capability::RunStocktake => "run_stocktake",
            Capability::ViewTickets => "view_tickets",
            Capability::ApproveTickets => "approve_tickets",
            Capability::ExecuteWriteOffs => "execute_write_offs",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact set of [`Capability`] values.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn union(self, other: CapabilitySet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}
