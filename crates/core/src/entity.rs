//! Identity for records the server owns.

use std::collections::BTreeMap;

/// Zones, containers and tickets are entities: two snapshots with the same id
/// describe the same thing even when their fields differ.
pub trait Entity {
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> Self::Id;

    fn same_entity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

/// Key records by id. A later snapshot of the same entity replaces an
/// earlier one.
pub fn index_by_id<E: Entity>(records: impl IntoIterator<Item = E>) -> BTreeMap<E::Id, E> {
    records.into_iter().map(|record| (record.id(), record)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Slot {
        id: i64,
        label: &'static str,
    }

    impl Entity for Slot {
        type Id = i64;

        fn id(&self) -> i64 {
            self.id
        }
    }

    #[test]
    fn later_snapshot_replaces_earlier_one() {
        let index = index_by_id(vec![
            Slot { id: 2, label: "old" },
            Slot { id: 1, label: "a" },
            Slot { id: 2, label: "new" },
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index[&2].label, "new");
        assert_eq!(index.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn identity_ignores_fields() {
        let a = Slot { id: 5, label: "before" };
        let b = Slot { id: 5, label: "after" };
        assert!(a.same_entity(&b));
        assert_ne!(a, b);
    }
}
