//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attributes
/// (e.g. [`crate::Dimensions`], [`crate::DateRange`]). To "modify" one, build
/// a new value.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
