//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Products and ledger entries are entities: two instances with the same id are the
/// same thing even when their attributes differ (a renamed product is still the
/// product the ledger lines point at).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
