use crate::{Event, EventEnvelope};

/// A projection builds a read model from the ledger's change events.
///
/// Read models are **disposable**: the ledger is the source of truth and a projection
/// can be cleared and rebuilt by replaying the ledger at any time.
///
/// ## Idempotency
///
/// `apply` must be idempotent per revision: applying an envelope whose revision the
/// projection has already seen is a no-op. Replays after a crash or a rebuild are
/// therefore safe.
///
/// ## Errors
///
/// Unlike a best-effort subscriber, a projection that sits inside a write's critical
/// section must report failure, so the writer can compensate the ledger mutation.
pub trait Projection {
    type Ev: Event;
    type Error: core::fmt::Debug;

    /// Apply a single event to the read model.
    fn apply(&self, envelope: &EventEnvelope<Self::Ev>) -> Result<(), Self::Error>;
}
