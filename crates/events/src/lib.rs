//! Ledger change events and the projection boundary.
//!
//! Every mutation of the ledger is described by an event wrapped in an envelope that
//! carries the ledger revision it was committed at. Projections (cached balances) are
//! pure consumers of those envelopes and can be rebuilt from the ledger at any time.

pub mod envelope;
pub mod event;
pub mod projection;

pub use envelope::EventEnvelope;
pub use event::Event;
pub use projection::Projection;
