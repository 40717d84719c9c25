use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockledger_core::EntryId;

/// Envelope for a ledger event, carrying the ledger position it was committed at.
///
/// Notes:
/// - `revision` is the store-assigned ledger position of the mutation. It increases
///   with every append *and* every removal, so a removal is ordered after the append
///   it undoes.
/// - `entry_id` names the ledger entry the event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    entry_id: EntryId,

    /// Monotonically increasing ledger position.
    revision: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, entry_id: EntryId, revision: u64, payload: E) -> Self {
        Self {
            event_id,
            entry_id,
            revision,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_with_payload() {
        let entry_id = EntryId::new();
        let env = EventEnvelope::new(Uuid::now_v7(), entry_id, 7, "payload".to_string());
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["revision"], 7);
        assert_eq!(json["payload"], "payload");

        let back: EventEnvelope<String> = serde_json::from_value(json).unwrap();
        assert_eq!(back, env);
        assert_eq!(back.payload(), "payload");
    }
}
