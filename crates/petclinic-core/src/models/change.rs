//! Entity change notifications.

use serde::{Deserialize, Serialize};

/// Kind of committed change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Created => "created",
            ChangeType::Updated => "updated",
            ChangeType::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(ChangeType::Created),
            "updated" => Some(ChangeType::Updated),
            "deleted" => Some(ChangeType::Deleted),
            _ => None,
        }
    }
}

/// Name of the entity a change event refers to.
pub const VISIT_ENTITY: &str = "visit";

/// A change to an entity, delivered to listeners only after it commits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityChangedEvent {
    /// Outbox sequence number, assigned when the event is recorded
    pub event_id: i64,
    /// Entity name (e.g. "visit")
    pub entity: String,
    /// ID of the changed entity
    pub entity_id: String,
    pub change_type: ChangeType,
    /// Timestamp of the originating transaction
    pub created_at: String,
}

impl EntityChangedEvent {
    pub fn is_visit_creation(&self) -> bool {
        self.entity == VISIT_ENTITY && self.change_type == ChangeType::Created
    }
}
