//! Post-commit change dispatch.
//!
//! Changes record an event row inside their own transaction (see
//! `db::outbox`). Once that transaction has committed, [`PostCommitDispatcher`]
//! drains the pending rows and hands each event to every listener. Each
//! event is claimed before delivery, so it reaches the listeners at most
//! once even when several connections drain the same database.

use tracing::debug;

use crate::assignment::NurseAssignmentEngine;
use crate::db::{Database, DbResult};
use crate::models::EntityChangedEvent;

/// Events fetched per round trip.
const DISPATCH_BATCH_SIZE: usize = 64;

/// Receives committed change events.
///
/// Listeners run outside the originating transaction and must handle their
/// own failures; nothing they do can undo the change that produced the event.
pub trait ChangeListener {
    fn name(&self) -> &str;

    fn on_committed(&self, db: &Database, event: &EntityChangedEvent);
}

impl ChangeListener for NurseAssignmentEngine {
    fn name(&self) -> &str {
        "nurse_assignment"
    }

    fn on_committed(&self, db: &Database, event: &EntityChangedEvent) {
        let outcome = self.on_visit_changed(db, event);
        debug!(event_id = event.event_id, ?outcome, "Nurse assignment handled event");
    }
}

/// Delivers committed change events to registered listeners.
#[derive(Default)]
pub struct PostCommitDispatcher {
    listeners: Vec<Box<dyn ChangeListener + Send>>,
}

impl PostCommitDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Box<dyn ChangeListener + Send>) {
        self.listeners.push(listener);
    }

    /// Deliver every pending event, including ones raised by listeners while
    /// draining. Returns the number of events delivered.
    ///
    /// Must be called with no transaction open on `db`.
    pub fn drain(&self, db: &Database) -> DbResult<usize> {
        let mut delivered = 0;

        loop {
            let pending = db.list_pending_change_events(DISPATCH_BATCH_SIZE)?;
            if pending.is_empty() {
                break;
            }

            for event in &pending {
                if !db.claim_change_event(event.event_id)? {
                    continue;
                }
                debug!(
                    event_id = event.event_id,
                    entity = %event.entity,
                    entity_id = %event.entity_id,
                    change_type = event.change_type.as_str(),
                    "Dispatching committed change"
                );
                for listener in &self.listeners {
                    debug!(event_id = event.event_id, listener = listener.name(), "Notifying listener");
                    listener.on_committed(db, event);
                }
                delivered += 1;
            }
        }

        Ok(delivered)
    }
}
