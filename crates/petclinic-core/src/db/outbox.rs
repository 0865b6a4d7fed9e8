//! Change-event outbox operations.
//!
//! Events are written in the same transaction as the change they describe,
//! so an event becomes visible exactly when its change commits.

use rusqlite::params;

use super::{Database, DbError, DbResult};
use crate::models::{ChangeType, EntityChangedEvent};

impl Database {
    /// Record a change event. Returns the new event ID.
    pub fn record_change_event(
        &self,
        entity: &str,
        entity_id: &str,
        change_type: ChangeType,
    ) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO change_events (entity, entity_id, change_type, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                entity,
                entity_id,
                change_type.as_str(),
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Undelivered events, oldest first.
    pub fn list_pending_change_events(&self, limit: usize) -> DbResult<Vec<EntityChangedEvent>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT event_id, entity, entity_id, change_type, created_at
            FROM change_events
            WHERE delivered_at IS NULL
            ORDER BY event_id
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok(EventRow {
                event_id: row.get(0)?,
                entity: row.get(1)?,
                entity_id: row.get(2)?,
                change_type: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?.try_into()?);
        }
        Ok(events)
    }

    /// Claim an event for delivery.
    ///
    /// Returns `false` if another dispatcher already claimed it, which keeps
    /// delivery at most once per event even with several connections.
    pub fn claim_change_event(&self, event_id: i64) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE change_events SET delivered_at = ?2
            WHERE event_id = ?1 AND delivered_at IS NULL
            "#,
            params![event_id, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Number of events not yet delivered.
    pub fn count_pending_change_events(&self) -> DbResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM change_events WHERE delivered_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }
}

/// Intermediate row struct for database mapping.
struct EventRow {
    event_id: i64,
    entity: String,
    entity_id: String,
    change_type: String,
    created_at: String,
}

impl TryFrom<EventRow> for EntityChangedEvent {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let change_type = ChangeType::parse(&row.change_type).ok_or_else(|| {
            DbError::Constraint(format!("Unknown change type: {}", row.change_type))
        })?;

        Ok(EntityChangedEvent {
            event_id: row.event_id,
            entity: row.entity,
            entity_id: row.entity_id,
            change_type,
            created_at: row.created_at,
        })
    }
}
