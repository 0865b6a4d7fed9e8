//! Automatic nurse assignment.
//!
//! Pipeline: committed creation event → re-fetch → guard → overlap query →
//! busy set → roster scan → save in a fresh transaction
//!
//! The engine only talks to storage through [`VisitStore`] and
//! [`NurseRoster`], which [`Database`] implements.

mod engine;

pub use engine::*;

use crate::db::{Database, DbError, DbResult};
use crate::models::{ChangeType, Staff, Visit, VisitInterval, VISIT_ENTITY};

/// Visit persistence needed by the engine.
pub trait VisitStore {
    /// Load a visit with its assigned nurse. Missing visits are an error.
    fn load_visit(&self, visit_id: &str) -> DbResult<Visit>;

    /// All visits intersecting `interval` (strict half-open predicate), each
    /// with its assigned nurse populated.
    fn query_overlapping(&self, interval: &VisitInterval) -> DbResult<Vec<Visit>>;

    /// Persist an existing visit in its own transaction and return the
    /// stored state.
    fn save_visit(&self, visit: &Visit) -> DbResult<Visit>;
}

/// Read access to the nurse roster.
pub trait NurseRoster {
    /// All nurses, in an order that is stable across calls.
    fn find_all_nurses(&self) -> DbResult<Vec<Staff>>;
}

impl VisitStore for Database {
    fn load_visit(&self, visit_id: &str) -> DbResult<Visit> {
        self.get_visit(visit_id)?
            .ok_or_else(|| DbError::NotFound(format!("visit {}", visit_id)))
    }

    fn query_overlapping(&self, interval: &VisitInterval) -> DbResult<Vec<Visit>> {
        self.list_overlapping_visits(&interval.start, &interval.end)
    }

    fn save_visit(&self, visit: &Visit) -> DbResult<Visit> {
        self.in_transaction(|db| {
            if !db.update_visit(visit)? {
                return Err(DbError::NotFound(format!("visit {}", visit.visit_id)));
            }
            db.record_change_event(VISIT_ENTITY, &visit.visit_id, ChangeType::Updated)?;
            db.load_visit(&visit.visit_id)
        })
    }
}

impl NurseRoster for Database {
    fn find_all_nurses(&self) -> DbResult<Vec<Staff>> {
        self.list_nurses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitType;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_load_missing_visit_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.load_visit("missing"), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_save_records_update_event() {
        let db = Database::open_in_memory().unwrap();
        let joy = Staff::nurse("joy");
        db.insert_staff(&joy).unwrap();

        let mut visit = Visit::new(VisitType::Other, at(9, 0), at(10, 0));
        visit.visit_number = Some("V-2024-000001".into());
        db.insert_visit(&visit).unwrap();

        visit.assigned_nurse = Some(joy.clone());
        let saved = db.save_visit(&visit).unwrap();
        assert_eq!(saved.assigned_nurse, Some(joy));

        let events = db.list_pending_change_events(10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].change_type, ChangeType::Updated);
    }

    #[test]
    fn test_save_missing_visit_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let visit = Visit::new(VisitType::Other, at(9, 0), at(10, 0));

        assert!(matches!(db.save_visit(&visit), Err(DbError::NotFound(_))));
        assert_eq!(db.count_pending_change_events().unwrap(), 0);
    }

    #[test]
    fn test_query_overlapping_through_trait() {
        let db = Database::open_in_memory().unwrap();
        let mut visit = Visit::new(VisitType::Other, at(9, 0), at(10, 0));
        visit.visit_number = Some("V-2024-000001".into());
        db.insert_visit(&visit).unwrap();

        let hit = VisitInterval::new(at(9, 30), at(9, 45));
        let miss = VisitInterval::new(at(10, 0), at(10, 30));
        assert_eq!(db.query_overlapping(&hit).unwrap().len(), 1);
        assert!(db.query_overlapping(&miss).unwrap().is_empty());
    }
}
