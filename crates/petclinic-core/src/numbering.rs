//! Human-readable visit numbers.
//!
//! Format: `V-<year of visit_start>-<counter>`, counter zero-padded to at
//! least six digits. The counter is shared across all years and never reset,
//! so numbers are unique and increasing but not necessarily contiguous.

use chrono::Datelike;
use tracing::debug;

use crate::db::{Database, DbResult};
use crate::models::Visit;

/// Default name of the shared visit counter.
pub const VISIT_NUMBER_SEQUENCE: &str = "visit_number";

/// Source of monotonically increasing counter values.
pub trait SequenceSource {
    /// Advance the named counter and return the new value. Values are never
    /// reused, even across processes.
    fn next_value(&self, name: &str) -> DbResult<i64>;
}

impl SequenceSource for Database {
    fn next_value(&self, name: &str) -> DbResult<i64> {
        self.next_sequence_value(name)
    }
}

/// Format a visit number.
pub fn format_visit_number(year: i32, sequence: i64) -> String {
    format!("V-{}-{:06}", year, sequence)
}

/// Assigns visit numbers to visits on their first save.
#[derive(Debug, Clone)]
pub struct VisitNumberGenerator {
    sequence_name: String,
}

impl Default for VisitNumberGenerator {
    fn default() -> Self {
        Self::new(VISIT_NUMBER_SEQUENCE)
    }
}

impl VisitNumberGenerator {
    pub fn new(sequence_name: impl Into<String>) -> Self {
        Self {
            sequence_name: sequence_name.into(),
        }
    }

    pub fn sequence_name(&self) -> &str {
        &self.sequence_name
    }

    /// Number `visit` if it is new, replacing any number the caller set.
    ///
    /// Returns `true` when a number was assigned. Consumes one counter value
    /// per assignment; a counter failure is returned so the surrounding save
    /// can abort.
    pub fn assign_if_new<S: SequenceSource>(
        &self,
        source: &S,
        visit: &mut Visit,
        is_new: bool,
    ) -> DbResult<bool> {
        if !is_new {
            return Ok(false);
        }

        let sequence = source.next_value(&self.sequence_name)?;
        let number = format_visit_number(visit.visit_start.year(), sequence);
        debug!(visit_id = %visit.visit_id, visit_number = %number, "Assigned visit number");
        visit.visit_number = Some(number);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::models::VisitType;
    use chrono::NaiveDate;
    use std::cell::Cell;

    struct FailingSequence;

    impl SequenceSource for FailingSequence {
        fn next_value(&self, _name: &str) -> DbResult<i64> {
            Err(DbError::Sqlite(rusqlite::Error::InvalidQuery))
        }
    }

    struct CountingSequence {
        calls: Cell<i64>,
    }

    impl SequenceSource for CountingSequence {
        fn next_value(&self, _name: &str) -> DbResult<i64> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.calls.get())
        }
    }

    fn visit_in(year: i32) -> Visit {
        let start = NaiveDate::from_ymd_opt(year, 3, 14)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        Visit::starting_at(VisitType::RegularCheckup, start)
    }

    #[test]
    fn test_format_pads_to_six_digits() {
        assert_eq!(format_visit_number(2024, 1), "V-2024-000001");
        assert_eq!(format_visit_number(2024, 123456), "V-2024-123456");
        assert_eq!(format_visit_number(2025, 1234567), "V-2025-1234567");
    }

    #[test]
    fn test_assigns_from_shared_counter() {
        let db = Database::open_in_memory().unwrap();
        let generator = VisitNumberGenerator::default();

        let mut first = visit_in(2024);
        let mut second = visit_in(2025);
        assert!(generator.assign_if_new(&db, &mut first, true).unwrap());
        assert!(generator.assign_if_new(&db, &mut second, true).unwrap());

        assert_eq!(first.visit_number.as_deref(), Some("V-2024-000001"));
        // Counter is not reset when the year changes
        assert_eq!(second.visit_number.as_deref(), Some("V-2025-000002"));
    }

    #[test]
    fn test_existing_visit_keeps_number() {
        let source = CountingSequence { calls: Cell::new(0) };
        let generator = VisitNumberGenerator::default();

        let mut visit = visit_in(2024);
        generator.assign_if_new(&source, &mut visit, true).unwrap();
        let number = visit.visit_number.clone();

        assert!(!generator.assign_if_new(&source, &mut visit, false).unwrap());
        assert_eq!(visit.visit_number, number);
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn test_new_visit_number_is_overwritten() {
        let source = CountingSequence { calls: Cell::new(0) };
        let generator = VisitNumberGenerator::default();

        let mut visit = visit_in(2024);
        visit.visit_number = Some("bogus".into());

        assert!(generator.assign_if_new(&source, &mut visit, true).unwrap());
        assert_eq!(visit.visit_number.as_deref(), Some("V-2024-000001"));
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn test_counter_failure_propagates() {
        let generator = VisitNumberGenerator::default();
        let mut visit = visit_in(2024);

        let result = generator.assign_if_new(&FailingSequence, &mut visit, true);
        assert!(result.is_err());
        assert!(visit.visit_number.is_none());
    }

    #[test]
    fn test_custom_sequence_name() {
        let db = Database::open_in_memory().unwrap();
        let generator = VisitNumberGenerator::new("branch_two_visits");

        let mut visit = visit_in(2024);
        generator.assign_if_new(&db, &mut visit, true).unwrap();

        assert_eq!(db.current_sequence_value("branch_two_visits").unwrap(), Some(1));
        assert_eq!(db.current_sequence_value(VISIT_NUMBER_SEQUENCE).unwrap(), None);
    }
}
