//! Nurse assignment engine.

use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::config::AssignmentConfig;
use crate::db::{DbError, DbResult};
use crate::models::{EntityChangedEvent, Staff, Visit};

use super::{NurseRoster, VisitStore};

/// Result of handling one change event.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentOutcome {
    /// A nurse was assigned and saved
    Assigned { visit_id: String, nurse: Staff },
    /// The visit already had a nurse; nothing was written
    AlreadyAssigned { visit_id: String, nurse_id: String },
    /// Every roster nurse is busy during the visit
    NoNurseAvailable { visit_id: String },
    /// Not a visit creation, or the engine is disabled
    Ignored,
    /// An error was logged and swallowed; the visit stays as created
    Failed { visit_id: String, error: String },
}

impl AssignmentOutcome {
    pub fn assigned_nurse(&self) -> Option<&Staff> {
        match self {
            AssignmentOutcome::Assigned { nurse, .. } => Some(nurse),
            _ => None,
        }
    }
}

/// Nurse IDs assigned to any of `visits`.
pub fn busy_nurse_ids(visits: &[Visit]) -> HashSet<String> {
    visits
        .iter()
        .filter_map(|visit| visit.assigned_nurse_id())
        .map(str::to_string)
        .collect()
}

/// First nurse in roster order that is not busy.
///
/// Roster order is the only tie-break: the same roster and busy set always
/// produce the same nurse.
pub fn select_available_nurse<'a>(roster: &'a [Staff], busy: &HashSet<String>) -> Option<&'a Staff> {
    roster.iter().find(|nurse| !busy.contains(&nurse.staff_id))
}

/// Assigns a free nurse to newly created, unassigned visits.
///
/// Runs after the creating transaction commits. Its own writes happen in a
/// separate transaction, and its failures never reach the creator.
#[derive(Debug, Clone, Default)]
pub struct NurseAssignmentEngine {
    config: AssignmentConfig,
}

impl NurseAssignmentEngine {
    pub fn new(config: AssignmentConfig) -> Self {
        Self { config }
    }

    /// Handle a committed change event.
    ///
    /// Only visit creations are processed. Errors are logged and reported as
    /// [`AssignmentOutcome::Failed`], never propagated.
    pub fn on_visit_changed<S>(&self, store: &S, event: &EntityChangedEvent) -> AssignmentOutcome
    where
        S: VisitStore + NurseRoster,
    {
        if !self.config.enabled || !event.is_visit_creation() {
            return AssignmentOutcome::Ignored;
        }

        match self.assign(store, &event.entity_id) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(visit_id = %event.entity_id, error = %e, "Error automatically assigning nurse to visit");
                AssignmentOutcome::Failed {
                    visit_id: event.entity_id.clone(),
                    error: e.to_string(),
                }
            }
        }
    }

    /// Assign a nurse to `visit_id` if it has none.
    pub fn assign<S>(&self, store: &S, visit_id: &str) -> DbResult<AssignmentOutcome>
    where
        S: VisitStore + NurseRoster,
    {
        // Fresh read: the event only carries the ID
        let mut visit = store.load_visit(visit_id)?;

        if let Some(nurse) = &visit.assigned_nurse {
            info!(visit_id, nurse = %nurse, "Nurse already assigned to visit, no automatic assignment needed");
            return Ok(AssignmentOutcome::AlreadyAssigned {
                visit_id: visit_id.to_string(),
                nurse_id: nurse.staff_id.clone(),
            });
        }

        let window = self
            .config
            .buffer()
            .and_then(|buffer| visit.interval().padded(buffer))
            .ok_or_else(|| {
                DbError::Constraint(format!(
                    "Turnaround buffer of {} minutes is out of range",
                    self.config.buffer_minutes
                ))
            })?;
        let overlapping = store.query_overlapping(&window)?;
        let busy = busy_nurse_ids(&overlapping);
        debug!(
            visit_id,
            overlapping = overlapping.len(),
            busy = busy.len(),
            "Computed busy nurses"
        );

        let roster = store.find_all_nurses()?;
        let Some(nurse) = select_available_nurse(&roster, &busy) else {
            warn!(visit_id, roster = roster.len(), "No nurse available for visit");
            return Ok(AssignmentOutcome::NoNurseAvailable {
                visit_id: visit_id.to_string(),
            });
        };

        info!(
            visit_id,
            visit_number = visit.visit_number.as_deref().unwrap_or("-"),
            nurse = %nurse,
            "Available nurse found, assigning nurse to visit"
        );
        visit.assigned_nurse = Some(nurse.clone());
        visit.touch();
        store.save_visit(&visit)?;

        Ok(AssignmentOutcome::Assigned {
            visit_id: visit_id.to_string(),
            nurse: nurse.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChangeType, VisitInterval, VisitType, VISIT_ENTITY};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::cell::{Cell, RefCell};

    /// In-memory store with switchable failures.
    #[derive(Default)]
    struct MemoryStore {
        visits: RefCell<Vec<Visit>>,
        nurses: Vec<Staff>,
        fail_query: bool,
        fail_save: bool,
        saves: Cell<usize>,
    }

    impl VisitStore for MemoryStore {
        fn load_visit(&self, visit_id: &str) -> DbResult<Visit> {
            self.visits
                .borrow()
                .iter()
                .find(|v| v.visit_id == visit_id)
                .cloned()
                .ok_or_else(|| DbError::NotFound(visit_id.to_string()))
        }

        fn query_overlapping(&self, interval: &VisitInterval) -> DbResult<Vec<Visit>> {
            if self.fail_query {
                return Err(DbError::Sqlite(rusqlite::Error::InvalidQuery));
            }
            Ok(self
                .visits
                .borrow()
                .iter()
                .filter(|v| v.interval().overlaps(interval))
                .cloned()
                .collect())
        }

        fn save_visit(&self, visit: &Visit) -> DbResult<Visit> {
            if self.fail_save {
                return Err(DbError::Sqlite(rusqlite::Error::InvalidQuery));
            }
            self.saves.set(self.saves.get() + 1);
            let mut visits = self.visits.borrow_mut();
            let slot = visits
                .iter_mut()
                .find(|v| v.visit_id == visit.visit_id)
                .ok_or_else(|| DbError::NotFound(visit.visit_id.clone()))?;
            *slot = visit.clone();
            Ok(visit.clone())
        }
    }

    impl NurseRoster for MemoryStore {
        fn find_all_nurses(&self) -> DbResult<Vec<Staff>> {
            Ok(self.nurses.clone())
        }
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn visit(start: NaiveDateTime, end: NaiveDateTime, nurse: Option<&Staff>) -> Visit {
        let mut visit = Visit::new(VisitType::RegularCheckup, start, end);
        visit.assigned_nurse = nurse.cloned();
        visit
    }

    fn created(visit: &Visit) -> EntityChangedEvent {
        EntityChangedEvent {
            event_id: 1,
            entity: VISIT_ENTITY.into(),
            entity_id: visit.visit_id.clone(),
            change_type: ChangeType::Created,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn store_with(nurses: Vec<Staff>, visits: Vec<Visit>) -> MemoryStore {
        MemoryStore {
            visits: RefCell::new(visits),
            nurses,
            ..Default::default()
        }
    }

    #[test]
    fn test_busy_set_skips_unassigned() {
        let joy = Staff::nurse("joy");
        let visits = vec![
            visit(at(9, 0), at(9, 30), Some(&joy)),
            visit(at(9, 0), at(9, 30), None),
            visit(at(9, 10), at(9, 40), Some(&joy)),
        ];
        let busy = busy_nurse_ids(&visits);
        assert_eq!(busy.len(), 1);
        assert!(busy.contains(&joy.staff_id));
    }

    #[test]
    fn test_select_follows_roster_order() {
        let joy = Staff::nurse("joy");
        let comfey = Staff::nurse("comfey");
        let roster = vec![joy.clone(), comfey.clone()];

        assert_eq!(select_available_nurse(&roster, &HashSet::new()), Some(&joy));

        let busy: HashSet<String> = [joy.staff_id.clone()].into_iter().collect();
        assert_eq!(select_available_nurse(&roster, &busy), Some(&comfey));

        let all: HashSet<String> = roster.iter().map(|n| n.staff_id.clone()).collect();
        assert_eq!(select_available_nurse(&roster, &all), None);
        assert_eq!(select_available_nurse(&[], &HashSet::new()), None);
    }

    #[test]
    fn test_assigns_free_nurse() {
        let joy = Staff::nurse("joy");
        let comfey = Staff::nurse("comfey");
        let booked = visit(at(13, 0), at(13, 30), Some(&joy));
        let new_visit = visit(at(13, 15), at(13, 45), None);
        let store = store_with(vec![joy, comfey.clone()], vec![booked, new_visit.clone()]);

        let outcome = NurseAssignmentEngine::default().on_visit_changed(&store, &created(&new_visit));

        assert_eq!(outcome.assigned_nurse(), Some(&comfey));
        let stored = store.load_visit(&new_visit.visit_id).unwrap();
        assert_eq!(stored.assigned_nurse, Some(comfey));
    }

    #[test]
    fn test_already_assigned_is_noop() {
        let joy = Staff::nurse("joy");
        let comfey = Staff::nurse("comfey");
        let manual = visit(at(13, 0), at(13, 30), Some(&comfey));
        let store = store_with(vec![joy, comfey.clone()], vec![manual.clone()]);

        let outcome = NurseAssignmentEngine::default().on_visit_changed(&store, &created(&manual));

        assert!(matches!(
            outcome,
            AssignmentOutcome::AlreadyAssigned { ref nurse_id, .. } if *nurse_id == comfey.staff_id
        ));
        assert_eq!(store.saves.get(), 0);
    }

    #[test]
    fn test_repeated_delivery_assigns_once() {
        let joy = Staff::nurse("joy");
        let new_visit = visit(at(13, 0), at(13, 30), None);
        let store = store_with(vec![joy.clone()], vec![new_visit.clone()]);
        let engine = NurseAssignmentEngine::default();
        let event = created(&new_visit);

        assert!(matches!(engine.on_visit_changed(&store, &event), AssignmentOutcome::Assigned { .. }));
        assert!(matches!(engine.on_visit_changed(&store, &event), AssignmentOutcome::AlreadyAssigned { .. }));
        assert_eq!(store.saves.get(), 1);
    }

    #[test]
    fn test_all_busy_leaves_unassigned() {
        let joy = Staff::nurse("joy");
        let comfey = Staff::nurse("comfey");
        let new_visit = visit(at(13, 15), at(13, 45), None);
        let store = store_with(
            vec![joy.clone(), comfey.clone()],
            vec![
                visit(at(13, 0), at(13, 30), Some(&joy)),
                visit(at(13, 0), at(13, 30), Some(&comfey)),
                new_visit.clone(),
            ],
        );

        let outcome = NurseAssignmentEngine::default().on_visit_changed(&store, &created(&new_visit));

        assert!(matches!(outcome, AssignmentOutcome::NoNurseAvailable { .. }));
        assert!(store.load_visit(&new_visit.visit_id).unwrap().assigned_nurse.is_none());
        assert_eq!(store.saves.get(), 0);
    }

    #[test]
    fn test_empty_roster_is_not_an_error() {
        let new_visit = visit(at(13, 0), at(13, 30), None);
        let store = store_with(vec![], vec![new_visit.clone()]);

        let outcome = NurseAssignmentEngine::default().on_visit_changed(&store, &created(&new_visit));
        assert!(matches!(outcome, AssignmentOutcome::NoNurseAvailable { .. }));
    }

    #[test]
    fn test_buffer_blocks_back_to_back() {
        let joy = Staff::nurse("joy");
        let comfey = Staff::nurse("comfey");
        let new_visit = visit(at(13, 30), at(14, 0), None);
        let visits = vec![visit(at(13, 0), at(13, 30), Some(&joy)), new_visit.clone()];

        let strict = store_with(vec![joy.clone(), comfey.clone()], visits.clone());
        let outcome = NurseAssignmentEngine::default().on_visit_changed(&strict, &created(&new_visit));
        assert_eq!(outcome.assigned_nurse(), Some(&joy));

        let buffered = store_with(vec![joy, comfey.clone()], visits);
        let engine = NurseAssignmentEngine::new(AssignmentConfig {
            enabled: true,
            buffer_minutes: 10,
        });
        let outcome = engine.on_visit_changed(&buffered, &created(&new_visit));
        assert_eq!(outcome.assigned_nurse(), Some(&comfey));
    }

    #[test]
    fn test_out_of_range_buffer_fails_without_panic() {
        let joy = Staff::nurse("joy");
        let new_visit = visit(at(13, 0), at(13, 30), None);
        let store = store_with(vec![joy], vec![new_visit.clone()]);

        for buffer_minutes in [1_000_000_000_000, i64::MAX] {
            let engine = NurseAssignmentEngine::new(AssignmentConfig {
                enabled: true,
                buffer_minutes,
            });
            assert!(matches!(
                engine.on_visit_changed(&store, &created(&new_visit)),
                AssignmentOutcome::Failed { .. }
            ));
        }
        assert_eq!(store.saves.get(), 0);
    }

    #[test]
    fn test_ignores_other_change_types() {
        let joy = Staff::nurse("joy");
        let new_visit = visit(at(13, 0), at(13, 30), None);
        let store = store_with(vec![joy], vec![new_visit.clone()]);
        let engine = NurseAssignmentEngine::default();

        for change_type in [ChangeType::Updated, ChangeType::Deleted] {
            let mut event = created(&new_visit);
            event.change_type = change_type;
            assert_eq!(engine.on_visit_changed(&store, &event), AssignmentOutcome::Ignored);
        }

        let mut other_entity = created(&new_visit);
        other_entity.entity = "pet".into();
        assert_eq!(engine.on_visit_changed(&store, &other_entity), AssignmentOutcome::Ignored);
        assert_eq!(store.saves.get(), 0);
    }

    #[test]
    fn test_disabled_engine_does_nothing() {
        let joy = Staff::nurse("joy");
        let new_visit = visit(at(13, 0), at(13, 30), None);
        let store = store_with(vec![joy], vec![new_visit.clone()]);
        let engine = NurseAssignmentEngine::new(AssignmentConfig {
            enabled: false,
            buffer_minutes: 0,
        });

        assert_eq!(engine.on_visit_changed(&store, &created(&new_visit)), AssignmentOutcome::Ignored);
        assert_eq!(store.saves.get(), 0);
    }

    #[test]
    fn test_failures_are_swallowed() {
        let joy = Staff::nurse("joy");
        let new_visit = visit(at(13, 0), at(13, 30), None);
        let engine = NurseAssignmentEngine::default();

        // Missing visit
        let empty = store_with(vec![joy.clone()], vec![]);
        assert!(matches!(
            engine.on_visit_changed(&empty, &created(&new_visit)),
            AssignmentOutcome::Failed { .. }
        ));

        // Query failure
        let mut failing_query = store_with(vec![joy.clone()], vec![new_visit.clone()]);
        failing_query.fail_query = true;
        assert!(matches!(
            engine.on_visit_changed(&failing_query, &created(&new_visit)),
            AssignmentOutcome::Failed { .. }
        ));

        // Save failure leaves the visit unassigned
        let mut failing_save = store_with(vec![joy], vec![new_visit.clone()]);
        failing_save.fail_save = true;
        let outcome = engine.on_visit_changed(&failing_save, &created(&new_visit));
        assert!(matches!(outcome, AssignmentOutcome::Failed { ref visit_id, .. } if *visit_id == new_visit.visit_id));
        assert!(failing_save
            .load_visit(&new_visit.visit_id)
            .unwrap()
            .assigned_nurse
            .is_none());
    }
}
