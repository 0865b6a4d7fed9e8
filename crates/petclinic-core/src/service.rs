//! Clinic service: the entry point for visit changes.
//!
//! Every visit change runs in one transaction together with its numbering
//! and its outbox event. After commit the service drains the outbox, which
//! is where automatic nurse assignment happens.

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{error, info};

use crate::assignment::{NurseAssignmentEngine, VisitStore};
use crate::config::{ClinicConfig, ConfigError};
use crate::db::{Database, DbError};
use crate::events::{ChangeListener, PostCommitDispatcher};
use crate::models::{ChangeType, Pet, Staff, Visit, VISIT_ENTITY};
use crate::numbering::VisitNumberGenerator;

/// Fallbacks for the default description when the pet is unknown.
const UNKNOWN_PET: &str = "the pet";
const UNKNOWN_OWNER: &str = "the pet owner";

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid visit: {0}")]
    InvalidVisit(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Visit lifecycle orchestration over a [`Database`].
pub struct ClinicService {
    db: Database,
    numbering: VisitNumberGenerator,
    dispatcher: PostCommitDispatcher,
}

impl ClinicService {
    /// Open the configured database and deliver any events left pending by
    /// an earlier run.
    pub fn open(config: &ClinicConfig) -> ServiceResult<Self> {
        config.validate()?;
        let db = match &config.database_path {
            Some(path) => Database::open(path)?,
            None => Database::open_in_memory()?,
        };
        let service = Self::new(db, config);
        service.dispatch_committed();
        Ok(service)
    }

    /// Wrap an open database. The assignment engine is registered as the
    /// first listener.
    pub fn new(db: Database, config: &ClinicConfig) -> Self {
        let mut dispatcher = PostCommitDispatcher::new();
        dispatcher.register(Box::new(NurseAssignmentEngine::new(config.assignment.clone())));
        Self {
            db,
            numbering: VisitNumberGenerator::new(config.visit_number_sequence.clone()),
            dispatcher,
        }
    }

    /// Register an additional post-commit listener.
    pub fn register_listener(&mut self, listener: Box<dyn ChangeListener + Send>) {
        self.dispatcher.register(listener);
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Staff & Pets
    // =========================================================================

    pub fn add_staff(&self, staff: &Staff) -> ServiceResult<()> {
        self.db.insert_staff(staff)?;
        Ok(())
    }

    /// Nurses in roster order.
    pub fn nurses(&self) -> ServiceResult<Vec<Staff>> {
        Ok(self.db.list_nurses()?)
    }

    pub fn add_pet(&self, pet: &Pet) -> ServiceResult<()> {
        self.db.insert_pet(pet)?;
        Ok(())
    }

    // =========================================================================
    // Visits
    // =========================================================================

    /// Create or update a visit.
    ///
    /// New visits are numbered before the saving transaction opens, so a
    /// failed save still consumes its counter value. `visit` is only
    /// modified once the save has committed. The returned visit is re-read
    /// after post-commit dispatch, so it reflects any automatic assignment.
    pub fn save_visit(&self, visit: &mut Visit) -> ServiceResult<Visit> {
        if !visit.interval().is_valid() {
            return Err(ServiceError::InvalidVisit(format!(
                "visit_start {} must be before visit_end {}",
                visit.visit_start, visit.visit_end
            )));
        }
        if let Some(staff) = &visit.assigned_nurse {
            ensure_nurse(staff)?;
        }

        let mut numbered = visit.clone();
        if numbered.has_blank_description() {
            numbered.description = Some(self.default_description(&numbered)?);
        }

        let is_new = !self.db.visit_exists(&numbered.visit_id)?;
        self.numbering.assign_if_new(&self.db, &mut numbered, is_new)?;
        numbered.touch();

        self.db.in_transaction(|db| -> ServiceResult<()> {
            if is_new {
                db.insert_visit(&numbered)?;
                db.record_change_event(VISIT_ENTITY, &numbered.visit_id, ChangeType::Created)?;
            } else {
                db.update_visit(&numbered)?;
                db.record_change_event(VISIT_ENTITY, &numbered.visit_id, ChangeType::Updated)?;
            }
            Ok(())
        })?;
        *visit = numbered;

        if is_new {
            info!(visit_id = %visit.visit_id, visit_number = visit.visit_number.as_deref().unwrap_or("-"), "Visit created");
        }

        self.dispatch_committed();
        let fresh = self.get_visit(&visit.visit_id)?;
        *visit = fresh.clone();
        Ok(fresh)
    }

    /// Manually assign (or clear) the nurse of a visit.
    pub fn assign_nurse(&self, visit_id: &str, staff_id: Option<&str>) -> ServiceResult<Visit> {
        let mut visit = self.get_visit(visit_id)?;
        visit.assigned_nurse = match staff_id {
            Some(id) => {
                let staff = self
                    .db
                    .get_staff(id)?
                    .ok_or_else(|| ServiceError::NotFound(format!("staff {}", id)))?;
                ensure_nurse(&staff)?;
                Some(staff)
            }
            None => None,
        };
        visit.touch();
        let saved = self.db.save_visit(&visit)?;
        self.dispatch_committed();
        Ok(saved)
    }

    /// Delete a visit. Returns `false` if it did not exist.
    pub fn delete_visit(&self, visit_id: &str) -> ServiceResult<bool> {
        let deleted = self.db.in_transaction(|db| -> ServiceResult<bool> {
            if !db.delete_visit(visit_id)? {
                return Ok(false);
            }
            db.record_change_event(VISIT_ENTITY, visit_id, ChangeType::Deleted)?;
            Ok(true)
        })?;

        if deleted {
            self.dispatch_committed();
        }
        Ok(deleted)
    }

    pub fn get_visit(&self, visit_id: &str) -> ServiceResult<Visit> {
        self.db
            .get_visit(visit_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("visit {}", visit_id)))
    }

    /// Visits intersecting `[start, end)`.
    pub fn visits_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> ServiceResult<Vec<Visit>> {
        Ok(self.db.list_overlapping_visits(&start, &end)?)
    }

    pub fn unassigned_visits(&self) -> ServiceResult<Vec<Visit>> {
        Ok(self.db.list_unassigned_visits()?)
    }

    /// Deliver pending change events.
    ///
    /// Failures are logged only: the changes behind the events are already
    /// committed and stay committed.
    pub fn dispatch_committed(&self) -> usize {
        match self.dispatcher.drain(&self.db) {
            Ok(delivered) => delivered,
            Err(e) => {
                error!(error = %e, "Failed to dispatch committed changes");
                0
            }
        }
    }

    fn default_description(&self, visit: &Visit) -> ServiceResult<String> {
        let pet = match &visit.pet_id {
            Some(pet_id) => self.db.get_pet(pet_id)?,
            None => None,
        };
        let pet_name = pet.as_ref().map_or(UNKNOWN_PET, |p| p.name.as_str());
        let owner_name = pet
            .as_ref()
            .and_then(|p| p.owner_name.as_deref())
            .unwrap_or(UNKNOWN_OWNER);
        Ok(visit.visit_type.default_description(pet_name, owner_name))
    }
}

fn ensure_nurse(staff: &Staff) -> ServiceResult<()> {
    if staff.is_nurse() {
        Ok(())
    } else {
        Err(ServiceError::InvalidVisit(format!(
            "{} is a {}, not a nurse",
            staff,
            staff.role.as_str()
        )))
    }
}
