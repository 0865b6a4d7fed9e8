//! Petclinic Core Library
//!
//! Visit scheduling for a veterinary clinic with automatic nurse assignment.
//!
//! # Architecture
//!
//! ```text
//!   save_visit ──► ┌──────────── transaction ────────────┐
//!                  │ visit number ◄── sequences           │
//!                  │ INSERT visits                        │
//!                  │ INSERT change_events (created)       │
//!                  └──────────────────┬───────────────────┘
//!                                     │ commit
//!                                     ▼
//!                          PostCommitDispatcher
//!                                     │
//!                                     ▼
//!                         NurseAssignmentEngine
//!              re-fetch → guard → overlap query → busy set
//!                      → first free nurse in roster order
//!                                     │
//!                  ┌──────────────────▼───────────────────┐
//!                  │  new transaction: UPDATE visits      │
//!                  └──────────────────────────────────────┘
//! ```
//!
//! # Core Principle
//!
//! **Automatic assignment never breaks visit creation.** Engine failures are
//! logged and the visit simply stays unassigned.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer (visits, staff, pets, sequences, outbox)
//! - [`models`]: Domain types (Visit, Staff, Pet, VisitInterval, ...)
//! - [`numbering`]: Visit number generation
//! - [`assignment`]: Nurse assignment engine and its storage traits
//! - [`events`]: Post-commit change dispatch
//! - [`service`]: Visit lifecycle entry point
//! - [`config`]: JSON configuration

pub mod assignment;
pub mod config;
pub mod db;
pub mod events;
pub mod models;
pub mod numbering;
pub mod service;

// Re-export commonly used types
pub use assignment::{AssignmentOutcome, NurseAssignmentEngine, NurseRoster, VisitStore};
pub use config::{AssignmentConfig, ClinicConfig};
pub use db::Database;
pub use events::{ChangeListener, PostCommitDispatcher};
pub use models::{
    ChangeType, EntityChangedEvent, HealthStatus, Pet, Staff, StaffRole, TreatmentStatus, Visit,
    VisitInterval, VisitType,
};
pub use numbering::{SequenceSource, VisitNumberGenerator};
pub use service::{ClinicService, ServiceError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::NaiveDateTime;
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PetClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for PetClinicError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => PetClinicError::NotFound(what),
            other => PetClinicError::DatabaseError(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for PetClinicError {
    fn from(e: config::ConfigError) -> Self {
        PetClinicError::ConfigError(e.to_string())
    }
}

impl From<ServiceError> for PetClinicError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Database(db_error) => db_error.into(),
            ServiceError::Config(config_error) => config_error.into(),
            ServiceError::InvalidVisit(msg) => PetClinicError::InvalidInput(msg),
            ServiceError::NotFound(what) => PetClinicError::NotFound(what),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for PetClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PetClinicError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_datetime(field: &str, value: &str) -> Result<NaiveDateTime, PetClinicError> {
    value
        .parse::<NaiveDateTime>()
        .map_err(|e| PetClinicError::InvalidInput(format!("{} '{}': {}", field, value, e)))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path with default settings.
#[uniffi::export]
pub fn open_clinic(path: String) -> Result<Arc<PetClinicCore>, PetClinicError> {
    let config = ClinicConfig {
        database_path: Some(path),
        ..ClinicConfig::default()
    };
    open_with_config(&config)
}

/// Open a clinic from a JSON configuration string.
#[uniffi::export]
pub fn open_clinic_with_config(config_json: String) -> Result<Arc<PetClinicCore>, PetClinicError> {
    let config = ClinicConfig::from_json(&config_json)?;
    open_with_config(&config)
}

/// Create an in-memory clinic (for testing).
#[uniffi::export]
pub fn open_clinic_in_memory() -> Result<Arc<PetClinicCore>, PetClinicError> {
    open_with_config(&ClinicConfig::default())
}

fn open_with_config(config: &ClinicConfig) -> Result<Arc<PetClinicCore>, PetClinicError> {
    let service = ClinicService::open(config)?;
    Ok(Arc::new(PetClinicCore {
        service: Arc::new(Mutex::new(service)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe service wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PetClinicCore {
    service: Arc<Mutex<ClinicService>>,
}

#[uniffi::export]
impl PetClinicCore {
    // =========================================================================
    // Staff Operations
    // =========================================================================

    /// Add a nurse to the end of the roster.
    pub fn add_nurse(
        &self,
        username: String,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<FfiStaff, PetClinicError> {
        let service = self.service.lock()?;
        let mut nurse = Staff::nurse(username);
        nurse.first_name = first_name;
        nurse.last_name = last_name;
        service.add_staff(&nurse)?;
        Ok(nurse.into())
    }

    /// List nurses in roster order.
    pub fn list_nurses(&self) -> Result<Vec<FfiStaff>, PetClinicError> {
        let service = self.service.lock()?;
        let nurses = service.nurses()?;
        Ok(nurses.into_iter().map(|n| n.into()).collect())
    }

    // =========================================================================
    // Pet Operations
    // =========================================================================

    /// Register a new pet.
    pub fn create_pet(
        &self,
        name: String,
        identification_number: String,
        owner_name: Option<String>,
    ) -> Result<FfiPet, PetClinicError> {
        let service = self.service.lock()?;
        let mut pet = Pet::new(name, identification_number);
        pet.owner_name = owner_name;
        service.add_pet(&pet)?;
        Ok(pet.into())
    }

    // =========================================================================
    // Visit Operations
    // =========================================================================

    /// Create a visit. A nurse is assigned automatically when none is given
    /// and one is free.
    pub fn create_visit(&self, visit: FfiNewVisit) -> Result<FfiVisit, PetClinicError> {
        let service = self.service.lock()?;
        let visit_type = VisitType::parse(&visit.visit_type).ok_or_else(|| {
            PetClinicError::InvalidInput(format!("Unknown visit type: {}", visit.visit_type))
        })?;
        let start = parse_datetime("visit_start", &visit.visit_start)?;

        let mut new_visit = match visit.visit_end {
            Some(end) => Visit::new(visit_type, start, parse_datetime("visit_end", &end)?),
            None => Visit::starting_at(visit_type, start),
        };
        new_visit.pet_id = visit.pet_id;
        new_visit.description = visit.description;
        new_visit.assigned_nurse = match visit.assigned_nurse_id {
            Some(id) => Some(
                service
                    .db()
                    .get_staff(&id)?
                    .ok_or_else(|| PetClinicError::NotFound(format!("staff {}", id)))?,
            ),
            None => None,
        };

        let saved = service.save_visit(&mut new_visit)?;
        Ok(saved.into())
    }

    /// Get a visit by ID.
    pub fn get_visit(&self, visit_id: String) -> Result<FfiVisit, PetClinicError> {
        let service = self.service.lock()?;
        Ok(service.get_visit(&visit_id)?.into())
    }

    /// Manually assign a nurse, or clear the assignment with `None`.
    pub fn assign_nurse(
        &self,
        visit_id: String,
        staff_id: Option<String>,
    ) -> Result<FfiVisit, PetClinicError> {
        let service = self.service.lock()?;
        Ok(service.assign_nurse(&visit_id, staff_id.as_deref())?.into())
    }

    /// Delete a visit.
    pub fn delete_visit(&self, visit_id: String) -> Result<bool, PetClinicError> {
        let service = self.service.lock()?;
        Ok(service.delete_visit(&visit_id)?)
    }

    /// Visits intersecting `[start, end)`.
    pub fn list_visits_between(
        &self,
        start: String,
        end: String,
    ) -> Result<Vec<FfiVisit>, PetClinicError> {
        let service = self.service.lock()?;
        let visits = service.visits_between(
            parse_datetime("start", &start)?,
            parse_datetime("end", &end)?,
        )?;
        Ok(visits.into_iter().map(|v| v.into()).collect())
    }

    /// Visits still waiting for a nurse.
    pub fn list_unassigned_visits(&self) -> Result<Vec<FfiVisit>, PetClinicError> {
        let service = self.service.lock()?;
        let visits = service.unassigned_visits()?;
        Ok(visits.into_iter().map(|v| v.into()).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe staff member.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStaff {
    pub staff_id: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
}

impl From<Staff> for FfiStaff {
    fn from(staff: Staff) -> Self {
        Self {
            display_name: staff.display_name(),
            role: staff.role.as_str().to_string(),
            staff_id: staff.staff_id,
            username: staff.username,
        }
    }
}

/// FFI-safe pet.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPet {
    pub pet_id: String,
    pub name: String,
    pub identification_number: String,
    pub owner_name: Option<String>,
}

impl From<Pet> for FfiPet {
    fn from(pet: Pet) -> Self {
        Self {
            pet_id: pet.pet_id,
            name: pet.name,
            identification_number: pet.identification_number,
            owner_name: pet.owner_name,
        }
    }
}

/// FFI-safe visit creation request. Timestamps are ISO-8601 local times
/// (`2024-05-01T13:00:00`).
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewVisit {
    pub visit_type: String,
    pub visit_start: String,
    /// Derived from the visit type when omitted
    pub visit_end: Option<String>,
    pub pet_id: Option<String>,
    pub description: Option<String>,
    pub assigned_nurse_id: Option<String>,
}

/// FFI-safe visit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisit {
    pub visit_id: String,
    pub visit_number: String,
    pub visit_type: String,
    pub visit_start: String,
    pub visit_end: String,
    pub pet_id: Option<String>,
    pub description: Option<String>,
    pub treatment_status: String,
    pub assigned_nurse: Option<FfiStaff>,
}

impl From<Visit> for FfiVisit {
    fn from(visit: Visit) -> Self {
        Self {
            visit_id: visit.visit_id,
            visit_number: visit.visit_number.unwrap_or_default(),
            visit_type: visit.visit_type.as_str().to_string(),
            visit_start: visit.visit_start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            visit_end: visit.visit_end.format("%Y-%m-%dT%H:%M:%S").to_string(),
            pet_id: visit.pet_id,
            description: visit.description,
            treatment_status: visit.treatment_status.as_str().to_string(),
            assigned_nurse: visit.assigned_nurse.map(|n| n.into()),
        }
    }
}
