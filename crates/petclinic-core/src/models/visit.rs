//! Visit models.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::interval::VisitInterval;
use super::staff::Staff;

/// Kind of visit. Determines the default duration and description template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VisitType {
    RegularCheckup,
    Recharge,
    StatusConditionHealing,
    DiseaseTreatment,
    Other,
}

impl VisitType {
    /// Default length of a visit of this type.
    pub fn default_duration(&self) -> Duration {
        match self {
            VisitType::RegularCheckup => Duration::minutes(30),
            VisitType::Recharge => Duration::minutes(180),
            VisitType::StatusConditionHealing
            | VisitType::DiseaseTreatment
            | VisitType::Other => Duration::minutes(60),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisitType::RegularCheckup => "regular_checkup",
            VisitType::Recharge => "recharge",
            VisitType::StatusConditionHealing => "status_condition_healing",
            VisitType::DiseaseTreatment => "disease_treatment",
            VisitType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "regular_checkup" => Some(VisitType::RegularCheckup),
            "recharge" => Some(VisitType::Recharge),
            "status_condition_healing" => Some(VisitType::StatusConditionHealing),
            "disease_treatment" => Some(VisitType::DiseaseTreatment),
            "other" => Some(VisitType::Other),
            _ => None,
        }
    }

    /// Checklist template for the visit notes.
    pub fn default_description(&self, pet_name: &str, owner_name: &str) -> String {
        match self {
            VisitType::RegularCheckup => format!(
                "Regular Check-up Notes:\n\
                 - Temperature and heart rate measured from {pet}: Y/N\n\
                 - Vaccination status reviewed with {owner}: Y/N\n\
                 - Teeth and gums inspected from {pet}: Y/N\n\
                 - Overall condition recorded: Y/N\n\
                 - Follow-up discussion held with {owner}: Y/N\n",
                pet = pet_name,
                owner = owner_name
            ),
            VisitType::Recharge => format!(
                "Recharge Visit Notes:\n\
                 - Fluids and electrolytes replenished for {pet}: Y/N\n\
                 - Supplements provided as needed: Y/N\n\
                 - Post-recharge behavior observed in {pet}: Y/N\n\
                 - Recovery instructions shared with {owner}: Y/N\n",
                pet = pet_name,
                owner = owner_name
            ),
            VisitType::StatusConditionHealing => format!(
                "Healing Progress Notes:\n\
                 - Healing progress assessed for {pet}: Y/N\n\
                 - Signs of infection or inflammation checked: Y/N\n\
                 - Treatment plan adjusted if necessary: Y/N\n\
                 - Condition progress discussed with {owner}: Y/N\n",
                pet = pet_name,
                owner = owner_name
            ),
            VisitType::DiseaseTreatment => format!(
                "Disease Treatment Notes:\n\
                 - Prescribed medications administered to {pet}: Y/N\n\
                 - Vital signs monitored for {pet}: Y/N\n\
                 - Side effects and patient response recorded: Y/N\n\
                 - Treatment outcomes reviewed with {owner}: Y/N\n",
                pet = pet_name,
                owner = owner_name
            ),
            VisitType::Other => format!(
                "General Visit Notes:\n\
                 - Concerns discussed with {owner}: Y/N\n\
                 - Unusual observations about {pet} recorded: Y/N\n\
                 - Follow-up recommendations provided: Y/N\n",
                pet = pet_name,
                owner = owner_name
            ),
        }
    }
}

/// Treatment progress of a visit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TreatmentStatus {
    Upcoming,
    InProgress,
    Done,
}

impl TreatmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentStatus::Upcoming => "upcoming",
            TreatmentStatus::InProgress => "in_progress",
            TreatmentStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upcoming" => Some(TreatmentStatus::Upcoming),
            "in_progress" => Some(TreatmentStatus::InProgress),
            "done" => Some(TreatmentStatus::Done),
            _ => None,
        }
    }
}

/// A scheduled clinic appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visit {
    /// Unique visit ID, immutable
    pub visit_id: String,
    /// Display label `V-<year>-<sequence>`, set once on first save
    pub visit_number: Option<String>,
    /// Pet being treated
    pub pet_id: Option<String>,
    pub visit_type: VisitType,
    /// Inclusive start
    pub visit_start: NaiveDateTime,
    /// Exclusive end
    pub visit_end: NaiveDateTime,
    /// Free-text notes
    pub description: Option<String>,
    pub treatment_status: TreatmentStatus,
    /// Nurse in charge; `None` means unassigned
    pub assigned_nurse: Option<Staff>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Visit {
    /// Create a new, unsaved visit over `[visit_start, visit_end)`.
    pub fn new(visit_type: VisitType, visit_start: NaiveDateTime, visit_end: NaiveDateTime) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            visit_id: uuid::Uuid::new_v4().to_string(),
            visit_number: None,
            pet_id: None,
            visit_type,
            visit_start,
            visit_end,
            description: None,
            treatment_status: TreatmentStatus::Upcoming,
            assigned_nurse: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Create a visit whose end is derived from the type's default duration.
    pub fn starting_at(visit_type: VisitType, visit_start: NaiveDateTime) -> Self {
        Self::new(visit_type, visit_start, visit_start + visit_type.default_duration())
    }

    pub fn interval(&self) -> VisitInterval {
        VisitInterval::new(self.visit_start, self.visit_end)
    }

    pub fn overlaps(&self, other: &Visit) -> bool {
        self.interval().overlaps(&other.interval())
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_nurse.is_some()
    }

    pub fn assigned_nurse_id(&self) -> Option<&str> {
        self.assigned_nurse.as_ref().map(|n| n.staff_id.as_str())
    }

    /// Check whether the description is missing or whitespace only.
    pub fn has_blank_description(&self) -> bool {
        self.description
            .as_deref()
            .map_or(true, |d| d.trim().is_empty())
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
