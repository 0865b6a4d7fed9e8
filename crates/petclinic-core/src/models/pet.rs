//! Pet models.

use serde::{Deserialize, Serialize};

/// Health status of a pet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Sick,
    InRecovery,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Sick => "sick",
            HealthStatus::InRecovery => "in_recovery",
            HealthStatus::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "healthy" => Some(HealthStatus::Healthy),
            "sick" => Some(HealthStatus::Sick),
            "in_recovery" => Some(HealthStatus::InRecovery),
            "unknown" => Some(HealthStatus::Unknown),
            _ => None,
        }
    }
}

/// A pet treated at the clinic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pet {
    /// Local UUID
    pub pet_id: String,
    /// Pet name
    pub name: String,
    /// Chip or tag number
    pub identification_number: String,
    pub health_status: Option<HealthStatus>,
    /// Date of birth (YYYY-MM-DD)
    pub birthdate: Option<String>,
    /// Owner full name
    pub owner_name: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

impl Pet {
    /// Create a new pet with required fields.
    pub fn new(name: String, identification_number: String) -> Self {
        Self {
            pet_id: uuid::Uuid::new_v4().to_string(),
            name,
            identification_number,
            health_status: None,
            birthdate: None,
            owner_name: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
