//! Staff models.

use serde::{Deserialize, Serialize};

/// Role of a clinic employee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StaffRole {
    /// Eligible for automatic visit assignment
    Nurse,
    Veterinarian,
    Receptionist,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Nurse => "nurse",
            StaffRole::Veterinarian => "veterinarian",
            StaffRole::Receptionist => "receptionist",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nurse" => Some(StaffRole::Nurse),
            "veterinarian" => Some(StaffRole::Veterinarian),
            "receptionist" => Some(StaffRole::Receptionist),
            _ => None,
        }
    }
}

/// A clinic employee.
///
/// Equality is by `staff_id` only, so a nurse loaded through different
/// queries compares equal regardless of which columns were fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    /// Stable identity (UUID)
    pub staff_id: String,
    /// Login name, unique
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: StaffRole,
    /// Creation timestamp
    pub created_at: String,
}

impl Staff {
    /// Create a new staff member with the given role.
    pub fn new(username: String, role: StaffRole) -> Self {
        Self {
            staff_id: uuid::Uuid::new_v4().to_string(),
            username,
            first_name: None,
            last_name: None,
            role,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Shorthand for a nurse.
    pub fn nurse(username: impl Into<String>) -> Self {
        Self::new(username.into(), StaffRole::Nurse)
    }

    pub fn is_nurse(&self) -> bool {
        self.role == StaffRole::Nurse
    }

    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

impl PartialEq for Staff {
    fn eq(&self, other: &Self) -> bool {
        self.staff_id == other.staff_id
    }
}

impl Eq for Staff {}

impl std::hash::Hash for Staff {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.staff_id.hash(state);
    }
}

impl std::fmt::Display for Staff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_nurse() {
        let joy = Staff::nurse("joy");
        assert_eq!(joy.username, "joy");
        assert!(joy.is_nurse());
        assert_eq!(joy.staff_id.len(), 36);
    }

    #[test]
    fn test_identity_equality() {
        let joy = Staff::nurse("joy");
        let mut renamed = joy.clone();
        renamed.first_name = Some("Joy".into());
        assert_eq!(joy, renamed);
        assert_ne!(joy, Staff::nurse("joy"));
    }

    #[test]
    fn test_role_round_trip() {
        for role in [StaffRole::Nurse, StaffRole::Veterinarian, StaffRole::Receptionist] {
            assert_eq!(StaffRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(StaffRole::parse("janitor"), None);
    }

    #[test]
    fn test_display_name() {
        let mut joy = Staff::nurse("joy");
        assert_eq!(joy.display_name(), "joy");
        joy.first_name = Some("Nurse".into());
        joy.last_name = Some("Joy".into());
        assert_eq!(joy.display_name(), "Nurse Joy");
    }
}
