//! Visit database operations.

use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Row};

use super::staff::StaffRow;
use super::{format_timestamp, parse_timestamp, Database, DbError, DbResult};
use crate::models::{Staff, TreatmentStatus, Visit, VisitType};

/// Visit columns plus the assigned nurse, fetched in one LEFT JOIN.
const VISIT_WITH_NURSE: &str = r#"
    SELECT v.visit_id, v.visit_number, v.pet_id, v.visit_type,
           v.visit_start, v.visit_end, v.description, v.treatment_status,
           v.created_at, v.updated_at,
           s.staff_id, s.username, s.first_name, s.last_name, s.role, s.created_at
    FROM visits v
    LEFT JOIN staff s ON s.staff_id = v.assigned_nurse_id
"#;

/// Column index where the joined nurse columns begin.
const NURSE_OFFSET: usize = 10;

impl Database {
    /// Insert a new visit. The visit must already carry its number.
    pub fn insert_visit(&self, visit: &Visit) -> DbResult<()> {
        let visit_number = visit.visit_number.as_deref().ok_or_else(|| {
            DbError::Constraint(format!("Visit {} has no visit number", visit.visit_id))
        })?;

        self.conn.execute(
            r#"
            INSERT INTO visits (
                visit_id, visit_number, pet_id, visit_type, visit_start, visit_end,
                description, treatment_status, assigned_nurse_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                visit.visit_id,
                visit_number,
                visit.pet_id,
                visit.visit_type.as_str(),
                format_timestamp(&visit.visit_start),
                format_timestamp(&visit.visit_end),
                visit.description,
                visit.treatment_status.as_str(),
                visit.assigned_nurse_id(),
                visit.created_at,
                visit.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing visit. The visit number is left untouched.
    pub fn update_visit(&self, visit: &Visit) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE visits SET
                pet_id = ?2,
                visit_type = ?3,
                visit_start = ?4,
                visit_end = ?5,
                description = ?6,
                treatment_status = ?7,
                assigned_nurse_id = ?8,
                updated_at = ?9
            WHERE visit_id = ?1
            "#,
            params![
                visit.visit_id,
                visit.pet_id,
                visit.visit_type.as_str(),
                format_timestamp(&visit.visit_start),
                format_timestamp(&visit.visit_end),
                visit.description,
                visit.treatment_status.as_str(),
                visit.assigned_nurse_id(),
                visit.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Check whether a visit has been persisted.
    pub fn visit_exists(&self, visit_id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM visits WHERE visit_id = ?",
            [visit_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get a visit by ID, including its assigned nurse.
    pub fn get_visit(&self, visit_id: &str) -> DbResult<Option<Visit>> {
        self.conn
            .query_row(
                &format!("{} WHERE v.visit_id = ?", VISIT_WITH_NURSE),
                [visit_id],
                VisitRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// All visits intersecting the half-open interval `[start, end)`.
    ///
    /// Uses the strict predicate `visit_start < end AND visit_end > start`.
    pub fn list_overlapping_visits(
        &self,
        start: &NaiveDateTime,
        end: &NaiveDateTime,
    ) -> DbResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE v.visit_start < ?1 AND v.visit_end > ?2 ORDER BY v.visit_start, v.visit_id",
            VISIT_WITH_NURSE
        ))?;

        let rows = stmt.query_map(
            params![format_timestamp(end), format_timestamp(start)],
            VisitRow::from_row,
        )?;

        let mut visits = Vec::new();
        for row in rows {
            visits.push(row?.try_into()?);
        }
        Ok(visits)
    }

    /// All visits assigned to a nurse, ordered by start.
    pub fn list_visits_for_nurse(&self, staff_id: &str) -> DbResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE v.assigned_nurse_id = ? ORDER BY v.visit_start",
            VISIT_WITH_NURSE
        ))?;

        let rows = stmt.query_map([staff_id], VisitRow::from_row)?;

        let mut visits = Vec::new();
        for row in rows {
            visits.push(row?.try_into()?);
        }
        Ok(visits)
    }

    /// Unassigned visits, ordered by start.
    pub fn list_unassigned_visits(&self) -> DbResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE v.assigned_nurse_id IS NULL ORDER BY v.visit_start",
            VISIT_WITH_NURSE
        ))?;

        let rows = stmt.query_map([], VisitRow::from_row)?;

        let mut visits = Vec::new();
        for row in rows {
            visits.push(row?.try_into()?);
        }
        Ok(visits)
    }

    /// Delete a visit.
    pub fn delete_visit(&self, visit_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM visits WHERE visit_id = ?", [visit_id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct VisitRow {
    visit_id: String,
    visit_number: String,
    pet_id: Option<String>,
    visit_type: String,
    visit_start: String,
    visit_end: String,
    description: Option<String>,
    treatment_status: String,
    created_at: String,
    updated_at: String,
    nurse: Option<StaffRow>,
}

impl VisitRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(VisitRow {
            visit_id: row.get(0)?,
            visit_number: row.get(1)?,
            pet_id: row.get(2)?,
            visit_type: row.get(3)?,
            visit_start: row.get(4)?,
            visit_end: row.get(5)?,
            description: row.get(6)?,
            treatment_status: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
            nurse: StaffRow::from_joined(row, NURSE_OFFSET)?,
        })
    }
}

impl TryFrom<VisitRow> for Visit {
    type Error = DbError;

    fn try_from(row: VisitRow) -> Result<Self, Self::Error> {
        let visit_type = VisitType::parse(&row.visit_type)
            .ok_or_else(|| DbError::Constraint(format!("Unknown visit type: {}", row.visit_type)))?;
        let treatment_status = TreatmentStatus::parse(&row.treatment_status).ok_or_else(|| {
            DbError::Constraint(format!("Unknown treatment status: {}", row.treatment_status))
        })?;

        Ok(Visit {
            visit_id: row.visit_id,
            visit_number: Some(row.visit_number),
            pet_id: row.pet_id,
            visit_type,
            visit_start: parse_timestamp(&row.visit_start)?,
            visit_end: parse_timestamp(&row.visit_end)?,
            description: row.description,
            treatment_status,
            assigned_nurse: row.nurse.map(Staff::try_from).transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
