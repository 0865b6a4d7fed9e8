//! Staff database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Staff, StaffRole};

impl Database {
    /// Insert a new staff member.
    pub fn insert_staff(&self, staff: &Staff) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO staff (
                staff_id, username, first_name, last_name, role, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                staff.staff_id,
                staff.username,
                staff.first_name,
                staff.last_name,
                staff.role.as_str(),
                staff.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a staff member by ID.
    pub fn get_staff(&self, staff_id: &str) -> DbResult<Option<Staff>> {
        self.conn
            .query_row(
                r#"
                SELECT staff_id, username, first_name, last_name, role, created_at
                FROM staff
                WHERE staff_id = ?
                "#,
                [staff_id],
                StaffRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get a staff member by username.
    pub fn get_staff_by_username(&self, username: &str) -> DbResult<Option<Staff>> {
        self.conn
            .query_row(
                r#"
                SELECT staff_id, username, first_name, last_name, role, created_at
                FROM staff
                WHERE username = ?
                "#,
                [username],
                StaffRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all nurses in roster order (insertion order, stable across calls).
    pub fn list_nurses(&self) -> DbResult<Vec<Staff>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT staff_id, username, first_name, last_name, role, created_at
            FROM staff
            WHERE role = 'nurse'
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([], StaffRow::from_row)?;

        let mut nurses = Vec::new();
        for row in rows {
            nurses.push(row?.try_into()?);
        }
        Ok(nurses)
    }

    /// Delete a staff member.
    pub fn delete_staff(&self, staff_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM staff WHERE staff_id = ?", [staff_id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
pub(super) struct StaffRow {
    staff_id: String,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: String,
    created_at: String,
}

impl StaffRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(StaffRow {
            staff_id: row.get(0)?,
            username: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            role: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    /// Read the nurse columns of a joined visit row, starting at `offset`.
    /// Returns `None` when the LEFT JOIN found no nurse.
    pub(super) fn from_joined(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<Self>> {
        let staff_id: Option<String> = row.get(offset)?;
        match staff_id {
            Some(staff_id) => Ok(Some(StaffRow {
                staff_id,
                username: row.get(offset + 1)?,
                first_name: row.get(offset + 2)?,
                last_name: row.get(offset + 3)?,
                role: row.get(offset + 4)?,
                created_at: row.get(offset + 5)?,
            })),
            None => Ok(None),
        }
    }
}

impl TryFrom<StaffRow> for Staff {
    type Error = DbError;

    fn try_from(row: StaffRow) -> Result<Self, Self::Error> {
        let role = StaffRole::parse(&row.role)
            .ok_or_else(|| DbError::Constraint(format!("Unknown staff role: {}", row.role)))?;

        Ok(Staff {
            staff_id: row.staff_id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            role,
            created_at: row.created_at,
        })
    }
}
