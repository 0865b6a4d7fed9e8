//! Pet database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{HealthStatus, Pet};

impl Database {
    /// Insert a new pet.
    pub fn insert_pet(&self, pet: &Pet) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO pets (
                pet_id, name, identification_number, health_status,
                birthdate, owner_name, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                pet.pet_id,
                pet.name,
                pet.identification_number,
                pet.health_status.map(|s| s.as_str()),
                pet.birthdate,
                pet.owner_name,
                pet.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a pet by ID.
    pub fn get_pet(&self, pet_id: &str) -> DbResult<Option<Pet>> {
        self.conn
            .query_row(
                r#"
                SELECT pet_id, name, identification_number, health_status,
                       birthdate, owner_name, created_at
                FROM pets
                WHERE pet_id = ?
                "#,
                [pet_id],
                |row| {
                    Ok(PetRow {
                        pet_id: row.get(0)?,
                        name: row.get(1)?,
                        identification_number: row.get(2)?,
                        health_status: row.get(3)?,
                        birthdate: row.get(4)?,
                        owner_name: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all pets.
    pub fn list_pets(&self) -> DbResult<Vec<Pet>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT pet_id, name, identification_number, health_status,
                   birthdate, owner_name, created_at
            FROM pets
            ORDER BY name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(PetRow {
                pet_id: row.get(0)?,
                name: row.get(1)?,
                identification_number: row.get(2)?,
                health_status: row.get(3)?,
                birthdate: row.get(4)?,
                owner_name: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;

        let mut pets = Vec::new();
        for row in rows {
            pets.push(row?.try_into()?);
        }
        Ok(pets)
    }
}

/// Intermediate row struct for database mapping.
struct PetRow {
    pet_id: String,
    name: String,
    identification_number: String,
    health_status: Option<String>,
    birthdate: Option<String>,
    owner_name: Option<String>,
    created_at: String,
}

impl TryFrom<PetRow> for Pet {
    type Error = DbError;

    fn try_from(row: PetRow) -> Result<Self, Self::Error> {
        let health_status = row
            .health_status
            .map(|s| {
                HealthStatus::parse(&s)
                    .ok_or_else(|| DbError::Constraint(format!("Unknown health status: {}", s)))
            })
            .transpose()?;

        Ok(Pet {
            pet_id: row.pet_id,
            name: row.name,
            identification_number: row.identification_number,
            health_status,
            birthdate: row.birthdate,
            owner_name: row.owner_name,
            created_at: row.created_at,
        })
    }
}
