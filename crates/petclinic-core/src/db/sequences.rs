//! Named sequence counters.

use rusqlite::OptionalExtension;

use super::{Database, DbResult};

impl Database {
    /// Advance the named counter and return the new value.
    ///
    /// The first call for a name returns 1. Increment and read happen in one
    /// statement, so concurrent connections never receive the same value.
    pub fn next_sequence_value(&self, name: &str) -> DbResult<i64> {
        let value = self.conn.query_row(
            r#"
            INSERT INTO sequences (name, value) VALUES (?1, 1)
            ON CONFLICT(name) DO UPDATE SET
                value = value + 1,
                updated_at = datetime('now')
            RETURNING value
            "#,
            [name],
            |row| row.get(0),
        )?;
        Ok(value)
    }

    /// Current value of the named counter, `None` if never advanced.
    pub fn current_sequence_value(&self, name: &str) -> DbResult<Option<i64>> {
        self.conn
            .query_row(
                "SELECT value FROM sequences WHERE name = ?",
                [name],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }
}
