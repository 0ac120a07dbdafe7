//! Playbook catalogue queries.

use jiff::Timestamp;
use rusqlite::{params, Connection, OptionalExtension};

use super::utils::parse_json;
use crate::{
    error::{DatabaseResultExt, Result},
    models::Playbook,
};

const UPSERT_PLAYBOOK_SQL: &str = "INSERT INTO playbooks (name, title, description, definition, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5) ON CONFLICT(name) DO UPDATE SET title = excluded.title, description = excluded.description, definition = excluded.definition, updated_at = excluded.updated_at";
const SELECT_PLAYBOOK_SQL: &str = "SELECT definition FROM playbooks WHERE name = ?1";
const SELECT_PLAYBOOKS_SQL: &str = "SELECT definition FROM playbooks ORDER BY name";

/// Loads a playbook definition by name on any connection or transaction.
pub(crate) fn load_playbook(conn: &Connection, name: &str) -> Result<Option<Playbook>> {
    conn.query_row(SELECT_PLAYBOOK_SQL, params![name], |row| parse_json(row, 0))
        .optional()
        .db_context("Failed to query playbook")
}

impl super::Database {
    /// Validates and stores a playbook, replacing any previous version with
    /// the same name. Flows already created from it keep their own copy of
    /// the structure.
    pub fn upsert_playbook(&mut self, playbook: &Playbook) -> Result<Playbook> {
        playbook.validate()?;
        let definition = serde_json::to_string(playbook)?;
        let now = Timestamp::now().to_string();

        self.connection
            .execute(
                UPSERT_PLAYBOOK_SQL,
                params![
                    playbook.name,
                    playbook.title,
                    playbook.description,
                    definition,
                    now
                ],
            )
            .db_context("Failed to store playbook")?;

        Ok(playbook.clone())
    }

    /// Retrieves a playbook by name.
    pub fn get_playbook(&self, name: &str) -> Result<Option<Playbook>> {
        load_playbook(&self.connection, name)
    }

    /// Lists every playbook, ordered by name.
    pub fn list_playbooks(&self) -> Result<Vec<Playbook>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_PLAYBOOKS_SQL)
            .db_context("Failed to prepare query")?;

        let playbooks = stmt
            .query_map([], |row| parse_json(row, 0))
            .db_context("Failed to query playbooks")?
            .collect::<std::result::Result<Vec<Playbook>, _>>()
            .db_context("Failed to fetch playbooks")?;

        Ok(playbooks)
    }
}
