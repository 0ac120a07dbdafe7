//! SQLite persistence for playbooks and flows.
//!
//! This module provides the low-level storage used by the local backend. It
//! handles SQLite connections and schema management, and offers query
//! interfaces for playbooks, flows and steps. Every mutating call runs the
//! state machine and the write inside one transaction.

use std::path::Path;

use rusqlite::Connection;

use crate::error::{DatabaseResultExt, Result};

pub mod flow_queries;
pub mod migrations;
pub mod playbook_queries;
pub mod step_queries;
pub mod utils;

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}
