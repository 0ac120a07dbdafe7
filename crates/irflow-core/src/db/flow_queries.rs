//! Flow CRUD operations and queries.

use jiff::Timestamp;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    playbook_queries::load_playbook,
    step_queries::{insert_phases, load_phases},
    utils::{parse_column, parse_optional_column, parse_timestamp},
};
use crate::{
    engine::machine,
    error::{DatabaseResultExt, FlowError, Result},
    models::{
        AlertDisposition, Flow, FlowCommit, FlowControl, FlowFilter, FlowStatus, IncidentStatus,
    },
};

const FLOW_COLUMNS: &str = "id, playbook, incident_id, status, started_by, status_reason, final_report, alert_disposition, incident_status, created_at, updated_at";
const INSERT_FLOW_SQL: &str = "INSERT INTO flows (playbook, incident_id, status, started_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5)";
const CHECK_IN_FLIGHT_SQL: &str =
    "SELECT id FROM flows WHERE incident_id = ?1 AND status IN ('active', 'paused')";
const UPDATE_FLOW_SQL: &str = "UPDATE flows SET status = ?1, status_reason = ?2, final_report = ?3, alert_disposition = ?4, incident_status = ?5, updated_at = ?6 WHERE id = ?7";

/// Helper function to construct a flow header (without phases) from a row
fn build_flow_from_row(row: &Row) -> rusqlite::Result<Flow> {
    let final_report: Option<String> = row.get(6)?;
    let alert_disposition: Option<AlertDisposition> = parse_optional_column(row, 7)?;
    let incident_status: Option<IncidentStatus> = parse_optional_column(row, 8)?;
    let commit = match (final_report, alert_disposition, incident_status) {
        (Some(final_report), Some(alert_disposition), Some(incident_status)) => Some(FlowCommit {
            final_report,
            alert_disposition,
            incident_status,
        }),
        _ => None,
    };

    Ok(Flow {
        id: row.get::<_, i64>(0)? as u64,
        playbook: row.get(1)?,
        incident_id: row.get(2)?,
        status: parse_column(row, 3)?,
        started_by: row.get(4)?,
        status_reason: row.get(5)?,
        phases: Vec::new(),
        commit,
        created_at: parse_timestamp(row, 9)?,
        updated_at: parse_timestamp(row, 10)?,
    })
}

/// Loads a complete flow on any connection or transaction.
pub(crate) fn load_flow(conn: &Connection, id: u64) -> Result<Option<Flow>> {
    let query = format!("SELECT {FLOW_COLUMNS} FROM flows WHERE id = ?1");
    let flow = conn
        .query_row(&query, params![id as i64], build_flow_from_row)
        .optional()
        .db_context("Failed to query flow")?;

    match flow {
        Some(mut flow) => {
            flow.phases = load_phases(conn, flow.id)?;
            Ok(Some(flow))
        }
        None => Ok(None),
    }
}

/// Writes the flow-level columns after a transition.
pub(crate) fn write_flow_header(conn: &Connection, flow: &Flow) -> Result<()> {
    let commit = flow.commit.as_ref();
    conn.execute(
        UPDATE_FLOW_SQL,
        params![
            flow.status.as_str(),
            flow.status_reason,
            commit.map(|c| c.final_report.as_str()),
            commit.map(|c| c.alert_disposition.as_str()),
            commit.map(|c| c.incident_status.as_str()),
            flow.updated_at.to_string(),
            flow.id as i64
        ],
    )
    .db_context("Failed to update flow")?;
    Ok(())
}

impl super::Database {
    /// Instantiates a playbook as a new active flow for an incident.
    ///
    /// Fails with `InvalidInput` when the incident already has an active or
    /// paused flow.
    pub fn create_flow(
        &mut self,
        playbook_name: &str,
        incident_id: &str,
        started_by: Option<&str>,
    ) -> Result<Flow> {
        if incident_id.trim().is_empty() {
            return Err(
                FlowError::invalid_input("incident_id").with_reason("Incident ID cannot be empty")
            );
        }

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let playbook =
            load_playbook(&tx, playbook_name)?.ok_or_else(|| FlowError::PlaybookNotFound {
                name: playbook_name.to_string(),
            })?;

        let existing: Option<i64> = tx
            .query_row(CHECK_IN_FLIGHT_SQL, params![incident_id], |row| row.get(0))
            .optional()
            .db_context("Failed to check for in-flight flows")?;
        if let Some(existing) = existing {
            return Err(FlowError::invalid_input("incident_id").with_reason(format!(
                "Incident '{incident_id}' already has in-flight flow {existing}"
            )));
        }

        let now = Timestamp::now();
        tx.execute(
            INSERT_FLOW_SQL,
            params![
                playbook.name,
                incident_id,
                FlowStatus::Active.as_str(),
                started_by,
                now.to_string()
            ],
        )
        .db_context("Failed to insert flow")?;

        let id = tx.last_insert_rowid() as u64;
        let flow = Flow::instantiate(id, &playbook, incident_id, started_by, now);
        insert_phases(&tx, &flow)?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(flow)
    }

    /// Retrieves a flow by its ID, phases and steps included.
    pub fn get_flow(&self, id: u64) -> Result<Option<Flow>> {
        load_flow(&self.connection, id)
    }

    /// Retrieves the flow of an incident: the in-flight one when present,
    /// otherwise the most recent.
    pub fn get_flow_by_incident(&self, incident_id: &str) -> Result<Option<Flow>> {
        let query = format!(
            "SELECT {FLOW_COLUMNS} FROM flows WHERE incident_id = ?1 \
             ORDER BY status IN ('active', 'paused') DESC, id DESC LIMIT 1"
        );
        let flow = self
            .connection
            .query_row(&query, params![incident_id], build_flow_from_row)
            .optional()
            .db_context("Failed to query flow by incident")?;

        match flow {
            Some(mut flow) => {
                flow.phases = load_phases(&self.connection, flow.id)?;
                Ok(Some(flow))
            }
            None => Ok(None),
        }
    }

    /// Lists flows matching a filter, newest first.
    pub fn list_flows(&self, filter: &FlowFilter) -> Result<Vec<Flow>> {
        let mut query = format!("SELECT {FLOW_COLUMNS} FROM flows");

        let mut conditions = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params_vec.push(Box::new(status.as_str().to_string()));
        } else if filter.in_flight_only {
            conditions.push("status IN ('active', 'paused')");
        }

        if let Some(ref incident_id) = filter.incident_id {
            conditions.push("incident_id = ?");
            params_vec.push(Box::new(incident_id.clone()));
        }

        if let Some(ref started_by) = filter.started_by {
            conditions.push("started_by = ?");
            params_vec.push(Box::new(started_by.clone()));
        }

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }

        query.push_str(" ORDER BY id DESC");

        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| &**b).collect();

        let mut flows = stmt
            .query_map(&params_refs[..], build_flow_from_row)
            .db_context("Failed to query flows")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch flows")?;

        // Eagerly load phases for each flow
        for flow in &mut flows {
            flow.phases = load_phases(&self.connection, flow.id)?;
        }

        Ok(flows)
    }

    /// Pauses, resumes or cancels a flow.
    pub fn control_flow(&mut self, id: u64, control: &FlowControl) -> Result<Flow> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let mut flow = load_flow(&tx, id)?.ok_or(FlowError::FlowNotFound { id })?;
        machine::apply_control(&mut flow, control, Timestamp::now())?;
        write_flow_header(&tx, &flow)?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(flow)
    }

    /// Commits a finished flow with its final report.
    pub fn commit_flow(&mut self, id: u64, commit: &FlowCommit) -> Result<Flow> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let mut flow = load_flow(&tx, id)?.ok_or(FlowError::FlowNotFound { id })?;
        machine::apply_commit(&mut flow, commit, Timestamp::now())?;
        write_flow_header(&tx, &flow)?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(flow)
    }
}
