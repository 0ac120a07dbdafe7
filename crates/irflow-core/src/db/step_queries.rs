//! Phase and step queries, and the step action write path.

use std::collections::BTreeSet;

use jiff::Timestamp;
use rusqlite::{params, Connection, Row};

use super::{
    flow_queries::{load_flow, write_flow_header},
    utils::{
        parse_column, parse_json, parse_optional_json, parse_optional_timestamp, parse_timestamp,
        to_optional_json, to_optional_timestamp,
    },
};
use crate::{
    engine::machine,
    error::{DatabaseResultExt, FlowError, Result},
    models::{Flow, Phase, Step, StepAction},
};

const INSERT_PHASE_SQL: &str =
    "INSERT INTO phases (flow_id, name, position, title, description) VALUES (?1, ?2, ?3, ?4, ?5)";
const INSERT_STEP_SQL: &str = "INSERT INTO steps (flow_id, name, phase, position, title, description, step_type, required, estimated_minutes, depends_on, status, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";
const SELECT_PHASES_SQL: &str =
    "SELECT name, title, description FROM phases WHERE flow_id = ?1 ORDER BY position";
const SELECT_STEPS_SQL: &str = "SELECT name, phase, title, description, step_type, required, estimated_minutes, depends_on, status, output_data, error_data, input_data, skip_reason, started_at, finished_at, updated_at FROM steps WHERE flow_id = ?1 AND phase = ?2 ORDER BY position";
const UPDATE_STEP_SQL: &str = "UPDATE steps SET status = ?1, output_data = ?2, error_data = ?3, input_data = ?4, skip_reason = ?5, started_at = ?6, finished_at = ?7, updated_at = ?8 WHERE flow_id = ?9 AND name = ?10";

/// Helper function to construct a Step from a database row
fn build_step_from_row(row: &Row) -> rusqlite::Result<Step> {
    Ok(Step {
        name: row.get(0)?,
        phase: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        step_type: parse_column(row, 4)?,
        required: row.get(5)?,
        estimated_minutes: row.get(6)?,
        depends_on: parse_json::<BTreeSet<String>>(row, 7)?,
        status: parse_column(row, 8)?,
        output_data: parse_optional_json(row, 9)?,
        error_data: parse_optional_json(row, 10)?,
        input_data: parse_optional_json(row, 11)?,
        skip_reason: row.get(12)?,
        started_at: parse_optional_timestamp(row, 13)?,
        finished_at: parse_optional_timestamp(row, 14)?,
        updated_at: parse_timestamp(row, 15)?,
    })
}

/// Loads the ordered phases of a flow with their ordered steps.
pub(crate) fn load_phases(conn: &Connection, flow_id: u64) -> Result<Vec<Phase>> {
    let mut phase_stmt = conn
        .prepare(SELECT_PHASES_SQL)
        .db_context("Failed to prepare phase query")?;
    let mut phases = phase_stmt
        .query_map(params![flow_id as i64], |row| {
            Ok(Phase {
                name: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                steps: Vec::new(),
            })
        })
        .db_context("Failed to query phases")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .db_context("Failed to fetch phases")?;

    let mut step_stmt = conn
        .prepare(SELECT_STEPS_SQL)
        .db_context("Failed to prepare step query")?;
    for phase in &mut phases {
        phase.steps = step_stmt
            .query_map(params![flow_id as i64, phase.name], build_step_from_row)
            .db_context("Failed to query steps")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to fetch steps")?;
    }

    Ok(phases)
}

/// Inserts the phase and step rows of a freshly instantiated flow.
pub(crate) fn insert_phases(conn: &Connection, flow: &Flow) -> Result<()> {
    for (phase_position, phase) in flow.phases.iter().enumerate() {
        conn.execute(
            INSERT_PHASE_SQL,
            params![
                flow.id as i64,
                phase.name,
                phase_position as i64,
                phase.title,
                phase.description
            ],
        )
        .db_context("Failed to insert phase")?;

        for (position, step) in phase.steps.iter().enumerate() {
            let depends_on = serde_json::to_string(&step.depends_on)?;
            conn.execute(
                INSERT_STEP_SQL,
                params![
                    flow.id as i64,
                    step.name,
                    phase.name,
                    position as i64,
                    step.title,
                    step.description,
                    step.step_type.as_str(),
                    step.required,
                    step.estimated_minutes,
                    depends_on,
                    step.status.as_str(),
                    step.updated_at.to_string()
                ],
            )
            .db_context("Failed to insert step")?;
        }
    }
    Ok(())
}

/// Writes the mutable columns of one step.
pub(crate) fn write_step(conn: &Connection, flow_id: u64, step: &Step) -> Result<()> {
    let rows = conn
        .execute(
            UPDATE_STEP_SQL,
            params![
                step.status.as_str(),
                to_optional_json(step.output_data.as_ref()),
                to_optional_json(step.error_data.as_ref()),
                to_optional_json(step.input_data.as_ref()),
                step.skip_reason,
                to_optional_timestamp(step.started_at),
                to_optional_timestamp(step.finished_at),
                step.updated_at.to_string(),
                flow_id as i64,
                step.name
            ],
        )
        .db_context("Failed to update step")?;

    if rows == 0 {
        return Err(FlowError::StepNotFound {
            flow_id,
            name: step.name.clone(),
        });
    }
    Ok(())
}

impl super::Database {
    /// Applies a step action through the state machine and persists the
    /// result. Returns the updated flow.
    pub fn apply_step_action(
        &mut self,
        flow_id: u64,
        step_name: &str,
        action: &StepAction,
    ) -> Result<Flow> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let mut flow = load_flow(&tx, flow_id)?.ok_or(FlowError::FlowNotFound { id: flow_id })?;
        machine::apply_step_action(&mut flow, step_name, action, Timestamp::now())?;

        let step = flow.step(step_name).ok_or_else(|| FlowError::StepNotFound {
            flow_id,
            name: step_name.to_string(),
        })?;
        write_step(&tx, flow_id, step)?;
        write_flow_header(&tx, &flow)?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(flow)
    }
}
