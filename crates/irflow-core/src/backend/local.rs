//! SQLite-backed flow store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use tokio::task;

use super::FlowBackend;
use crate::{
    db::Database,
    error::{join_error, Result},
    models::{
        DashboardSummary, Flow, FlowCommit, FlowControl, FlowFilter, Playbook, StepAction,
    },
    params::TriggerFlow,
};

/// Local backend opening a fresh SQLite connection for every call.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    db_path: PathBuf,
}

impl LocalBackend {
    /// Creates a backend for an existing (or to-be-created) database file.
    /// The schema is applied on first connection.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    /// Runs a database closure on the blocking pool.
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            f(&mut db)
        })
        .await
        .map_err(join_error)?
    }
}

#[async_trait]
impl FlowBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn import_playbook(&self, playbook: &Playbook) -> Result<Playbook> {
        debug!("Importing playbook '{}'", playbook.name);
        let playbook = playbook.clone();
        self.with_db(move |db| db.upsert_playbook(&playbook)).await
    }

    async fn get_playbook(&self, name: &str) -> Result<Option<Playbook>> {
        let name = name.to_string();
        self.with_db(move |db| db.get_playbook(&name)).await
    }

    async fn list_playbooks(&self) -> Result<Vec<Playbook>> {
        self.with_db(|db| db.list_playbooks()).await
    }

    async fn create_flow(&self, request: &TriggerFlow) -> Result<Flow> {
        debug!(
            "Creating flow from '{}' for incident {}",
            request.playbook, request.incident_id
        );
        let request = request.clone();
        self.with_db(move |db| {
            db.create_flow(
                &request.playbook,
                &request.incident_id,
                request.started_by.as_deref(),
            )
        })
        .await
    }

    async fn get_flow(&self, id: u64) -> Result<Option<Flow>> {
        self.with_db(move |db| db.get_flow(id)).await
    }

    async fn get_flow_by_incident(&self, incident_id: &str) -> Result<Option<Flow>> {
        let incident_id = incident_id.to_string();
        self.with_db(move |db| db.get_flow_by_incident(&incident_id))
            .await
    }

    async fn list_flows(&self, filter: &FlowFilter) -> Result<Vec<Flow>> {
        let filter = filter.clone();
        self.with_db(move |db| db.list_flows(&filter)).await
    }

    async fn apply_step_action(
        &self,
        flow_id: u64,
        step: &str,
        action: &StepAction,
    ) -> Result<Flow> {
        debug!("Applying '{}' to step '{step}' of flow {flow_id}", action.name());
        let step = step.to_string();
        let action = action.clone();
        self.with_db(move |db| db.apply_step_action(flow_id, &step, &action))
            .await
    }

    async fn control_flow(&self, flow_id: u64, control: &FlowControl) -> Result<Flow> {
        let control = control.clone();
        self.with_db(move |db| db.control_flow(flow_id, &control))
            .await
    }

    async fn commit_flow(&self, flow_id: u64, commit: &FlowCommit) -> Result<Flow> {
        let commit = commit.clone();
        self.with_db(move |db| db.commit_flow(flow_id, &commit))
            .await
    }

    async fn dashboard(&self, analyst: Option<&str>) -> Result<DashboardSummary> {
        let analyst = analyst.map(String::from);
        self.with_db(move |db| {
            let filter = FlowFilter::in_flight_for(analyst.as_deref());
            let flows = db.list_flows(&filter)?;
            Ok(DashboardSummary::from_flows(analyst.as_deref(), &flows))
        })
        .await
    }
}
