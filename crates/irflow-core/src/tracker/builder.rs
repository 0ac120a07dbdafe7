//! Builder for creating and configuring Tracker instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use log::info;
use tokio::task;

use super::Tracker;
use crate::{
    backend::{remote::DEFAULT_TIMEOUT, FlowBackend, LocalBackend, RemoteBackend},
    db::Database,
    error::{join_error, FlowError, Result},
    poll::PollPolicy,
};

/// Builder for creating and configuring Tracker instances.
///
/// A server URL selects the REST backend; otherwise flows live in a local
/// SQLite file.
#[derive(Debug, Clone)]
pub struct TrackerBuilder {
    database_path: Option<PathBuf>,
    server: Option<String>,
    token: Option<String>,
    timeout: Duration,
    poll: PollPolicy,
}

impl TrackerBuilder {
    pub fn new() -> Self {
        Self {
            database_path: None,
            server: None,
            token: None,
            timeout: DEFAULT_TIMEOUT,
            poll: PollPolicy::default(),
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/irflow/irflow.db` or `~/.local/share/irflow/irflow.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Uses the REST API at `url` instead of a local database.
    pub fn with_remote(mut self, url: Option<impl Into<String>>) -> Self {
        if let Some(url) = url {
            self.server = Some(url.into());
        }
        self
    }

    /// Bearer token for the REST API.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Builds the configured tracker.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Configuration` for an unusable server URL,
    /// `FlowError::FileSystem` if the database directory cannot be created and
    /// `FlowError::Database` if schema initialization fails.
    pub async fn build(self) -> Result<Tracker> {
        let backend: Arc<dyn FlowBackend> = match self.server {
            Some(ref url) => {
                info!("Using remote flow backend at {url}");
                Arc::new(RemoteBackend::new(url, self.token.clone(), self.timeout)?)
            }
            None => {
                let db_path = match self.database_path {
                    Some(ref path) => path.clone(),
                    None => Self::default_database_path()?,
                };
                Self::initialize_database(&db_path).await?;
                Arc::new(LocalBackend::new(db_path))
            }
        };

        Ok(Tracker::new(backend).with_poll_policy(self.poll))
    }

    async fn initialize_database(db_path: &Path) -> Result<()> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FlowError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let db_path = db_path.to_path_buf();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path)?;
            info!("Using local flow database at {}", db_path.display());
            Ok::<(), FlowError>(())
        })
        .await
        .map_err(join_error)?
    }

    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("irflow")
            .place_data_file("irflow.db")
            .map_err(|e| FlowError::XdgDirectory(e.to_string()))
    }
}

impl Default for TrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
