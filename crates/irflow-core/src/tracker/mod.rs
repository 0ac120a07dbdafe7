//! High-level tracker API for running playbooks against incidents.
//!
//! [`Tracker`] is what the CLI and the MCP server talk to. It never owns
//! flow state: every operation fetches a snapshot from the configured
//! [`FlowBackend`], uses the pure rules in [`crate::engine`] to reject
//! requests that cannot succeed, and forwards the rest to the backend.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   Interfaces    │    │     Tracker     │    │   FlowBackend   │
//! │  (CLI, MCP)     │───▶│ (flow_ops,      │───▶│ (local SQLite / │
//! │                 │    │  step_ops)      │    │  remote REST)   │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: picks and initializes a backend
//! - [`flow_ops`]: triggering, lookup, listing, progress and the dashboard
//! - [`step_ops`]: step actions, lifecycle control, commit and bounded waits
//!
//! # Examples
//!
//! ```rust,no_run
//! use irflow_core::{params::TriggerFlow, TrackerBuilder};
//!
//! # async fn example() -> irflow_core::Result<()> {
//! let tracker = TrackerBuilder::new()
//!     .with_database_path(Some("/tmp/irflow.db"))
//!     .build()
//!     .await?;
//!
//! let flow = tracker
//!     .trigger_flow(&TriggerFlow {
//!         playbook: "phishing".to_string(),
//!         incident_id: "INC-1042".to_string(),
//!         started_by: Some("alice".to_string()),
//!     })
//!     .await?;
//! let next = tracker.next_step(flow.id).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::{backend::FlowBackend, poll::PollPolicy};

pub mod builder;
pub mod flow_ops;
pub mod step_ops;


pub use builder::TrackerBuilder;

/// Entry point for every flow operation.
#[derive(Clone)]
pub struct Tracker {
    backend: Arc<dyn FlowBackend>,
    poll: PollPolicy,
}

impl Tracker {
    /// Creates a tracker over an already configured backend.
    pub fn new(backend: Arc<dyn FlowBackend>) -> Self {
        Self {
            backend,
            poll: PollPolicy::default(),
        }
    }

    /// Replaces the policy used by the `wait_for_*` operations.
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn backend(&self) -> &dyn FlowBackend {
        self.backend.as_ref()
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("backend", &self.backend.name())
            .field("poll", &self.poll)
            .finish()
    }
}
