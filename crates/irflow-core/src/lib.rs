//! Core library for irflow, a playbook execution tracker for incident
//! response.
//!
//! A [`Playbook`](models::Playbook) is a reusable template of ordered phases
//! and steps. Triggering it against an incident produces a
//! [`Flow`](models::Flow); analysts then move its steps through their state
//! machine until the flow can be committed and the incident closed.
//!
//! # Layers
//!
//! - [`engine`]: pure rules for transitions, dependency resolution and
//!   progress
//! - [`backend`]: where flows live, either a local SQLite file ([`db`]) or a
//!   remote REST API
//! - [`tracker`]: the [`Tracker`] facade used by every interface
//! - [`feed`]: live push updates with reconnect and keep-alive
//! - [`display`]: markdown rendering shared by the CLI and MCP server
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use irflow_core::{models::{Playbook, StepAction}, params::{ApplyStepAction, TriggerFlow}, TrackerBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = TrackerBuilder::new()
//!     .with_database_path(Some("irflow.db"))
//!     .build()
//!     .await?;
//!
//! let playbook = Playbook::from_json(&std::fs::read_to_string("phishing.json")?)?;
//! tracker.import_playbook(&playbook).await?;
//!
//! let flow = tracker
//!     .trigger_flow(&TriggerFlow {
//!         playbook: playbook.name.clone(),
//!         incident_id: "INC-1042".to_string(),
//!         started_by: None,
//!     })
//!     .await?;
//!
//! if let Some(step) = tracker.next_step(flow.id).await?.step() {
//!     tracker
//!         .apply_step_action(&ApplyStepAction {
//!             flow_id: flow.id,
//!             step: step.name.clone(),
//!             action: StepAction::Start,
//!         })
//!         .await?;
//! }
//! println!("{}", tracker.progress(flow.id).await?);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod db;
pub mod display;
pub mod engine;
pub mod error;
pub mod feed;
pub mod models;
pub mod params;
pub mod poll;
pub mod tracker;

pub use backend::{FlowBackend, LocalBackend, RemoteBackend};
pub use db::Database;
pub use display::{
    CreateResult, FlowSummaries, LocalDateTime, OperationStatus, Playbooks, UpdateResult,
};
pub use engine::{FlowOutcome, FlowProgress, Resolution};
pub use error::{FlowError, Result};
pub use feed::{FeedConfig, FeedEvent, FeedMessage, LiveFeed};
pub use models::{Flow, FlowStatus, Playbook, Step, StepAction, StepStatus};
pub use poll::PollPolicy;
pub use tracker::{Tracker, TrackerBuilder};
