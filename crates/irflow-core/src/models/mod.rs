//! Data models for playbooks, flows and steps.
//!
//! This module contains the domain types of the tracker. Display
//! implementations live in [`crate::display::models`] so that data and
//! presentation stay separate.
//!
//! - [`Playbook`]: reusable template of phases and step definitions
//! - [`Flow`]: a playbook instantiated against one incident
//! - [`Step`]: smallest unit of tracked work, carrying a [`StepStatus`]
//! - [`StepAction`], [`FlowControl`], [`FlowCommit`]: requests that change
//!   state
//! - [`FlowSummary`], [`DashboardSummary`], [`StatusCounts`]: derived views
//!
//! # Examples
//!
//! ```rust
//! use irflow_core::models::{Flow, Playbook, StepStatus};
//! use jiff::Timestamp;
//!
//! let playbook = Playbook::from_json(r#"{
//!     "name": "ransomware",
//!     "title": "Ransomware response",
//!     "phases": [
//!         {"name": "contain", "title": "Contain", "steps": [
//!             {"name": "isolate", "title": "Isolate hosts"}
//!         ]},
//!         {"name": "recover", "title": "Recover", "steps": [
//!             {"name": "restore", "title": "Restore backups", "depends_on": ["isolate"]}
//!         ]}
//!     ]
//! }"#)?;
//!
//! let flow = Flow::instantiate(1, &playbook, "INC-42", Some("alice"), Timestamp::now());
//! assert_eq!(flow.status_counts().get(StepStatus::Pending), 2);
//! assert_eq!(flow.current_step().map(|s| s.name.as_str()), Some("isolate"));
//! # irflow_core::Result::<()>::Ok(())
//! ```

pub mod filters;
pub mod flow;
pub mod playbook;
pub mod requests;
pub mod status;
pub mod step;
pub mod summary;

#[cfg(test)]
mod tests;

pub use filters::FlowFilter;
pub use flow::{group_by_phase, status_counts, Flow, Phase, PhaseGroups};
pub use playbook::{PhaseDefinition, Playbook, StepDefinition};
pub use requests::{FlowCommit, FlowControl, StepAction};
pub use status::{AlertDisposition, FlowStatus, IncidentStatus, StepStatus, StepType};
pub use step::Step;
pub use summary::{DashboardSummary, FlowSummary, StatusCounts};
