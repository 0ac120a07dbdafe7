//! Markdown rendering for flows, playbooks and operation results.
//!
//! Domain models implement `Display` directly (see [`models`]); collections
//! and operation outcomes get small wrapper types so every interface prints
//! the same text. All output is markdown, rendered by the CLI through
//! termimad and returned verbatim by the MCP server.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │    Wrappers     │    │   Formatted     │
//! │ (Flow, Step...) │───▶│ (FlowSummaries, │───▶│    Output       │
//! │                 │    │  UpdateResult)  │    │  (Terminal/MCP) │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`collections`]: `FlowSummaries`, `Playbooks`
//! - [`results`]: `CreateResult`, `UpdateResult`
//! - [`status`]: `OperationStatus`
//! - [`datetime`]: `LocalDateTime`, `Elapsed`
//! - [`models`]: `Display` for the domain models
//!
//! # Examples
//!
//! ```rust
//! use irflow_core::display::{OperationStatus, UpdateResult};
//! use irflow_core::models::{Flow, Playbook};
//! use jiff::Timestamp;
//!
//! let playbook = Playbook::from_json(r#"{"name":"p","title":"P","phases":[
//!     {"name":"x","title":"X","steps":[{"name":"s","title":"Do the thing"}]}]}"#)?;
//! let flow = Flow::instantiate(1, &playbook, "INC-1", None, Timestamp::now());
//!
//! let output = UpdateResult::with_changes(flow, vec!["Step 's' started".to_string()]).to_string();
//! assert!(output.contains("Updated flow 1"));
//! assert!(output.contains("- Step 's' started"));
//!
//! let status = OperationStatus::success("Flow 1 committed".to_string());
//! assert_eq!(status.to_string(), "Success: Flow 1 committed\n");
//! # irflow_core::Result::<()>::Ok(())
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::{FlowSummaries, Playbooks};
pub use datetime::{Elapsed, LocalDateTime};
pub use results::{CreateResult, UpdateResult};
pub use status::OperationStatus;
