//! Command-line argument definitions using clap
//!
//! Each subcommand has a clap-derived argument struct that converts into the
//! matching core parameter type, so the tracker never sees clap types:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Tracker
//! ```
//!
//! Conversions that need context from the global flags (the analyst name)
//! are methods instead of `From` impls.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use irflow_core::{
    models::{AlertDisposition, FlowCommit, FlowControl, FlowStatus, IncidentStatus, StepAction},
    params::*,
};

// ============================================================================
// Playbooks
// ============================================================================

/// Import a playbook definition from a JSON file
///
/// An existing playbook with the same name is replaced. Running flows keep
/// the steps they were created with.
#[derive(Args)]
pub struct ImportPlaybookArgs {
    #[arg(help = "Path to the playbook JSON file")]
    pub file: PathBuf,
}

/// Show one playbook with its phases and steps
#[derive(Args)]
pub struct ShowPlaybookArgs {
    #[arg(help = "Name of the playbook")]
    pub name: String,
}

impl From<ShowPlaybookArgs> for ShowPlaybook {
    fn from(val: ShowPlaybookArgs) -> Self {
        ShowPlaybook { name: val.name }
    }
}

#[derive(Subcommand)]
pub enum PlaybookCommands {
    /// Import or replace a playbook from a JSON file
    #[command(alias = "i")]
    Import(ImportPlaybookArgs),
    /// List available playbooks
    #[command(alias = "l")]
    List,
    /// Show a playbook definition
    #[command(alias = "s")]
    Show(ShowPlaybookArgs),
}

// ============================================================================
// Flows
// ============================================================================

/// Trigger a playbook for an incident
///
/// Creates a new flow with every step pending. An incident can have only one
/// active or paused flow at a time.
#[derive(Args)]
pub struct TriggerFlowArgs {
    #[arg(help = "Name of the playbook to run")]
    pub playbook: String,
    #[arg(help = "Identifier of the incident the flow responds to")]
    pub incident_id: String,
}

impl TriggerFlowArgs {
    pub fn into_params(self, analyst: Option<String>) -> TriggerFlow {
        TriggerFlow {
            playbook: self.playbook,
            incident_id: self.incident_id,
            started_by: analyst,
        }
    }
}

/// Show a flow with all phases and steps
#[derive(Args)]
pub struct ShowFlowArgs {
    #[arg(help = "Flow ID", required_unless_present = "incident")]
    pub id: Option<u64>,
    #[arg(
        short,
        long,
        conflicts_with = "id",
        help = "Show the in-flight (or latest) flow of this incident instead"
    )]
    pub incident: Option<String>,
}

impl From<ShowFlowArgs> for ShowFlow {
    fn from(val: ShowFlowArgs) -> Self {
        ShowFlow {
            id: val.id,
            incident_id: val.incident,
        }
    }
}

/// List flows
///
/// Shows active and paused flows by default. Use --all to include completed
/// and cancelled flows.
#[derive(Args)]
pub struct ListFlowsArgs {
    #[arg(short, long, help = "Only flows in this status")]
    pub status: Option<FlowStatusArg>,
    #[arg(short, long, help = "Only flows for this incident")]
    pub incident: Option<String>,
    #[arg(short, long, help = "Only flows triggered by the current analyst")]
    pub mine: bool,
    #[arg(short, long, help = "Include completed and cancelled flows")]
    pub all: bool,
}

impl ListFlowsArgs {
    pub fn into_params(self, analyst: Option<String>) -> ListFlows {
        ListFlows {
            status: self.status.map(|s| FlowStatus::from(s).as_str().to_string()),
            incident_id: self.incident,
            started_by: if self.mine { analyst } else { None },
            all: self.all,
        }
    }
}

/// Select a flow by ID
#[derive(Args)]
pub struct FlowIdArgs {
    #[arg(help = "Flow ID")]
    pub id: u64,
}

impl From<FlowIdArgs> for Id {
    fn from(val: FlowIdArgs) -> Self {
        Id { id: val.id }
    }
}

/// Pause, resume or cancel a flow
#[derive(Args)]
pub struct ControlFlowArgs {
    #[arg(help = "Flow ID")]
    pub id: u64,
    #[arg(short, long, help = "Reason recorded with the change")]
    pub reason: String,
}

impl ControlFlowArgs {
    pub fn pause(self) -> ControlFlow {
        ControlFlow {
            flow_id: self.id,
            control: FlowControl::Pause {
                reason: self.reason,
            },
        }
    }

    pub fn resume(self) -> ControlFlow {
        ControlFlow {
            flow_id: self.id,
            control: FlowControl::Resume {
                reason: self.reason,
            },
        }
    }

    pub fn cancel(self) -> ControlFlow {
        ControlFlow {
            flow_id: self.id,
            control: FlowControl::Cancel {
                reason: self.reason,
            },
        }
    }
}

/// Commit a finished flow and close its incident
///
/// Every step must be completed, failed or skipped. The final report is
/// stored with the flow.
#[derive(Args)]
pub struct CommitFlowArgs {
    #[arg(help = "Flow ID")]
    pub id: u64,
    #[arg(short, long, help = "Final report describing what was done")]
    pub report: String,
    #[arg(short, long, help = "What happens to the originating alert")]
    pub disposition: DispositionArg,
    #[arg(
        long,
        default_value = "resolved",
        help = "Status the incident is moved to"
    )]
    pub incident_status: IncidentStatusArg,
}

impl From<CommitFlowArgs> for CommitFlow {
    fn from(val: CommitFlowArgs) -> Self {
        CommitFlow {
            flow_id: val.id,
            commit: FlowCommit {
                final_report: val.report,
                alert_disposition: val.disposition.into(),
                incident_status: val.incident_status.into(),
            },
        }
    }
}

/// Wait until a flow reaches a status
#[derive(Args)]
pub struct WaitFlowArgs {
    #[arg(help = "Flow ID")]
    pub id: u64,
    #[arg(help = "Status to wait for")]
    pub status: FlowStatusArg,
    #[arg(long, default_value_t = 30, help = "Number of checks before giving up")]
    pub attempts: u32,
    #[arg(long, default_value_t = 2, help = "Seconds between checks")]
    pub interval: u64,
}

#[derive(Subcommand)]
pub enum FlowCommands {
    /// Trigger a playbook for an incident
    #[command(alias = "t")]
    Trigger(TriggerFlowArgs),
    /// Show a flow by ID or incident
    #[command(alias = "s")]
    Show(ShowFlowArgs),
    /// List flows
    #[command(alias = "l")]
    List(ListFlowsArgs),
    /// Show the step to work on next
    #[command(alias = "n")]
    Next(FlowIdArgs),
    /// Show completion per phase and per status
    #[command(alias = "p")]
    Progress(FlowIdArgs),
    /// Put a flow on hold
    Pause(ControlFlowArgs),
    /// Resume a paused flow
    Resume(ControlFlowArgs),
    /// Abandon a flow
    Cancel(ControlFlowArgs),
    /// Commit a finished flow
    Commit(CommitFlowArgs),
    /// Wait until a flow reaches a status
    Wait(WaitFlowArgs),
}

// ============================================================================
// Steps
// ============================================================================

/// Select a step of a flow
#[derive(Args)]
pub struct StepRef {
    #[arg(help = "Flow ID")]
    pub flow_id: u64,
    #[arg(help = "Step name")]
    pub step: String,
}

#[derive(Args)]
pub struct CompleteStepArgs {
    #[command(flatten)]
    pub target: StepRef,
    #[arg(short, long, help = "Output data as JSON")]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct FailStepArgs {
    #[command(flatten)]
    pub target: StepRef,
    #[arg(short, long, help = "Error details as JSON")]
    pub error: Option<String>,
}

#[derive(Args)]
pub struct SkipStepArgs {
    #[command(flatten)]
    pub target: StepRef,
    #[arg(short, long, help = "Why the step is skipped")]
    pub reason: String,
}

#[derive(Args)]
pub struct SubmitInputArgs {
    #[command(flatten)]
    pub target: StepRef,
    #[arg(help = "Input data as JSON")]
    pub input: String,
}

#[derive(Args)]
pub struct ApproveStepArgs {
    #[command(flatten)]
    pub target: StepRef,
    #[arg(short, long, help = "Optional note stored with the approval")]
    pub note: Option<String>,
}

#[derive(Args)]
pub struct RejectStepArgs {
    #[command(flatten)]
    pub target: StepRef,
    #[arg(short, long, help = "Why the step is rejected")]
    pub reason: String,
}

#[derive(Subcommand)]
pub enum StepCommands {
    /// Start a pending step
    Start(StepRef),
    /// Complete a step in progress
    #[command(alias = "done")]
    Complete(CompleteStepArgs),
    /// Mark a step in progress as failed
    Fail(FailStepArgs),
    /// Skip an optional pending step
    Skip(SkipStepArgs),
    /// Park a step until an analyst provides input
    AwaitInput(StepRef),
    /// Provide input to a step waiting for it
    Input(SubmitInputArgs),
    /// Park a step until someone approves it
    AwaitApproval(StepRef),
    /// Approve a step waiting for approval
    Approve(ApproveStepArgs),
    /// Reject a step waiting for approval
    Reject(RejectStepArgs),
}

fn parse_json(field: &str, raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).with_context(|| format!("--{field} must be valid JSON"))
}

impl StepCommands {
    /// Converts the command into a step action request. Approvals and
    /// rejections are recorded under `analyst`.
    pub fn into_params(self, analyst: &str) -> Result<ApplyStepAction> {
        let (target, action) = match self {
            StepCommands::Start(target) => (target, StepAction::Start),
            StepCommands::Complete(args) => {
                let output = args
                    .output
                    .as_deref()
                    .map(|raw| parse_json("output", raw))
                    .transpose()?;
                (args.target, StepAction::Complete { output })
            }
            StepCommands::Fail(args) => {
                let error = args
                    .error
                    .as_deref()
                    .map(|raw| parse_json("error", raw))
                    .transpose()?;
                (args.target, StepAction::Fail { error })
            }
            StepCommands::Skip(args) => (
                args.target,
                StepAction::Skip {
                    reason: args.reason,
                },
            ),
            StepCommands::AwaitInput(target) => (target, StepAction::AwaitInput),
            StepCommands::Input(args) => {
                let input = parse_json("input", &args.input)?;
                (args.target, StepAction::SubmitInput { input })
            }
            StepCommands::AwaitApproval(target) => (target, StepAction::AwaitApproval),
            StepCommands::Approve(args) => (
                args.target,
                StepAction::Approve {
                    approver: analyst.to_string(),
                    note: args.note,
                },
            ),
            StepCommands::Reject(args) => (
                args.target,
                StepAction::Reject {
                    approver: analyst.to_string(),
                    reason: args.reason,
                },
            ),
        };

        Ok(ApplyStepAction {
            flow_id: target.flow_id,
            step: target.step,
            action,
        })
    }
}

// ============================================================================
// Live feed
// ============================================================================

/// Follow live updates from the remote console
///
/// Reconnects with exponential backoff when the connection drops and gives
/// up after repeated failures.
#[derive(Args)]
pub struct WatchArgs {
    #[arg(
        long,
        help = "WebSocket URL of the feed. Derived from --server when omitted"
    )]
    pub feed_url: Option<String>,
    #[arg(long, default_value_t = 30, help = "Seconds between keep-alive pings")]
    pub keepalive: u64,
}

// ============================================================================
// Value enums
// ============================================================================

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FlowStatusArg {
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl From<FlowStatusArg> for FlowStatus {
    fn from(val: FlowStatusArg) -> Self {
        match val {
            FlowStatusArg::Active => FlowStatus::Active,
            FlowStatusArg::Paused => FlowStatus::Paused,
            FlowStatusArg::Completed => FlowStatus::Completed,
            FlowStatusArg::Cancelled => FlowStatus::Cancelled,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum DispositionArg {
    FalsePositive,
    Resolved,
    Closed,
}

impl From<DispositionArg> for AlertDisposition {
    fn from(val: DispositionArg) -> Self {
        match val {
            DispositionArg::FalsePositive => AlertDisposition::FalsePositive,
            DispositionArg::Resolved => AlertDisposition::Resolved,
            DispositionArg::Closed => AlertDisposition::Closed,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum IncidentStatusArg {
    Resolved,
    Closed,
}

impl From<IncidentStatusArg> for IncidentStatus {
    fn from(val: IncidentStatusArg) -> Self {
        match val {
            IncidentStatusArg::Resolved => IncidentStatus::Resolved,
            IncidentStatusArg::Closed => IncidentStatus::Closed,
        }
    }
}
