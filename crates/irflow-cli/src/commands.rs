//! Command handlers for the terminal front end
//!
//! Every handler calls one tracker operation and renders the Display output
//! of its result, the same text the MCP tools return.

use std::{path::Path, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use irflow_core::{
    display::{CreateResult, OperationStatus, UpdateResult},
    feed::WsConnector,
    models::{FlowStatus, FlowSummary},
    params::{CommitFlow, ControlFlow, Dashboard, Id, ShowFlow, ShowPlaybook},
    FeedConfig, FeedEvent, FeedMessage, LiveFeed, Playbook, PollPolicy, Tracker,
};
use log::{info, warn};
use tokio::sync::broadcast::error::RecvError;

use crate::{
    cli::{FlowCommands, PlaybookCommands, StepCommands, WaitFlowArgs, WatchArgs},
    renderer::TerminalRenderer,
};

/// Runs CLI commands against a tracker and renders their results.
pub struct Cli {
    tracker: Tracker,
    renderer: TerminalRenderer,
    analyst: Option<String>,
}

impl Cli {
    pub fn new(tracker: Tracker, renderer: TerminalRenderer, analyst: Option<String>) -> Self {
        Self {
            tracker,
            renderer,
            analyst,
        }
    }

    fn require_analyst(&self) -> Result<&str> {
        self.analyst
            .as_deref()
            .context("Set --analyst, IRFLOW_ANALYST or USER to record who approves steps")
    }

    pub async fn handle_playbook_command(&self, command: PlaybookCommands) -> Result<()> {
        match command {
            PlaybookCommands::Import(args) => self.import_playbook(&args.file).await,
            PlaybookCommands::List => {
                let playbooks = self.tracker.list_playbooks().await?;
                self.renderer.render(&playbooks.to_string())
            }
            PlaybookCommands::Show(args) => self.show_playbook(&args.into()).await,
        }
    }

    async fn import_playbook(&self, path: &Path) -> Result<()> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read playbook file {}", path.display()))?;
        let playbook = Playbook::from_json(&json)
            .with_context(|| format!("Invalid playbook in {}", path.display()))?;

        let imported = self.tracker.import_playbook(&playbook).await?;
        self.renderer
            .render(&CreateResult::new(imported).to_string())
    }

    async fn show_playbook(&self, params: &ShowPlaybook) -> Result<()> {
        let playbook = self
            .tracker
            .get_playbook(&params.name)
            .await?
            .ok_or_else(|| anyhow!("Playbook '{}' not found", params.name))?;
        self.renderer.render(&playbook.to_string())
    }

    pub async fn handle_flow_command(&self, command: FlowCommands) -> Result<()> {
        match command {
            FlowCommands::Trigger(args) => {
                let flow = self
                    .tracker
                    .trigger_flow(&args.into_params(self.analyst.clone()))
                    .await?;
                self.renderer.render(&CreateResult::new(flow).to_string())
            }
            FlowCommands::Show(args) => self.show_flow(&args.into()).await,
            FlowCommands::List(args) => {
                let flows = self
                    .tracker
                    .list_flows(&args.into_params(self.analyst.clone()))
                    .await?;
                self.renderer.render(&flows.to_string())
            }
            FlowCommands::Next(args) => {
                let Id { id } = args.into();
                let resolution = self.tracker.next_step(id).await?;
                self.renderer.render(&resolution.to_string())
            }
            FlowCommands::Progress(args) => {
                let Id { id } = args.into();
                let progress = self.tracker.progress(id).await?;
                self.renderer.render(&progress.to_string())
            }
            FlowCommands::Pause(args) => self.control_flow(args.pause()).await,
            FlowCommands::Resume(args) => self.control_flow(args.resume()).await,
            FlowCommands::Cancel(args) => self.control_flow(args.cancel()).await,
            FlowCommands::Commit(args) => self.commit_flow(args.into()).await,
            FlowCommands::Wait(args) => self.wait_for_flow(args).await,
        }
    }

    async fn show_flow(&self, params: &ShowFlow) -> Result<()> {
        let flow = self
            .tracker
            .show_flow(params)
            .await?
            .ok_or_else(|| match (&params.id, &params.incident_id) {
                (Some(id), _) => anyhow!("Flow {id} not found"),
                (None, Some(incident)) => anyhow!("No flow found for incident {incident}"),
                (None, None) => anyhow!("Flow not found"),
            })?;
        self.renderer.render(&flow.to_string())
    }

    async fn control_flow(&self, params: ControlFlow) -> Result<()> {
        let change = format!(
            "{}: {}",
            params.control.target_status(),
            params.control.reason()
        );
        let flow = self.tracker.control_flow(&params).await?;
        self.renderer
            .render(&UpdateResult::with_changes(flow, vec![change]).to_string())
    }

    async fn commit_flow(&self, params: CommitFlow) -> Result<()> {
        let changes = vec![
            format!("Alert disposition: {}", params.commit.alert_disposition),
            format!("Incident status: {}", params.commit.incident_status),
        ];
        let flow = self.tracker.commit_flow(&params).await?;
        self.renderer
            .render(&UpdateResult::with_changes(flow, changes).to_string())
    }

    async fn wait_for_flow(&self, args: WaitFlowArgs) -> Result<()> {
        let status = FlowStatus::from(args.status);
        let policy = PollPolicy::new(args.attempts, Duration::from_secs(args.interval));
        let flow = self
            .tracker
            .wait_for_status_with(args.id, status, policy)
            .await?;
        self.renderer.render(
            &OperationStatus::success(format!("Flow {} is {}", flow.id, flow.status)).to_string(),
        )
    }

    pub async fn handle_step_command(&self, command: StepCommands) -> Result<()> {
        let analyst = match command {
            StepCommands::Approve(_) | StepCommands::Reject(_) => self.require_analyst()?,
            _ => self.analyst.as_deref().unwrap_or_default(),
        };
        let params = command.into_params(analyst)?;
        let change = format!("{} {}", params.action.name(), params.step);

        let flow = self.tracker.apply_step_action(&params).await?;
        self.renderer
            .render(&UpdateResult::with_changes(flow, vec![change]).to_string())
    }

    /// The analyst's flows in flight, shown when no command is given.
    pub async fn dashboard(&self) -> Result<()> {
        let dashboard = self
            .tracker
            .dashboard(&Dashboard {
                analyst: self.analyst.clone(),
            })
            .await?;
        self.renderer.render(&dashboard.to_string())
    }

    /// Follows the live feed until Ctrl-C or until reconnecting gives up.
    pub async fn watch(
        &self,
        args: WatchArgs,
        server: Option<&str>,
        token: Option<String>,
    ) -> Result<()> {
        let config = match (args.feed_url, server) {
            (Some(url), _) => FeedConfig::new(url),
            (None, Some(server)) => FeedConfig::from_server_url(server)?,
            (None, None) => bail!("watch needs --feed-url or --server"),
        }
        .with_token(token)
        .with_keepalive_interval(Duration::from_secs(args.keepalive));

        let mut feed = LiveFeed::new(config);
        let mut events = feed.subscribe();
        feed.start(WsConnector);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(FeedEvent::ConnectionFailed) => {
                        self.renderer.render(
                            &OperationStatus::failure(format!(
                                "Lost connection to {} after {} attempts",
                                feed.config().url,
                                feed.config().max_attempts
                            ))
                            .to_string(),
                        )?;
                        bail!("Live feed connection failed");
                    }
                    Ok(event) => self.render_event(event).await?,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Skipped {skipped} feed events");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Stopping live feed");
                    break;
                }
            }
        }

        feed.stop();
        Ok(())
    }

    async fn render_event(&self, event: FeedEvent) -> Result<()> {
        let line = match event {
            FeedEvent::Connected => "Connected to live feed".to_string(),
            FeedEvent::Disconnected => "Disconnected".to_string(),
            FeedEvent::Reconnecting { attempt, delay } => {
                format!("Reconnecting in {}s (attempt {attempt})", delay.as_secs_f32())
            }
            FeedEvent::Message(FeedMessage::FlowUpdated { flow_id }) => {
                return match self.tracker.get_flow(flow_id).await {
                    Ok(Some(flow)) => self.renderer.render(&FlowSummary::from(&flow).to_string()),
                    Ok(None) => self.renderer.render(&format!("Flow {flow_id} updated\n")),
                    Err(e) => {
                        warn!("Failed to fetch flow {flow_id}: {e}");
                        self.renderer.render(&format!("Flow {flow_id} updated\n"))
                    }
                };
            }
            FeedEvent::Message(FeedMessage::IncidentUpdated { incident_id }) => {
                format!("Incident {incident_id} updated")
            }
            FeedEvent::Message(FeedMessage::AlertCreated { alert_id }) => {
                format!("Alert {alert_id} created")
            }
            FeedEvent::Message(FeedMessage::Ping | FeedMessage::Pong) => return Ok(()),
            FeedEvent::ConnectionFailed => "Connection failed".to_string(),
        };
        self.renderer.render(&format!("{line}\n"))
    }
}
