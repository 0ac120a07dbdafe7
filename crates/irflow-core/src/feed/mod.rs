//! Live push feed with reconnect, backoff and keep-alive.
//!
//! A [`LiveFeed`] owns one supervisor task. The supervisor keeps a
//! connection to the push endpoint open, sends a keep-alive ping on a fixed
//! interval while connected, and reconnects with exponential backoff when
//! the connection drops. Everything it observes is republished as
//! [`FeedEvent`]s on a broadcast channel; any number of subscribers can
//! listen without knowing about each other.
//!
//! Reconnect delays are `base_delay * 2^(attempt - 1)`. After
//! `max_attempts` consecutive failures the supervisor emits
//! [`FeedEvent::ConnectionFailed`] once and stops. Only a connection that
//! stays up for at least `stable_after` resets the attempt counter; one that
//! drops sooner counts as a failed attempt, so a server that accepts and
//! immediately closes still ends in `ConnectionFailed`.

use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

pub mod connection;


use crate::error::{FlowError, Result};

pub use connection::{FeedConnection, FeedConnector, WsConnector};

/// Capacity of the event channel; slow subscribers lag beyond this.
const EVENT_CAPACITY: usize = 256;

/// Connection and retry settings for the live feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// WebSocket endpoint, `ws://` or `wss://`
    pub url: String,
    /// Bearer token sent with the handshake
    pub token: Option<String>,
    /// Delay before the first reconnect attempt
    pub base_delay: Duration,
    /// Consecutive failed attempts before giving up
    pub max_attempts: u32,
    /// Interval between keep-alive pings
    pub keepalive_interval: Duration,
    /// Session length after which the connection counts as healthy
    pub stable_after: Duration,
}

impl FeedConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            base_delay: Duration::from_secs(1),
            max_attempts: 5,
            keepalive_interval: Duration::from_secs(30),
            stable_after: Duration::from_secs(10),
        }
    }

    /// Derives the feed endpoint from a console base URL: `http` becomes
    /// `ws`, `https` becomes `wss` and `/ws` is appended to the path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use irflow_core::feed::FeedConfig;
    ///
    /// let config = FeedConfig::from_server_url("https://soc.example.com/console/")?;
    /// assert_eq!(config.url, "wss://soc.example.com/console/ws");
    /// # irflow_core::Result::<()>::Ok(())
    /// ```
    pub fn from_server_url(server: &str) -> Result<Self> {
        let mut url = Url::parse(server).map_err(|e| {
            FlowError::configuration(format!("Invalid server URL '{server}': {e}"))
        })?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(FlowError::configuration(format!(
                    "Unsupported server URL scheme '{other}'"
                )))
            }
        };
        url.set_scheme(scheme).map_err(|()| {
            FlowError::configuration(format!("Cannot derive feed URL from '{server}'"))
        })?;
        let path = format!("{}/ws", url.path().trim_end_matches('/'));
        url.set_path(&path);
        Ok(Self::new(url.to_string()))
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    pub fn with_stable_after(mut self, stable_after: Duration) -> Self {
        self.stable_after = stable_after;
        self
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use irflow_core::feed::FeedConfig;
    ///
    /// let config = FeedConfig::new("ws://localhost/ws");
    /// assert_eq!(config.reconnect_delay(1), Duration::from_secs(1));
    /// assert_eq!(config.reconnect_delay(5), Duration::from_secs(16));
    /// ```
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Messages pushed by the server, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    FlowUpdated { flow_id: u64 },
    IncidentUpdated { incident_id: String },
    AlertCreated { alert_id: String },
    Ping,
    Pong,
}

/// What subscribers of a [`LiveFeed`] observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Connected,
    Message(FeedMessage),
    Disconnected,
    Reconnecting { attempt: u32, delay: Duration },
    /// Every reconnect attempt failed; the feed has stopped
    ConnectionFailed,
}

fn emit(events: &broadcast::Sender<FeedEvent>, event: FeedEvent) {
    debug!("Feed event: {event:?}");
    // No subscribers is fine; events are fire-and-forget
    let _ = events.send(event);
}

/// Handle to a running feed supervisor.
pub struct LiveFeed {
    config: FeedConfig,
    events: broadcast::Sender<FeedEvent>,
    task: Option<JoinHandle<()>>,
}

impl LiveFeed {
    /// Creates a stopped feed. Subscribe before [`start`](Self::start) to
    /// see the first `Connected` event.
    pub fn new(config: FeedConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            events,
            task: None,
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    /// Spawns the supervisor. Does nothing if it is already running.
    pub fn start<C>(&mut self, connector: C)
    where
        C: FeedConnector + 'static,
    {
        if self.is_running() {
            return;
        }
        info!("Starting live feed for {}", self.config.url);
        let connector: Arc<dyn FeedConnector> = Arc::new(connector);
        self.task = Some(tokio::spawn(supervise(
            self.config.clone(),
            connector,
            self.events.clone(),
        )));
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the supervisor and drops its connection.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Live feed stopped");
        }
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Connect, run the session, back off, repeat; returns after
/// `ConnectionFailed`.
pub async fn supervise(
    config: FeedConfig,
    connector: Arc<dyn FeedConnector>,
    events: broadcast::Sender<FeedEvent>,
) {
    let mut attempt: u32 = 0;

    loop {
        match connector.connect(&config).await {
            Ok(connection) => {
                info!("Live feed connected to {}", config.url);
                emit(&events, FeedEvent::Connected);
                let connected_at = Instant::now();
                run_session(connection, &config, &events).await;
                let lasted = connected_at.elapsed();
                info!("Live feed disconnected from {} after {lasted:?}", config.url);
                emit(&events, FeedEvent::Disconnected);
                if lasted >= config.stable_after {
                    attempt = 0;
                } else {
                    debug!("Live feed session shorter than {:?}", config.stable_after);
                }
            }
            Err(e) => warn!("Live feed connection failed: {e}"),
        }

        attempt += 1;
        if attempt > config.max_attempts {
            warn!(
                "Live feed giving up after {} reconnect attempts",
                config.max_attempts
            );
            emit(&events, FeedEvent::ConnectionFailed);
            return;
        }

        let delay = config.reconnect_delay(attempt);
        emit(&events, FeedEvent::Reconnecting { attempt, delay });
        time::sleep(delay).await;
    }
}

/// Pumps one connection until it closes or fails. The keep-alive timer
/// lives only as long as this call.
async fn run_session(
    mut connection: Box<dyn FeedConnection>,
    config: &FeedConfig,
    events: &broadcast::Sender<FeedEvent>,
) {
    let period = config.keepalive_interval;
    let mut keepalive = time::interval_at(Instant::now() + period, period);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = connection.recv() => match frame {
                Ok(Some(text)) => match serde_json::from_str::<FeedMessage>(&text) {
                    Ok(message) => emit(events, FeedEvent::Message(message)),
                    Err(e) => warn!("Dropping unparseable feed message: {e}"),
                },
                Ok(None) => return,
                Err(e) => {
                    warn!("{e}");
                    return;
                }
            },
            _ = keepalive.tick() => {
                let ping = match serde_json::to_string(&FeedMessage::Ping) {
                    Ok(ping) => ping,
                    Err(e) => {
                        warn!("Failed to encode keep-alive: {e}");
                        continue;
                    }
                };
                if let Err(e) = connection.send(ping).await {
                    warn!("Keep-alive failed: {e}");
                    return;
                }
            }
        }
    }
}
