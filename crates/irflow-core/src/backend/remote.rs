//! REST client for the console's flow API.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};

use super::FlowBackend;
use crate::{
    error::{FlowError, Result},
    models::{
        DashboardSummary, Flow, FlowCommit, FlowControl, FlowFilter, Playbook, StepAction,
    },
    params::TriggerFlow,
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Backend talking to a remote REST service.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl RemoteBackend {
    /// Creates a client for `base_url` (e.g. `https://console.example/`).
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| FlowError::Configuration {
            message: format!("Invalid server URL '{base_url}': {e}"),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FlowError::Configuration {
                message: format!("Server URL '{base_url}' cannot be used as a base"),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FlowError::network("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FlowError::Configuration {
                message: format!("Server URL '{}' cannot be used as a base", self.base_url),
            })?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!("{method} {url}");
        let mut request = self.client.request(method, url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn send(request: RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| FlowError::network("Request to flow server failed", e))
    }

    /// Maps a non-success response to `FlowError::Backend`, preferring the
    /// server's JSON `message`.
    async fn error_from(response: Response) -> FlowError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .ok()
            .filter(|m| !m.is_empty())
            .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        FlowError::Backend {
            status: status.as_u16(),
            message,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| FlowError::network("Failed to decode server response", e))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Self::decode(Self::send(request).await?).await
    }

    /// Like [`fetch`](Self::fetch) but a 404 becomes `None`.
    async fn fetch_optional<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let response = Self::send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response).await.map(Some)
    }
}

#[async_trait]
impl FlowBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn import_playbook(&self, playbook: &Playbook) -> Result<Playbook> {
        playbook.validate()?;
        let request = self.request(Method::POST, &["playbooks"])?.json(playbook);
        self.fetch(request).await
    }

    async fn get_playbook(&self, name: &str) -> Result<Option<Playbook>> {
        let request = self.request(Method::GET, &["playbooks", name])?;
        self.fetch_optional(request).await
    }

    async fn list_playbooks(&self) -> Result<Vec<Playbook>> {
        let request = self.request(Method::GET, &["playbooks"])?;
        self.fetch(request).await
    }

    async fn create_flow(&self, request: &TriggerFlow) -> Result<Flow> {
        let builder = self.request(Method::POST, &["flows"])?.json(request);
        self.fetch(builder).await
    }

    async fn get_flow(&self, id: u64) -> Result<Option<Flow>> {
        let id = id.to_string();
        let request = self.request(Method::GET, &["flows", &id])?;
        self.fetch_optional(request).await
    }

    async fn get_flow_by_incident(&self, incident_id: &str) -> Result<Option<Flow>> {
        let request = self.request(Method::GET, &["incidents", incident_id, "flow"])?;
        self.fetch_optional(request).await
    }

    async fn list_flows(&self, filter: &FlowFilter) -> Result<Vec<Flow>> {
        let request = self
            .request(Method::GET, &["flows"])?
            .query(&filter.to_query());
        self.fetch(request).await
    }

    async fn apply_step_action(
        &self,
        flow_id: u64,
        step: &str,
        action: &StepAction,
    ) -> Result<Flow> {
        let id = flow_id.to_string();
        let request = self
            .request(Method::POST, &["flows", &id, "steps", step, "actions"])?
            .json(action);
        self.fetch(request).await
    }

    async fn control_flow(&self, flow_id: u64, control: &FlowControl) -> Result<Flow> {
        let id = flow_id.to_string();
        let request = self
            .request(Method::POST, &["flows", &id, "control"])?
            .json(control);
        self.fetch(request).await
    }

    async fn commit_flow(&self, flow_id: u64, commit: &FlowCommit) -> Result<Flow> {
        let id = flow_id.to_string();
        let request = self
            .request(Method::POST, &["flows", &id, "commit"])?
            .json(commit);
        self.fetch(request).await
    }

    async fn dashboard(&self, analyst: Option<&str>) -> Result<DashboardSummary> {
        let mut request = self.request(Method::GET, &["dashboard"])?;
        if let Some(analyst) = analyst {
            request = request.query(&[("analyst", analyst)]);
        }
        self.fetch(request).await
    }
}
