//! Remote enable/disable calls and their outcome classification.
//!
//! Every call resolves to an [`Outcome`]; transport errors and non-2xx
//! responses are data here, not `Err`, so the controller can handle each exit
//! path uniformly.
use crate::config::ClientConfig;
use crate::flow::{FlowId, FlowPayload};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Error `type` the backend returns when a billing limit is hit.
pub const RESOURCE_CAPPED: &str = "resource_capped";

/// Message used when no server-supplied message is available.
pub const GENERIC_RETRY_MESSAGE: &str = "Something went wrong. Please try again.";

/// Message raised for any failed disable.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";

/// Links offered when the quota prompt is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeLinks {
    pub upgrade_url: String,
    pub docs_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    QuotaExceeded { upgrade_url: String, docs_url: String },
    Failure { message: String },
    /// No response was obtained at all.
    TransportFailure { reason: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::QuotaExceeded { .. } => "quota_exceeded",
            Outcome::Failure { .. } => "failure",
            Outcome::TransportFailure { .. } => "transport_failure",
        }
    }
}

/// Which statuses count as a successful disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessPolicy {
    #[default]
    Exact200,
    Any2xx,
}

impl SuccessPolicy {
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            SuccessPolicy::Exact200 => status == 200,
            SuccessPolicy::Any2xx => (200..300).contains(&status),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Classify the response of a create or re-enable call.
///
/// 2xx is success regardless of body. Otherwise the body is inspected for the
/// quota sentinel, then for a server message.
pub fn classify_enable_response(status: u16, body: &str, links: &UpgradeLinks) -> Outcome {
    if (200..300).contains(&status) {
        return Outcome::Success;
    }
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    if parsed.kind.as_deref() == Some(RESOURCE_CAPPED) {
        return Outcome::QuotaExceeded {
            upgrade_url: links.upgrade_url.clone(),
            docs_url: links.docs_url.clone(),
        };
    }
    let message = parsed
        .error
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| GENERIC_RETRY_MESSAGE.to_string());
    Outcome::Failure { message }
}

/// Classify the response of a disable call. The body is never inspected.
pub fn classify_disable_response(status: u16, policy: SuccessPolicy) -> Outcome {
    if policy.accepts(status) {
        Outcome::Success
    } else {
        Outcome::Failure {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Backend operations that change a flow's enablement.
pub trait EnablementClient {
    /// First-time creation of a flow that has no identity yet.
    fn create(&self, payload: &FlowPayload) -> Outcome;

    fn re_enable(&self, id: FlowId, payload: &FlowPayload) -> Outcome;

    /// Disable across every listed connection of the integration.
    fn disable(
        &self,
        id: FlowId,
        flow_name: &str,
        connection_ids: &[String],
        payload: &FlowPayload,
    ) -> Outcome;
}

/// [`EnablementClient`] over the backend's HTTP API.
#[derive(Clone)]
pub struct HttpEnablementClient {
    agent: ureq::Agent,
    base_url: String,
    environment: String,
    links: UpgradeLinks,
    disable_success: SuccessPolicy,
}

impl HttpEnablementClient {
    pub fn new(config: &ClientConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            environment: config.environment.clone(),
            links: config.upgrade_links(),
            disable_success: config.disable_success,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn finish(
        &self,
        operation: &'static str,
        start: Instant,
        sent: Result<ureq::http::Response<ureq::Body>>,
    ) -> std::result::Result<(u16, String), Outcome> {
        let elapsed_ms = start.elapsed().as_millis();
        let mut response = match sent {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(operation, elapsed_ms, error = %err, "flow request failed");
                return Err(Outcome::TransportFailure {
                    reason: format!("{err:#}"),
                });
            }
        };
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();
        tracing::info!(
            operation,
            elapsed_ms,
            status,
            response_bytes = body.len(),
            "flow request complete"
        );
        Ok((status, body))
    }
}

impl EnablementClient for HttpEnablementClient {
    fn create(&self, payload: &FlowPayload) -> Outcome {
        let start = Instant::now();
        let sent = self
            .agent
            .post(self.url("/flow"))
            .query("env", &self.environment)
            .send_json([payload])
            .with_context(|| format!("create flow {}", payload.name));
        match self.finish("create", start, sent) {
            Ok((status, body)) => classify_enable_response(status, &body, &self.links),
            Err(outcome) => outcome,
        }
    }

    fn re_enable(&self, id: FlowId, payload: &FlowPayload) -> Outcome {
        let start = Instant::now();
        let sent = self
            .agent
            .patch(self.url(&format!("/flow/{id}/enable")))
            .query("env", &self.environment)
            .send_json(payload)
            .with_context(|| format!("enable flow {id}"));
        match self.finish("re_enable", start, sent) {
            Ok((status, body)) => classify_enable_response(status, &body, &self.links),
            Err(outcome) => outcome,
        }
    }

    fn disable(
        &self,
        id: FlowId,
        flow_name: &str,
        connection_ids: &[String],
        payload: &FlowPayload,
    ) -> Outcome {
        let start = Instant::now();
        let sent = self
            .agent
            .patch(self.url(&format!("/flow/{id}/disable")))
            .query("env", &self.environment)
            .query("sync_name", flow_name)
            .query("connectionIds", connection_ids.join(","))
            .send_json(payload)
            .with_context(|| format!("disable flow {id}"));
        match self.finish("disable", start, sent) {
            Ok((status, _)) => classify_disable_response(status, self.disable_success),
            Err(outcome) => outcome,
        }
    }
}
