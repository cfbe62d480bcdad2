//! HTTP client that hands a task to one agent
//!
//! One call, one attempt. Every path ends in a [`DelegationOutcome`]; transport
//! problems never surface as errors.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::context::DelegationContext;
use super::outcome::DelegationOutcome;
use crate::models::AuthDescriptor;

/// Hop ceiling: a context at this depth is not forwarded again
pub const MAX_DEPTH: u32 = 5;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct DelegateOptions {
    pub context: DelegationContext,
    pub auth: Option<AuthDescriptor>,
    /// Falls back to the client's default when unset
    pub timeout: Option<Duration>,
    /// Ask the target to report back through the callback URL
    pub async_mode: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DelegationRequest<'a> {
    delegation_id: Uuid,
    task: &'a str,
    context: DelegationContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<String>,
}

/// Client for agent callback endpoints
#[derive(Debug, Clone)]
pub struct DelegationClient {
    client: Client,
    max_depth: u32,
    default_timeout: Duration,
    callback_base: Option<String>,
}

impl Default for DelegationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DelegationClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            max_depth: MAX_DEPTH,
            default_timeout: DEFAULT_TIMEOUT,
            callback_base: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Public base URL of this registry; async callbacks go to
    /// `{base}/delegations/{id}/callback`
    pub fn with_callback_base(mut self, base: impl Into<String>) -> Self {
        self.callback_base = Some(base.into());
        self
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn callback_url(&self, delegation_id: Uuid) -> Option<String> {
        self.callback_base.as_ref().map(|base| {
            format!(
                "{}/delegations/{}/callback",
                base.trim_end_matches('/'),
                delegation_id
            )
        })
    }

    /// Send `task` to `endpoint`
    pub async fn delegate(
        &self,
        endpoint: &str,
        delegation_id: Uuid,
        task: &str,
        options: DelegateOptions,
    ) -> DelegationOutcome {
        let depth = options.context.depth;
        if depth >= self.max_depth {
            tracing::warn!(%delegation_id, depth, "Delegation depth limit reached");
            return DelegationOutcome::failed(
                format!(
                    "Delegation depth {} exceeds the maximum of {}",
                    depth, self.max_depth
                ),
                Duration::ZERO,
            );
        }

        let callback_url = if options.async_mode {
            match self.callback_url(delegation_id) {
                Some(url) => Some(url),
                None => {
                    return DelegationOutcome::failed(
                        "Async delegation requested but no callback URL is configured",
                        Duration::ZERO,
                    )
                }
            }
        } else {
            None
        };

        let payload = DelegationRequest {
            delegation_id,
            task,
            context: options.context.next_hop(),
            callback_url,
        };

        let request = with_auth(self.client.post(endpoint).json(&payload), options.auth.as_ref());
        let timeout = options.timeout.unwrap_or(self.default_timeout);

        tracing::info!(%delegation_id, endpoint, depth, async_mode = options.async_mode, "Dispatching delegation");

        let started = Instant::now();
        let response = tokio::time::timeout(timeout, send(request)).await;
        let latency = started.elapsed();

        let outcome = match response {
            Err(_) => DelegationOutcome::timeout(timeout, latency),
            Ok(Err(e)) => {
                DelegationOutcome::failed(format!("Request to {} failed: {}", endpoint, e), latency)
            }
            Ok(Ok((status, body))) => interpret(status, &body, latency),
        };

        if !outcome.success {
            tracing::warn!(%delegation_id, status = outcome.status.as_str(), error = ?outcome.error, "Delegation did not succeed");
        }

        outcome
    }
}

fn with_auth(request: RequestBuilder, auth: Option<&AuthDescriptor>) -> RequestBuilder {
    match auth {
        Some(AuthDescriptor::Bearer { token }) => request.bearer_auth(token),
        Some(AuthDescriptor::Header { name, value }) => request.header(name.as_str(), value.as_str()),
        None => request,
    }
}

async fn send(request: RequestBuilder) -> Result<(StatusCode, String), reqwest::Error> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    Ok((status, body))
}

/// Map a finished HTTP exchange onto an outcome
fn interpret(status: StatusCode, body: &str, latency: Duration) -> DelegationOutcome {
    if !status.is_success() {
        return DelegationOutcome::failed(format!("HTTP {}: {}", status.as_u16(), body), latency);
    }

    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let explicitly_accepted = parsed
        .as_ref()
        .and_then(|v| v.get("status"))
        .and_then(Value::as_str)
        == Some("accepted");
    if status == StatusCode::ACCEPTED || explicitly_accepted {
        return DelegationOutcome::accepted(latency);
    }

    let result = match parsed {
        Some(Value::Object(map)) => match map.get("result") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        },
        Some(Value::String(s)) => Some(s),
        _ if body.is_empty() => None,
        _ => Some(body.to_string()),
    };

    DelegationOutcome::completed(result, latency)
}
