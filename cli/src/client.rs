//! HTTP client for the agentmesh registry

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use crate::messages::{
    Agent, Candidate, DelegateRequest, Delegation, DiscoverRequest, DiscoverResponse, Receipt,
};

pub struct MeshClient {
    http: Client,
    base: Url,
}

impl MeshClient {
    pub fn new(server: &str) -> Result<Self> {
        let base = Url::parse(server).with_context(|| format!("Invalid server URL: {}", server))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("Server URL cannot carry paths: {}", server));
        }
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    /// `base` with `segments` appended, each percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Server URL cannot carry paths: {}", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        tracing::debug!("{} {}", method, url);
        Ok(self.http.request(method, url))
    }

    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        let response = self.request(Method::GET, &["agents"])?.send().await?;
        json(response).await
    }

    pub async fn get_agent(&self, name: &str) -> Result<Agent> {
        let response = self.request(Method::GET, &["agents", name])?.send().await?;
        json(response).await
    }

    /// Register from a raw descriptor so the server does all validation
    pub async fn register(&self, descriptor: &serde_json::Value) -> Result<Agent> {
        let response = self
            .request(Method::POST, &["agents"])?
            .json(descriptor)
            .send()
            .await?;
        json(response).await
    }

    pub async fn heartbeat(&self, name: &str) -> Result<Agent> {
        let response = self
            .request(Method::POST, &["agents", name, "heartbeat"])?
            .send()
            .await?;
        json(response).await
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        let response = self.request(Method::DELETE, &["agents", name])?.send().await?;
        check(response).await?;
        Ok(())
    }

    pub async fn discover(
        &self,
        query: &str,
        limit: Option<usize>,
        resources: Vec<String>,
    ) -> Result<Vec<Candidate>> {
        let body = DiscoverRequest {
            query: query.to_string(),
            limit,
            required_resources: if resources.is_empty() {
                None
            } else {
                Some(resources)
            },
        };
        let response = self
            .request(Method::POST, &["discover"])?
            .json(&body)
            .send()
            .await?;
        let response: DiscoverResponse = json(response).await?;
        Ok(response.results)
    }

    pub async fn delegate(&self, request: &DelegateRequest) -> Result<Receipt> {
        let response = self
            .request(Method::POST, &["delegate"])?
            .json(request)
            .send()
            .await?;
        json(response).await
    }

    pub async fn delegation(&self, id: Uuid) -> Result<Delegation> {
        let id = id.to_string();
        let response = self
            .request(Method::GET, &["delegations", &id])?
            .send()
            .await?;
        json(response).await
    }
}

/// Turn a non-2xx response into an error carrying the server's message
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(anyhow!("Server returned {}: {}", status, text))
}

async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check(response).await?;
    response
        .json()
        .await
        .context("Failed to parse server response")
}
