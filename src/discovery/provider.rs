//! Discovery providers
//!
//! [`LocalDiscovery`] ranks the directory snapshot with token overlap.
//! [`RemoteDiscovery`] asks an external semantic-search service for a ranking
//! and falls back to local ranking whenever that service cannot be used.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::engine::{self, DiscoveryConfig, DiscoveryResult};
use crate::directory::AgentDirectory;
use crate::error::{AppError, Result};

/// Upper bound on results when the caller gives no limit
pub const DEFAULT_LIMIT: usize = 10;

/// A discovery query as received from callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_resources: Option<Vec<String>>,
}

impl DiscoveryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
            required_resources: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.required_resources = Some(resources);
        self
    }
}

/// Anything that can rank agents for a query
#[async_trait]
pub trait DiscoveryProvider: Send + Sync {
    async fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<DiscoveryResult>>;
}

/// Token-overlap ranking over the directory snapshot
pub struct LocalDiscovery {
    directory: Arc<dyn AgentDirectory>,
    config: DiscoveryConfig,
    default_limit: usize,
}

impl LocalDiscovery {
    pub fn new(directory: Arc<dyn AgentDirectory>) -> Self {
        Self {
            directory,
            config: DiscoveryConfig::default(),
            default_limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }
}

#[async_trait]
impl DiscoveryProvider for LocalDiscovery {
    async fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<DiscoveryResult>> {
        let candidates = self.directory.list().await?;
        Ok(engine::discover(
            &request.query,
            &candidates,
            Some(request.limit.unwrap_or(self.default_limit)),
            request.required_resources.as_deref(),
            &self.config,
        ))
    }
}

#[derive(Debug, Serialize)]
struct SemanticSearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SemanticSearchResponse {
    results: Vec<SemanticHit>,
}

#[derive(Debug, Deserialize)]
struct SemanticHit {
    name: String,
    score: f64,
    #[serde(default)]
    matched_capabilities: Vec<String>,
}

/// Ranking delegated to an external semantic-search service
pub struct RemoteDiscovery {
    client: Client,
    endpoint: String,
    timeout: Duration,
    fallback: LocalDiscovery,
}

impl RemoteDiscovery {
    pub fn new(endpoint: impl Into<String>, fallback: LocalDiscovery) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
            fallback,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn search(&self, request: &DiscoveryRequest, limit: usize) -> Result<Vec<DiscoveryResult>> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&SemanticSearchRequest {
                query: &request.query,
                limit,
            })
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Semantic search failed: {} - {}",
                status, text
            )));
        }

        let body: SemanticSearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        // Hits are resolved against the directory so callers always get full descriptors
        let snapshot = self.fallback.directory.list().await?;
        let requirements = request
            .required_resources
            .as_deref()
            .filter(|r| !r.is_empty());

        let mut results: Vec<DiscoveryResult> = body
            .results
            .into_iter()
            .filter_map(|hit| {
                let agent = snapshot.iter().find(|a| a.name == hit.name)?;
                let mut score = hit.score.clamp(0.0, 1.0);
                let mut matched_resources = Vec::new();
                if let Some(reqs) = requirements {
                    matched_resources = engine::cover_requirements(agent, reqs)?;
                    score = engine::boosted_score(
                        score,
                        matched_resources.len(),
                        reqs.len(),
                        &self.fallback.config,
                    );
                }
                Some(DiscoveryResult {
                    agent: agent.clone(),
                    score,
                    matched_capabilities: hit.matched_capabilities,
                    matched_resources,
                })
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);
        Ok(results)
    }
}

#[async_trait]
impl DiscoveryProvider for RemoteDiscovery {
    async fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<DiscoveryResult>> {
        // Same contract as local ranking: no tokens, no candidates
        if engine::tokenize(&request.query).is_empty() {
            return Ok(Vec::new());
        }

        let limit = request.limit.unwrap_or(self.fallback.default_limit);
        match self.search(request, limit).await {
            Ok(results) => Ok(results),
            Err(AppError::Upstream(e)) => {
                tracing::warn!("Semantic search unavailable, using local ranking: {}", e);
                self.fallback.discover(request).await
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;
    use crate::models::{AgentDescriptor, ResourceGrant};

    fn directory() -> Arc<dyn AgentDirectory> {
        Arc::new(MemoryDirectory::from_agents(vec![
            AgentDescriptor::new("crawler", "Searches the web", vec!["search".into()], "http://a"),
            AgentDescriptor::new("reviewer", "Reviews code", vec!["review".into()], "http://b")
                .with_resources(vec![ResourceGrant::new("github.com/acme/*")]),
        ]))
    }

    #[tokio::test]
    async fn test_local_discovery_uses_directory_snapshot() {
        let provider = LocalDiscovery::new(directory());
        let results = provider
            .discover(&DiscoveryRequest::new("review"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].agent.name, "reviewer");
    }

    #[tokio::test]
    async fn test_local_discovery_applies_default_limit() {
        let provider = LocalDiscovery::new(directory()).with_default_limit(1);
        let results = provider
            .discover(&DiscoveryRequest::new("search review"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_local_discovery_resource_filter() {
        let provider = LocalDiscovery::new(directory());
        let request = DiscoveryRequest::new("search review")
            .with_resources(vec!["github.com/acme/api".to_string()]);
        let results = provider.discover(&request).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].agent.name, "reviewer");
        assert_eq!(results[0].matched_resources[0].grant, "github.com/acme/*");
    }

    #[tokio::test]
    async fn test_remote_discovery_falls_back_when_unreachable() {
        let provider = RemoteDiscovery::new("http://127.0.0.1:1/search", LocalDiscovery::new(directory()))
            .with_timeout(Duration::from_millis(500));
        let results = provider
            .discover(&DiscoveryRequest::new("web"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].agent.name, "crawler");
    }

    #[test]
    fn test_discovery_request_deserialization() {
        let req: DiscoveryRequest = serde_json::from_str(
            r#"{"query": "code", "required_resources": ["file://vm1/srv"]}"#,
        )
        .unwrap();
        assert_eq!(req.query, "code");
        assert_eq!(req.limit, None);
        assert_eq!(req.required_resources.unwrap(), vec!["file://vm1/srv"]);
    }
}
