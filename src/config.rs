//! Server configuration, from flags or environment

use clap::Parser;
use std::time::Duration;

use crate::delegation::{DelegationClient, DEFAULT_TIMEOUT, MAX_DEPTH};
use crate::discovery::engine::{DiscoveryConfig, DEFAULT_RESOURCE_BOOST};
use crate::discovery::provider::DEFAULT_LIMIT;

const DEFAULT_DATABASE_URL: &str = "sqlite:agentmesh.db?mode=rwc";
const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT.as_secs();

#[derive(Debug, Clone, Parser)]
#[command(name = "agentmesh")]
#[command(about = "Agent registry with capability discovery and task delegation")]
#[command(version)]
pub struct ServerConfig {
    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Address to listen on
    #[arg(long, env = "AGENTMESH_BIND", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Externally reachable base URL, used to build async callback URLs
    #[arg(long, env = "AGENTMESH_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Hop depth at which delegations are refused
    #[arg(long, env = "AGENTMESH_MAX_DEPTH", default_value_t = MAX_DEPTH)]
    pub max_depth: u32,

    /// Default deadline for a delegation call
    #[arg(long, env = "AGENTMESH_DELEGATION_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub delegation_timeout_secs: u64,

    /// Score added when an agent covers all required resources
    #[arg(long, env = "AGENTMESH_RESOURCE_BOOST", default_value_t = DEFAULT_RESOURCE_BOOST)]
    pub resource_boost: f64,

    /// Result cap when a discovery query gives none
    #[arg(long, env = "AGENTMESH_DEFAULT_LIMIT", default_value_t = DEFAULT_LIMIT)]
    pub default_limit: usize,

    /// External semantic-search endpoint; local ranking is used when unset
    #[arg(long, env = "AGENTMESH_SEMANTIC_SEARCH_URL")]
    pub semantic_search_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind: DEFAULT_BIND.to_string(),
            public_url: None,
            max_depth: MAX_DEPTH,
            delegation_timeout_secs: DEFAULT_TIMEOUT_SECS,
            resource_boost: DEFAULT_RESOURCE_BOOST,
            default_limit: DEFAULT_LIMIT,
            semantic_search_url: None,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.resource_boost.is_finite() || self.resource_boost < 0.0 {
            return Err(format!(
                "resource boost must be a non-negative number, got {}",
                self.resource_boost
            ));
        }
        if self.default_limit == 0 {
            return Err("default limit must be at least 1".to_string());
        }
        if self.delegation_timeout_secs == 0 {
            return Err("delegation timeout must be at least 1 second".to_string());
        }
        Ok(())
    }

    pub fn delegation_timeout(&self) -> Duration {
        Duration::from_secs(self.delegation_timeout_secs)
    }

    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            resource_boost: self.resource_boost,
        }
    }

    pub fn delegation_client(&self) -> DelegationClient {
        let client = DelegationClient::new()
            .with_max_depth(self.max_depth)
            .with_timeout(self.delegation_timeout());
        match &self.public_url {
            Some(url) => client.with_callback_base(url.clone()),
            None => client,
        }
    }
}
