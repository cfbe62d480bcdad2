//! Wire types for the registry's HTTP API
//!
//! These mirror the server's JSON shapes. Fields the CLI never prints are
//! still kept so responses round-trip cleanly.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub resources: Vec<Grant>,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<serde_json::Value>,
    pub registered_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
}

impl std::fmt::Display for Grant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.access {
            Some(access) => write!(f, "{} ({})", self.uri, access),
            None => write!(f, "{}", self.uri),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoverRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_resources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverResponse {
    pub results: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub agent: Agent,
    pub score: f64,
    #[serde(default)]
    pub matched_capabilities: Vec<String>,
    #[serde(default)]
    pub matched_resources: Vec<ResourceMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceMatch {
    pub requirement: String,
    pub grant: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DelegateRequest {
    pub agent: String,
    pub task: String,
    #[serde(rename = "async")]
    pub async_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Receipt {
    pub delegation_id: Uuid,
    pub agent: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    pub status: String,
    pub success: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub latency_ms: u64,
}

/// A ledger entry
#[derive(Debug, Clone, Deserialize)]
pub struct Delegation {
    pub id: Uuid,
    pub agent_name: String,
    pub task: String,
    pub depth: u32,
    pub status: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub latency_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
