//! Data models for agents, resource grants and the delegation ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An agent as advertised in the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub resources: Vec<ResourceGrant>,
    /// Callback address delegations are POSTed to
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthDescriptor>,
    pub registered_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl AgentDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        capabilities: Vec<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: description.into(),
            capabilities,
            resources: Vec::new(),
            endpoint: endpoint.into(),
            auth: None,
            registered_at: now,
            last_seen: now,
        }
    }

    pub fn with_resources(mut self, resources: Vec<ResourceGrant>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_auth(mut self, auth: AuthDescriptor) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// Scoped access an agent advertises.
///
/// `uri` is either `scheme://host/path`, or an opaque repo slug, plain path or
/// logical service name. On the wire a grant may be given as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GrantRepr")]
pub struct ResourceGrant {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessLevel>,
}

impl ResourceGrant {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            access: None,
        }
    }

    pub fn with_access(mut self, access: AccessLevel) -> Self {
        self.access = Some(access);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GrantRepr {
    Bare(String),
    Full {
        uri: String,
        #[serde(default)]
        access: Option<AccessLevel>,
    },
}

impl From<GrantRepr> for ResourceGrant {
    fn from(repr: GrantRepr) -> Self {
        match repr {
            GrantRepr::Bare(uri) => ResourceGrant { uri, access: None },
            GrantRepr::Full { uri, access } => ResourceGrant { uri, access },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

/// Credential attached to outgoing delegation requests. Opaque to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthDescriptor {
    /// Sent as `Authorization: Bearer <token>`
    Bearer { token: String },
    /// Sent as `<name>: <value>`
    Header { name: String, value: String },
}

/// Status of a delegation as kept in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    Started,
    Accepted,
    Completed,
    Failed,
    Timeout,
}

impl DelegationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelegationStatus::Started => "started",
            DelegationStatus::Accepted => "accepted",
            DelegationStatus::Completed => "completed",
            DelegationStatus::Failed => "failed",
            DelegationStatus::Timeout => "timeout",
        }
    }

    /// A terminal entry accepts no further updates.
    ///
    /// `timeout` is not terminal here: the callee may still be running and
    /// deliver its result through the callback later.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DelegationStatus::Completed | DelegationStatus::Failed)
    }
}

impl std::str::FromStr for DelegationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(DelegationStatus::Started),
            "accepted" => Ok(DelegationStatus::Accepted),
            "completed" => Ok(DelegationStatus::Completed),
            "failed" => Ok(DelegationStatus::Failed),
            "timeout" => Ok(DelegationStatus::Timeout),
            _ => Err(format!("Invalid delegation status: {}", s)),
        }
    }
}

/// One delegation attempt in the audit ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationRecord {
    pub id: Uuid,
    pub agent_name: String,
    pub task: String,
    pub depth: u32,
    pub status: DelegationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DelegationRecord {
    /// A freshly dispatched attempt
    pub fn started(id: Uuid, agent_name: impl Into<String>, task: impl Into<String>, depth: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            agent_name: agent_name.into(),
            task: task.into(),
            depth,
            status: DelegationStatus::Started,
            result: None,
            error: None,
            latency_ms: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A status change applied to an existing ledger entry
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerUpdate {
    pub status: DelegationStatus,
    pub result: Option<String>,
    pub error: Option<String>,
    pub latency_ms: Option<u64>,
}

/// Request to register (or re-register) an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub resources: Vec<ResourceGrant>,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthDescriptor>,
}

/// Body a target agent POSTs to the callback URL once async work finishes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub status: DelegationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
