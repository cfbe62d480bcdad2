//! Database store for agents and the delegation ledger

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::directory::AgentDirectory;
use crate::error::{AppError, Result};
use crate::ledger::DelegationLedger;
use crate::models::{AgentDescriptor, DelegationRecord, LedgerUpdate, RegisterAgentRequest};

/// Database store
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // Agent operations

    /// Insert or replace an agent by name. `registered_at` survives re-registration.
    pub async fn upsert_agent(&self, request: RegisterAgentRequest) -> Result<AgentDescriptor> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Agent name must not be empty".to_string()));
        }
        if request.endpoint.trim().is_empty() {
            return Err(AppError::BadRequest(format!(
                "Agent {} has no callback endpoint",
                name
            )));
        }

        let now = Utc::now();
        let auth = request
            .auth
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO agents (name, description, capabilities, resources, endpoint, auth, registered_at, last_seen)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                description = excluded.description,
                capabilities = excluded.capabilities,
                resources = excluded.resources,
                endpoint = excluded.endpoint,
                auth = excluded.auth,
                last_seen = excluded.last_seen
            "#,
        )
        .bind(name)
        .bind(&request.description)
        .bind(serde_json::to_string(&request.capabilities)?)
        .bind(serde_json::to_string(&request.resources)?)
        .bind(request.endpoint.trim())
        .bind(auth)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::info!(agent = name, "Agent registered");

        self.get_agent(name).await
    }

    pub async fn get_agent(&self, name: &str) -> Result<AgentDescriptor> {
        self.find_agent(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Agent {} not found", name)))
    }

    pub async fn find_agent(&self, name: &str) -> Result<Option<AgentDescriptor>> {
        let row = sqlx::query_as::<_, AgentRow>(
            r#"
            SELECT name, description, capabilities, resources, endpoint, auth, registered_at, last_seen
            FROM agents
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentDescriptor>> {
        let rows = sqlx::query_as::<_, AgentRow>(
            r#"
            SELECT name, description, capabilities, resources, endpoint, auth, registered_at, last_seen
            FROM agents
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    pub async fn delete_agent(&self, name: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM agents WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Agent {} not found", name)));
        }

        tracing::info!(agent = name, "Agent removed");
        Ok(())
    }

    /// Refresh `last_seen` for a live agent
    pub async fn heartbeat(&self, name: &str) -> Result<AgentDescriptor> {
        let result = sqlx::query("UPDATE agents SET last_seen = ? WHERE name = ?")
            .bind(Utc::now())
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Agent {} not found", name)));
        }

        self.get_agent(name).await
    }

    // Ledger operations

    pub async fn record_delegation(&self, attempt: &DelegationRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO delegations (id, agent_name, task, depth, status, result, error, latency_ms, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(attempt.id.to_string())
        .bind(&attempt.agent_name)
        .bind(&attempt.task)
        .bind(i64::from(attempt.depth))
        .bind(attempt.status.as_str())
        .bind(&attempt.result)
        .bind(&attempt.error)
        .bind(attempt.latency_ms.map(|ms| ms as i64))
        .bind(attempt.created_at)
        .bind(attempt.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply a status change unless the entry is already terminal
    pub async fn update_delegation(&self, id: Uuid, update: LedgerUpdate) -> Result<DelegationRecord> {
        let result = sqlx::query(
            r#"
            UPDATE delegations
            SET status = ?,
                result = COALESCE(?, result),
                error = COALESCE(?, error),
                latency_ms = COALESCE(?, latency_ms),
                updated_at = ?
            WHERE id = ? AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(update.status.as_str())
        .bind(&update.result)
        .bind(&update.error)
        .bind(update.latency_ms.map(|ms| ms as i64))
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        let record = self.get_delegation(id).await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Delegation {} is already {}",
                id,
                record.status.as_str()
            )));
        }

        Ok(record)
    }

    pub async fn get_delegation(&self, id: Uuid) -> Result<DelegationRecord> {
        self.find_delegation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Delegation {} not found", id)))
    }

    pub async fn find_delegation(&self, id: Uuid) -> Result<Option<DelegationRecord>> {
        let row = sqlx::query_as::<_, DelegationRow>(
            r#"
            SELECT id, agent_name, task, depth, status, result, error, latency_ms, created_at, updated_at
            FROM delegations
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Newest first, optionally for a single agent
    pub async fn list_delegations(&self, agent_name: Option<&str>) -> Result<Vec<DelegationRecord>> {
        let rows = sqlx::query_as::<_, DelegationRow>(
            r#"
            SELECT id, agent_name, task, depth, status, result, error, latency_ms, created_at, updated_at
            FROM delegations
            WHERE ? IS NULL OR agent_name = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(agent_name)
        .bind(agent_name)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

#[async_trait]
impl AgentDirectory for Store {
    async fn list(&self) -> Result<Vec<AgentDescriptor>> {
        self.list_agents().await
    }

    async fn get(&self, name: &str) -> Result<Option<AgentDescriptor>> {
        self.find_agent(name).await
    }
}

#[async_trait]
impl DelegationLedger for Store {
    async fn record(&self, attempt: &DelegationRecord) -> Result<()> {
        self.record_delegation(attempt).await
    }

    async fn update(&self, id: Uuid, update: LedgerUpdate) -> Result<DelegationRecord> {
        self.update_delegation(id, update).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<DelegationRecord>> {
        self.find_delegation(id).await
    }
}

// Internal row types for sqlx

#[derive(sqlx::FromRow)]
struct AgentRow {
    name: String,
    description: String,
    capabilities: String,
    resources: String,
    endpoint: String,
    auth: Option<String>,
    registered_at: chrono::DateTime<Utc>,
    last_seen: chrono::DateTime<Utc>,
}

impl TryFrom<AgentRow> for AgentDescriptor {
    type Error = AppError;

    fn try_from(row: AgentRow) -> Result<Self> {
        Ok(AgentDescriptor {
            capabilities: serde_json::from_str(&row.capabilities)
                .map_err(|e| AppError::Internal(format!("Invalid capabilities for {}: {}", row.name, e)))?,
            resources: serde_json::from_str(&row.resources)
                .map_err(|e| AppError::Internal(format!("Invalid resources for {}: {}", row.name, e)))?,
            auth: row
                .auth
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .map_err(|e| AppError::Internal(format!("Invalid auth for {}: {}", row.name, e)))?,
            name: row.name,
            description: row.description,
            endpoint: row.endpoint,
            registered_at: row.registered_at,
            last_seen: row.last_seen,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DelegationRow {
    id: String,
    agent_name: String,
    task: String,
    depth: i64,
    status: String,
    result: Option<String>,
    error: Option<String>,
    latency_ms: Option<i64>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl TryFrom<DelegationRow> for DelegationRecord {
    type Error = AppError;

    fn try_from(row: DelegationRow) -> Result<Self> {
        Ok(DelegationRecord {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| AppError::Internal(format!("Invalid UUID: {}", e)))?,
            agent_name: row.agent_name,
            task: row.task,
            depth: u32::try_from(row.depth)
                .map_err(|e| AppError::Internal(format!("Invalid depth: {}", e)))?,
            status: row
                .status
                .parse()
                .map_err(|e| AppError::Internal(format!("Invalid status: {}", e)))?,
            result: row.result,
            error: row.error,
            latency_ms: row.latency_ms.map(|ms| ms.max(0) as u64),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
