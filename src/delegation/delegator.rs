//! Orchestrates one delegation end to end
//!
//! Resolves the target, writes the attempt to the ledger, runs the client and
//! records the outcome. Async callbacks land here too.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::client::{DelegateOptions, DelegationClient};
use super::context::DelegationContext;
use super::outcome::DelegationOutcome;
use crate::directory::AgentDirectory;
use crate::error::{AppError, Result};
use crate::ledger::DelegationLedger;
use crate::models::{CallbackPayload, DelegationRecord, DelegationStatus, LedgerUpdate};

/// A delegation to perform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateRequest {
    pub agent: String,
    pub task: String,
    /// Context received from an upstream caller, if this is a nested hop
    #[serde(default)]
    pub context: DelegationContext,
    #[serde(default, rename = "async")]
    pub async_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl DelegateRequest {
    pub fn new(agent: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            task: task.into(),
            context: DelegationContext::default(),
            async_mode: false,
            timeout_secs: None,
        }
    }
}

/// What the caller gets back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationReceipt {
    pub delegation_id: Uuid,
    pub agent: String,
    pub outcome: DelegationOutcome,
}

pub struct Delegator {
    directory: Arc<dyn AgentDirectory>,
    ledger: Arc<dyn DelegationLedger>,
    client: DelegationClient,
}

impl Delegator {
    pub fn new(
        directory: Arc<dyn AgentDirectory>,
        ledger: Arc<dyn DelegationLedger>,
        client: DelegationClient,
    ) -> Self {
        Self {
            directory,
            ledger,
            client,
        }
    }

    /// Delegate a task to a registered agent and record the attempt.
    ///
    /// Remote problems come back inside the receipt's outcome; `Err` is only
    /// returned for an unknown agent, an empty task, or a ledger that cannot
    /// record the attempt.
    pub async fn delegate(&self, request: DelegateRequest) -> Result<DelegationReceipt> {
        if request.task.trim().is_empty() {
            return Err(AppError::BadRequest("Task must not be empty".to_string()));
        }

        let agent = self
            .directory
            .get(&request.agent)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Agent {} not found", request.agent)))?;

        let delegation_id = Uuid::new_v4();
        self.ledger
            .record(&DelegationRecord::started(
                delegation_id,
                &agent.name,
                &request.task,
                request.context.depth,
            ))
            .await?;

        let outcome = self
            .client
            .delegate(
                &agent.endpoint,
                delegation_id,
                &request.task,
                DelegateOptions {
                    context: request.context,
                    auth: agent.auth.clone(),
                    timeout: request.timeout_secs.map(Duration::from_secs),
                    async_mode: request.async_mode,
                },
            )
            .await;

        match self.ledger.update(delegation_id, outcome.to_ledger_update()).await {
            Ok(_) => {}
            // The callback may already have finished this entry
            Err(AppError::Conflict(e)) => tracing::debug!(%delegation_id, "Ledger already terminal: {}", e),
            Err(e) => tracing::error!(%delegation_id, "Failed to record delegation outcome: {}", e),
        }

        Ok(DelegationReceipt {
            delegation_id,
            agent: agent.name,
            outcome,
        })
    }

    /// Apply an async result POSTed by the target agent
    pub async fn complete(&self, delegation_id: Uuid, payload: CallbackPayload) -> Result<DelegationRecord> {
        if !payload.status.is_terminal() {
            return Err(AppError::BadRequest(format!(
                "Callback status must be completed or failed, got {}",
                payload.status.as_str()
            )));
        }

        if self.ledger.get(delegation_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Delegation {} not found",
                delegation_id
            )));
        }

        let record = self
            .ledger
            .update(
                delegation_id,
                LedgerUpdate {
                    status: payload.status,
                    result: payload.result,
                    error: payload.error,
                    latency_ms: None,
                },
            )
            .await?;

        tracing::info!(
            %delegation_id,
            status = record.status.as_str(),
            "Async delegation result received"
        );

        Ok(record)
    }
}
