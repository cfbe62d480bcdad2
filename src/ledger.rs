//! Delegation audit ledger

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{DelegationRecord, LedgerUpdate};

/// Append-only record of delegation attempts and their outcomes.
///
/// Writes are at-least-once and keyed by delegation id: recording the same
/// attempt twice is a no-op, and updating an entry that is already terminal
/// fails with [`AppError::Conflict`](crate::error::AppError::Conflict).
#[async_trait]
pub trait DelegationLedger: Send + Sync {
    async fn record(&self, attempt: &DelegationRecord) -> Result<()>;

    async fn update(&self, id: Uuid, update: LedgerUpdate) -> Result<DelegationRecord>;

    async fn get(&self, id: Uuid) -> Result<Option<DelegationRecord>>;
}
