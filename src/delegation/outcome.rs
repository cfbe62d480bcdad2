//! Result of a single delegation attempt

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{DelegationStatus, LedgerUpdate};

/// Terminal state of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The target answered synchronously
    Completed,
    /// The target took the task and will report through the callback
    Accepted,
    Failed,
    /// No answer before the deadline; the target may still be running
    Timeout,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Completed => "completed",
            OutcomeStatus::Accepted => "accepted",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::Timeout => "timeout",
        }
    }
}

impl From<OutcomeStatus> for DelegationStatus {
    fn from(status: OutcomeStatus) -> Self {
        match status {
            OutcomeStatus::Completed => DelegationStatus::Completed,
            OutcomeStatus::Accepted => DelegationStatus::Accepted,
            OutcomeStatus::Failed => DelegationStatus::Failed,
            OutcomeStatus::Timeout => DelegationStatus::Timeout,
        }
    }
}

/// What the delegation client reports back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationOutcome {
    pub status: OutcomeStatus,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "latency_ms", with = "millis")]
    pub latency: Duration,
}

impl DelegationOutcome {
    pub fn completed(result: Option<String>, latency: Duration) -> Self {
        Self {
            status: OutcomeStatus::Completed,
            success: true,
            result,
            error: None,
            latency,
        }
    }

    pub fn accepted(latency: Duration) -> Self {
        Self {
            status: OutcomeStatus::Accepted,
            success: true,
            result: None,
            error: None,
            latency,
        }
    }

    pub fn failed(error: impl Into<String>, latency: Duration) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            success: false,
            result: None,
            error: Some(error.into()),
            latency,
        }
    }

    pub fn timeout(timeout: Duration, latency: Duration) -> Self {
        Self {
            status: OutcomeStatus::Timeout,
            success: false,
            result: None,
            error: Some(format!("No response within {}ms", timeout.as_millis())),
            latency,
        }
    }

    /// The ledger write that records this outcome
    pub fn to_ledger_update(&self) -> LedgerUpdate {
        LedgerUpdate {
            status: self.status.into(),
            result: self.result.clone(),
            error: self.error.clone(),
            latency_ms: Some(self.latency.as_millis() as u64),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
