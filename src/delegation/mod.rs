//! Task delegation between agents
//!
//! A delegation is a single HTTP handoff to an agent's callback endpoint.
//! Nested delegations are bounded by the hop depth carried in the
//! [`DelegationContext`]; no call-stack state is kept anywhere else.

pub mod client;
pub mod context;
pub mod delegator;
pub mod outcome;

pub use client::{DelegateOptions, DelegationClient, DEFAULT_TIMEOUT, MAX_DEPTH};
pub use context::DelegationContext;
pub use delegator::{DelegateRequest, DelegationReceipt, Delegator};
pub use outcome::{DelegationOutcome, OutcomeStatus};
