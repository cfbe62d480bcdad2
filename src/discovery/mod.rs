//! Capability and resource based agent discovery
//!
//! Agents are ranked by how many query tokens appear in their advertised
//! description and capabilities, then filtered by whether their resource
//! grants cover every required resource.

pub mod engine;
pub mod matcher;
pub mod provider;

pub use engine::{discover, DiscoveryConfig, DiscoveryResult, ResourceMatch};
pub use matcher::matches;
pub use provider::{DiscoveryProvider, DiscoveryRequest, LocalDiscovery, RemoteDiscovery};
