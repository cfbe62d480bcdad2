//! Read-only view of the agent registry used by discovery and delegation

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::AgentDescriptor;

/// Point-in-time access to registered agents
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Snapshot of every registered agent
    async fn list(&self) -> Result<Vec<AgentDescriptor>>;

    async fn get(&self, name: &str) -> Result<Option<AgentDescriptor>>;
}

/// Directory held in memory, keyed by agent name
#[derive(Default)]
pub struct MemoryDirectory {
    agents: RwLock<BTreeMap<String, AgentDescriptor>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_agents(agents: impl IntoIterator<Item = AgentDescriptor>) -> Self {
        Self {
            agents: RwLock::new(agents.into_iter().map(|a| (a.name.clone(), a)).collect()),
        }
    }

    pub async fn insert(&self, agent: AgentDescriptor) {
        self.agents.write().await.insert(agent.name.clone(), agent);
    }

    pub async fn remove(&self, name: &str) -> Option<AgentDescriptor> {
        self.agents.write().await.remove(name)
    }
}

#[async_trait]
impl AgentDirectory for MemoryDirectory {
    async fn list(&self) -> Result<Vec<AgentDescriptor>> {
        Ok(self.agents.read().await.values().cloned().collect())
    }

    async fn get(&self, name: &str) -> Result<Option<AgentDescriptor>> {
        Ok(self.agents.read().await.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str) -> AgentDescriptor {
        AgentDescriptor::new(name, "", vec!["code".to_string()], "http://localhost:9000")
    }

    #[tokio::test]
    async fn test_memory_directory_list_is_sorted_by_name() {
        let dir = MemoryDirectory::from_agents(vec![agent("zeta"), agent("alpha")]);
        let names: Vec<_> = dir.list().await.unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_memory_directory_insert_get_remove() {
        let dir = MemoryDirectory::new();
        assert!(dir.get("alpha").await.unwrap().is_none());

        dir.insert(agent("alpha")).await;
        assert_eq!(dir.get("alpha").await.unwrap().unwrap().name, "alpha");

        assert!(dir.remove("alpha").await.is_some());
        assert!(dir.get("alpha").await.unwrap().is_none());
    }
}
