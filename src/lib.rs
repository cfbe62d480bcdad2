//! Agentmesh registry - capability-based discovery and task delegation

pub mod config;
pub mod delegation;
pub mod directory;
pub mod discovery;
pub mod error;
pub mod ledger;
pub mod models;
pub mod routes;
pub mod store;

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::delegation::Delegator;
use crate::discovery::{DiscoveryProvider, LocalDiscovery, RemoteDiscovery};
use crate::store::Store;

/// Application state shared across handlers
pub struct AppState {
    pub store: Store,
    pub discovery: Arc<dyn DiscoveryProvider>,
    pub delegator: Delegator,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Arc<Self> {
        Self::from_config(pool, &ServerConfig::default())
    }

    pub fn from_config(pool: SqlitePool, config: &ServerConfig) -> Arc<Self> {
        let store = Store::new(pool);

        let local = LocalDiscovery::new(Arc::new(store.clone()))
            .with_config(config.discovery_config())
            .with_default_limit(config.default_limit);
        let discovery: Arc<dyn DiscoveryProvider> = match &config.semantic_search_url {
            Some(url) => Arc::new(RemoteDiscovery::new(url.clone(), local)),
            None => Arc::new(local),
        };

        let delegator = Delegator::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            config.delegation_client(),
        );

        Arc::new(Self {
            store,
            discovery,
            delegator,
        })
    }
}
