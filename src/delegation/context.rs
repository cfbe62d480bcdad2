//! Context carried across delegation hops

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DEPTH_KEY: &str = "depth";

/// Hop counter plus whatever the caller wants forwarded.
///
/// `depth` is the only field the registry interprets. Everything else lands in
/// `extra` and is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelegationContext {
    #[serde(default)]
    pub depth: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DelegationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_depth(depth: u32) -> Self {
        Self {
            depth,
            extra: Map::new(),
        }
    }

    /// Attach a forwarded field. `depth` is reserved and ignored here.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != DEPTH_KEY {
            self.extra.insert(key, value.into());
        }
        self
    }

    /// The context the next agent receives
    pub fn next_hop(&self) -> Self {
        let mut extra = self.extra.clone();
        extra.remove(DEPTH_KEY);
        Self {
            depth: self.depth.saturating_add(1),
            extra,
        }
    }
}
