//! Configuration schema

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Agent settings
    pub agent: AgentConfig,

    /// Store settings
    pub store: StoreConfig,
}

/// `[agent]` section: where the agent lives and what it prefetches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL all asset paths resolve against
    pub origin: String,

    /// Path of the manifest feed, relative to the origin
    pub manifest_path: String,

    /// Path the agent itself is registered under; never intercepted
    pub bootstrap_path: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            manifest_path: "/feeds/atom.json".to_string(),
            bootstrap_path: "/assets/js/agent.js".to_string(),
        }
    }
}

/// `[store]` section: where cache stores live
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store root directory; defaults to the platform state directory
    pub root: Option<PathBuf>,
}
