//! Configuration management for the ringflight CLI.

use anyhow::{Context, Result};
use ringflight::RingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file searched for in the current and parent directories.
pub const CONFIG_FILE: &str = "ringflight.toml";

/// Ringflight tool configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ring: RingConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
}

/// Peer membership as seen from this node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// This node's own peer name.
    #[serde(default = "default_self_name")]
    pub self_name: String,
    /// All peers, including this node.
    #[serde(default = "default_peers")]
    pub peers: Vec<String>,
}

fn default_self_name() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_peers() -> Vec<String> {
    vec![
        "http://127.0.0.1:9000".to_string(),
        "http://127.0.0.1:9001".to_string(),
        "http://127.0.0.1:9002".to_string(),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ring: RingConfig::default(),
            cluster: ClusterConfig::default(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            self_name: default_self_name(),
            peers: default_peers(),
        }
    }
}

impl Config {
    /// Load config from an explicit path, or from ringflight.toml in the
    /// current or parent directories. Falls back to defaults if none exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(),
        };

        match path {
            Some(path) => Self::read(&path),
            None => Ok(Config::default()),
        }
    }

    /// Read and validate a config file.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .ring
            .validate()
            .with_context(|| format!("Invalid ring settings in {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Replace the configured peers when `nodes` is non-empty.
    pub fn with_nodes(mut self, nodes: Vec<String>) -> Self {
        if !nodes.is_empty() {
            self.cluster.peers = nodes;
        }
        self
    }
}

/// Find ringflight.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}
