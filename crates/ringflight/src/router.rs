//! Peer selection for a cache node.
//!
//! A router knows this node's own name and the current peer set, and decides
//! for each key whether it should be loaded locally or fetched from the peer
//! that owns it.

use crate::hashing::{HashAlgorithm, HashRing, SharedRing};
use crate::types::{RingConfig, RingResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a key should be served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// This node owns the key, or there are no peers.
    Local,
    /// The named peer owns the key.
    Remote(String),
}

impl Route {
    /// Returns true if the key is handled by this node.
    pub fn is_local(&self) -> bool {
        matches!(self, Route::Local)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Local => write!(f, "local"),
            Route::Remote(peer) => write!(f, "remote({})", peer),
        }
    }
}

/// Routes keys to peers using a consistent hash ring.
#[derive(Debug)]
pub struct PeerRouter {
    /// This node's own name, as it appears in the peer list.
    self_name: String,
    ring: SharedRing<HashAlgorithm>,
}

impl PeerRouter {
    /// Create a router with no peers.
    ///
    /// # Errors
    ///
    /// Returns `RingError::InvalidReplicas` if the config has 0 replicas.
    pub fn new(self_name: impl Into<String>, config: &RingConfig) -> RingResult<Self> {
        Ok(Self {
            self_name: self_name.into(),
            ring: SharedRing::new(HashRing::from_config(config)?),
        })
    }

    /// Replace the peer set.
    ///
    /// The list should include this node's own name if it serves keys.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ring.set(peers);
        debug!(self_name = %self.self_name, "Updated peer set");
    }

    /// Pick where `key` should be served from.
    pub fn pick(&self, key: &str) -> Route {
        match self.ring.get(key) {
            Some(owner) if owner != self.self_name => Route::Remote(owner),
            _ => Route::Local,
        }
    }

    /// Get this node's name.
    pub fn self_name(&self) -> &str {
        &self.self_name
    }

    /// Get the current peer names.
    pub fn peers(&self) -> Vec<String> {
        self.ring
            .snapshot()
            .nodes()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
