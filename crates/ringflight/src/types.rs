//! Shared configuration and error types.
//!
//! This module defines the configuration used to build hash rings and the
//! error type surfaced when a ring cannot be built or cannot answer a lookup.

use crate::hashing::HashAlgorithm;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of virtual nodes per physical node.
pub const DEFAULT_REPLICAS: usize = 50;

/// Configuration for building a hash ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingConfig {
    /// Number of virtual nodes placed on the ring for each physical node.
    #[serde(default = "default_replicas")]
    pub replicas: usize,
    /// Hash function used for both virtual nodes and keys.
    #[serde(default)]
    pub hash: HashAlgorithm,
}

fn default_replicas() -> usize {
    DEFAULT_REPLICAS
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            hash: HashAlgorithm::default(),
        }
    }
}

impl RingConfig {
    /// Create a config with the given replica count and the default hash.
    pub fn with_replicas(replicas: usize) -> Self {
        Self {
            replicas,
            ..Self::default()
        }
    }

    /// Check that the config can build a ring.
    ///
    /// # Errors
    ///
    /// Returns `RingError::InvalidReplicas` if `replicas` is 0.
    pub fn validate(&self) -> RingResult<()> {
        if self.replicas == 0 {
            return Err(RingError::InvalidReplicas(self.replicas));
        }
        Ok(())
    }
}

/// Errors that can occur when building or querying a ring.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    #[error("Replica count must be greater than 0, got {0}")]
    InvalidReplicas(usize),

    #[error("Hash ring has no nodes")]
    EmptyRing,
}

/// Result type for ring operations.
pub type RingResult<T> = Result<T, RingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RingConfig::default();
        assert_eq!(config.replicas, DEFAULT_REPLICAS);
        assert_eq!(config.hash, HashAlgorithm::Crc32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_replicas_rejected() {
        let config = RingConfig::with_replicas(0);
        assert_eq!(config.validate(), Err(RingError::InvalidReplicas(0)));
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: RingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RingConfig::default());

        let config: RingConfig =
            serde_json::from_str(r#"{"replicas": 3, "hash": "crc32c"}"#).unwrap();
        assert_eq!(config.replicas, 3);
        assert_eq!(config.hash, HashAlgorithm::Crc32c);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            RingError::InvalidReplicas(0).to_string(),
            "Replica count must be greater than 0, got 0"
        );
        assert_eq!(RingError::EmptyRing.to_string(), "Hash ring has no nodes");
    }
}
