//! Consistent hashing for key-to-peer routing.
//!
//! This module implements a consistent hash ring that maps cache keys to the
//! peer that owns them. Each peer occupies several virtual positions on the
//! ring so that keys spread evenly and only a fraction of them move when
//! membership changes.

mod hasher;
mod shared;

pub use hasher::{Crc32, Crc32c, HashAlgorithm, KeyHasher};
pub use shared::SharedRing;

use crate::types::{RingConfig, RingError, RingResult, DEFAULT_REPLICAS};
use std::collections::HashMap;
use tracing::debug;

/// A consistent hash ring for routing keys to nodes.
///
/// Virtual node positions are kept in a sorted vector and looked up with a
/// binary search, with a side map from position to owning node. Positions are
/// never removed: shrinking membership means building a new ring.
///
/// # Thread Safety
///
/// `add` takes `&mut self` and re-sorts the whole ring, so the ring must not
/// be mutated while other threads read it. Use [`SharedRing`] when membership
/// changes concurrently with lookups.
///
/// # Example
///
/// ```
/// use ringflight::hashing::HashRing;
///
/// let mut ring = HashRing::new(3);
/// ring.add(["A", "B"]);
/// assert_eq!(ring.get("hello"), Some("A"));
/// ```
#[derive(Clone)]
pub struct HashRing<H = Crc32> {
    /// Hash used for virtual nodes and keys.
    hasher: H,
    /// Virtual nodes per physical node.
    replicas: usize,
    /// Sorted virtual node positions. Colliding positions appear more than once.
    positions: Vec<u32>,
    /// Owning node of each virtual node position.
    owners: HashMap<u32, String>,
}

impl HashRing<Crc32> {
    /// Create an empty ring using the CRC-32 hash.
    ///
    /// # Panics
    ///
    /// Panics if `replicas` is 0.
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, Crc32)
    }
}

impl HashRing<HashAlgorithm> {
    /// Create an empty ring from configuration.
    ///
    /// # Errors
    ///
    /// Returns `RingError::InvalidReplicas` if the configured replica count is 0.
    pub fn from_config(config: &RingConfig) -> RingResult<Self> {
        config.validate()?;
        Ok(Self::with_hasher(config.replicas, config.hash))
    }
}

impl<H: KeyHasher> HashRing<H> {
    /// Create an empty ring with a custom hash function.
    ///
    /// # Arguments
    ///
    /// * `replicas` - Number of virtual nodes per physical node
    /// * `hasher` - Hash applied to virtual node labels and to keys
    ///
    /// # Panics
    ///
    /// Panics if `replicas` is 0.
    pub fn with_hasher(replicas: usize, hasher: H) -> Self {
        assert!(replicas > 0, "Replica count must be greater than 0");

        Self {
            hasher,
            replicas,
            positions: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Returns true if no node has been added.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Add nodes to the ring.
    ///
    /// Each node gets `replicas` virtual positions, hashed from the replica
    /// index in decimal followed by the node name (`"0A"`, `"1A"`, ...). The
    /// whole ring is re-sorted once per call, so batch membership changes
    /// rather than adding nodes one at a time on a hot path.
    ///
    /// Adding a node that is already present is additive: its positions are
    /// inserted again and it counts twice. When two virtual nodes hash to the
    /// same position the later one owns it.
    pub fn add<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0usize;

        for node in nodes {
            let node = node.as_ref();
            self.positions.reserve(self.replicas);
            for replica in 0..self.replicas {
                let position = self.hasher.hash(format!("{}{}", replica, node).as_bytes());
                self.positions.push(position);
                if let Some(previous) = self.owners.insert(position, node.to_string()) {
                    if previous != node {
                        debug!(
                            position,
                            previous = %previous,
                            node,
                            "Virtual node collision, slot reassigned"
                        );
                    }
                }
            }
            added += 1;
        }

        self.positions.sort_unstable();
        debug!(
            added,
            virtual_nodes = self.positions.len(),
            "Added nodes to hash ring"
        );
    }

    /// Get the node that owns `key`.
    ///
    /// This operation is O(log n) where n is the total number of virtual nodes.
    ///
    /// # Returns
    ///
    /// The owner of the first virtual node at or after the key's hash, wrapping
    /// around to the first position. `None` if the ring is empty.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&str> {
        let index = self.position_index(key.as_ref())?;
        self.owner_at(index)
    }

    /// Like [`get`](Self::get), but an empty ring is an error.
    pub fn require(&self, key: impl AsRef<[u8]>) -> RingResult<&str> {
        self.get(key).ok_or(RingError::EmptyRing)
    }

    /// Get up to `n` distinct nodes for `key`.
    ///
    /// Walks the ring clockwise from the key's position, so the primary owner
    /// comes first and the rest are the natural replica holders.
    pub fn get_n(&self, key: impl AsRef<[u8]>, n: usize) -> Vec<&str> {
        let Some(start) = self.position_index(key.as_ref()) else {
            return Vec::new();
        };

        let total = self.positions.len();
        let mut nodes: Vec<&str> = Vec::with_capacity(n.min(total));
        for offset in 0..total {
            if nodes.len() >= n {
                break;
            }
            if let Some(owner) = self.owner_at((start + offset) % total) {
                if !nodes.contains(&owner) {
                    nodes.push(owner);
                }
            }
        }

        nodes
    }

    /// Get the number of virtual nodes per physical node.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Get the total number of virtual nodes in the ring.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Get all nodes that own at least one position.
    ///
    /// Returns a sorted, deduplicated list.
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.owners.values().map(String::as_str).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Count the virtual positions currently owned by `node`.
    pub fn virtual_nodes_of(&self, node: &str) -> usize {
        self.positions
            .iter()
            .filter(|&&position| self.owners.get(&position).is_some_and(|owner| owner == node))
            .count()
    }

    /// Get the hash function used by this ring.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Hash a key and find the index of the first position at or after it.
    fn position_index(&self, key: &[u8]) -> Option<usize> {
        if self.positions.is_empty() {
            return None;
        }

        let hash = self.hasher.hash(key);
        let index = self.positions.partition_point(|&position| position < hash);

        // Past the last position: cycle back to the first one.
        if index == self.positions.len() {
            Some(0)
        } else {
            Some(index)
        }
    }

    fn owner_at(&self, index: usize) -> Option<&str> {
        self.owners.get(&self.positions[index]).map(String::as_str)
    }
}

impl<H: KeyHasher + Clone> HashRing<H> {
    /// Create an empty ring with the same hash and replica count.
    pub fn empty_like(&self) -> Self {
        Self::with_hasher(self.replicas, self.hasher.clone())
    }
}

impl Default for HashRing<Crc32> {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS)
    }
}

impl<H> std::fmt::Debug for HashRing<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("virtual_nodes", &self.positions.len())
            .field("owners", &self.owners.len())
            .finish()
    }
}
