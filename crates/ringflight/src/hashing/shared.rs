//! Thread-safe ring with snapshot swapping.

use super::{Crc32, HashRing, KeyHasher};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// A hash ring that can change membership while other threads look up keys.
///
/// Readers take a cheap snapshot of the current ring. Membership changes build
/// a new ring on the side and swap it in, so a lookup never sees a ring that
/// is half added or half sorted.
///
/// # Example
///
/// ```
/// use ringflight::hashing::{HashRing, SharedRing};
///
/// let ring = SharedRing::new(HashRing::new(3));
/// ring.set(["A", "B", "C"]);
/// ring.set(["A", "B"]);
/// assert_eq!(ring.snapshot().nodes(), vec!["A", "B"]);
/// ```
#[derive(Debug)]
pub struct SharedRing<H = Crc32> {
    current: RwLock<Arc<HashRing<H>>>,
}

impl<H: KeyHasher + Clone> SharedRing<H> {
    /// Wrap a ring for shared use.
    pub fn new(ring: HashRing<H>) -> Self {
        Self {
            current: RwLock::new(Arc::new(ring)),
        }
    }

    /// Get the current ring.
    ///
    /// The snapshot is unaffected by later membership changes.
    pub fn snapshot(&self) -> Arc<HashRing<H>> {
        Arc::clone(&self.current.read())
    }

    /// Get the node that owns `key` in the current ring.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<String> {
        self.current.read().get(key).map(str::to_string)
    }

    /// Returns true if the current ring has no nodes.
    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// Add nodes to the current membership.
    ///
    /// Same semantics as [`HashRing::add`], applied to a copy that replaces
    /// the current ring once it is fully built.
    pub fn add<I, S>(&self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Upgradable read: readers proceed while the copy is built, writers wait.
        let current = self.current.upgradable_read();
        let mut next = HashRing::clone(&current);
        next.add(nodes);

        let mut current = parking_lot::RwLockUpgradableReadGuard::upgrade(current);
        *current = Arc::new(next);
    }

    /// Replace the membership with exactly `nodes`.
    ///
    /// This is the only way to remove nodes: the ring is rebuilt from scratch
    /// with the same hash and replica count.
    pub fn set<I, S>(&self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let current = self.current.upgradable_read();
        let mut next = current.empty_like();
        next.add(nodes);
        debug!(nodes = next.nodes().len(), "Rebuilt hash ring membership");

        let mut current = parking_lot::RwLockUpgradableReadGuard::upgrade(current);
        *current = Arc::new(next);
    }
}

impl<H: KeyHasher + Clone> From<HashRing<H>> for SharedRing<H> {
    fn from(ring: HashRing<H>) -> Self {
        Self::new(ring)
    }
}
