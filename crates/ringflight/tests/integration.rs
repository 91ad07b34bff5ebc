//! End-to-end tests for a small in-process cache cluster.
//!
//! Each simulated node routes keys with a `PeerRouter` and loads misses from a
//! shared backing store through a `CallGroup`, the way a cache client would.

use ringflight::{CallGroup, PeerRouter, RingConfig, Route};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadError {
    NotFound(String),
}

/// Slow backing store that counts how often each key is loaded.
struct BackingStore {
    values: HashMap<String, String>,
    loads: AtomicUsize,
}

impl BackingStore {
    fn new() -> Self {
        let values = (0..100)
            .map(|i| (format!("key-{}", i), format!("value-{}", i)))
            .collect();
        Self {
            values,
            loads: AtomicUsize::new(0),
        }
    }

    fn load(&self, key: &str) -> Result<String, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(key.to_string()))
    }
}

/// One cache node: its router and its loader group.
struct CacheNode {
    router: PeerRouter,
    loads: CallGroup<String, LoadError>,
}

impl CacheNode {
    fn new(name: &str, peers: &[&str]) -> Self {
        let router = PeerRouter::new(name, &RingConfig::default()).unwrap();
        router.set_peers(peers);
        Self {
            router,
            loads: CallGroup::new(),
        }
    }

    fn get(&self, key: &str, store: &BackingStore) -> Result<String, LoadError> {
        self.loads.call(key, || store.load(key))
    }
}

/// Helper: create an in-process cluster where every node knows every peer.
fn create_cluster(names: &[&str]) -> Vec<Arc<CacheNode>> {
    names
        .iter()
        .map(|name| Arc::new(CacheNode::new(name, names)))
        .collect()
}

#[test]
fn test_nodes_agree_on_owners() {
    let cluster = create_cluster(&["10.0.0.1:8000", "10.0.0.2:8000", "10.0.0.3:8000"]);

    for i in 0..200 {
        let key = format!("key-{}", i);
        let locals: Vec<&str> = cluster
            .iter()
            .filter(|node| node.router.pick(&key).is_local())
            .map(|node| node.router.self_name())
            .collect();

        // Exactly one node considers itself the owner
        assert_eq!(locals.len(), 1, "key {} owned by {:?}", key, locals);

        // Every other node routes to that owner
        for node in &cluster {
            match node.router.pick(&key) {
                Route::Local => assert_eq!(node.router.self_name(), locals[0]),
                Route::Remote(peer) => assert_eq!(peer, locals[0]),
            }
        }
    }
}

#[test]
fn test_concurrent_misses_load_once() {
    let cluster = create_cluster(&["a", "b", "c"]);
    let store = Arc::new(BackingStore::new());

    let key = "key-7";
    let owner = cluster
        .iter()
        .find(|node| node.router.pick(key).is_local())
        .cloned()
        .unwrap();

    let barrier = Arc::new(Barrier::new(10));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let owner = Arc::clone(&owner);
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                owner.get(key, &store)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok("value-7".to_string()));
    }
    assert_eq!(store.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_distinct_keys_load_independently() {
    let node = Arc::new(CacheNode::new("solo", &["solo"]));
    let store = Arc::new(BackingStore::new());

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let node = Arc::clone(&node);
            let store = Arc::clone(&store);
            thread::spawn(move || node.get(&format!("key-{}", i), &store))
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Ok(format!("value-{}", i)));
    }
    assert_eq!(store.loads.load(Ordering::SeqCst), 5);
}

#[test]
fn test_missing_key_error_not_cached() {
    let node = CacheNode::new("solo", &["solo"]);
    let store = BackingStore::new();

    assert_eq!(
        node.get("nope", &store),
        Err(LoadError::NotFound("nope".to_string()))
    );
    assert_eq!(
        node.get("nope", &store),
        Err(LoadError::NotFound("nope".to_string()))
    );
    assert_eq!(store.loads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_membership_change_moves_few_keys() {
    let before = CacheNode::new("a", &["a", "b", "c"]);
    let after = CacheNode::new("a", &["a", "b", "c", "d"]);

    let mut moved = 0;
    for i in 0..1000 {
        let key = format!("key-{}", i);
        let old = before.router.pick(&key);
        let new = after.router.pick(&key);
        if old != new {
            // Moved keys only go to the new peer
            assert_eq!(new, Route::Remote("d".to_string()));
            moved += 1;
        }
    }

    assert!(moved > 0);
    assert!(moved < 400, "Too many keys moved: {}", moved);
}
