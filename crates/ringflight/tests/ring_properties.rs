//! Property tests for ring lookups.

use proptest::prelude::*;
use ringflight::HashRing;

fn node_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z0-9.:]{1,16}", 1..8).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn lookup_returns_an_added_node(
        nodes in node_names(),
        replicas in 1usize..40,
        key in ".*",
    ) {
        let mut ring = HashRing::new(replicas);
        ring.add(&nodes);

        let owner = ring.get(&key).unwrap();
        prop_assert!(nodes.iter().any(|node| node == owner));
        prop_assert_eq!(ring.len(), nodes.len() * replicas);
    }

    #[test]
    fn lookup_is_deterministic(nodes in node_names(), key in ".*") {
        let mut first = HashRing::new(10);
        first.add(&nodes);

        let mut reversed = nodes.clone();
        reversed.reverse();
        let mut second = HashRing::new(10);
        second.add(&reversed);

        prop_assert_eq!(first.get(&key), first.get(&key));
        prop_assert_eq!(first.get(&key), second.get(&key));
    }

    #[test]
    fn adding_a_node_only_moves_keys_to_it(
        nodes in node_names(),
        keys in prop::collection::vec(".*", 1..50),
    ) {
        let mut ring = HashRing::new(20);
        ring.add(&nodes);
        let before: Vec<String> = keys
            .iter()
            .map(|key| ring.get(key).unwrap().to_string())
            .collect();

        ring.add(["newcomer"]);

        for (key, old) in keys.iter().zip(&before) {
            let new = ring.get(key).unwrap();
            prop_assert!(new == old || new == "newcomer");
        }
    }
}
