//! Consistent-Hash Ring Tests
//!
//! ## Test Scopes
//! - **Routing**: exact successor selection and wraparound, pinned down with
//!   a digit-parsing hash so every position is known in advance.
//! - **Membership**: add/remove symmetry (the same virtual-node keys on both
//!   paths) and insertion-order independence.
//! - **Distribution**: balance and relocation bounds with the default CRC32
//!   hash; the key corpus is fixed, so the counts are deterministic.

#[cfg(test)]
mod tests {
    use crate::ring::hash_ring::HashRing;
    use std::collections::HashMap;

    /// Interprets the hashed bytes as a decimal number, so virtual-node
    /// positions can be chosen by naming peers after digits.
    fn digit_hash(data: &[u8]) -> u32 {
        std::str::from_utf8(data)
            .expect("test keys are ascii")
            .parse()
            .expect("test keys are numeric")
    }

    // ============================================================
    // ROUTING TESTS (deterministic digit hash)
    // ============================================================

    #[test]
    fn test_successor_selection_and_wraparound() {
        let ring = HashRing::with_hash(3, digit_hash);

        // Peer "6" owns positions 6, 16, 26; peer "4" owns 4, 14, 24;
        // peer "2" owns 2, 12, 22.
        ring.add(&["6", "4", "2"]);

        let cases = [
            ("2", "2"),   // exact position match
            ("11", "2"),  // successor is 12
            ("23", "4"),  // successor is 24
            ("27", "2"),  // past the last position, wraps to 2
        ];
        for (key, expected) in cases {
            assert_eq!(ring.get(key).as_deref(), Some(expected), "key {key}");
        }

        // Peer "8" adds positions 8, 18, 28; key 27 now stops there.
        ring.add(&["8"]);
        assert_eq!(ring.get("27").as_deref(), Some("8"));
    }

    #[test]
    fn test_remove_deletes_the_positions_add_created() {
        let ring = HashRing::with_hash(3, digit_hash);
        ring.add(&["6", "4", "2"]);
        ring.add(&["8"]);
        assert_eq!(ring.len(), 12);

        ring.remove("8");

        assert_eq!(ring.len(), 9);
        // Routing falls back to the pre-"8" owner.
        assert_eq!(ring.get("27").as_deref(), Some("2"));
        assert_eq!(ring.get("7").as_deref(), Some("2"));
    }

    #[test]
    fn test_empty_ring_returns_none() {
        let ring = HashRing::new(50);
        assert!(ring.get("anything").is_none());
        assert!(ring.is_empty());
    }

    #[test]
    fn test_routing_is_independent_of_insertion_order() {
        let forward = HashRing::new(50);
        forward.add(&["node-a", "node-b", "node-c"]);

        let backward = HashRing::new(50);
        backward.add(&["node-c"]);
        backward.add(&["node-b", "node-a"]);

        for i in 0..500 {
            let key = format!("key-{i}");
            assert_eq!(forward.get(&key), backward.get(&key), "key {key}");
        }
    }

    #[test]
    fn test_reset_replaces_the_peer_set() {
        let ring = HashRing::new(50);
        ring.add(&["node-a", "node-b"]);
        assert_eq!(ring.len(), 100);

        ring.reset(&["node-c"]);

        assert_eq!(ring.len(), 50);
        for i in 0..100 {
            assert_eq!(ring.get(&format!("key-{i}")).as_deref(), Some("node-c"));
        }
    }

    #[test]
    fn test_position_count_matches_replicas_times_peers() {
        let ring = HashRing::new(50);
        ring.add(&["node-a", "node-b", "node-c"]);
        assert_eq!(ring.len(), 150);
    }

    // ============================================================
    // DISTRIBUTION TESTS (default CRC32 hash)
    // ============================================================

    #[test]
    fn test_assignment_is_roughly_balanced() {
        let ring = HashRing::new(50);
        ring.add(&["node-a", "node-b", "node-c"]);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for i in 0..10_000 {
            let owner = ring.get(&format!("key-{i}")).expect("ring is not empty");
            *counts.entry(owner).or_insert(0) += 1;
        }

        assert_eq!(counts.len(), 3, "every peer should own some keys");
        for (peer, count) in &counts {
            assert!(
                (2_800..=3_700).contains(count),
                "peer {peer} owns {count} of 10000 keys"
            );
        }
    }

    #[test]
    fn test_adding_a_peer_relocates_about_a_quarter_of_keys() {
        let ring = HashRing::new(50);
        ring.add(&["node-a", "node-b", "node-c"]);

        let before: Vec<Option<String>> = (0..10_000)
            .map(|i| ring.get(&format!("key-{i}")))
            .collect();

        ring.add(&["node-d"]);

        let moved = (0..10_000)
            .filter(|&i| ring.get(&format!("key-{i}")) != before[i as usize])
            .count();

        // Ideally 1/4 of the keys move to the new peer; allow for vnode skew.
        assert!(moved <= 3_300, "{moved} of 10000 keys relocated");
        assert!(moved >= 1_500, "only {moved} of 10000 keys relocated");
    }
}
