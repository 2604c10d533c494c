//! Property test for invariant 1: `|entries| <= max_size` after arbitrary
//! sequences of set/get/delete.

use ember_cache::{Cache, CacheConfig, Ttl};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Set(u8),
    Get(u8),
    Delete(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..12).prop_map(Op::Set),
        (0u8..12).prop_map(Op::Get),
        (0u8..12).prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn size_never_exceeds_max_size(
        max_size in 1usize..8,
        policy in prop_oneof![Just("lru"), Just("lfu"), Just("fifo")],
        ops in proptest::collection::vec(op_strategy(), 1..60),
    ) {
        let cache: Cache<u8, u8> = Cache::new(CacheConfig {
            eviction_policy: policy.to_string(),
            cleanup_interval: std::time::Duration::from_secs(3600),
            ..CacheConfig::new(max_size)
        })
        .unwrap();

        for op in ops {
            match op {
                Op::Set(k) => {
                    let _ = cache.set(k, k, Ttl::Never);
                }
                Op::Get(k) => {
                    let _ = cache.get(&k);
                }
                Op::Delete(k) => {
                    let _ = cache.delete(&k);
                }
            }
            prop_assert!(cache.size() <= max_size);
        }
        cache.stop();
    }
}
