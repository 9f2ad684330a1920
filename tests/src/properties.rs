//! Property tests for the parallel engine.
//!
//! Every property is checked against a plain sequential rendition of the
//! same operation, on pools of one, four, and one-per-core workers.

use std::sync::OnceLock;

use plait::{ParallelEngine, ThreadPool};
use proptest::prelude::*;

fn pools() -> &'static [ThreadPool] {
    static POOLS: OnceLock<Vec<ThreadPool>> = OnceLock::new();
    POOLS.get_or_init(|| {
        let per_core = std::thread::available_parallelism().map_or(8, usize::from);
        [1, 4, per_core]
            .into_iter()
            .map(|n| ThreadPool::new(n).unwrap())
            .collect()
    })
}

fn tag(x: &i32, i: usize) -> i64 {
    i64::from(*x) * 31 + i64::try_from(i).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_map_matches_sequential(items in prop::collection::vec(any::<i32>(), 0..300), chunk in 1usize..8) {
        let expected: Vec<i64> = items.iter().enumerate().map(|(i, x)| tag(x, i)).collect();
        for pool in pools() {
            let out = ParallelEngine::on(pool).with_chunk_size(chunk).map(&items, tag).unwrap();
            prop_assert_eq!(out.len(), items.len());
            prop_assert_eq!(&out, &expected);
        }
    }

    #[test]
    fn prop_filter_keeps_relative_order(items in prop::collection::vec(any::<i32>(), 0..300), modulus in 1i32..7) {
        let keep = |x: &i32, i: usize| x.rem_euclid(modulus) == 0 || i % 5 == 0;
        let expected: Vec<i32> = items
            .iter()
            .enumerate()
            .filter(|&(i, x)| keep(x, i))
            .map(|(_, x)| *x)
            .collect();
        for pool in pools() {
            prop_assert_eq!(ParallelEngine::on(pool).filter(&items, keep).unwrap(), expected.clone());
        }
    }

    #[test]
    fn prop_map_and_join_is_concatenation(items in prop::collection::vec(0u8..6, 0..120)) {
        let expand = |&x: &u8, i: usize| vec![i; usize::from(x)];
        let expected: Vec<usize> = items
            .iter()
            .enumerate()
            .flat_map(|(i, x)| expand(x, i))
            .collect();
        for pool in pools() {
            prop_assert_eq!(ParallelEngine::on(pool).map_and_join(&items, expand).unwrap(), expected.clone());
        }
    }

    #[test]
    fn prop_find_first_is_lowest_match(items in prop::collection::vec(0u16..500, 0..400), target in 0u16..500) {
        let expected = items.iter().position(|&x| x >= target);
        for pool in pools() {
            let engine = ParallelEngine::on(pool);
            prop_assert_eq!(engine.position(&items, |&x, _| x >= target).unwrap(), expected);
            prop_assert_eq!(
                engine.find_first(&items, |&x, _| x >= target).unwrap(),
                expected.map(|i| &items[i])
            );
        }
    }

    #[test]
    fn prop_identity_and_trivial_filters(items in prop::collection::vec(any::<u64>(), 0..200)) {
        for pool in pools() {
            let engine = ParallelEngine::on(pool);
            prop_assert_eq!(engine.map(&items, |x, _| *x).unwrap(), items.clone());
            prop_assert_eq!(engine.filter(&items, |_, _| true).unwrap(), items.clone());
            prop_assert!(engine.filter(&items, |_, _| false).unwrap().is_empty());
        }
    }

    #[test]
    fn prop_failure_names_a_failing_index(items in prop::collection::vec(0u8..20, 1..200)) {
        let failing = |x: u8| x == 13;
        for pool in pools() {
            let result = ParallelEngine::on(pool)
                .try_map(&items, |&x, _| if failing(x) { Err("unlucky") } else { Ok(x) });
            match items.iter().position(|&x| failing(x)) {
                None => prop_assert_eq!(result.unwrap(), items.clone()),
                Some(lowest) => {
                    let index = result.unwrap_err().index().unwrap();
                    prop_assert!(failing(items[index]));
                    if pool.num_threads() == 1 {
                        prop_assert_eq!(index, lowest);
                    }
                }
            }
        }
    }
}
