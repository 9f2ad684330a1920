//! Integration tests for the Plait comprehension library.

#[cfg(test)]
mod concurrency;
#[cfg(test)]
mod properties;

/// Integration tests for the complete Plait system.
#[cfg(test)]
mod integration_tests {
    use plait::prelude::*;
    use plait::{CancellationToken, ExecutorError};
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const SAMPLE: [i64; 8] = [3, 1, 4, 1, 5, 9, 2, 6];

    #[derive(Debug, thiserror::Error, PartialEq)]
    #[error("sensor {0} is offline")]
    struct Offline(i64);

    #[test]
    fn test_sample_on_every_entry_point() {
        let expected = vec![30, 11, 42, 13, 54, 95, 26, 67];
        let tag = |x: &i64, i: usize| x * 10 + i64::try_from(i).unwrap();

        let plait = Plait::builder().worker_threads(3).build().unwrap();
        assert_eq!(plait.map(&SAMPLE, tag).unwrap(), expected);
        assert_eq!(SAMPLE.par_map(tag).unwrap(), expected);
        assert_eq!(SAMPLE.par_map_on(plait.pool(), tag).unwrap(), expected);
        assert_eq!(ParallelEngine::new().map(&SAMPLE, tag).unwrap(), expected);

        assert_eq!(plait.filter(&SAMPLE, |x, _| *x > 4).unwrap(), vec![5, 9, 6]);
        assert_eq!(plait.find_first(&SAMPLE, |x, _| *x > 4).unwrap(), Some(&5));
        assert_eq!(SAMPLE.par_position(|x, _| *x > 4).unwrap(), Some(4));
    }

    #[test]
    fn test_map_and_join_keeps_group_order() {
        let plait = Plait::builder().worker_threads(4).build().unwrap();
        let ranges = plait
            .map_and_join(&SAMPLE, |&x, i| (0..x).map(move |k| (i, k)))
            .unwrap();

        let expected: Vec<(usize, i64)> = SAMPLE
            .iter()
            .enumerate()
            .flat_map(|(i, &x)| (0..x).map(move |k| (i, k)))
            .collect();
        assert_eq!(ranges, expected);
    }

    #[test]
    fn test_map_with_slow_early_indices_stays_ordered() {
        let pool = ThreadPool::new(4).unwrap();
        let items: Vec<u64> = (0..32).collect();

        let out = items
            .par_map_on(&pool, |&x, _| {
                // Early indices finish last.
                std::thread::sleep(Duration::from_millis(32 - x));
                x * x
            })
            .unwrap();

        assert_eq!(out, items.iter().map(|x| x * x).collect::<Vec<_>>());
    }

    #[test]
    fn test_find_first_prefers_lower_slow_match() {
        let pool = ThreadPool::new(4).unwrap();
        let items: Vec<u64> = (0..16).collect();

        let found = ParallelEngine::on(&pool)
            .find_first(&items, |&x, _| {
                if x == 2 {
                    std::thread::sleep(Duration::from_millis(60));
                    return true;
                }
                x == 10
            })
            .unwrap();

        assert_eq!(found, Some(&2));
    }

    #[test]
    fn test_find_first_shared_from_runtime() {
        let plait = Plait::builder().worker_threads(2).build().unwrap();
        let readings: Arc<[i64]> = SAMPLE.to_vec().into();

        let found = plait
            .engine()
            .find_first_shared(readings, |x, _| x % 3 == 0)
            .unwrap();
        assert_eq!(found, Some(3));
    }

    #[test]
    fn test_user_error_comes_back_intact() {
        let plait = Plait::builder().worker_threads(1).build().unwrap();

        let err = plait
            .engine()
            .try_map(&SAMPLE, |&x, _| if x == 9 { Err(Offline(x)) } else { Ok(x) })
            .unwrap_err();

        assert_eq!(err.index(), Some(5));
        assert_eq!(err.to_string(), "user function failed at index 5: sensor 9 is offline");
        let source = err.into_user_error().unwrap();
        assert_eq!(source.downcast_ref::<Offline>(), Some(&Offline(9)));
    }

    #[test]
    fn test_panic_is_reported_and_pool_recovers() {
        let pool = ThreadPool::new(2).unwrap();

        let err = SAMPLE
            .par_filter_on(&pool, |&x, _| {
                assert!(x != 5, "cannot weigh five");
                true
            })
            .unwrap_err();
        assert!(err.is_panic());
        assert_eq!(err.index(), Some(4));
        assert!(err.to_string().contains("cannot weigh five"));

        // The same pool keeps serving.
        assert_eq!(SAMPLE.par_filter_on(&pool, |_, _| true).unwrap(), SAMPLE.to_vec());
    }

    #[test]
    fn test_failure_stops_unstarted_work() {
        let pool = ThreadPool::new(2).unwrap();
        let items: Vec<usize> = (0..10_000).collect();
        let calls = AtomicUsize::new(0);

        let result = ParallelEngine::on(&pool).try_map(&items, |&x, _| {
            calls.fetch_add(1, Ordering::Relaxed);
            if x == 10 { Err("stop") } else { Ok(x) }
        });

        assert!(result.is_err());
        assert!(calls.load(Ordering::Relaxed) < 1_000);
    }

    #[test]
    fn test_chunk_sizes_agree() {
        let items: Vec<u32> = (0..257).collect();
        let expected: Vec<u32> = items.iter().map(|x| x ^ 0x55).collect();

        for chunk_size in [0, 1, 3, 64, 1000] {
            let plait = Plait::builder()
                .worker_threads(3)
                .chunk_size(chunk_size)
                .build()
                .unwrap();
            assert_eq!(plait.map(&items, |x, _| x ^ 0x55).unwrap(), expected);
            assert_eq!(plait.find_first(&items, |x, _| *x == 200).unwrap(), Some(&200));
        }
    }

    #[test]
    fn test_zero_worker_pool_is_rejected() {
        let err = ThreadPool::new(0).unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_empty_inputs() {
        let empty: Vec<String> = Vec::new();
        let plait = Plait::builder().worker_threads(2).build().unwrap();

        assert!(plait.map(&empty, |s, _| s.len()).unwrap().is_empty());
        assert!(plait.map_and_join(&empty, |s, _| s.clone().into_bytes()).unwrap().is_empty());
        assert!(plait.filter(&empty, |_, _| true).unwrap().is_empty());
        assert_eq!(plait.find_first(&empty, |_, _| true).unwrap(), None);
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(token.cancel());
        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_map_comprehensions_with_tuples() {
        let mut inventory: HashMap<String, u32> = map_from_tuples([
            Tuple::new("bolts".to_string(), 120),
            Tuple::new("nuts".to_string(), 0),
        ]);
        inventory.insert_tuple(Tuple::new("washers".to_string(), 35));
        inventory.extend([Tuple::new("nuts".to_string(), 8)]);

        let doubled = inventory.map_entries(|t| Tuple::new(t.key().to_string(), **t.value() * 2));
        assert_eq!(doubled["nuts"], 16);

        let low = inventory.filter_entries(|t| **t.value() < 50);
        let mut low_names = low.map_to_vec(|t| t.key().to_string());
        low_names.sort();
        assert_eq!(low_names, ["nuts", "washers"]);
    }

    #[test]
    fn test_set_comprehensions() {
        let tags: HashSet<&str> = ["Rust", "rust", "Go", "go", "C"].into_iter().collect();
        let folded = tags.map_elements(|t| t.to_lowercase());
        assert_eq!(folded.len(), 3);

        let short = tags.filter_elements(|t| t.len() == 1);
        assert_eq!(short, HashSet::from(["C"]));
    }

    #[test]
    fn test_parallel_map_over_map_entries() {
        let scores: HashMap<&str, u32> = map_from_tuples([Tuple::new("a", 1), Tuple::new("b", 2)]);
        let mut entries = scores.map_to_vec(|t| t.cloned());
        entries.sort();

        let rendered = entries.par_map(|t, i| format!("{i}:{t}")).unwrap();
        assert_eq!(rendered, ["0:(a, 1)", "1:(b, 2)"]);
    }
}
