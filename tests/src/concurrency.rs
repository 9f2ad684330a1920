//! Many callers, nested calls, and long-running work on shared pools.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use plait::prelude::*;

#[test]
fn test_concurrent_callers_share_one_pool() {
    let plait = Plait::builder().worker_threads(4).build().unwrap();
    let barrier = Barrier::new(8);

    thread::scope(|scope| {
        for caller in 0..8u64 {
            let plait = &plait;
            let barrier = &barrier;
            scope.spawn(move || {
                let items: Vec<u64> = (0..500).map(|x| x + caller * 1000).collect();
                barrier.wait();
                for _ in 0..10 {
                    let out = plait.map(&items, |x, i| x * 2 + i as u64).unwrap();
                    let expected: Vec<u64> =
                        items.iter().enumerate().map(|(i, x)| x * 2 + i as u64).collect();
                    assert_eq!(out, expected);
                }
            });
        }
    });
}

#[test]
fn test_global_pool_from_many_threads() {
    let handles: Vec<_> = (0..6)
        .map(|seed: u32| {
            thread::spawn(move || {
                let items: Vec<u32> = (0..200).map(|x: u32| x.wrapping_mul(seed + 1)).collect();
                items.par_filter(|x, _| x % 2 == 0).unwrap()
            })
        })
        .collect();

    for (seed, handle) in (0..6u32).zip(handles) {
        let expected: Vec<u32> = (0..200)
            .map(|x: u32| x.wrapping_mul(seed + 1))
            .filter(|x| x % 2 == 0)
            .collect();
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_nested_comprehension_on_one_pool() {
    let plait = Plait::builder().worker_threads(2).build().unwrap();
    let rows: Vec<Vec<u32>> = (0..6).map(|r| (0..5).map(|c| r * 5 + c).collect()).collect();

    // Inner calls come from the pool's own workers and must not deadlock.
    let sums = plait
        .map(&rows, |row, _| plait.map(row, |x, _| x * x).unwrap().into_iter().sum::<u32>())
        .unwrap();

    let expected: Vec<u32> = rows.iter().map(|row| row.iter().map(|x| x * x).sum()).collect();
    assert_eq!(sums, expected);

    let hit = plait
        .find_first(&rows, |row, _| plait.find_first(row, |x, _| *x == 17).unwrap().is_some())
        .unwrap();
    assert_eq!(hit, Some(&rows[3]));
}

#[test]
fn test_nested_comprehension_through_global_pool() {
    let (tx, rx) = std::sync::mpsc::channel();
    thread::spawn(move || {
        let runtime = Plait::builder().worker_threads(2).build().unwrap();
        let width = plait::global().unwrap().num_threads() * 2;
        let items: Vec<u32> = (0..u32::try_from(width).unwrap()).collect();

        // Global workers call into `runtime`, whose workers call back into the global pool.
        let sums = items
            .par_map(|&x, _| {
                runtime
                    .map(&[1u32, 2, 3], |&y, _| {
                        [x, y].par_map(|v, _| v * 2).unwrap().into_iter().sum::<u32>()
                    })
                    .unwrap()
                    .into_iter()
                    .sum::<u32>()
            })
            .unwrap();
        tx.send((items, sums)).unwrap();
    });

    let (items, sums) = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("nested comprehension deadlocked");
    let expected: Vec<u32> = items.iter().map(|x| 6 * x + 12).collect();
    assert_eq!(sums, expected);
}

#[test]
fn test_shared_search_does_not_wait_for_stragglers() {
    let plait = Plait::builder().worker_threads(4).build().unwrap();
    let items: Arc<[u32]> = (0..4).collect::<Vec<_>>().into();
    let finished = Arc::new(AtomicUsize::new(0));
    let straggling = Arc::new(AtomicBool::new(true));

    let started = Instant::now();
    let found = {
        let finished = Arc::clone(&finished);
        let straggling = Arc::clone(&straggling);
        plait
            .engine()
            .find_first_shared(items, move |&x, _| {
                if x > 0 {
                    // Higher indices take far longer than the match below them.
                    let held = Instant::now();
                    while straggling.load(Ordering::Acquire) && held.elapsed() < Duration::from_secs(2) {
                        thread::sleep(Duration::from_millis(1));
                    }
                }
                finished.fetch_add(1, Ordering::AcqRel);
                x == 0
            })
            .unwrap()
    };

    assert_eq!(found, Some(0));
    assert!(started.elapsed() < Duration::from_secs(1));
    // Only the match itself has completed; the stragglers are still held.
    assert_eq!(finished.load(Ordering::Acquire), 1);
    straggling.store(false, Ordering::Release);
}

#[test]
fn test_repeated_failures_leave_pool_usable() {
    let pool = ThreadPool::new(3).unwrap();
    let items: Vec<i32> = (0..64).collect();

    for round in 0..20 {
        let err = items
            .par_map_on(&pool, |&x, _| {
                assert!(x != round, "round {round}");
                x
            })
            .unwrap_err();
        assert!(err.is_panic());
        assert_eq!(err.index(), Some(usize::try_from(round).unwrap()));
    }

    assert_eq!(items.par_map_on(&pool, |&x, _| x).unwrap(), items);
}
