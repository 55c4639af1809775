#[cfg(test)]
mod skip_list_stress_tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    use rstest::rstest;
    use skipjack_core::{DeferredGuard, SkipListMap};

    type TestMap = SkipListMap<i64, DeferredGuard>;

    fn create_test_map() -> Arc<TestMap> {
        Arc::new(SkipListMap::new())
    }

    fn assert_sorted(map: &TestMap) {
        let keys: Vec<i64> = map.iter().map(|(k, _)| k).collect();
        for window in keys.windows(2) {
            assert!(window[0] < window[1], "bottom list is not sorted");
        }
    }

    #[rstest]
    #[case::few_threads(4, 10)]
    #[case::many_threads(16, 5)]
    fn stress_insert_remove_same_values(#[case] num_threads: usize, #[case] rounds: usize) {
        let map = create_test_map();
        let values_per_thread = 100i64;

        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let map = Arc::clone(&map);
                thread::spawn(move || {
                    for round in 0..rounds {
                        for key in 0..values_per_thread {
                            map.insert(key, key * 10);
                        }
                        for key in 0..values_per_thread {
                            map.remove(key);
                        }
                        if round % 3 == 0 {
                            let len = map.len();
                            assert!(len <= values_per_thread as usize);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_sorted(&map);
        println!("Final map size after concurrent insert/remove: {}", map.len());
    }

    #[rstest]
    #[case::moderate(8)]
    #[case::heavy(24)]
    fn stress_high_contention_boundaries(#[case] num_threads: usize) {
        let map = create_test_map();
        let barrier = Arc::new(Barrier::new(num_threads));

        let handles: Vec<_> = (0..num_threads)
            .map(|t| {
                let map = Arc::clone(&map);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();

                    for i in 0..1000i64 {
                        match t % 3 {
                            0 => {
                                map.insert(i, i);
                            }
                            1 => {
                                map.insert(1_000_000 - i, 1_000_000 - i);
                            }
                            _ => {
                                map.remove(500_000);
                            }
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_sorted(&map);
    }

    #[test]
    fn stress_find_during_modifications() {
        let map = create_test_map();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let find_success = Arc::new(AtomicUsize::new(0));
        let find_failure = Arc::new(AtomicUsize::new(0));

        // Stable even keys that writers never touch
        for i in 0..1000i64 {
            map.insert(i * 2, i * 20);
        }

        let mut handles = vec![];
        for t in 0..4i64 {
            let map = Arc::clone(&map);
            let stop = Arc::clone(&stop_flag);
            handles.push(thread::spawn(move || {
                let mut i = 0i64;
                while !stop.load(Ordering::Relaxed) {
                    // Writers churn odd keys in a disjoint range
                    let key = 10_001 + (t * 10_000 + i) * 2;
                    if i % 2 == 0 {
                        map.insert(key, key * 10);
                    } else {
                        map.remove(key);
                    }
                    i += 1;
                }
            }));
        }

        for _ in 0..4 {
            let map = Arc::clone(&map);
            let stop = Arc::clone(&stop_flag);
            let success = Arc::clone(&find_success);
            let failure = Arc::clone(&find_failure);
            handles.push(thread::spawn(move || {
                let mut i = 0i64;
                while !stop.load(Ordering::Relaxed) {
                    let key = (i % 1000) * 2;
                    match map.find(key) {
                        Some(element) => {
                            assert_eq!(element, key * 10);
                            success.fetch_add(1, Ordering::Relaxed);
                        }
                        None => {
                            failure.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    i += 1;
                }
            }));
        }

        thread::sleep(Duration::from_millis(200));
        stop_flag.store(true, Ordering::Relaxed);

        for handle in handles {
            handle.join().unwrap();
        }

        // The stable keys are never removed, so every lookup must hit
        assert_eq!(find_failure.load(Ordering::Relaxed), 0);
        assert!(find_success.load(Ordering::Relaxed) > 0);
        println!(
            "Reads during modifications: {} hits",
            find_success.load(Ordering::Relaxed)
        );
    }

    #[test]
    fn stress_random_mixed_workload() {
        let map = create_test_map();
        let num_threads = 8;
        let ops_per_thread = 5000;

        let barrier = Arc::new(Barrier::new(num_threads));
        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let map = Arc::clone(&map);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..ops_per_thread {
                        let key = (rand::random::<u32>() % 2000) as i64;
                        match rand::random::<u32>() % 3 {
                            0 => {
                                map.insert(key, key * 10);
                            }
                            1 => {
                                if let Some(element) = map.find(key) {
                                    assert_eq!(element, key * 10);
                                }
                            }
                            _ => {
                                if let Some(element) = map.remove(key) {
                                    assert_eq!(element, key * 10);
                                }
                            }
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_sorted(&map);
        for (key, element) in map.iter() {
            assert_eq!(element, key * 10);
        }
    }

    /// Tall towers (many index levels) must not break removals: insert far
    /// more keys than 2^10 so upper levels are well populated, then remove
    /// everything.
    #[test]
    fn stress_drain_large_population() {
        let map = create_test_map();
        let num_keys = 20_000i64;

        for key in 0..num_keys {
            assert!(map.insert(key, key));
        }
        assert_eq!(map.len(), num_keys as usize);

        let num_threads = 4;
        let handles: Vec<_> = (0..num_threads)
            .map(|t| {
                let map = Arc::clone(&map);
                thread::spawn(move || {
                    let mut removed = 0usize;
                    for key in 0..num_keys {
                        if key % num_threads as i64 == t as i64 && map.remove(key).is_some() {
                            removed += 1;
                        }
                    }
                    removed
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, num_keys as usize);
        assert!(map.is_empty());
    }
}
