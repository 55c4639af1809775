//! Runs the shared map suites under `EpochGuard`.

use rstest::rstest;
use skipjack_core::common_tests::map_core_tests::*;
use skipjack_core::common_tests::map_stress_tests::*;
use skipjack_core::{DeferredGuard, Guard};
use skipjack_crossbeam::EpochGuard;

// Marker-driven parametrization so every case runs under both guards from
// this crate (skipjack-core's own tests only see DeferredGuard).

trait TestGuard {
    type GuardType: Guard + 'static;
}

struct UseDeferredGuard;
struct UseEpochGuard;

impl TestGuard for UseDeferredGuard {
    type GuardType = DeferredGuard;
}

impl TestGuard for UseEpochGuard {
    type GuardType = EpochGuard;
}

// ============================================================================
// Functional suite
// ============================================================================

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_basic<T: TestGuard>(#[case] _guard: T) {
    test_basic_operations::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_bulk<T: TestGuard>(#[case] _guard: T) {
    test_bulk_insert_and_find::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_remove_neighbors<T: TestGuard>(#[case] _guard: T) {
    test_remove_leaves_neighbors::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_reinsert<T: TestGuard>(#[case] _guard: T) {
    test_reinsert_after_remove::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_iteration<T: TestGuard>(#[case] _guard: T) {
    test_iteration_after_removals::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_negative<T: TestGuard>(#[case] _guard: T) {
    test_negative_keys::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_len<T: TestGuard>(#[case] _guard: T) {
    test_len_tracks_operations::<T::GuardType>();
}

// ============================================================================
// Concurrency suite
// ============================================================================

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_concurrent_disjoint<T: TestGuard>(#[case] _guard: T) {
    test_concurrent_insert_disjoint::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_interleaved_insert<T: TestGuard>(#[case] _guard: T) {
    test_two_thread_interleaved_insert::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_random_workload<T: TestGuard>(#[case] _guard: T) {
    test_split_key_random_workload::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_insert_race<T: TestGuard>(#[case] _guard: T) {
    test_insert_race_single_key::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_remove_races<T: TestGuard>(#[case] _guard: T) {
    test_remove_race::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_mixed_operations<T: TestGuard>(#[case] _guard: T) {
    test_concurrent_mixed_operations::<T::GuardType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_contention<T: TestGuard>(#[case] _guard: T) {
    test_high_contention_same_range::<T::GuardType>();
}
