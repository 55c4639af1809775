//! Epoch-based guard implementation using crossbeam-epoch.
//!
//! This module provides `EpochGuard`, an implementation of the `Guard` trait
//! on top of crossbeam-epoch's global collector.
//!
//! # Design
//!
//! Collections parameterized with `EpochGuard` get epoch-based memory
//! reclamation:
//!
//! ```text
//! SkipListMap<i64, EpochGuard>
//!     │
//!     └── Uses crossbeam-epoch for reclamation
//! ```
//!
//! # Reclamation contract
//!
//! crossbeam-epoch frees a retired node once every thread that was pinned
//! at retire time has unpinned. That covers everything reached through
//! successor words and back-links, which threads only follow while pinned.
//! Tower cells can however keep `down` references to cells already handed
//! to the collector (upper cells awaiting their lazy unlink, and cells that
//! never got linked on a level at all), so a thread pinning after the grace
//! period could in principle still descend into one. `DeferredGuard`
//! (skipjack-core) has no such window and is the safe default; this guard
//! bounds memory growth and is what the benchmarks use.

use crossbeam_epoch as epoch;
use skipjack_core::guard::Guard;

/// Epoch-based memory reclamation guard.
///
/// All state lives in crossbeam's global collector, so the guard itself is
/// an empty marker: storing one in a collection costs nothing, and cloning
/// or copying it is trivial. Thread pinning happens per operation through
/// [`Guard::pin`], never at construction.
///
/// Retired nodes become reclaimable only after every thread that was
/// pinned at retire time has unpinned, and the collector frees them in
/// batches as epochs advance.
#[derive(Clone, Copy, Default)]
pub struct EpochGuard;

impl EpochGuard {
    /// Create a new epoch guard. Equivalent to `EpochGuard::default()`;
    /// there is no per-instance state.
    pub fn new() -> Self {
        EpochGuard
    }
}

impl Guard for EpochGuard {
    /// An actual crossbeam epoch guard that pins the current thread for the
    /// duration of an operation or iteration.
    type ReadGuard = epoch::Guard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        // Registration has to happen under a pin so the collector ties the
        // node to the current epoch; the pin ends as soon as the call
        // returns. The address is captured as a plain word.
        let addr = node as usize;
        unsafe {
            epoch::pin().defer_unchecked(move || dealloc(addr as *mut N));
        }
    }
}
