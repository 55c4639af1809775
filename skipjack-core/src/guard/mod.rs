//! Guard trait for memory reclamation strategies.
//!
//! This module defines the `Guard` trait that abstracts over different memory
//! reclamation strategies (epoch-based, hazard pointers, deferred, etc.).
//!
//! # Design
//!
//! The `Guard` trait enables collections to be generic over their memory
//! reclamation strategy:
//!
//! ```text
//! SkipListMap<V, G: Guard>
//!     │
//!     ├── SkipListMap<i64, DeferredGuard>   (safe default: free at map drop)
//!     └── SkipListMap<i64, EpochGuard>      (skipjack-crossbeam)
//! ```
//!
//! The skip list never frees an unlinked node itself; the thread whose CAS
//! physically unlinks a node hands it to the map's guard via `defer_destroy`.
//! When to actually run the deallocation is entirely the guard's decision.

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// Different implementations provide different trade-offs:
///
/// - **DeferredGuard**: accumulates unlinked nodes and frees them when the
///   owning collection drops. Memory grows with the number of removals, but
///   no interleaving can observe a freed node.
/// - **EpochGuard**: batched reclamation after a grace period
///   (crossbeam-epoch, in the skipjack-crossbeam crate).
///
/// # Safety Contract
///
/// Implementations must ensure that nodes passed to `defer_destroy` are not
/// freed while any thread may still reach them.
///
/// # Design Note
///
/// Guards are stored in collections and must be `Send + Sync`. The guard
/// stored in a collection is used for deferred destruction scheduling.
/// Actual thread pinning (for epoch-based guards) happens per-operation,
/// not when the guard is created.
///
pub trait Guard: Sized + Default + Send + Sync {
    /// An active guard that protects reads for its lifetime.
    ///
    /// For epoch-based guards, this holds an actual pinned
    /// `crossbeam_epoch::Guard`. For deferred guards, this can be a unit
    /// type `()` since protection is provided by the collection's stored
    /// guard.
    ///
    type ReadGuard: Sized;

    /// Pin an active read guard.
    ///
    /// This creates a guard that protects all node reads until dropped.
    /// Every public operation on a collection pins one for its duration.
    ///
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// The node will be deallocated when it's safe (no readers).
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated by the collection
    /// - `node` must be unlinked from the collection (not reachable by traversal)
    /// - `dealloc` must be the correct deallocation function for `node`
    ///
    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N));
}
