//! Deferred guard implementation.
//!
//! This module provides `DeferredGuard`, a guard that holds every retired
//! node until the guard itself is dropped.

use std::sync::Mutex;

use super::Guard;

/// A retired cell: the address of the allocation and the type-erased
/// deallocation routine that frees it. Addresses are kept as plain words,
/// which keeps the record `Send` without any unsafe impl.
struct Retired {
    addr: usize,
    free: unsafe fn(*mut ()),
}

/// A guard that keeps all retired nodes alive until it is dropped.
///
/// Since the guard is stored inside the collection, unlinked nodes survive
/// for the collection's whole lifetime and are released in one sweep when
/// it drops. That makes it the safe default for the skip list: removed
/// cells stay reachable through back-links and `down` pointers for an
/// unbounded time, and this guard never frees anything a live thread could
/// still follow. The cost is that memory usage grows with the number of
/// removals.
///
/// # Thread Safety
///
/// The retired list sits behind a `Mutex`, so any thread may retire nodes.
///
pub struct DeferredGuard {
    retired: Mutex<Vec<Retired>>,
}

impl DeferredGuard {
    /// Create a new deferred guard.
    pub fn new() -> Self {
        DeferredGuard {
            retired: Mutex::new(Vec::new()),
        }
    }
}

impl Default for DeferredGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferredGuard {
    fn drop(&mut self) {
        let retired = self.retired.get_mut().unwrap();

        // A cell retired twice would be freed twice below; catch that in
        // debug builds before it turns into heap corruption.
        #[cfg(debug_assertions)]
        {
            let mut seen = std::collections::HashSet::with_capacity(retired.len());
            for record in retired.iter() {
                assert!(
                    seen.insert(record.addr),
                    "cell retired twice: {:#x}",
                    record.addr
                );
            }
        }

        for Retired { addr, free } in retired.drain(..) {
            unsafe { free(addr as *mut ()) };
        }
    }
}

impl Guard for DeferredGuard {
    /// For DeferredGuard, ReadGuard is a no-op since all nodes are protected
    /// until the collection's stored guard drops.
    type ReadGuard = ();

    fn pin() -> Self::ReadGuard {
        // No-op for DeferredGuard - protection is provided by the stored guard
    }

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        // Erase the node type so one list can hold every kind of cell. The
        // two signatures only differ in the pointee of a thin pointer, so
        // the call through the erased form is ABI-compatible.
        let free = unsafe {
            std::mem::transmute::<unsafe fn(*mut N), unsafe fn(*mut ())>(dealloc)
        };
        let record = Retired {
            addr: node as usize,
            free,
        };
        self.retired.lock().unwrap().push(record);
    }
}
