//! Lock-free sorted collection implementations.
//!
//! Collections are parameterized by a guard type `G: Guard` that determines
//! the memory reclamation strategy:
//!
//! - `DeferredGuard`: frees unlinked nodes when the map drops
//! - `EpochGuard`: epoch-based reclamation (skipjack-crossbeam)

pub mod skip_list_map;

pub use skip_list_map::{Entry, Iter, Key, SkipListMap};
