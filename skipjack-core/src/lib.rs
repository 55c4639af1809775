pub mod common_tests;
pub mod data_structures;
pub mod guard;

// Re-export the map and guard types for convenience
pub use data_structures::{Entry, Iter, Key, SkipListMap};
pub use guard::{DeferredGuard, Guard};
