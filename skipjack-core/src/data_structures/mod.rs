//! Data structures for concurrent collections.
//!
//! # Organization
//!
//! - [`sorted`] - The lock-free ordered map (`SkipListMap`)
//! - [`internal`] - Internal implementation details (pub(crate))
//!
//! # Usage
//!
//! Collections are generic over guard type `G: Guard`:
//!
//! ```ignore
//! use skipjack_core::{SkipListMap, DeferredGuard};
//!
//! let map: SkipListMap<i64, DeferredGuard> = SkipListMap::new();
//! map.insert(42, 100);
//! ```

pub(crate) mod internal;
pub mod sorted;

pub use sorted::{Entry, Iter, Key, SkipListMap};

// TaggedPtr stays pub(crate) - truly internal implementation detail
pub(crate) use internal::TaggedPtr;
