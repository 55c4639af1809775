//! Crossbeam-based memory reclamation for skipjack collections.
//!
//! This crate provides `EpochGuard`, an implementation of the `Guard` trait
//! using crossbeam-epoch.
//!
//! # Usage
//!
//! ```ignore
//! use skipjack_core::SkipListMap;
//! use skipjack_crossbeam::EpochGuard;
//!
//! let map: SkipListMap<i64, EpochGuard> = SkipListMap::new();
//! map.insert(42, 100);
//! ```

pub mod epoch_guard;

// Export the Guard implementation
pub use epoch_guard::EpochGuard;
