//! An Adaptive Radix Tree (ART) index with lock-free concurrent reads.
//!
//! A trie over binary-comparable keys whose inner nodes adapt their fan-out
//! encoding (4, 16, 48, or 256 children) to the number of live branches,
//! with path compression and lazy leaf expansion. One mutator at a time may
//! run alongside any number of readers: mutation builds replacement nodes
//! and publishes them with a single pointer store, and replaced nodes are
//! freed only after every registered reader has passed a quiescent point —
//! so reads never block and never observe torn state.
//!
//! ```rust
//! use qart::{Art, keys::ArrayKey};
//!
//! let tree: Art<ArrayKey<16>, u64> = Art::new();
//! for i in [5u64, 3, 1, 4, 2] {
//!     tree.insert(i, i * 10).unwrap();
//! }
//!
//! let mut reader = tree.reader();
//! let guard = reader.enter();
//! assert_eq!(guard.get(3u64), Some(&30));
//!
//! // Ordered iteration, and half-open range scans.
//! let keys: Vec<u64> = guard.iter().map(|(k, _)| k.to_be_u64()).collect();
//! assert_eq!(keys, vec![1, 2, 3, 4, 5]);
//! let lo: ArrayKey<16> = 2u64.into();
//! let hi: ArrayKey<16> = 4u64.into();
//! let mid: Vec<u64> = guard.range(lo..hi).map(|(k, _)| k.to_be_u64()).collect();
//! assert_eq!(mid, vec![2, 3]);
//! ```

pub mod error;
pub mod iter;
pub mod keys;
pub mod range;
pub mod stats;
pub mod tree;

mod mapping;
mod node;
mod prefix;
mod qsbr;
mod utils;

pub use error::ArtError;
pub use iter::Iter;
pub use keys::{ArrayKey, KeyTrait, VectorKey};
pub use range::Range;
pub use stats::TreeStats;
pub use tree::{Art, ReadGuard, Reader, TreeConfig, Update};
