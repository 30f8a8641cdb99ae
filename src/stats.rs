//! Structure and operation statistics.
//!
//! The structural walk is always available and runs under the writer lock.
//! Mutation counters cost an atomic bump on hot paths, so they are compiled
//! in only with the `stats` feature — the packaging's statistics toggle.

/// A snapshot of the tree's shape, gathered by [`crate::Art::stats`].
#[derive(Debug, Default, Clone)]
pub struct TreeStats {
    pub num_leaves: usize,
    pub num_inner_nodes: usize,
    pub num_n4: usize,
    pub num_n16: usize,
    pub num_n48: usize,
    pub num_n256: usize,
    /// Children across all inner nodes.
    pub total_children: usize,
    /// Children per unit of inner-node capacity.
    pub total_density: f64,
    pub max_height: usize,
    #[cfg(feature = "stats")]
    pub ops: OpStats,
}

/// Cumulative mutation counters (feature `stats`).
#[cfg(feature = "stats")]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OpStats {
    pub grows: u64,
    pub shrinks: u64,
    pub path_compressions: u64,
    pub retired: u64,
}

#[cfg(feature = "stats")]
pub(crate) use counters::OpCounters;

#[cfg(feature = "stats")]
mod counters {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::OpStats;

    #[derive(Default)]
    pub(crate) struct OpCounters {
        grows: AtomicU64,
        shrinks: AtomicU64,
        path_compressions: AtomicU64,
        retired: AtomicU64,
    }

    impl OpCounters {
        pub fn bump_grows(&self) {
            self.grows.fetch_add(1, Ordering::Relaxed);
        }

        pub fn bump_shrinks(&self) {
            self.shrinks.fetch_add(1, Ordering::Relaxed);
        }

        pub fn bump_path_compressions(&self) {
            self.path_compressions.fetch_add(1, Ordering::Relaxed);
        }

        pub fn bump_retired(&self) {
            self.retired.fetch_add(1, Ordering::Relaxed);
        }

        pub fn snapshot(&self) -> OpStats {
            OpStats {
                grows: self.grows.load(Ordering::Relaxed),
                shrinks: self.shrinks.load(Ordering::Relaxed),
                path_compressions: self.path_compressions.load(Ordering::Relaxed),
                retired: self.retired.load(Ordering::Relaxed),
            }
        }
    }
}
