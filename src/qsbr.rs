//! Quiescent-state-based reclamation.
//!
//! The single mutator never frees an unlinked node directly: it places it on
//! a retired list tagged with the global epoch, then advances the epoch. A
//! retired item is freed only once every registered reader is offline or has
//! announced an epoch strictly newer than the item's tag — at that point no
//! in-flight traversal can still hold a reference into it.
//!
//! Readers announce entry and exit around each traversal through a
//! per-thread slot; a long-running reader reports quiescent points between
//! traversals. A reader that never quiesces only delays reclamation (the
//! retired list grows); it never compromises safety.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering, fence};

use parking_lot::Mutex;
use tracing::debug;

/// Slot value meaning "not inside any traversal".
const OFFLINE: u64 = 0;

/// Collection is attempted from the mutator path once this many retirements
/// have accumulated.
const RECLAIM_BATCH: usize = 64;

/// Per-reader announcement slot, padded out to its own cache line so reader
/// entry/exit stores do not contend.
#[repr(align(128))]
pub(crate) struct ReaderSlot {
    epoch: AtomicU64,
}

/// An unlinked allocation awaiting its quiescent horizon.
struct Retired {
    epoch: u64,
    ptr: *mut u8,
    drop_fn: unsafe fn(*mut u8),
}

// The pointers inside are exclusively owned by the retired list; whichever
// thread runs collection frees them. Payload Send-ness is enforced by the
// tree's own Send/Sync bounds.
unsafe impl Send for Retired {}

pub(crate) struct Qsbr {
    global_epoch: AtomicU64,
    registry: Mutex<Vec<Arc<ReaderSlot>>>,
    retired: Mutex<Vec<Retired>>,
}

impl Qsbr {
    pub fn new() -> Self {
        Self {
            // Epoch 0 is reserved for OFFLINE.
            global_epoch: AtomicU64::new(1),
            registry: Mutex::new(Vec::new()),
            retired: Mutex::new(Vec::new()),
        }
    }

    /// Register a reader thread. One slot per `Reader` handle.
    pub fn register(&self) -> Arc<ReaderSlot> {
        let slot = Arc::new(ReaderSlot {
            epoch: AtomicU64::new(OFFLINE),
        });
        self.registry.lock().push(Arc::clone(&slot));
        slot
    }

    pub fn unregister(&self, slot: &Arc<ReaderSlot>) {
        self.registry.lock().retain(|s| !Arc::ptr_eq(s, slot));
    }

    /// Announce entry into a traversal section.
    ///
    /// The fence pairs with the one in [`collect`]: either the collector
    /// observes this announcement (and spares everything tagged at or after
    /// it), or this reader observes every unlink that preceded the
    /// collector's fence and cannot wander onto a retired node.
    pub fn begin_section(&self, slot: &ReaderSlot) {
        let epoch = self.global_epoch.load(Ordering::SeqCst);
        slot.epoch.store(epoch, Ordering::SeqCst);
        fence(Ordering::SeqCst);
    }

    /// Announce exit from a traversal section.
    pub fn end_section(&self, slot: &ReaderSlot) {
        slot.epoch.store(OFFLINE, Ordering::Release);
    }

    /// Report a quiescent point between sections: equivalent to an exit
    /// immediately followed by an entry at the current epoch.
    pub fn quiescent(&self, slot: &ReaderSlot) {
        let epoch = self.global_epoch.load(Ordering::SeqCst);
        slot.epoch.store(epoch, Ordering::SeqCst);
        fence(Ordering::SeqCst);
    }

    /// Hand an unlinked allocation to the reclamation list, tagged with the
    /// current epoch. Mutator-side only; the unlink must already be
    /// published.
    pub fn retire(&self, ptr: *mut u8, drop_fn: unsafe fn(*mut u8)) {
        let epoch = self.global_epoch.load(Ordering::SeqCst);
        self.retired.lock().push(Retired {
            epoch,
            ptr,
            drop_fn,
        });
    }

    /// Advance the global epoch. Called once per mutation, after its
    /// retirements.
    pub fn advance(&self) {
        self.global_epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Collect once the batch watermark is reached.
    pub fn maybe_collect(&self) {
        if self.retired.lock().len() >= RECLAIM_BATCH {
            self.collect();
        }
    }

    /// Free every retired item whose epoch lies strictly below the
    /// quiescent horizon. Returns how many were freed.
    pub fn collect(&self) -> usize {
        let mut retired = self.retired.lock();
        if retired.is_empty() {
            return 0;
        }

        // Pairs with the fence in begin_section; see there.
        fence(Ordering::SeqCst);

        let horizon = {
            let registry = self.registry.lock();
            registry
                .iter()
                .map(|slot| slot.epoch.load(Ordering::SeqCst))
                .filter(|&e| e != OFFLINE)
                .min()
                .unwrap_or(u64::MAX)
        };

        let before = retired.len();
        retired.retain(|item| {
            if item.epoch < horizon {
                // SAFETY: unlinked before retirement, and every reader that
                // could have seen it has since quiesced past its epoch.
                unsafe { (item.drop_fn)(item.ptr) };
                false
            } else {
                true
            }
        });
        let freed = before - retired.len();
        if freed > 0 {
            debug!(freed, remaining = retired.len(), "reclaimed retired nodes");
        }
        freed
    }

    #[cfg(test)]
    fn retired_len(&self) -> usize {
        self.retired.lock().len()
    }
}

impl Drop for Qsbr {
    fn drop(&mut self) {
        // Exclusive access: no reader can be live. Free everything.
        for item in self.retired.get_mut().drain(..) {
            // SAFETY: exclusive ownership of the list and its pointers.
            unsafe { (item.drop_fn)(item.ptr) };
        }
    }
}
