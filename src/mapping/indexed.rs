use std::ptr::null_mut;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::mapping::direct::DirectChildren;
use crate::mapping::keyed::KeyedChildren;
use crate::mapping::{ChildSlot, NodeMapping};

const EMPTY: u8 = 255;

/// Child storage for N48: a 256-entry byte-to-slot table indexing into a
/// compact 48-slot child array.
///
/// Slots are always compact (0..num_children occupied): replacement
/// mappings are rebuilt on every mutation, so there is never a hole to
/// track.
pub(crate) struct IndexedChildren<N> {
    child_index: Box<[u8; 256]>,
    children: Box<[ChildSlot<N>; 48]>,
    num_children: u8,
}

impl<N> IndexedChildren<N> {
    pub fn new() -> Self {
        Self {
            child_index: Box::new([EMPTY; 256]),
            children: Box::new(std::array::from_fn(|_| AtomicPtr::new(null_mut()))),
            num_children: 0,
        }
    }

    fn push(&mut self, key: u8, child: *mut N) {
        let slot = self.num_children as usize;
        debug_assert!(slot < 48);
        debug_assert_eq!(self.child_index[key as usize], EMPTY);
        self.child_index[key as usize] = slot as u8;
        self.children[slot] = AtomicPtr::new(child);
        self.num_children += 1;
    }

    /// Replacement mapping with one more child.
    pub fn with_child_added(&self, key: u8, child: *mut N) -> Self {
        debug_assert!((self.num_children as usize) < 48);
        let mut new = self.copied();
        new.push(key, child);
        new
    }

    /// Replacement mapping without `key`, slots re-compacted.
    pub fn with_child_removed(&self, key: u8) -> Self {
        debug_assert_ne!(self.child_index[key as usize], EMPTY);
        let mut new = Self::new();
        for byte in 0..=255u8 {
            if byte == key {
                continue;
            }
            let slot = self.child_index[byte as usize];
            if slot != EMPTY {
                // Writer side; ordered by the mutator lock.
                new.push(byte, self.children[slot as usize].load(Ordering::Relaxed));
            }
        }
        new
    }

    /// Grow from a full N16, folding in the child that did not fit.
    pub fn from_keyed(km: &KeyedChildren<N, 16>, key: u8, child: *mut N) -> Self {
        let mut new = Self::new();
        for i in 0..km.num_children as usize {
            new.push(km.keys[i], km.children[i].load(Ordering::Relaxed));
        }
        new.push(key, child);
        new
    }

    /// Shrink from an N256 mapping while dropping `removed`.
    pub fn from_direct_shrink(dm: &DirectChildren<N>, removed: u8) -> Self {
        let mut new = Self::new();
        let mut pos: u16 = 0;
        while let Some((key, slot)) = dm.child_at_or_after(pos) {
            pos = u16::from(key) + 1;
            if key == removed {
                continue;
            }
            new.push(key, slot.load(Ordering::Relaxed));
        }
        new
    }

    /// The sibling that remains when `removing` leaves this node with a
    /// single child.
    pub fn other_child(&self, removing: u8) -> (u8, *mut N) {
        debug_assert_eq!(self.num_children, 2);
        for byte in 0..=255u8 {
            let slot = self.child_index[byte as usize];
            if slot != EMPTY && byte != removing {
                return (byte, self.children[slot as usize].load(Ordering::Relaxed));
            }
        }
        unreachable!("other_child: removed key not present");
    }

    /// Shallow copy: same index table, same child pointer values in fresh
    /// slots.
    pub fn copied(&self) -> Self {
        let mut new = Self::new();
        new.child_index = self.child_index.clone();
        for i in 0..self.num_children as usize {
            new.children[i] = AtomicPtr::new(self.children[i].load(Ordering::Relaxed));
        }
        new.num_children = self.num_children;
        new
    }
}

impl<N> NodeMapping<N> for IndexedChildren<N> {
    fn seek_child(&self, key: u8) -> Option<&ChildSlot<N>> {
        let slot = self.child_index[key as usize];
        if slot == EMPTY {
            return None;
        }
        Some(&self.children[slot as usize])
    }

    fn child_at_or_after(&self, pos: u16) -> Option<(u8, &ChildSlot<N>)> {
        for byte in pos..=255 {
            let slot = self.child_index[byte as usize];
            if slot != EMPTY {
                return Some((byte as u8, &self.children[slot as usize]));
            }
        }
        None
    }

    #[inline(always)]
    fn num_children(&self) -> usize {
        self.num_children as usize
    }
}
