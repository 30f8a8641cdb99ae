use std::ptr::null_mut;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::mapping::indexed::IndexedChildren;
use crate::mapping::{ChildSlot, NodeMapping};

/// Child storage for N256: a direct 256-entry child-pointer array. Dense,
/// no indirection; a null slot means no child for that byte.
pub(crate) struct DirectChildren<N> {
    children: Box<[ChildSlot<N>; 256]>,
    num_children: u16,
}

impl<N> DirectChildren<N> {
    pub fn new() -> Self {
        Self {
            children: Box::new(std::array::from_fn(|_| AtomicPtr::new(null_mut()))),
            num_children: 0,
        }
    }

    /// Replacement mapping with one more child.
    pub fn with_child_added(&self, key: u8, child: *mut N) -> Self {
        let mut new = self.copied();
        debug_assert!(new.children[key as usize].load(Ordering::Relaxed).is_null());
        new.children[key as usize] = AtomicPtr::new(child);
        new.num_children += 1;
        new
    }

    /// Replacement mapping without `key`.
    pub fn with_child_removed(&self, key: u8) -> Self {
        let mut new = self.copied();
        debug_assert!(!new.children[key as usize].load(Ordering::Relaxed).is_null());
        new.children[key as usize] = AtomicPtr::new(null_mut());
        new.num_children -= 1;
        new
    }

    /// Grow from a full N48, folding in the child that did not fit.
    pub fn from_indexed(im: &IndexedChildren<N>, key: u8, child: *mut N) -> Self {
        let mut new = Self::new();
        let mut pos: u16 = 0;
        while let Some((byte, slot)) = im.child_at_or_after(pos) {
            pos = u16::from(byte) + 1;
            // Writer side; ordered by the mutator lock.
            new.children[byte as usize] = AtomicPtr::new(slot.load(Ordering::Relaxed));
            new.num_children += 1;
        }
        new.children[key as usize] = AtomicPtr::new(child);
        new.num_children += 1;
        new
    }

    /// The sibling that remains when `removing` leaves this node with a
    /// single child.
    pub fn other_child(&self, removing: u8) -> (u8, *mut N) {
        debug_assert_eq!(self.num_children, 2);
        for byte in 0..=255u8 {
            if byte == removing {
                continue;
            }
            let ptr = self.children[byte as usize].load(Ordering::Relaxed);
            if !ptr.is_null() {
                return (byte, ptr);
            }
        }
        unreachable!("other_child: removed key not present");
    }

    /// Shallow copy: same child pointer values in fresh slots.
    pub fn copied(&self) -> Self {
        let mut new = Self::new();
        for i in 0..256 {
            new.children[i] = AtomicPtr::new(self.children[i].load(Ordering::Relaxed));
        }
        new.num_children = self.num_children;
        new
    }
}

impl<N> NodeMapping<N> for DirectChildren<N> {
    fn seek_child(&self, key: u8) -> Option<&ChildSlot<N>> {
        let slot = &self.children[key as usize];
        if slot.load(Ordering::Acquire).is_null() {
            return None;
        }
        Some(slot)
    }

    fn child_at_or_after(&self, pos: u16) -> Option<(u8, &ChildSlot<N>)> {
        for byte in pos..=255 {
            let slot = &self.children[byte as usize];
            if !slot.load(Ordering::Acquire).is_null() {
                return Some((byte as u8, slot));
            }
        }
        None
    }

    #[inline(always)]
    fn num_children(&self) -> usize {
        self.num_children as usize
    }
}
