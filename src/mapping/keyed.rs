use std::ptr::null_mut;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::mapping::indexed::IndexedChildren;
use crate::mapping::{ChildSlot, NodeMapping};
use crate::utils::u8_keys::{
    find_insert_position_sorted, find_key_position_sorted, find_position_at_or_after,
};

/// Child storage for the two narrow encodings (N4 and N16): a sorted array
/// of key bytes and a parallel array of child slots. Presence of a key at a
/// position means there is a child at the same position.
///
/// Keeping the keys sorted makes in-order iteration a plain array walk and
/// lets the 16-wide variant search with SSE2 where available. Sorted
/// storage usually costs a shuffle on every insert and delete, but not
/// here: mutation always builds a fresh mapping anyway, so the sorted
/// order is established once per copy.
pub(crate) struct KeyedChildren<N, const WIDTH: usize> {
    pub(crate) keys: [u8; WIDTH],
    pub(crate) children: Box<[ChildSlot<N>; WIDTH]>,
    pub(crate) num_children: u8,
}

fn empty_slots<N, const WIDTH: usize>() -> Box<[ChildSlot<N>; WIDTH]> {
    Box::new(std::array::from_fn(|_| AtomicPtr::new(null_mut())))
}

impl<N, const WIDTH: usize> KeyedChildren<N, WIDTH> {
    pub fn new() -> Self {
        Self {
            keys: [255; WIDTH],
            children: empty_slots(),
            num_children: 0,
        }
    }

    /// Replacement mapping with one more child. The caller has already
    /// checked capacity and grows instead when full.
    pub fn with_child_added(&self, key: u8, child: *mut N) -> Self {
        let n = self.num_children as usize;
        debug_assert!(n < WIDTH, "with_child_added on full mapping");
        debug_assert!(find_key_position_sorted::<WIDTH>(key, &self.keys, n).is_none());

        let idx = find_insert_position_sorted::<WIDTH>(key, &self.keys, n);
        let mut new = Self::new();
        for i in 0..idx {
            new.keys[i] = self.keys[i];
            // Writer side; prior publications are ordered by the mutator lock.
            new.children[i] = AtomicPtr::new(self.children[i].load(Ordering::Relaxed));
        }
        new.keys[idx] = key;
        new.children[idx] = AtomicPtr::new(child);
        for i in idx..n {
            new.keys[i + 1] = self.keys[i];
            new.children[i + 1] = AtomicPtr::new(self.children[i].load(Ordering::Relaxed));
        }
        new.num_children = self.num_children + 1;
        new
    }

    /// Replacement mapping without `key`.
    pub fn with_child_removed(&self, key: u8) -> Self {
        let n = self.num_children as usize;
        let idx = find_key_position_sorted::<WIDTH>(key, &self.keys, n)
            .expect("with_child_removed: key not present");

        let mut new = Self::new();
        let mut cnt = 0;
        for i in 0..n {
            if i == idx {
                continue;
            }
            new.keys[cnt] = self.keys[i];
            new.children[cnt] = AtomicPtr::new(self.children[i].load(Ordering::Relaxed));
            cnt += 1;
        }
        new.num_children = cnt as u8;
        new
    }

    /// Grow from a narrower keyed mapping, folding in the child that did
    /// not fit.
    pub fn from_grow<const SMALL: usize>(
        small: &KeyedChildren<N, SMALL>,
        key: u8,
        child: *mut N,
    ) -> Self {
        debug_assert!(WIDTH > SMALL);
        debug_assert_eq!(small.num_children as usize, SMALL);

        let idx = find_insert_position_sorted::<SMALL>(key, &small.keys, SMALL);
        let mut new = Self::new();
        for i in 0..idx {
            new.keys[i] = small.keys[i];
            new.children[i] = AtomicPtr::new(small.children[i].load(Ordering::Relaxed));
        }
        new.keys[idx] = key;
        new.children[idx] = AtomicPtr::new(child);
        for i in idx..SMALL {
            new.keys[i + 1] = small.keys[i];
            new.children[i + 1] = AtomicPtr::new(small.children[i].load(Ordering::Relaxed));
        }
        new.num_children = SMALL as u8 + 1;
        new
    }

    /// Shrink from a wider keyed mapping while dropping `removed`.
    pub fn from_shrink<const LARGE: usize>(
        large: &KeyedChildren<N, LARGE>,
        removed: u8,
    ) -> Self {
        debug_assert!(WIDTH < LARGE);

        let mut new = Self::new();
        let mut cnt = 0;
        for i in 0..large.num_children as usize {
            if large.keys[i] == removed {
                continue;
            }
            debug_assert!(cnt < WIDTH, "from_shrink: source does not fit");
            new.keys[cnt] = large.keys[i];
            new.children[cnt] = AtomicPtr::new(large.children[i].load(Ordering::Relaxed));
            cnt += 1;
        }
        new.num_children = cnt as u8;
        new
    }

    /// Shrink from an N48 mapping while dropping `removed`. The indexed
    /// iteration is already byte-ascending, so the result stays sorted.
    pub fn from_indexed_shrink(im: &IndexedChildren<N>, removed: u8) -> Self {
        let mut new = Self::new();
        let mut cnt = 0;
        let mut pos: u16 = 0;
        while let Some((key, slot)) = im.child_at_or_after(pos) {
            pos = u16::from(key) + 1;
            if key == removed {
                continue;
            }
            debug_assert!(cnt < WIDTH, "from_indexed_shrink: source does not fit");
            new.keys[cnt] = key;
            new.children[cnt] = AtomicPtr::new(slot.load(Ordering::Relaxed));
            cnt += 1;
        }
        new.num_children = cnt as u8;
        new
    }

    /// Shallow copy: same keys, same child pointer values in fresh slots.
    pub fn copied(&self) -> Self {
        let mut new = Self::new();
        new.keys = self.keys;
        for i in 0..self.num_children as usize {
            new.children[i] = AtomicPtr::new(self.children[i].load(Ordering::Relaxed));
        }
        new.num_children = self.num_children;
        new
    }

    /// The sibling that remains when `removing` leaves this node with a
    /// single child, which the tree then folds into its parent.
    pub fn other_child(&self, removing: u8) -> (u8, *mut N) {
        debug_assert_eq!(self.num_children, 2);
        for i in 0..2 {
            if self.keys[i] != removing {
                return (self.keys[i], self.children[i].load(Ordering::Relaxed));
            }
        }
        unreachable!("other_child: removed key not present");
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u8, &ChildSlot<N>)> {
        (0..self.num_children as usize).map(|i| (self.keys[i], &self.children[i]))
    }
}

impl<N, const WIDTH: usize> NodeMapping<N> for KeyedChildren<N, WIDTH> {
    fn seek_child(&self, key: u8) -> Option<&ChildSlot<N>> {
        let idx = find_key_position_sorted::<WIDTH>(key, &self.keys, self.num_children as usize)?;
        Some(&self.children[idx])
    }

    fn child_at_or_after(&self, pos: u16) -> Option<(u8, &ChildSlot<N>)> {
        if pos > 255 {
            return None;
        }
        let idx = find_position_at_or_after::<WIDTH>(
            pos as u8,
            &self.keys,
            self.num_children as usize,
        )?;
        Some((self.keys[idx], &self.children[idx]))
    }

    #[inline(always)]
    fn num_children(&self) -> usize {
        self.num_children as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leak(v: u32) -> *mut u32 {
        Box::into_raw(Box::new(v))
    }

    fn free_all<const W: usize>(m: &KeyedChildren<u32, W>) {
        for (_, slot) in m.iter() {
            unsafe { drop(Box::from_raw(slot.load(Ordering::Relaxed))) };
        }
    }

    #[test]
    fn add_seek_remove() {
        let m = KeyedChildren::<u32, 4>::new();
        let m = m.with_child_added(3, leak(30));
        let m = m.with_child_added(1, leak(10));
        let m = m.with_child_added(2, leak(20));
        assert_eq!(m.num_children(), 3);
        // Sorted storage.
        assert_eq!(m.keys[..3], [1, 2, 3]);
        for k in [1u8, 2, 3] {
            let slot = m.seek_child(k).unwrap();
            assert_eq!(unsafe { *slot.load(Ordering::Relaxed) }, u32::from(k) * 10);
        }
        assert!(m.seek_child(4).is_none());

        let removed_ptr = m.seek_child(2).unwrap().load(Ordering::Relaxed);
        let m2 = m.with_child_removed(2);
        assert_eq!(m2.num_children(), 2);
        assert!(m2.seek_child(2).is_none());
        unsafe { drop(Box::from_raw(removed_ptr)) };
        free_all(&m2);
    }

    #[test]
    fn ascending_cursor() {
        let m = KeyedChildren::<u32, 16>::new()
            .with_child_added(200, leak(1))
            .with_child_added(5, leak(2))
            .with_child_added(60, leak(3));
        let mut seen = vec![];
        let mut pos: u16 = 0;
        while let Some((k, _)) = m.child_at_or_after(pos) {
            seen.push(k);
            pos = u16::from(k) + 1;
        }
        assert_eq!(seen, vec![5, 60, 200]);
        assert!(m.child_at_or_after(201).is_none());
        free_all(&m);
    }

    #[test]
    fn grow_keeps_order() {
        let mut m = KeyedChildren::<u32, 4>::new();
        for k in [9u8, 3, 200, 0] {
            m = m.with_child_added(k, leak(u32::from(k)));
        }
        let grown = KeyedChildren::<u32, 16>::from_grow(&m, 100, leak(100));
        assert_eq!(grown.num_children(), 5);
        assert_eq!(grown.keys[..5], [0, 3, 9, 100, 200]);
        free_all(&grown);
    }

    #[test]
    fn shrink_drops_removed() {
        let mut m = KeyedChildren::<u32, 16>::new();
        for k in [1u8, 2, 3, 4] {
            m = m.with_child_added(k, leak(u32::from(k)));
        }
        let doomed = m.seek_child(2).unwrap().load(Ordering::Relaxed);
        let shrunk = KeyedChildren::<u32, 4>::from_shrink(&m, 2);
        assert_eq!(shrunk.num_children(), 3);
        assert_eq!(shrunk.keys[..3], [1, 3, 4]);
        unsafe { drop(Box::from_raw(doomed)) };
        free_all(&shrunk);
    }

    #[test]
    fn sole_sibling() {
        let m = KeyedChildren::<u32, 4>::new()
            .with_child_added(7, leak(70))
            .with_child_added(9, leak(90));
        let (k, ptr) = m.other_child(7);
        assert_eq!(k, 9);
        assert_eq!(unsafe { *ptr }, 90);
        free_all(&m);
    }
}
