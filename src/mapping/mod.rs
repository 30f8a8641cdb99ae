pub(crate) mod direct;
pub(crate) mod indexed;
pub(crate) mod keyed;

use std::sync::atomic::AtomicPtr;

/// A child slot. The pointer value inside a slot is the only thing a
/// published node ever has mutated in place: the mutator swaps it with a
/// single `Release` store, readers load it with `Acquire`. Everything else
/// about a published node (key bytes, slot layout, child count) is frozen;
/// changes build a replacement node.
pub(crate) type ChildSlot<N> = AtomicPtr<N>;

/// Read-side contract shared by the four encodings.
///
/// `child_at_or_after` is the restartable ascending cursor ordered scans are
/// built from: it reports the smallest child keyed `>= pos`, so a traversal
/// can always resume from "last byte + 1".
pub(crate) trait NodeMapping<N> {
    fn seek_child(&self, key: u8) -> Option<&ChildSlot<N>>;
    fn child_at_or_after(&self, pos: u16) -> Option<(u8, &ChildSlot<N>)>;
    fn num_children(&self) -> usize;
}
