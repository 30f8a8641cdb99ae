//! The tree engine: lookup, insert, remove, and the publication discipline
//! that lets readers run lock-free against the single mutator.
//!
//! Mutation is copy-on-write at node granularity. A replacement node is
//! fully built off to the side, published with one `Release` store into the
//! parent's child slot, and the old shell is retired to the QSBR subsystem.
//! A reader in flight therefore observes either the fully-old or the
//! fully-new subtree, never a torn mix.

use std::marker::PhantomData;
use std::ops::RangeBounds;
use std::ptr::null_mut;
use std::sync::Arc;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::error::ArtError;
use crate::iter::Iter;
use crate::keys::KeyTrait;
use crate::mapping::ChildSlot;
use crate::node::{self, Node};
use crate::prefix::Prefix;
use crate::qsbr::{Qsbr, ReaderSlot};
use crate::range::Range;
use crate::stats::TreeStats;

/// Construction-time tuning.
///
/// The shrink thresholds carry the hysteresis that keeps a node from
/// bouncing between encodings when its occupancy hovers at a boundary: a
/// node shrinks only once its child count drops comfortably below the
/// narrower encoding's capacity.
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Maximum accepted encoded key length; longer keys fail with
    /// [`ArtError::KeyTooLong`].
    pub max_key_len: usize,
    /// N16 shrinks to N4 at or below this child count.
    pub shrink_n16: usize,
    /// N48 shrinks to N16 at or below this child count.
    pub shrink_n48: usize,
    /// N256 shrinks to N48 at or below this child count.
    pub shrink_n256: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_key_len: 4096,
            shrink_n16: 3,
            shrink_n48: 12,
            shrink_n256: 37,
        }
    }
}

/// Outcome of an [`Art::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Inserted,
    Replaced,
}

/// An Adaptive Radix Tree supporting one mutator and any number of
/// concurrent readers.
///
/// Writers (`insert`, `upsert`, `remove`) serialize on an internal mutex;
/// readers register once ([`Art::reader`]) and wrap each traversal in a
/// [`ReadGuard`], which is what makes deferred reclamation of replaced
/// nodes safe. Reads never wait on the writer.
///
/// ```rust
/// use qart::{Art, keys::ArrayKey};
///
/// let tree: Art<ArrayKey<16>, String> = Art::new();
/// tree.insert("apple", "fruit".to_string()).unwrap();
/// tree.insert("application", "software".to_string()).unwrap();
///
/// let mut reader = tree.reader();
/// let guard = reader.enter();
/// assert_eq!(guard.get("apple"), Some(&"fruit".to_string()));
/// assert_eq!(guard.get("orange"), None);
/// ```
pub struct Art<K, V>
where
    K: KeyTrait,
{
    root: ChildSlot<Node<V>>,
    config: TreeConfig,
    qsbr: Qsbr,
    size: AtomicUsize,
    writer: Mutex<()>,
    #[cfg(feature = "stats")]
    counters: crate::stats::OpCounters,
    _phantom: PhantomData<K>,
}

// The raw child pointers are owned by the tree structure and the retired
// lists; the guard discipline keeps reader references alive. Key types are
// phantom.
unsafe impl<K: KeyTrait + Send, V: Send> Send for Art<K, V> {}
unsafe impl<K: KeyTrait + Send + Sync, V: Send + Sync> Sync for Art<K, V> {}

#[inline]
fn alloc<V>(node: Node<V>) -> *mut Node<V> {
    Box::into_raw(Box::new(node))
}

impl<K: KeyTrait, V> Default for Art<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Art<K, V>
where
    K: KeyTrait,
{
    /// Create an empty tree with default configuration.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty tree with explicit configuration.
    ///
    /// # Panics
    ///
    /// Panics when a shrink threshold lies outside the capacity band of its
    /// target encoding.
    pub fn with_config(config: TreeConfig) -> Self {
        assert!(config.max_key_len >= 1, "max_key_len must be at least 1");
        assert!(
            (2..=4).contains(&config.shrink_n16),
            "shrink_n16 must lie in 2..=4"
        );
        assert!(
            (2..=16).contains(&config.shrink_n48),
            "shrink_n48 must lie in 2..=16"
        );
        assert!(
            (2..=48).contains(&config.shrink_n256),
            "shrink_n256 must lie in 2..=48"
        );
        Self {
            root: AtomicPtr::new(null_mut()),
            config,
            qsbr: Qsbr::new(),
            size: AtomicUsize::new(0),
            writer: Mutex::new(()),
            #[cfg(feature = "stats")]
            counters: crate::stats::OpCounters::default(),
            _phantom: PhantomData,
        }
    }

    /// Register a reader. The handle owns this thread's quiescent-state
    /// slot; traversals happen through [`Reader::enter`].
    pub fn reader(&self) -> Reader<'_, K, V> {
        Reader {
            tree: self,
            slot: self.qsbr.register(),
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a new key. Fails with [`ArtError::KeyExists`] if the key is
    /// already present (the provided value is dropped); use [`Art::upsert`]
    /// for replace-on-duplicate semantics.
    pub fn insert<Q>(&self, key: Q, value: V) -> Result<(), ArtError>
    where
        Q: Into<K>,
    {
        self.insert_k(&key.into(), value)
    }

    pub fn insert_k(&self, key: &K, value: V) -> Result<(), ArtError> {
        self.write_k(key, value, false).map(|_| ())
    }

    /// Insert or replace. An existing leaf is replaced wholesale — the old
    /// leaf retires to reclamation, so concurrent readers keep seeing the
    /// value they already resolved until they quiesce.
    pub fn upsert<Q>(&self, key: Q, value: V) -> Result<Update, ArtError>
    where
        Q: Into<K>,
    {
        self.upsert_k(&key.into(), value)
    }

    pub fn upsert_k(&self, key: &K, value: V) -> Result<Update, ArtError> {
        self.write_k(key, value, true)
    }

    /// Remove a key. Fails with [`ArtError::KeyNotFound`] if absent.
    pub fn remove<Q>(&self, key: Q) -> Result<(), ArtError>
    where
        Q: Into<K>,
    {
        self.remove_k(&key.into())
    }

    pub fn remove_k(&self, key: &K) -> Result<(), ArtError> {
        let encoded = key.as_slice();
        self.check_key(encoded)?;

        let guard = self.writer.lock();
        let result = self.remove_locked(encoded);
        if result.is_ok() {
            self.size.fetch_sub(1, Ordering::Relaxed);
            self.qsbr.advance();
            self.qsbr.maybe_collect();
        }
        drop(guard);
        result
    }

    /// Drain whatever the quiescent horizon allows from the retired list.
    /// Reclamation also runs opportunistically from the mutator path; this
    /// exists for callers that want to bound memory between mutations.
    pub fn reclaim(&self) -> usize {
        self.qsbr.collect()
    }

    /// Structure statistics, gathered under the writer lock.
    pub fn stats(&self) -> TreeStats {
        let _guard = self.writer.lock();
        let mut stats = TreeStats::default();
        let root = self.root.load(Ordering::Acquire);
        if !root.is_null() {
            // SAFETY: writer lock held, structure cannot change under us.
            unsafe { Self::stats_recurse(root, &mut stats, 1) };
        }
        let total_width = 4 * stats.num_n4 + 16 * stats.num_n16 + 48 * stats.num_n48
            + 256 * stats.num_n256;
        if total_width > 0 {
            stats.total_density = stats.total_children as f64 / total_width as f64;
        }
        #[cfg(feature = "stats")]
        {
            stats.ops = self.counters.snapshot();
        }
        stats
    }

    /// Walk the whole tree checking structural invariants, panicking on any
    /// violation. Fuzzing/property-test hook.
    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let _guard = self.writer.lock();
        let root = self.root.load(Ordering::Acquire);
        if root.is_null() {
            assert_eq!(self.len(), 0, "empty tree with nonzero size");
            return;
        }
        let mut path = Vec::new();
        let mut leaves = 0usize;
        // SAFETY: writer lock held.
        unsafe { Self::invariants_recurse(root, true, &mut path, &mut leaves) };
        assert_eq!(leaves, self.len(), "leaf count does not match size");
    }

    fn check_key(&self, encoded: &[u8]) -> Result<(), ArtError> {
        if encoded.is_empty() {
            return Err(ArtError::InvalidKeyBytes);
        }
        if encoded.len() > self.config.max_key_len {
            return Err(ArtError::KeyTooLong {
                len: encoded.len(),
                max: self.config.max_key_len,
            });
        }
        Ok(())
    }

    fn write_k(&self, key: &K, value: V, overwrite: bool) -> Result<Update, ArtError> {
        let encoded = key.as_slice();
        self.check_key(encoded)?;

        let guard = self.writer.lock();
        // SAFETY: writer lock held.
        let result = unsafe { self.insert_recurse(&self.root, encoded, 0, value, overwrite) };
        match result {
            Ok(Update::Inserted) => {
                self.size.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Update::Replaced) | Err(_) => {}
        }
        if result.is_ok() {
            self.qsbr.advance();
            self.qsbr.maybe_collect();
        }
        drop(guard);
        result
    }

    /// # Safety
    ///
    /// Writer lock must be held; `slot` must belong to the live structure.
    unsafe fn insert_recurse(
        &self,
        slot: &ChildSlot<Node<V>>,
        encoded: &[u8],
        depth: usize,
        value: V,
        overwrite: bool,
    ) -> Result<Update, ArtError> {
        let cur_ptr = slot.load(Ordering::Relaxed);
        if cur_ptr.is_null() {
            // Empty tree; the root slot is the only one ever null.
            let leaf = Node::new_leaf(Prefix::from_slice(&encoded[depth..]), encoded, value);
            slot.store(alloc(leaf), Ordering::Release);
            return Ok(Update::Inserted);
        }

        // SAFETY: reachable from the live structure, writer lock held.
        let cur = unsafe { &*cur_ptr };
        let rem = &encoded[depth..];
        let lcp = cur.prefix.prefix_length_slice(rem);

        if lcp == cur.prefix.len() && lcp == rem.len() {
            if !cur.is_leaf() {
                // The key ends exactly at an inner node: some stored key
                // extends this one, so the key set is not prefix-free.
                return Err(ArtError::InvalidKeyBytes);
            }
            debug_assert!(cur.leaf_matches(encoded));
            if !overwrite {
                return Err(ArtError::KeyExists);
            }
            let replacement = Node::new_leaf(Prefix::from_slice(rem), encoded, value);
            slot.store(alloc(replacement), Ordering::Release);
            self.retire(cur_ptr);
            return Ok(Update::Replaced);
        }

        if lcp < cur.prefix.len() {
            // Diverge inside this node's prefix: splice in a fresh N4
            // holding exactly the two diverging entries.
            if lcp == rem.len() {
                // The key is a strict prefix of the compressed path.
                return Err(ArtError::InvalidKeyBytes);
            }
            let k1 = cur.prefix.at(lcp);
            let k2 = rem[lcp];
            debug_assert_ne!(k1, k2);

            let mut branch = Node::new_inner(cur.prefix.partial_before(lcp));
            // SAFETY: `cur` relinquishes its content to the trimmed clone
            // and is retired shell-only below.
            let trimmed = unsafe { cur.shallow_clone_with_prefix(cur.prefix.partial_after(lcp)) };
            let leaf = Node::new_leaf(Prefix::from_slice(&rem[lcp..]), encoded, value);
            branch.add_child(k1, alloc(trimmed));
            branch.add_child(k2, alloc(leaf));

            slot.store(alloc(branch), Ordering::Release);
            self.retire_shell(cur_ptr);
            return Ok(Update::Inserted);
        }

        // Prefix fully consumed, key continues.
        if cur.is_leaf() {
            // The stored leaf key is a strict prefix of the new key.
            return Err(ArtError::InvalidKeyBytes);
        }
        let k = rem[lcp];
        if let Some(child_slot) = cur.seek_child(k) {
            // SAFETY: propagated from caller.
            return unsafe { self.insert_recurse(child_slot, encoded, depth + lcp, value, overwrite) };
        }

        // No child on this byte: lazy expansion, the new leaf hangs
        // directly off this node.
        let leaf = alloc(Node::new_leaf(Prefix::from_slice(&rem[lcp..]), encoded, value));
        let (replacement, grew) = cur.with_child_added(k, leaf);
        if grew {
            trace!(capacity = replacement.capacity(), "grew node encoding");
            #[cfg(feature = "stats")]
            self.counters.bump_grows();
        }
        slot.store(alloc(replacement), Ordering::Release);
        self.retire(cur_ptr);
        Ok(Update::Inserted)
    }

    fn remove_locked(&self, encoded: &[u8]) -> Result<(), ArtError> {
        let root_ptr = self.root.load(Ordering::Relaxed);
        if root_ptr.is_null() {
            return Err(ArtError::KeyNotFound);
        }
        // SAFETY: writer lock held.
        let root = unsafe { &*root_ptr };

        let lcp = root.prefix.prefix_length_slice(encoded);
        if lcp != root.prefix.len() {
            return Err(ArtError::KeyNotFound);
        }

        if root.is_leaf() {
            if !root.leaf_matches(encoded) {
                return Err(ArtError::KeyNotFound);
            }
            self.root.store(null_mut(), Ordering::Release);
            self.retire(root_ptr);
            return Ok(());
        }

        // SAFETY: writer lock held.
        unsafe { self.remove_recurse(&self.root, root_ptr, encoded, lcp) }
    }

    /// Remove below `parent`, which sits in `parent_slot` and whose
    /// children branch at `depth` bytes into the key.
    ///
    /// # Safety
    ///
    /// Writer lock must be held; `parent_ptr` must be the current value of
    /// `parent_slot`.
    unsafe fn remove_recurse(
        &self,
        parent_slot: &ChildSlot<Node<V>>,
        parent_ptr: *mut Node<V>,
        encoded: &[u8],
        depth: usize,
    ) -> Result<(), ArtError> {
        // SAFETY: per contract.
        let parent = unsafe { &*parent_ptr };
        if depth >= encoded.len() {
            return Err(ArtError::KeyNotFound);
        }
        let c = encoded[depth];
        let Some(child_slot) = parent.seek_child(c) else {
            return Err(ArtError::KeyNotFound);
        };
        let child_ptr = child_slot.load(Ordering::Relaxed);
        // SAFETY: reachable from the live structure.
        let child = unsafe { &*child_ptr };

        let rem = &encoded[depth..];
        let lcp = child.prefix.prefix_length_slice(rem);
        if lcp != child.prefix.len() {
            return Err(ArtError::KeyNotFound);
        }

        if !child.is_leaf() {
            // SAFETY: propagated from caller.
            return unsafe {
                self.remove_recurse(child_slot, child_ptr, encoded, depth + child.prefix.len())
            };
        }

        if !child.leaf_matches(encoded) {
            return Err(ArtError::KeyNotFound);
        }

        debug_assert!(parent.num_children() >= 2);
        if parent.num_children() == 2 {
            // One sibling left: collapse this level. The sibling's prefix
            // already starts with its branch byte, so the merged prefix is
            // plain concatenation.
            let (_, sibling_ptr) = parent.other_child(c);
            // SAFETY: reachable from the live structure.
            let sibling = unsafe { &*sibling_ptr };
            let merged = parent.prefix.extended_with(&sibling.prefix);
            // SAFETY: sibling relinquishes its content to the folded clone
            // and is retired shell-only below.
            let folded = unsafe { sibling.shallow_clone_with_prefix(merged) };
            parent_slot.store(alloc(folded), Ordering::Release);
            trace!("collapsed single-child node into parent slot");
            #[cfg(feature = "stats")]
            self.counters.bump_path_compressions();

            self.retire(parent_ptr);
            self.retire_shell(sibling_ptr);
            self.retire(child_ptr);
        } else {
            let (replacement, shrank) = parent.with_child_removed(c, &self.config);
            if shrank {
                trace!(capacity = replacement.capacity(), "shrank node encoding");
                #[cfg(feature = "stats")]
                self.counters.bump_shrinks();
            }
            parent_slot.store(alloc(replacement), Ordering::Release);
            self.retire(parent_ptr);
            self.retire(child_ptr);
        }
        Ok(())
    }

    /// Hand an unlinked node (and, for a leaf, its value) to reclamation.
    fn retire(&self, ptr: *mut Node<V>) {
        #[cfg(feature = "stats")]
        self.counters.bump_retired();
        self.qsbr.retire(ptr as *mut u8, node::drop_node_erased::<V>);
    }

    /// Hand an unlinked node shell to reclamation; its content was moved
    /// into a replacement.
    fn retire_shell(&self, ptr: *mut Node<V>) {
        #[cfg(feature = "stats")]
        self.counters.bump_retired();
        self.qsbr.retire(ptr as *mut u8, node::drop_node_shell_erased::<V>);
    }

    /// # Safety
    ///
    /// Caller must be inside a read section or hold the writer lock; the
    /// returned reference is only valid for as long as that protection
    /// lasts.
    pub(crate) unsafe fn get_raw(&self, encoded: &[u8]) -> Option<&V> {
        let mut cur_ptr = self.root.load(Ordering::Acquire);
        let mut depth = 0usize;
        loop {
            if cur_ptr.is_null() {
                return None;
            }
            // SAFETY: protected per contract; retired nodes outlive the
            // section.
            let cur = unsafe { &*cur_ptr };
            let rem = &encoded[depth..];
            let lcp = cur.prefix.prefix_length_slice(rem);
            if lcp != cur.prefix.len() {
                return None;
            }
            if let Some(leaf) = cur.leaf() {
                // Confirm against the stored key; the descent only checked
                // prefixes.
                if &*leaf.key == encoded {
                    return Some(&*leaf.value);
                }
                return None;
            }
            if lcp == rem.len() {
                // Key exhausted at an inner node.
                return None;
            }
            let Some(slot) = cur.seek_child(rem[lcp]) else {
                return None;
            };
            cur_ptr = slot.load(Ordering::Acquire);
            depth += lcp;
        }
    }

    pub(crate) fn root_slot(&self) -> &ChildSlot<Node<V>> {
        &self.root
    }

    /// # Safety
    ///
    /// Writer lock must be held.
    unsafe fn stats_recurse(ptr: *mut Node<V>, stats: &mut TreeStats, height: usize) {
        // SAFETY: per contract.
        let node = unsafe { &*ptr };
        stats.max_height = stats.max_height.max(height);
        if node.is_leaf() {
            stats.num_leaves += 1;
            return;
        }
        match node.capacity() {
            4 => stats.num_n4 += 1,
            16 => stats.num_n16 += 1,
            48 => stats.num_n48 += 1,
            _ => stats.num_n256 += 1,
        }
        stats.num_inner_nodes += 1;
        stats.total_children += node.num_children();
        let mut pos: u16 = 0;
        while let Some((k, slot)) = node.child_at_or_after(pos) {
            pos = u16::from(k) + 1;
            // SAFETY: propagated.
            unsafe { Self::stats_recurse(slot.load(Ordering::Relaxed), stats, height + 1) };
        }
    }

    /// # Safety
    ///
    /// Writer lock must be held.
    unsafe fn invariants_recurse(
        ptr: *mut Node<V>,
        is_root: bool,
        path: &mut Vec<u8>,
        leaves: &mut usize,
    ) {
        // SAFETY: per contract.
        let node = unsafe { &*ptr };
        let mark = path.len();
        path.extend_from_slice(node.prefix.to_slice());

        if let Some(leaf) = node.leaf() {
            assert_eq!(
                &path[..],
                &*leaf.key,
                "prefixes along the path do not reconstruct the leaf key"
            );
            *leaves += 1;
            path.truncate(mark);
            return;
        }

        let reported = node.num_children();
        assert!(reported <= node.capacity(), "child count exceeds capacity");
        assert!(
            reported >= 2 || is_root,
            "inner node with fewer than two children"
        );

        let mut observed = 0usize;
        let mut pos: u16 = 0;
        while let Some((k, slot)) = node.child_at_or_after(pos) {
            pos = u16::from(k) + 1;
            observed += 1;
            let child_ptr = slot.load(Ordering::Relaxed);
            assert!(!child_ptr.is_null(), "present slot holds a null child");
            // SAFETY: reachable from the live structure.
            let child = unsafe { &*child_ptr };
            assert!(
                !child.prefix.is_empty() && child.prefix.at(0) == k,
                "child prefix does not start with its branch byte"
            );
            // SAFETY: propagated.
            unsafe { Self::invariants_recurse(child_ptr, false, path, leaves) };
        }
        assert_eq!(
            observed, reported,
            "reported child count does not match iterated children"
        );
        path.truncate(mark);
    }
}

impl<K: KeyTrait, V> Drop for Art<K, V> {
    fn drop(&mut self) {
        // Exclusive access: no readers or writers remain. Tear down the
        // reachable structure with an explicit stack; the Qsbr drop then
        // frees whatever still sits on the retired list.
        let root = self.root.load(Ordering::Relaxed);
        if root.is_null() {
            return;
        }
        let mut stack: Vec<*mut Node<V>> = Vec::with_capacity(64);
        stack.push(root);
        while let Some(ptr) = stack.pop() {
            // SAFETY: exclusively owned, each node visited once.
            let node = unsafe { &*ptr };
            let mut pos: u16 = 0;
            while let Some((k, slot)) = node.child_at_or_after(pos) {
                pos = u16::from(k) + 1;
                stack.push(slot.load(Ordering::Relaxed));
            }
            // SAFETY: children are already collected by pointer value.
            unsafe { node::drop_node(ptr) };
        }
    }
}

/// A registered reader: owns one quiescent-state slot.
///
/// `enter` takes `&mut self` deliberately — overlapping read sections from
/// one registration would let the inner section re-announce an epoch while
/// the outer one still holds references, which is exactly the misuse QSBR
/// cannot tolerate. One section (or one quiescent report) at a time.
pub struct Reader<'t, K, V>
where
    K: KeyTrait,
{
    tree: &'t Art<K, V>,
    slot: Arc<ReaderSlot>,
}

impl<'t, K: KeyTrait, V> Reader<'t, K, V> {
    /// Announce entry into a traversal section.
    pub fn enter(&mut self) -> ReadGuard<'_, 't, K, V> {
        self.tree.qsbr.begin_section(&self.slot);
        ReadGuard { reader: self }
    }

    /// Report a quiescent point without entering a section. Long-lived
    /// reader threads call this between batches of traversals so that
    /// reclamation keeps moving.
    pub fn quiescent(&mut self) {
        self.tree.qsbr.quiescent(&self.slot);
    }
}

impl<K: KeyTrait, V> Drop for Reader<'_, K, V> {
    fn drop(&mut self) {
        self.tree.qsbr.end_section(&self.slot);
        self.tree.qsbr.unregister(&self.slot);
    }
}

/// An active read section. Everything resolved through the guard (values,
/// iterators) stays valid until the guard drops, even if the writer
/// replaces or removes it concurrently.
pub struct ReadGuard<'r, 't, K, V>
where
    K: KeyTrait,
{
    reader: &'r Reader<'t, K, V>,
}

impl<K: KeyTrait, V> ReadGuard<'_, '_, K, V> {
    /// Look up a key.
    pub fn get<Q>(&self, key: Q) -> Option<&V>
    where
        Q: Into<K>,
    {
        self.get_k(&key.into())
    }

    pub fn get_k(&self, key: &K) -> Option<&V> {
        // SAFETY: inside a read section for this tree's Qsbr.
        unsafe { self.reader.tree.get_raw(key.as_slice()) }
    }

    /// Ascending iteration over the whole tree.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.reader.tree.root_slot().load(Ordering::Acquire))
    }

    /// Ascending iteration over a key range. `lo..hi` gives the
    /// half-open scan `lo <= k < hi`; all `RangeBounds` forms work.
    pub fn range<R>(&self, range: R) -> Range<'_, K, V>
    where
        R: RangeBounds<K>,
    {
        Range::new(
            self.reader.tree.root_slot().load(Ordering::Acquire),
            range.start_bound().cloned(),
            range.end_bound().cloned(),
        )
    }
}

impl<K: KeyTrait, V> Drop for ReadGuard<'_, '_, K, V> {
    fn drop(&mut self) {
        self.reader.tree.qsbr.end_section(&self.reader.slot);
    }
}
