//! Ordered depth-first iteration.
//!
//! The traversal keeps a stack of `(node, next byte)` cursors and drives
//! each node's `child_at_or_after`, so it is lazy, ascending, and
//! restartable: seeking to a lower bound just primes the stack mid-way.
//! Iterators borrow the read guard they were created under; every node they
//! touch stays alive until that guard drops.

use std::marker::PhantomData;
use std::sync::atomic::Ordering;

use crate::keys::KeyTrait;
use crate::node::Node;

struct Frame<V> {
    node: *const Node<V>,
    /// Next child byte to consider; 256 once exhausted.
    pos: u16,
}

pub struct Iter<'g, K, V>
where
    K: KeyTrait,
{
    stack: Vec<Frame<V>>,
    /// A leaf to yield before touching the stack (root-is-leaf, or an
    /// exactly-matched seek target).
    pending_leaf: Option<*const Node<V>>,
    _phantom: PhantomData<(&'g (), K)>,
}

impl<'g, K, V> Iter<'g, K, V>
where
    K: KeyTrait,
{
    /// Full ascending scan from `root`.
    pub(crate) fn new(root: *mut Node<V>) -> Self {
        let mut it = Self::empty();
        if root.is_null() {
            return it;
        }
        // SAFETY: guard-protected for 'g.
        let node = unsafe { &*root };
        if node.is_leaf() {
            it.pending_leaf = Some(root);
        } else {
            it.stack.push(Frame { node: root, pos: 0 });
        }
        it
    }

    /// Ascending scan of every key `>= bound`: descend toward the bound,
    /// priming each level's cursor past the branch byte taken, then resume
    /// in order.
    pub(crate) fn seek(root: *mut Node<V>, bound: &[u8]) -> Self {
        let mut it = Self::empty();
        let mut ptr = root;
        let mut depth = 0usize;
        loop {
            if ptr.is_null() {
                return it;
            }
            // SAFETY: guard-protected for 'g.
            let node = unsafe { &*ptr };
            let rem = &bound[depth..];
            let lcp = node.prefix.prefix_length_slice(rem);

            if lcp < node.prefix.len() {
                // Compressed path diverges from the bound: the whole
                // subtree sorts on one side of it.
                if lcp == rem.len() || rem[lcp] < node.prefix.at(lcp) {
                    if node.is_leaf() {
                        it.pending_leaf = Some(ptr);
                    } else {
                        it.stack.push(Frame { node: ptr, pos: 0 });
                    }
                }
                return it;
            }

            if let Some(leaf) = node.leaf() {
                if &*leaf.key >= bound {
                    it.pending_leaf = Some(ptr);
                }
                return it;
            }

            if lcp == rem.len() {
                // Bound exhausted at an inner node: everything below
                // extends it.
                it.stack.push(Frame { node: ptr, pos: 0 });
                return it;
            }

            let b = rem[lcp];
            // This level resumes after the branch byte once the descent
            // below it is exhausted.
            it.stack.push(Frame {
                node: ptr,
                pos: u16::from(b) + 1,
            });
            match node.seek_child(b) {
                Some(slot) => {
                    ptr = slot.load(Ordering::Acquire);
                    depth += lcp;
                }
                None => return it,
            }
        }
    }

    fn empty() -> Self {
        Self {
            stack: Vec::new(),
            pending_leaf: None,
            _phantom: PhantomData,
        }
    }

    fn yield_leaf(node: &Node<V>) -> (K, &V) {
        let leaf = node.leaf().expect("yield_leaf on inner node");
        (K::new_from_slice(&leaf.key), &*leaf.value)
    }
}

impl<'g, K, V> Iterator for Iter<'g, K, V>
where
    K: KeyTrait,
    V: 'g,
{
    type Item = (K, &'g V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(ptr) = self.pending_leaf.take() {
            // SAFETY: guard-protected for 'g.
            return Some(Self::yield_leaf(unsafe { &*ptr }));
        }
        loop {
            let frame = self.stack.last_mut()?;
            // SAFETY: guard-protected for 'g.
            let node = unsafe { &*frame.node };
            match node.child_at_or_after(frame.pos) {
                None => {
                    self.stack.pop();
                }
                Some((b, slot)) => {
                    frame.pos = u16::from(b) + 1;
                    let child_ptr = slot.load(Ordering::Acquire);
                    debug_assert!(!child_ptr.is_null());
                    // SAFETY: guard-protected for 'g.
                    let child = unsafe { &*child_ptr };
                    if child.is_leaf() {
                        return Some(Self::yield_leaf(child));
                    }
                    self.stack.push(Frame {
                        node: child_ptr,
                        pos: 0,
                    });
                }
            }
        }
    }
}
