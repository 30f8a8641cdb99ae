use std::mem::ManuallyDrop;

use crate::mapping::direct::DirectChildren;
use crate::mapping::indexed::IndexedChildren;
use crate::mapping::keyed::KeyedChildren;
use crate::mapping::{ChildSlot, NodeMapping};
use crate::prefix::Prefix;
use crate::tree::TreeConfig;

/// A tree node: compressed path plus content. Once published (reachable by
/// a reader), a node is frozen except for the pointer values in its child
/// slots; any other change produces a replacement node that is swapped in
/// at the parent and the old shell is retired.
pub(crate) struct Node<V> {
    pub(crate) prefix: Prefix,
    pub(crate) content: Content<V>,
}

pub(crate) enum Content<V> {
    Leaf(Leaf<V>),
    Node4(KeyedChildren<Node<V>, 4>),
    Node16(KeyedChildren<Node<V>, 16>),
    Node48(IndexedChildren<Node<V>>),
    Node256(DirectChildren<Node<V>>),
}

/// Terminal node: the full encoded key and the value.
///
/// The value sits in `ManuallyDrop` because a retired shell does not always
/// own it: when a leaf is shallow-cloned during a split, the value moves
/// into the clone and the original shell must be freed without dropping it.
/// [`drop_node`] drops the value, [`drop_node_shell`] does not.
pub(crate) struct Leaf<V> {
    pub(crate) key: Box<[u8]>,
    pub(crate) value: ManuallyDrop<V>,
}

impl<V> Node<V> {
    pub fn new_leaf(prefix: Prefix, key: &[u8], value: V) -> Self {
        Self {
            prefix,
            content: Content::Leaf(Leaf {
                key: Box::from(key),
                value: ManuallyDrop::new(value),
            }),
        }
    }

    /// New inner nodes always start at the smallest encoding.
    pub fn new_inner(prefix: Prefix) -> Self {
        Self {
            prefix,
            content: Content::Node4(KeyedChildren::new()),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(&self.content, Content::Leaf(_))
    }

    pub fn leaf(&self) -> Option<&Leaf<V>> {
        match &self.content {
            Content::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn leaf_matches(&self, key: &[u8]) -> bool {
        match &self.content {
            Content::Leaf(leaf) => &*leaf.key == key,
            _ => false,
        }
    }

    pub fn num_children(&self) -> usize {
        match &self.content {
            Content::Leaf(_) => 0,
            Content::Node4(m) => m.num_children(),
            Content::Node16(m) => m.num_children(),
            Content::Node48(m) => m.num_children(),
            Content::Node256(m) => m.num_children(),
        }
    }

    pub fn capacity(&self) -> usize {
        match &self.content {
            Content::Leaf(_) => 0,
            Content::Node4(_) => 4,
            Content::Node16(_) => 16,
            Content::Node48(_) => 48,
            Content::Node256(_) => 256,
        }
    }

    pub fn seek_child(&self, key: u8) -> Option<&ChildSlot<Node<V>>> {
        match &self.content {
            Content::Leaf(_) => None,
            Content::Node4(m) => m.seek_child(key),
            Content::Node16(m) => m.seek_child(key),
            Content::Node48(m) => m.seek_child(key),
            Content::Node256(m) => m.seek_child(key),
        }
    }

    /// Smallest child keyed `>= pos`; the cursor ordered iteration resumes
    /// from.
    pub fn child_at_or_after(&self, pos: u16) -> Option<(u8, &ChildSlot<Node<V>>)> {
        match &self.content {
            Content::Leaf(_) => None,
            Content::Node4(m) => m.child_at_or_after(pos),
            Content::Node16(m) => m.child_at_or_after(pos),
            Content::Node48(m) => m.child_at_or_after(pos),
            Content::Node256(m) => m.child_at_or_after(pos),
        }
    }

    /// In-place add, for nodes that are still under construction and not
    /// yet published.
    pub fn add_child(&mut self, key: u8, child: *mut Node<V>) {
        debug_assert!(self.num_children() < self.capacity());
        self.content = match &self.content {
            Content::Node4(m) => Content::Node4(m.with_child_added(key, child)),
            Content::Node16(m) => Content::Node16(m.with_child_added(key, child)),
            Content::Node48(m) => Content::Node48(m.with_child_added(key, child)),
            Content::Node256(m) => Content::Node256(m.with_child_added(key, child)),
            Content::Leaf(_) => unreachable!("add_child on a leaf"),
        };
    }

    /// Replacement node with one more child, grown to the next wider
    /// encoding when full. Returns the node and whether it grew.
    pub fn with_child_added(&self, key: u8, child: *mut Node<V>) -> (Node<V>, bool) {
        let (content, grew) = match &self.content {
            Content::Node4(m) => {
                if m.num_children() < 4 {
                    (Content::Node4(m.with_child_added(key, child)), false)
                } else {
                    (Content::Node16(KeyedChildren::from_grow(m, key, child)), true)
                }
            }
            Content::Node16(m) => {
                if m.num_children() < 16 {
                    (Content::Node16(m.with_child_added(key, child)), false)
                } else {
                    (Content::Node48(IndexedChildren::from_keyed(m, key, child)), true)
                }
            }
            Content::Node48(m) => {
                if m.num_children() < 48 {
                    (Content::Node48(m.with_child_added(key, child)), false)
                } else {
                    (Content::Node256(DirectChildren::from_indexed(m, key, child)), true)
                }
            }
            Content::Node256(m) => (Content::Node256(m.with_child_added(key, child)), false),
            Content::Leaf(_) => unreachable!("with_child_added on a leaf"),
        };
        (
            Node {
                prefix: self.prefix.clone(),
                content,
            },
            grew,
        )
    }

    /// Replacement node with `key` removed, shrunk to the next narrower
    /// encoding once occupancy drops to the configured threshold. Returns
    /// the node and whether it shrank. The caller handles the
    /// one-child-left case (path compression) before calling this.
    pub fn with_child_removed(&self, key: u8, config: &TreeConfig) -> (Node<V>, bool) {
        let remaining = self.num_children() - 1;
        debug_assert!(remaining >= 2, "fold-to-one-child handled by the caller");
        let (content, shrank) = match &self.content {
            Content::Node4(m) => (Content::Node4(m.with_child_removed(key)), false),
            Content::Node16(m) => {
                if remaining <= config.shrink_n16 {
                    (Content::Node4(KeyedChildren::from_shrink(m, key)), true)
                } else {
                    (Content::Node16(m.with_child_removed(key)), false)
                }
            }
            Content::Node48(m) => {
                if remaining <= config.shrink_n48 {
                    (Content::Node16(KeyedChildren::from_indexed_shrink(m, key)), true)
                } else {
                    (Content::Node48(m.with_child_removed(key)), false)
                }
            }
            Content::Node256(m) => {
                if remaining <= config.shrink_n256 {
                    (Content::Node48(IndexedChildren::from_direct_shrink(m, key)), true)
                } else {
                    (Content::Node256(m.with_child_removed(key)), false)
                }
            }
            Content::Leaf(_) => unreachable!("with_child_removed on a leaf"),
        };
        (
            Node {
                prefix: self.prefix.clone(),
                content,
            },
            shrank,
        )
    }

    /// The sibling left behind when removing `key` from a two-child node.
    pub fn other_child(&self, key: u8) -> (u8, *mut Node<V>) {
        match &self.content {
            Content::Node4(m) => m.other_child(key),
            Content::Node16(m) => m.other_child(key),
            Content::Node48(m) => m.other_child(key),
            Content::Node256(m) => m.other_child(key),
            Content::Leaf(_) => unreachable!("other_child on a leaf"),
        }
    }

    /// Shallow copy under a different prefix: child slots keep their
    /// pointer values, a leaf's key bytes are cloned and its value is moved
    /// out by `ptr::read`.
    ///
    /// # Safety
    ///
    /// For a leaf, the original must afterwards be freed with
    /// [`drop_node_shell`] (never [`drop_node`]), or the value would drop
    /// twice.
    pub unsafe fn shallow_clone_with_prefix(&self, prefix: Prefix) -> Node<V> {
        let content = match &self.content {
            Content::Leaf(leaf) => Content::Leaf(Leaf {
                key: leaf.key.clone(),
                // SAFETY: per contract, the source shell relinquishes
                // ownership of the value and is shell-dropped.
                value: unsafe { std::ptr::read(&leaf.value) },
            }),
            Content::Node4(m) => Content::Node4(m.copied()),
            Content::Node16(m) => Content::Node16(m.copied()),
            Content::Node48(m) => Content::Node48(m.copied()),
            Content::Node256(m) => Content::Node256(m.copied()),
        };
        Node { prefix, content }
    }
}

/// Free a node and, for a leaf, its value. The normal destructor for
/// removed and replaced nodes, and for teardown.
///
/// # Safety
///
/// `ptr` must come from `Box::into_raw` and be dead to all traversals
/// (unlinked past a quiescent horizon, or the tree is being dropped).
pub(crate) unsafe fn drop_node<V>(ptr: *mut Node<V>) {
    // SAFETY: caller guarantees ownership; children are raw pointers and
    // are not freed through the shell.
    let mut node = unsafe { Box::from_raw(ptr) };
    if let Content::Leaf(leaf) = &mut node.content {
        // SAFETY: this shell owns the value; see drop_node_shell for the
        // case where it does not.
        unsafe { ManuallyDrop::drop(&mut leaf.value) };
    }
}

/// Free a node shell whose value (if any) was moved into a replacement.
///
/// # Safety
///
/// Same reachability requirements as [`drop_node`]; additionally the leaf
/// value must have been moved out via `shallow_clone_with_prefix`.
pub(crate) unsafe fn drop_node_shell<V>(ptr: *mut Node<V>) {
    // SAFETY: caller guarantees ownership. The ManuallyDrop value field is
    // left untouched.
    unsafe { drop(Box::from_raw(ptr)) };
}

/// Type-erased adapters with the retire-callback signature.
pub(crate) unsafe fn drop_node_erased<V>(ptr: *mut u8) {
    unsafe { drop_node(ptr as *mut Node<V>) }
}

pub(crate) unsafe fn drop_node_shell_erased<V>(ptr: *mut u8) {
    unsafe { drop_node_shell(ptr as *mut Node<V>) }
}
