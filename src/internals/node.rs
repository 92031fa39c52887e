//! The `Node` representation shared by every `Rope`.
//!
//! A `Node` is one of three variants — `Literal`, `Concat`, or `Repeat` — and
//! is immutable after construction except for its memoized hash. Nodes never
//! reference a node that (transitively) references them, so the tree is
//! always a DAG; structural sharing comes from cloning a `NodeLink`, which
//! just bumps a reference count.

use std::fmt;

use super::NodeLink;

#[cfg(not(feature = "atomic"))]
use std::cell::Cell;
#[cfg(feature = "atomic")]
use std::sync::atomic::{AtomicI64, Ordering};

/// A lazily-computed, memoized hash.
///
/// Plain `Cell<Option<i64>>` when ropes are single-threaded (the default);
/// an `AtomicI64` with a sentinel "unset" value under the `atomic` feature,
/// so two threads racing to memoize the same node's hash is benign: both
/// compute the same value and store it.
pub(crate) struct HashCell(Inner);

#[cfg(not(feature = "atomic"))]
struct Inner(Cell<Option<i64>>);
#[cfg(feature = "atomic")]
struct Inner(AtomicI64);

#[cfg(feature = "atomic")]
const UNSET: i64 = i64::MIN;

impl HashCell {
    #[cfg(not(feature = "atomic"))]
    fn new() -> Self {
        HashCell(Inner(Cell::new(None)))
    }

    #[cfg(feature = "atomic")]
    fn new() -> Self {
        HashCell(Inner(AtomicI64::new(UNSET)))
    }

    #[cfg(not(feature = "atomic"))]
    pub(crate) fn get(&self) -> Option<i64> {
        (self.0).0.get()
    }

    #[cfg(feature = "atomic")]
    pub(crate) fn get(&self) -> Option<i64> {
        match (self.0).0.load(Ordering::Acquire) {
            UNSET => None,
            v => Some(v),
        }
    }

    #[cfg(not(feature = "atomic"))]
    pub(crate) fn set(&self, value: i64) {
        (self.0).0.set(Some(value));
    }

    #[cfg(feature = "atomic")]
    pub(crate) fn set(&self, value: i64) {
        (self.0).0.store(value, Ordering::Release);
    }
}

impl fmt::Debug for HashCell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.get() {
            Some(h) => write!(f, "{}", h),
            None => write!(f, "?"),
        }
    }
}

/// The payload of a `Node`.
#[derive(Debug)]
pub(crate) enum Value {
    /// A leaf owning a contiguous byte buffer.
    Literal(Box<[u8]>),
    /// The concatenation of `left` followed by `right`.
    Concat { left: NodeLink, right: NodeLink },
    /// `child` repeated `count` times (`count >= 2`).
    Repeat { child: NodeLink, count: usize },
}

/// One node in a rope's tree.
///
/// `length` and `depth` are computed once at construction and never change;
/// `hash` is the only field that mutates, and only from "unset" to a single
/// fixed value.
#[derive(Debug)]
pub(crate) struct Node {
    length: usize,
    depth: usize,
    hash: HashCell,
    pub(crate) value: Value,
}

impl Node {
    fn new(value: Value, length: usize, depth: usize) -> Self {
        Node { length, depth, hash: HashCell::new(), value }
    }

    #[inline]
    pub(crate) fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub(crate) fn memoized_hash(&self) -> Option<i64> {
        self.hash.get()
    }

    #[inline]
    pub(crate) fn memoize_hash(&self, value: i64) {
        self.hash.set(value);
    }

    /// Builds a fresh `Literal` node owning a copy of `bytes`.
    pub(crate) fn literal(bytes: Box<[u8]>) -> Self {
        let length = bytes.len();
        Node::new(Value::Literal(bytes), length, 1)
    }

    /// Builds a `Concat` node with no balancing and no empty-operand checks.
    /// Only the balancer and `concat()` (which performs those checks) may
    /// call this directly.
    pub(crate) fn concat_unchecked(left: NodeLink, right: NodeLink) -> Self {
        let length = left.length() + right.length();
        let depth = 1 + left.depth().max(right.depth());
        Node::new(Value::Concat { left, right }, length, depth)
    }

    /// Builds a `Repeat` node. Caller must ensure `count >= 2` and
    /// `!child.is_empty()`; `repeat()` enforces this.
    pub(crate) fn repeat_unchecked(child: NodeLink, count: usize) -> Self {
        let length = child.length() * count;
        let depth = child.depth();
        Node::new(Value::Repeat { child, count }, length, depth)
    }

    /// Returns the byte at index `i`, walking the tree iteratively so that
    /// an unbalanced (e.g. pre-balance) tree cannot overflow the stack.
    pub(crate) fn byte_at(&self, mut i: usize) -> u8 {
        let mut cur = self;
        loop {
            match &cur.value {
                Value::Literal(bytes) => return bytes[i],
                Value::Concat { left, right } => {
                    if i < left.length() {
                        cur = left;
                    } else {
                        i -= left.length();
                        cur = right;
                    }
                }
                Value::Repeat { child, .. } => {
                    i %= child.length();
                    cur = child;
                }
            }
        }
    }

    /// Like [`byte_at`](Node::byte_at), but returns a reference into whatever
    /// literal buffer actually owns the byte, rather than a copy.
    pub(crate) fn byte_ref(&self, mut i: usize) -> &u8 {
        let mut cur = self;
        loop {
            match &cur.value {
                Value::Literal(bytes) => return &bytes[i],
                Value::Concat { left, right } => {
                    if i < left.length() {
                        cur = left;
                    } else {
                        i -= left.length();
                        cur = right;
                    }
                }
                Value::Repeat { child, .. } => {
                    i %= child.length();
                    cur = child;
                }
            }
        }
    }
}
