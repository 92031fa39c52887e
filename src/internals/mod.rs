//! The rope engine: node storage, construction, slicing and the Fibonacci
//! rebalance. Everything here is an implementation detail of [`crate::Rope`];
//! callers only ever see a `Rope` and its public operations.

mod node;

pub(crate) use self::node::Node;
pub(crate) use self::node::Value;

use crate::error::RopeError;

#[cfg(not(feature = "atomic"))]
use std::rc::Rc as Ref;
#[cfg(feature = "atomic")]
use std::sync::Arc as Ref;

/// A depth beyond which a freshly concatenated tree is rebalanced. A
/// performance knob, not a correctness one.
const REBALANCE_THRESHOLD: usize = 8;

/// Adjacent literal leaves smaller than this (combined) are fused during
/// balancing.
const MIN_LITERAL_LENGTH: usize = 128;

/// A reference-counted handle to a [`Node`]. Cloning is O(1): it bumps a
/// refcount, it never copies the subtree.
#[derive(Clone, Debug)]
pub(crate) struct NodeLink(Ref<Node>);

impl std::ops::Deref for NodeLink {
    type Target = Node;
    fn deref(&self) -> &Node {
        &self.0
    }
}

impl NodeLink {
    fn new(node: Node) -> Self {
        NodeLink(Ref::new(node))
    }

    /// True if this link and `other` point at the literal same node.
    fn ptr_eq(&self, other: &NodeLink) -> bool {
        Ref::ptr_eq(&self.0, &other.0)
    }
}

/// The shared empty literal. Every empty `Rope` is this node; slicing to
/// nothing, repeating by zero, and `Rope::new()` all return a clone of it.
pub(crate) fn empty() -> NodeLink {
    NodeLink::new(Node::literal(Box::new([])))
}

/// Tries to allocate a boxed copy of `bytes`, surfacing allocator failure as
/// [`RopeError::OutOfMemory`] instead of aborting the process.
fn try_boxed_copy(bytes: &[u8]) -> Result<Box<[u8]>, RopeError> {
    let mut v: Vec<u8> = Vec::new();
    v.try_reserve_exact(bytes.len()).map_err(|_| RopeError::OutOfMemory)?;
    v.extend_from_slice(bytes);
    Ok(v.into_boxed_slice())
}

pub(crate) fn from_bytes(bytes: &[u8]) -> Result<NodeLink, RopeError> {
    if bytes.is_empty() {
        return Ok(empty());
    }
    Ok(NodeLink::new(Node::literal(try_boxed_copy(bytes)?)))
}

fn concat_unchecked(left: NodeLink, right: NodeLink) -> NodeLink {
    NodeLink::new(Node::concat_unchecked(left, right))
}

/// Builds a `Concat` node and rebalances it if the result is too deep. A
/// concat of two empty ropes returns the shared empty literal rather than a
/// zero-length `Concat` node.
pub(crate) fn concat(left: NodeLink, right: NodeLink) -> NodeLink {
    if left.is_empty() && right.is_empty() {
        return empty();
    }
    let joined = concat_unchecked(left, right);
    if joined.depth() > REBALANCE_THRESHOLD {
        balance(joined)
    } else {
        joined
    }
}

/// `n <= 0` and repeating an empty rope both yield the empty rope, rather
/// than erroring on a negative count — see DESIGN.md.
pub(crate) fn repeat(child: NodeLink, n: i64) -> NodeLink {
    if n <= 0 || child.is_empty() {
        return empty();
    }
    if n == 1 {
        return child;
    }
    NodeLink::new(Node::repeat_unchecked(child, n as usize))
}

// ---------------------------------------------------------------------
// Materialization
// ---------------------------------------------------------------------

/// Flattens `root` into its ordered sequence of non-`Concat` leaves, using
/// an explicit work stack so a deeply skewed (unbalanced) `Concat` spine
/// cannot blow the call stack. Shared by the balancer, the materializer and
/// the iterator.
fn flatten(root: &NodeLink) -> Vec<NodeLink> {
    let mut stack = vec![root.clone()];
    let mut leaves = Vec::new();
    while let Some(n) = stack.pop() {
        match &n.value {
            Value::Concat { left, right } => {
                stack.push(right.clone());
                stack.push(left.clone());
            }
            _ => leaves.push(n),
        }
    }
    leaves
}

/// Writes `root`'s bytes into `buf`, which must be exactly `root.length()`
/// bytes long. A `Repeat` node's child is materialized once into a scratch
/// buffer and copied `count` times — never expanded recursively, which
/// would be exponential for nested repeats.
pub(crate) fn materialize_into(root: &NodeLink, buf: &mut [u8]) {
    debug_assert_eq!(buf.len(), root.length());
    let mut cursor = 0;
    for leaf in flatten(root) {
        let len = leaf.length();
        match &leaf.value {
            Value::Literal(bytes) => buf[cursor..cursor + len].copy_from_slice(bytes),
            Value::Repeat { child, count } => {
                let unit = child.length();
                let mut scratch = vec![0u8; unit];
                materialize_into(child, &mut scratch);
                for i in 0..*count {
                    buf[cursor + i * unit..cursor + (i + 1) * unit].copy_from_slice(&scratch);
                }
            }
            Value::Concat { .. } => unreachable!("flatten() never yields a Concat node"),
        }
        cursor += len;
    }
}

pub(crate) fn materialize(root: &NodeLink) -> Vec<u8> {
    let mut buf = vec![0u8; root.length()];
    materialize_into(root, &mut buf);
    buf
}

// ---------------------------------------------------------------------
// Slicing
// ---------------------------------------------------------------------

fn round_up(x: usize, unit: usize) -> usize {
    let rem = x % unit;
    if rem == 0 { x } else { x + (unit - rem) }
}

fn round_down(x: usize, unit: usize) -> usize {
    x - x % unit
}

/// The suffix of `node` starting at `start`, reusing whole subtrees on the
/// concat spine and only falling through to [`slice`] at a non-concat node.
fn slice_right(node: &NodeLink, start: usize) -> Result<NodeLink, RopeError> {
    if start == 0 {
        return Ok(node.clone());
    }
    match &node.value {
        Value::Concat { left, right } => {
            let llen = left.length();
            if start >= llen {
                slice_right(right, start - llen)
            } else {
                Ok(concat_unchecked(slice_right(left, start)?, right.clone()))
            }
        }
        _ => slice(node, start, node.length()),
    }
}

/// The prefix of `node` ending at `stop`; the mirror image of
/// [`slice_right`].
fn slice_left(node: &NodeLink, stop: usize) -> Result<NodeLink, RopeError> {
    if stop == node.length() {
        return Ok(node.clone());
    }
    match &node.value {
        Value::Concat { left, right } => {
            let llen = left.length();
            if stop <= llen {
                slice_left(left, stop)
            } else {
                Ok(concat_unchecked(left.clone(), slice_left(right, stop - llen)?))
            }
        }
        _ => slice(node, 0, stop),
    }
}

/// Concatenates zero, one, or two pieces without ever building a spurious
/// empty `Concat` node.
fn concat_pieces(pieces: Vec<NodeLink>) -> NodeLink {
    let mut iter = pieces.into_iter().filter(|p| !p.is_empty());
    match (iter.next(), iter.next()) {
        (None, _) => empty(),
        (Some(a), None) => a,
        (Some(a), Some(b)) => iter.fold(concat_unchecked(a, b), |acc, p| concat_unchecked(acc, p)),
    }
}

/// Slices `[start, stop)` out of a `Repeat` node without ever materializing
/// the repetition.
fn slice_repeat(child: &NodeLink, count: usize, start: usize, stop: usize) -> Result<NodeLink, RopeError> {
    let unit = child.length();
    let start_unit = start / unit;
    let end_unit_incl = (stop - 1) / unit;

    if start_unit == end_unit_incl {
        // The whole range falls inside a single repetition of `child`.
        let base = start_unit * unit;
        return slice(child, start - base, stop - base);
    }

    let adj_start = round_up(start, unit);
    let adj_stop = round_down(stop, unit);
    let whole = if adj_stop > adj_start { (adj_stop - adj_start) / unit } else { 0 };

    let mut pieces = Vec::with_capacity(3);
    if start % unit != 0 {
        pieces.push(slice(child, start % unit, unit)?);
    }
    if whole > 0 {
        pieces.push(repeat(child.clone(), whole as i64));
    }
    if stop % unit != 0 {
        pieces.push(slice(child, 0, stop % unit)?);
    }
    debug_assert!(count >= 2);
    Ok(concat_pieces(pieces))
}

/// The general slicing entry point, valid for any node shape and any
/// `0 <= start <= stop <= node.length()` (callers are expected to clamp and
/// validate before reaching here — see [`rope_slice`]).
fn slice(node: &NodeLink, start: usize, stop: usize) -> Result<NodeLink, RopeError> {
    let stop = stop.min(node.length());
    if start == stop {
        return Ok(empty());
    }
    if start == 0 && stop == node.length() {
        return Ok(node.clone());
    }
    match &node.value {
        Value::Literal(bytes) => from_bytes(&bytes[start..stop]),
        Value::Concat { left, right } => {
            let llen = left.length();
            if stop <= llen {
                slice(left, start, stop)
            } else if start >= llen {
                slice(right, start - llen, stop - llen)
            } else {
                Ok(concat_pieces(vec![slice_right(left, start)?, slice_left(right, stop - llen)?]))
            }
        }
        Value::Repeat { child, count } => slice_repeat(child, *count, start, stop),
    }
}

pub(crate) fn rope_slice(root: &NodeLink, start: usize, stop: usize) -> Result<NodeLink, RopeError> {
    let length = root.length();
    if start > length || start > stop {
        return Err(RopeError::IndexError { index: start as i64, length });
    }
    slice(root, start, stop)
}

// ---------------------------------------------------------------------
// Indexing
// ---------------------------------------------------------------------

pub(crate) fn index(root: &NodeLink, i: usize) -> Result<u8, RopeError> {
    let length = root.length();
    if i >= length {
        return Err(RopeError::IndexError { index: i as i64, length });
    }
    Ok(root.byte_at(i))
}

// ---------------------------------------------------------------------
// Balancer
// ---------------------------------------------------------------------

/// The `k`th term of `F(0) = 1, F(1) = 2, F(k) = F(k-1) + F(k-2)`.
///
/// `length == 0` never falls in any `[F(k), F(k+1))` range (`a` only grows
/// from 1), so the search loop below would spin until the `a + b` addition
/// overflows. The original's `_find_fib_slot` guards this with
/// `if (length == 0) return -1;`; callers here are expected to filter
/// zero-length leaves out before reaching this function (see
/// [`fibonacci_insert`]), so slot 0 is returned as a harmless fallback
/// rather than mirroring the sentinel.
fn fib_slot(length: usize) -> usize {
    if length == 0 {
        return 0;
    }
    let (mut a, mut b) = (1usize, 2usize);
    let mut k = 0;
    while !(a <= length && length < b) {
        let next = a + b;
        a = b;
        b = next;
        k += 1;
    }
    k
}

/// Fuses adjacent small literals left-to-right.
fn merge_literals(leaves: Vec<NodeLink>) -> Result<Vec<NodeLink>, RopeError> {
    let mut merged: Vec<NodeLink> = Vec::with_capacity(leaves.len());
    for leaf in leaves {
        let fuse = match (merged.last(), &leaf.value) {
            (Some(prev), Value::Literal(next_bytes)) => match &prev.value {
                Value::Literal(prev_bytes) => {
                    prev_bytes.len() + next_bytes.len() < MIN_LITERAL_LENGTH
                }
                _ => false,
            },
            _ => false,
        };
        if fuse {
            let prev = merged.pop().unwrap();
            let (Value::Literal(a), Value::Literal(b)) = (&prev.value, &leaf.value) else {
                unreachable!()
            };
            let mut fused = Vec::new();
            fused.try_reserve_exact(a.len() + b.len()).map_err(|_| RopeError::OutOfMemory)?;
            fused.extend_from_slice(a);
            fused.extend_from_slice(b);
            merged.push(NodeLink::new(Node::literal(fused.into_boxed_slice())));
        } else {
            merged.push(leaf);
        }
    }
    Ok(merged)
}

/// Inserts `leaf` into the Fibonacci-indexed `slots`, combining with
/// whatever is already occupying `leaf`'s slot until an empty one is found.
///
/// `leaf` must be non-empty: a zero-length leaf (e.g. the empty literal
/// surviving next to a `Repeat` leaf, since [`merge_literals`] only fuses
/// adjacent `Literal`/`Literal` pairs) has no valid Fibonacci slot and
/// contributes nothing to the tree's content, so [`balance`] filters those
/// out before calling this.
fn fibonacci_insert(slots: &mut Vec<Option<NodeLink>>, leaf: NodeLink) {
    debug_assert!(!leaf.is_empty(), "balance() must filter zero-length leaves");
    let mut cur = leaf;
    loop {
        let k = fib_slot(cur.length());
        if k >= slots.len() {
            slots.resize(k + 1, None);
        }
        match slots[k].take() {
            Some(existing) => cur = concat_unchecked(existing, cur),
            None => {
                slots[k] = Some(cur);
                return;
            }
        }
    }
}

/// Collapses occupied slots back into one tree, lowest index first, with
/// each higher (earlier, larger) slot concatenated onto the *left* of the
/// accumulator built so far.
fn collapse_slots(mut slots: Vec<Option<NodeLink>>) -> NodeLink {
    let mut idx = 0;
    while idx < slots.len() && slots[idx].is_none() {
        idx += 1;
    }
    let mut acc = slots[idx].take().expect("balancer produced no occupied slots");
    for slot in slots.iter_mut().skip(idx + 1) {
        if let Some(node) = slot.take() {
            acc = concat_unchecked(node, acc);
        }
    }
    acc
}

/// Rebalances `root` into a tree whose depth is bounded by
/// `O(log_phi(length))`, independent of how skewed `root` was.
fn balance(root: NodeLink) -> NodeLink {
    let leaves = flatten(&root);
    let leaves = match merge_literals(leaves) {
        Ok(leaves) => leaves,
        // An allocation failure during the (optional) merge step is not
        // fatal: fall back to rebalancing the unmerged leaves.
        Err(_) => flatten(&root),
    };
    if leaves.len() == 1 {
        return leaves.into_iter().next().unwrap();
    }
    // A zero-length leaf (an empty Literal that wasn't adjacent to another
    // Literal to fuse with) has no Fibonacci slot and denotes no bytes;
    // drop it rather than feeding it to fibonacci_insert. The root this
    // balance() call was invoked on is never itself empty (concat() only
    // short-circuits to the shared empty node when *both* operands are
    // empty), so at least one non-empty leaf always remains.
    let leaves: Vec<NodeLink> = leaves.into_iter().filter(|leaf| !leaf.is_empty()).collect();
    let mut slots: Vec<Option<NodeLink>> = Vec::new();
    for leaf in leaves {
        fibonacci_insert(&mut slots, leaf);
    }
    collapse_slots(slots)
}

/// Returns `true` if `root`'s depth is already within the bound the
/// balancer guarantees for its length — used by tests and by callers that
/// want to assert balance was preserved without forcing a rebalance.
pub(crate) fn is_balanced(root: &NodeLink) -> bool {
    root.depth() <= REBALANCE_THRESHOLD || fib_slot(root.length()) + 2 >= root.depth()
}

pub(crate) fn ptr_eq(a: &NodeLink, b: &NodeLink) -> bool {
    a.ptr_eq(b)
}

/// Builds the ordered leaf list an iterator walks; exposed so
/// [`crate::iter::Bytes`] doesn't need to know about `Value` at all.
pub(crate) fn leaves(root: &NodeLink) -> Vec<NodeLink> {
    flatten(root)
}
