//! A lazy, byte-at-a-time traversal that precomputes the rope's leaf list
//! once at creation, and materializes each leaf's bytes only as it's
//! reached.

use crate::internals::{self, NodeLink, Value};

/// Holds, for the leaf currently being read, whatever bytes back it: a
/// cheap clone of the literal's own buffer, or a scratch copy of a repeat's
/// child (computed once, not once per repetition).
enum Current {
    Literal(NodeLink),
    Repeat(Vec<u8>),
    /// No leaves at all (iterating an empty rope).
    None,
}

/// An iterator over the bytes of a [`crate::Rope`], in left-to-right order.
///
/// Created by [`crate::Rope::bytes`]. Finite and non-restartable: once
/// exhausted it always yields `None`.
pub struct Bytes {
    leaves: Vec<NodeLink>,
    leaf_idx: usize,
    current: Current,
    /// Position within the *current leaf's logical length* (for a repeat
    /// leaf this can run past the scratch buffer's length; it's taken
    /// modulo the buffer length on read).
    pos: usize,
}

impl Bytes {
    pub(crate) fn new(root: &NodeLink) -> Self {
        let leaves = internals::leaves(root);
        let mut iter = Bytes { leaves, leaf_idx: 0, current: Current::None, pos: 0 };
        iter.load_current();
        iter
    }

    fn load_current(&mut self) {
        self.pos = 0;
        self.current = match self.leaves.get(self.leaf_idx) {
            None => Current::None,
            Some(leaf) => match &leaf.value {
                Value::Literal(_) => Current::Literal(leaf.clone()),
                Value::Repeat { child, .. } => Current::Repeat(internals::materialize(child)),
                Value::Concat { .. } => unreachable!("leaf lists never contain Concat nodes"),
            },
        };
    }

    fn advance_leaf(&mut self) {
        self.leaf_idx += 1;
        self.load_current();
    }
}

impl Iterator for Bytes {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        loop {
            let Some(leaf) = self.leaves.get(self.leaf_idx) else { return None };
            if self.pos >= leaf.length() {
                self.advance_leaf();
                continue;
            }
            let byte = match &self.current {
                Current::Literal(node) => match &node.value {
                    Value::Literal(bytes) => bytes[self.pos],
                    _ => unreachable!(),
                },
                Current::Repeat(scratch) => scratch[self.pos % scratch.len()],
                Current::None => return None,
            };
            self.pos += 1;
            return Some(byte);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total: usize = self.leaves.get(self.leaf_idx..).unwrap_or(&[]).iter().map(|l| l.length()).sum();
        let remaining = total.saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}
