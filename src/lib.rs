//! A persistent byte rope.
//!
//! A [`Rope`] is a handle to the root of a shared, immutable tree of nodes
//! denoting a sequence of bytes. Concatenating or repeating a rope is O(1):
//! it builds a new small node referencing the operands rather than copying
//! their bytes. Slicing shares whatever subtrees it can and copies only at
//! the cut boundaries. The tree is rebalanced after concatenation so that
//! indexing and slicing stay bounded by the tree's (logarithmic) depth
//! rather than by how many pieces went into building it.
//!
//! Ropes are immutable: every operation that looks like a mutation returns
//! a new `Rope`, leaving existing ones (and any subtrees they share with
//! the new one) untouched. There is no in-place mutation and no locking —
//! see the module-level notes in `internals` for what that does and
//! doesn't mean for multi-threaded use.
//!
//! This is a sequence of raw bytes, not text: there is no Unicode handling
//! anywhere in this crate. Build a `Rope` from whatever bytes you like and
//! interpret them however you like on the way out.
//!
//! ```
//! use brope::Rope;
//!
//! let greeting = Rope::from_bytes(b"hello, ").unwrap();
//! let name = Rope::from_bytes(b"world").unwrap();
//! let full = greeting + name;
//! assert_eq!(full.to_bytes(), b"hello, world");
//! assert_eq!(full.len(), 12);
//!
//! let banner = Rope::from_bytes(b"=").unwrap().repeat(10);
//! assert_eq!(banner.to_bytes(), b"==========");
//! ```

mod error;
mod internals;
pub mod iter;

pub use crate::error::RopeError;
pub use crate::iter::Bytes;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops;

use internals::NodeLink;

/// A persistent sequence of bytes backed by a shared, immutable tree.
///
/// See the [module documentation](crate) for the big picture.
#[derive(Clone)]
pub struct Rope {
    root: NodeLink,
}

impl Rope {
    /// The empty rope.
    #[inline]
    pub fn new() -> Self {
        Rope { root: internals::empty() }
    }

    /// Copies `bytes` into a new rope.
    ///
    /// Fails with [`RopeError::OutOfMemory`] only if the allocator can't
    /// provide the backing buffer; this never fails on the *shape* of
    /// `bytes` (any byte sequence, including `b""`, is a valid rope).
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Rope, RopeError> {
        Ok(Rope { root: internals::from_bytes(bytes.as_ref())? })
    }

    /// The number of bytes this rope denotes.
    #[inline]
    pub fn len(&self) -> usize {
        self.root.length()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// The byte at `index`, or `None` if it's out of range.
    pub fn get(&self, index: usize) -> Option<u8> {
        internals::index(&self.root, index).ok()
    }

    /// The byte at `index`. Like [`Rope::get`], but surfaces the out of
    /// range case as an error naming the offending index.
    pub fn try_get(&self, index: usize) -> Result<u8, RopeError> {
        internals::index(&self.root, index)
    }

    /// Returns the sub-rope denoted by `range`, without materializing
    /// anything outside of it. Mirrors slice indexing on `[u8]`: an
    /// out-of-range or inverted bound is an error rather than a panic,
    /// since a `Rope`'s bounds are a normal run-time value, not a
    /// programming mistake to be caught in debug builds only.
    pub fn slice(&self, range: impl ops::RangeBounds<usize>) -> Result<Rope, RopeError> {
        let length = self.len();
        let start = match range.start_bound() {
            ops::Bound::Included(&s) => s,
            ops::Bound::Excluded(&s) => s + 1,
            ops::Bound::Unbounded => 0,
        };
        let stop = match range.end_bound() {
            ops::Bound::Included(&e) => e + 1,
            ops::Bound::Excluded(&e) => e,
            ops::Bound::Unbounded => length,
        };
        Ok(Rope { root: internals::rope_slice(&self.root, start, stop)? })
    }

    /// Concatenates `self` and `other` into a new rope, sharing both
    /// operands' subtrees rather than copying them.
    pub fn concat(&self, other: &Rope) -> Rope {
        Rope { root: internals::concat(self.root.clone(), other.root.clone()) }
    }

    /// Repeats this rope `n` times. `n <= 0` (and repeating an empty rope
    /// by any `n`) yields the empty rope, rather than erroring on a
    /// negative count — see DESIGN.md for the rationale.
    pub fn repeat(&self, n: i64) -> Rope {
        Rope { root: internals::repeat(self.root.clone(), n) }
    }

    /// An iterator over this rope's bytes, left to right.
    pub fn bytes(&self) -> Bytes {
        Bytes::new(&self.root)
    }

    /// Copies this rope's bytes into a fresh, flat `Vec<u8>`.
    pub fn to_bytes(&self) -> Vec<u8> {
        internals::materialize(&self.root)
    }

    /// Whether `needle`'s bytes occur contiguously somewhere in `self`.
    /// Naive O(n*m) search built on the byte iterator — a rope is not a
    /// search index.
    pub fn contains(&self, needle: &Rope) -> bool {
        let n = self.len();
        let m = needle.len();
        if m == 0 {
            return true;
        }
        if m > n {
            return false;
        }
        for start in 0..=(n - m) {
            if self.bytes().skip(start).take(m).eq(needle.bytes()) {
                return true;
            }
        }
        false
    }

    /// This rope's stable content hash, memoized after the first call.
    /// Two ropes with equal bytes always hash equal, regardless of how
    /// each was built.
    pub fn content_hash(&self) -> i64 {
        if let Some(h) = self.root.memoized_hash() {
            return h;
        }
        let h = self.compute_hash();
        self.root.memoize_hash(h);
        h
    }

    fn compute_hash(&self) -> i64 {
        let len = self.len() as i64;
        if self.is_empty() {
            return 0;
        }
        let first = self.get(0).expect("non-empty rope has a byte 0") as i64;
        let mut h: i64 = first.wrapping_shl(7);
        for b in self.bytes() {
            h = 1_000_003i64.wrapping_mul(h) ^ (b as i64);
        }
        h ^= len;
        if h == -1 {
            -2
        } else {
            h
        }
    }
}

impl Default for Rope {
    fn default() -> Self {
        Rope::new()
    }
}

impl From<&[u8]> for Rope {
    fn from(bytes: &[u8]) -> Self {
        Rope::from_bytes(bytes).expect("allocating a literal rope")
    }
}

impl From<Vec<u8>> for Rope {
    fn from(bytes: Vec<u8>) -> Self {
        Rope::from_bytes(&bytes).expect("allocating a literal rope")
    }
}

impl From<&str> for Rope {
    fn from(s: &str) -> Self {
        Rope::from_bytes(s.as_bytes()).expect("allocating a literal rope")
    }
}

impl ops::Index<usize> for Rope {
    type Output = u8;
    /// Panics if `index >= self.len()`, matching `[T]`'s own indexing
    /// convention.
    fn index(&self, index: usize) -> &u8 {
        assert!(index < self.len(), "rope index {index} out of range (length {})", self.len());
        self.root.byte_ref(index)
    }
}

impl ops::Add for Rope {
    type Output = Rope;
    fn add(self, rhs: Rope) -> Rope {
        Rope { root: internals::concat(self.root, rhs.root) }
    }
}

impl ops::Add<&Rope> for &Rope {
    type Output = Rope;
    fn add(self, rhs: &Rope) -> Rope {
        self.concat(rhs)
    }
}

impl ops::Mul<i64> for Rope {
    type Output = Rope;
    fn mul(self, n: i64) -> Rope {
        Rope { root: internals::repeat(self.root, n) }
    }
}

impl ops::Mul<i64> for &Rope {
    type Output = Rope;
    fn mul(self, n: i64) -> Rope {
        self.repeat(n)
    }
}

impl PartialEq for Rope {
    fn eq(&self, other: &Rope) -> bool {
        internals::ptr_eq(&self.root, &other.root)
            || (self.len() == other.len() && self.bytes().eq(other.bytes()))
    }
}

impl Eq for Rope {}

/// Lexicographic ordering over the underlying bytes. A length-first
/// ordering (comparing by `len()` before falling back to bytes between
/// equal-length ropes, so that e.g. `"b" < "aa"`) was considered and
/// rejected — see DESIGN.md.
impl PartialOrd for Rope {
    fn partial_cmp(&self, other: &Rope) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rope {
    fn cmp(&self, other: &Rope) -> Ordering {
        self.bytes().cmp(other.bytes())
    }
}

impl Hash for Rope {
    /// Feeds this rope's memoized [`content_hash`](Rope::content_hash)
    /// into `state`, rather than writing every byte, so hashing a `Rope` a
    /// second time (e.g. as a `HashMap` key after a failed lookup) is O(1)
    /// once the content hash has been computed at all.
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i64(self.content_hash());
    }
}

impl fmt::Debug for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rope").field(&String::from_utf8_lossy(&self.to_bytes())).finish()
    }
}

impl<'a> IntoIterator for &'a Rope {
    type Item = u8;
    type IntoIter = Bytes;
    fn into_iter(self) -> Bytes {
        self.bytes()
    }
}

impl FromIterator<u8> for Rope {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        let bytes: Vec<u8> = iter.into_iter().collect();
        Rope::from_bytes(bytes).expect("allocating a rope from an iterator")
    }
}

#[cfg(test)]
mod test;
