//! The rope engine's error taxonomy.
//!
//! Every fallible operation returns exactly one of these; there is no
//! partial-failure mode — a failed `concat` or `slice` never leaks a
//! half-built node; temporaries taken by the attempt are simply dropped.

use std::error::Error;
use std::fmt;

/// Something went wrong building or indexing a [`crate::Rope`].
///
/// Two variants — [`TypeMismatch`](RopeError::TypeMismatch) and
/// [`NotImplemented`](RopeError::NotImplemented) — exist only so this
/// taxonomy matches the engine's documented error surface; this crate's
/// statically-typed `Rope` API can't actually produce them (there is no
/// dynamically-typed "other operand" to mismatch, and slicing takes a plain
/// `Range`, which has no notion of a step). A host binding built on top of
/// this crate (e.g. one exposing `Rope` to a dynamically typed caller) is
/// the intended source of those two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RopeError {
    /// An operand that should have been a rope (or convertible to one)
    /// wasn't.
    TypeMismatch(String),
    /// An index or slice bound fell outside `0..=length`.
    IndexError { index: i64, length: usize },
    /// A value was structurally valid but semantically nonsensical (e.g. a
    /// malformed range).
    ValueError(String),
    /// The requested operation has no meaning for this engine (e.g. a
    /// stepped slice).
    NotImplemented(&'static str),
    /// Allocating a fresh node or leaf buffer failed.
    OutOfMemory,
}

impl fmt::Display for RopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RopeError::TypeMismatch(what) => write!(f, "type mismatch: {what}"),
            RopeError::IndexError { index, length } => {
                write!(f, "index {index} out of range for rope of length {length}")
            }
            RopeError::ValueError(msg) => write!(f, "invalid value: {msg}"),
            RopeError::NotImplemented(what) => write!(f, "not implemented: {what}"),
            RopeError::OutOfMemory => write!(f, "allocation failed"),
        }
    }
}

impl Error for RopeError {}
