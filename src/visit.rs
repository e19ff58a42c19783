//! The visitor contract between parser and consumers.
//!
//! This is a private module. Its public items are re-exported by the parent.

use crate::parse::Frames;
use crate::tag::Tag;


//------------ Visitor -------------------------------------------------------

/// A consumer of the elements discovered by a [`Parser`].
///
/// The parser reports every element through these three callbacks instead
/// of materializing a tree. A primitive element produces a single
/// [`primitive`][Self::primitive] call; a constructed element produces a
/// [`begin_constructed`][Self::begin_constructed] call, the callbacks of
/// all its children, and a
/// [`finish_constructed`][Self::finish_constructed] call.
///
/// Each callback receives the parser's [`Frames`] so it can inspect the
/// tags and end offsets of the constructed elements currently open above
/// it, the zero-based nesting depth of the element, and its tag. Returning
/// `false` from any callback aborts the enclosing parse with
/// [`Error::Rejected`][crate::Error::Rejected]; no further callbacks occur.
///
/// The lifetime `'a` is that of the buffer being parsed. A visitor that
/// wants to retain primitive values without copying, such as a
/// [`Builder`][crate::Builder], ties itself to it.
///
/// [`Parser`]: crate::Parser
pub trait Visitor<'a> {
    /// Processes a primitive element.
    ///
    /// `value` is the raw content of the element, borrowed from the buffer
    /// being parsed. The visitor is free to ignore any part of it; the
    /// parser advances by the declared length regardless.
    fn primitive(
        &mut self, frames: &Frames, depth: usize, tag: Tag, value: &'a [u8]
    ) -> bool;

    /// Processes the start of a constructed element.
    fn begin_constructed(
        &mut self, frames: &Frames, depth: usize, tag: Tag
    ) -> bool;

    /// Processes the end of a constructed element.
    ///
    /// `depth` is the same value that was passed to the matching
    /// [`begin_constructed`][Self::begin_constructed] call.
    fn finish_constructed(
        &mut self, frames: &Frames, depth: usize, tag: Tag
    ) -> bool;
}
