//! Parsing of TLV encoded data.
//!
//! This is a private module. Its public items are re-exported by the parent.

use smallvec::SmallVec;
use crate::error::Error;
use crate::length;
use crate::tag::Tag;
use crate::visit::Visitor;


//------------ Constants -----------------------------------------------------

/// The nesting depth the frame stacks can hold without heap allocation.
const INLINE_DEPTH: usize = 8;


//------------ Frames --------------------------------------------------------

/// The per-depth state of the constructed elements currently open.
///
/// The parser keeps two parallel fixed-capacity stacks indexed by nesting
/// depth: the tag of the constructed element open at that depth and the
/// absolute offset at which its value ends. Visitors receive a reference to
/// this structure with every callback and can use it to look at their
/// ancestors.
///
/// Entries are wiped as soon as the element at their depth finishes, so a
/// slot only carries data while an element is actually open there and
/// stale tags or offsets cannot leak into later callbacks.
pub struct Frames {
    /// The tag of the element open at each depth.
    tags: SmallVec<[Tag; INLINE_DEPTH]>,

    /// The end offset of the element open at each depth.
    ends: SmallVec<[usize; INLINE_DEPTH]>,
}

impl Frames {
    /// Creates frames for up to `max_depth` nested elements.
    fn new(max_depth: usize) -> Self {
        Frames {
            tags: SmallVec::from_elem(Tag::default(), max_depth),
            ends: SmallVec::from_elem(0, max_depth),
        }
    }

    /// Returns the tag of the element open at the given depth.
    ///
    /// Returns `None` if `depth` is outside the configured maximum.
    pub fn tag(&self, depth: usize) -> Option<Tag> {
        self.tags.get(depth).copied()
    }

    /// Returns the end offset of the element open at the given depth.
    ///
    /// Returns `None` if `depth` is outside the configured maximum.
    pub fn end(&self, depth: usize) -> Option<usize> {
        self.ends.get(depth).copied()
    }

    /// Records the element now open at `depth`.
    fn set(&mut self, depth: usize, tag: Tag, end: usize) {
        self.tags[depth] = tag;
        self.ends[depth] = end;
    }

    /// Wipes the slot at `depth` after its element finished.
    fn clear(&mut self, depth: usize) {
        self.tags[depth] = Tag::default();
        self.ends[depth] = 0;
    }
}


//------------ Parser --------------------------------------------------------

/// A depth-bounded recursive-descent parser for TLV encoded data.
///
/// The parser walks a caller-owned byte buffer and dispatches every element
/// to a [`Visitor`]. It never copies or retains value data; visitors get
/// slices borrowed from the buffer for the duration of the callback chain.
/// All storage is sized at construction, so a long-lived parser instance
/// can be reused across calls without allocating.
///
/// A parse either consumes the input exactly, as one top-level element
/// with no trailing octets, or fails. There are no partial results and a failed
/// call leaves nothing to clean up; the next [`parse`][Self::parse] starts
/// fresh.
pub struct Parser {
    /// The maximum nesting depth accepted.
    max_depth: usize,

    /// The stacks recording the currently open constructed elements.
    frames: Frames,
}

impl Parser {
    /// Creates a parser accepting up to `max_depth` nested elements.
    ///
    /// # Panics
    ///
    /// This function panics if `max_depth` is zero.
    pub fn new(max_depth: usize) -> Self {
        assert!(max_depth > 0);
        Parser {
            max_depth,
            frames: Frames::new(max_depth),
        }
    }

    /// Returns the maximum nesting depth accepted.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parses one top-level element from `data`, reporting to `visitor`.
    ///
    /// The element must span the input exactly; anything left over fails
    /// with [`Error::TrailingData`]. Every error aborts the whole call
    /// immediately.
    pub fn parse<'a, V: Visitor<'a>>(
        &mut self, data: &'a [u8], visitor: &mut V
    ) -> Result<(), Error> {
        let mut pos = 0;
        self.element(data, &mut pos, 0, visitor)?;
        if pos != data.len() {
            return Err(Error::TrailingData)
        }
        Ok(())
    }

    /// Parses the single element starting at `pos`.
    fn element<'a, V: Visitor<'a>>(
        &mut self, data: &'a [u8], pos: &mut usize, depth: usize,
        visitor: &mut V
    ) -> Result<(), Error> {
        let (tag, cur) = Tag::read(data, *pos)?;
        let (len, cur) = length::read(data, cur)?;
        let end = cur.checked_add(len).ok_or(Error::Truncated)?;
        if end > data.len() {
            return Err(Error::Truncated)
        }

        self.frames.set(depth, tag, end);

        if tag.is_primitive() {
            if !visitor.primitive(&self.frames, depth, tag, &data[cur..end]) {
                return Err(Error::Rejected)
            }
        }
        else {
            if !visitor.begin_constructed(&self.frames, depth, tag) {
                return Err(Error::Rejected)
            }
            let child_depth = depth + 1;
            if child_depth == self.max_depth {
                return Err(Error::DepthExceeded)
            }
            *pos = cur;
            while *pos < end {
                self.element(data, pos, child_depth, visitor)?;
                if *pos > end {
                    return Err(Error::Overrun)
                }
            }
            if !visitor.finish_constructed(&self.frames, depth, tag) {
                return Err(Error::Rejected)
            }
        }

        self.frames.clear(depth);

        // Advance by the declared length no matter how much of the value
        // the visitor looked at.
        *pos = end;
        Ok(())
    }
}


//============ Tests =========================================================
