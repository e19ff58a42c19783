//! Building of TLV encoded data.
//!
//! This is a private module. Its public items are re-exported by the parent.

use bytes::Bytes;
use smallvec::SmallVec;
use crate::error::Error;
use crate::length;
use crate::parse::Frames;
use crate::tag::Tag;
use crate::visit::Visitor;


//------------ Constants -----------------------------------------------------

/// The number of entries the table can hold without heap allocation.
const INLINE_ENTRIES: usize = 8;


//------------ Entry ---------------------------------------------------------

/// One element in the builder's flat entry table.
///
/// The table replaces what would naturally be a parent/child tree: entries
/// appear in document order and each carries the depth it was added at.
/// That depth field is all [`Builder::end_constructed`] needs to fold the
/// sizes of immediate children into their parent.
struct Entry<'a> {
    /// The tag of the element.
    tag: Tag,

    /// The nesting depth the element was added at.
    depth: usize,

    /// The value of a primitive element.
    ///
    /// `None` marks a constructed element, whose value is the entries
    /// following it at greater depth.
    value: Option<Value<'a>>,

    /// The length of the value.
    ///
    /// For a constructed element this stays zero until the matching
    /// [`Builder::end_constructed`] resolves it.
    len: usize,
}

impl<'a> Entry<'a> {
    /// Returns the wiped-out state of an entry.
    fn cleared() -> Self {
        Entry { tag: Tag::default(), depth: 0, value: None, len: 0 }
    }
}


//------------ Value ---------------------------------------------------------

/// A reference to the data of a primitive entry.
#[derive(Clone, Copy)]
enum Value<'a> {
    /// Data borrowed from a caller buffer.
    Borrowed(&'a [u8]),

    /// Data copied into the builder's scratch arena.
    Scratch { start: usize, len: usize },
}


//------------ Builder -------------------------------------------------------

/// An accumulator for TLV encoded data.
///
/// A document is described through method calls: [`primitive`] and friends
/// for primitive elements, [`begin_constructed`] and [`end_constructed`]
/// around their children for constructed ones. It is serialized in a single
/// forward pass by [`finish`]. The builder never holds a tree: constructed
/// lengths are resolved by scanning the entry table backward when the
/// element is closed, at which point every immediate child already knows
/// its own size.
///
/// Primitive data is either borrowed from caller buffers for the lifetime
/// `'a` or copied into a fixed scratch arena by the convenience
/// constructors, so values living on the caller's stack can be used
/// without keeping a buffer around.
///
/// All capacities are fixed at construction and reused across
/// [`begin`]…[`finish`] cycles. Any error poisons the current cycle; the
/// next [`begin`] starts over from nothing.
///
/// The builder also implements [`Visitor`], so a [`Parser`] can drive it
/// directly to copy or restructure a TLV stream in one pass.
///
/// [`primitive`]: Self::primitive
/// [`begin_constructed`]: Self::begin_constructed
/// [`end_constructed`]: Self::end_constructed
/// [`begin`]: Self::begin
/// [`finish`]: Self::finish
/// [`Parser`]: crate::Parser
pub struct Builder<'a> {
    /// The capacity of the entry table.
    max_entries: usize,

    /// The maximum nesting depth accepted.
    max_depth: usize,

    /// The capacity of the scratch arena.
    scratch_size: usize,

    /// The maximum output length of the current cycle.
    max_len: usize,

    /// The running output length.
    ///
    /// Primitive entries are charged in full when added; constructed
    /// entries are charged their header when closed.
    len: usize,

    /// The current nesting depth.
    depth: usize,

    /// The entry table.
    entries: SmallVec<[Entry<'a>; INLINE_ENTRIES]>,

    /// The scratch arena of the convenience constructors.
    ///
    /// Individual allocations are never freed; `begin` resets the arena
    /// wholesale.
    scratch: Vec<u8>,

    /// The first error hit while driven through the visitor interface.
    ///
    /// The visitor callbacks can only signal accept or reject, so the
    /// underlying error is parked here and reported by [`Self::fault`]
    /// and [`Self::finish`].
    fault: Option<Error>,
}

impl<'a> Builder<'a> {
    /// Creates a builder with the given fixed capacities.
    ///
    /// `max_entries` bounds the entry table, `max_depth` the nesting of
    /// constructed elements, and `scratch_size` the arena used by the
    /// convenience constructors. Nothing is ever allocated beyond these.
    pub fn new(
        max_entries: usize, max_depth: usize, scratch_size: usize
    ) -> Self {
        Builder {
            max_entries,
            max_depth,
            scratch_size,
            max_len: 0,
            len: 0,
            depth: 0,
            entries: SmallVec::with_capacity(max_entries),
            scratch: Vec::with_capacity(scratch_size),
            fault: None,
        }
    }

    /// Starts a new document bounded to `max_len` output octets.
    ///
    /// Any state left over from a previous cycle is discarded.
    pub fn begin(&mut self, max_len: usize) {
        self.max_len = max_len;
        self.len = 0;
        self.depth = 0;
        self.entries.clear();
        self.scratch.clear();
        self.fault = None;
    }

    /// Returns the output length accumulated so far.
    ///
    /// Only meaningful at top level, where all headers are resolved.
    pub fn current_len(&self) -> usize {
        self.len
    }

    /// Returns the output space still available.
    pub fn space(&self) -> usize {
        self.max_len.saturating_sub(self.len)
    }

    /// Returns the current nesting depth.
    pub fn current_depth(&self) -> usize {
        self.depth
    }

    /// Returns the number of entries added so far.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the error that made the builder decline a visited element.
    pub fn fault(&self) -> Option<Error> {
        self.fault
    }

    /// Adds a primitive element with data borrowed from a caller buffer.
    pub fn primitive(
        &mut self, tag: Tag, value: &'a [u8]
    ) -> Result<(), Error> {
        self.push_primitive(tag, Value::Borrowed(value), value.len())
    }

    /// Adds a primitive element holding a single octet.
    pub fn primitive_u8(&mut self, tag: Tag, value: u8) -> Result<(), Error> {
        let value = self.scratch_push(&[value])?;
        self.push_primitive(tag, value, 1)
    }

    /// Adds a primitive element holding a big-endian 16-bit value.
    pub fn primitive_u16(
        &mut self, tag: Tag, value: u16
    ) -> Result<(), Error> {
        let value = self.scratch_push(&value.to_be_bytes())?;
        self.push_primitive(tag, value, 2)
    }

    /// Adds a primitive element with data copied into the scratch arena.
    ///
    /// Unlike [`primitive`][Self::primitive], the caller's buffer can go
    /// away right after the call.
    pub fn primitive_copied(
        &mut self, tag: Tag, value: &[u8]
    ) -> Result<(), Error> {
        let value = self.scratch_push(value)?;
        self.push_primitive(tag, value, value_len(value))
    }

    /// Opens a constructed element.
    ///
    /// The constructed flag is set on `tag` if it isn't already. Nothing
    /// is charged to the running length yet; the header size is unknown
    /// until the matching [`end_constructed`][Self::end_constructed]
    /// resolves the value length.
    pub fn begin_constructed(&mut self, tag: Tag) -> Result<(), Error> {
        if self.entries.len() == self.max_entries {
            return Err(Error::TooManyTags)
        }
        if self.depth == self.max_depth {
            return Err(Error::DepthExceeded)
        }
        self.entries.push(Entry {
            tag: tag.as_constructed(),
            depth: self.depth,
            value: None,
            len: 0,
        });
        self.depth += 1;
        Ok(())
    }

    /// Closes the innermost open constructed element.
    ///
    /// Scans the entry table backward, summing the encoded sizes of the
    /// immediate children. Entries at greater depth are skipped since their
    /// sizes were already folded into a child when it was closed, so each
    /// element is counted exactly once and no tree is ever needed. The
    /// first entry found above the children is the opening entry; its
    /// length is resolved here and its header charged to the running
    /// length.
    pub fn end_constructed(&mut self) -> Result<(), Error> {
        if self.depth == 0 {
            return Err(Error::NotInConstructed)
        }
        let mut value_len = 0;
        let mut opening = None;
        for i in (0..self.entries.len()).rev() {
            let entry = &self.entries[i];
            if entry.depth > self.depth {
                continue
            }
            if entry.depth == self.depth {
                value_len += entry.tag.encoded_len()
                    + length::encoded_len(entry.len)
                    + entry.len;
                continue
            }
            opening = Some(i);
            break
        }
        // An open depth always has its opening entry in the table.
        let opening = opening.ok_or(Error::Inconsistent)?;
        if value_len > length::MAX {
            return Err(Error::TooLong)
        }
        let header = self.entries[opening].tag.encoded_len()
            + length::encoded_len(value_len);
        self.charge(header)?;
        self.entries[opening].len = value_len;
        self.depth -= 1;
        Ok(())
    }

    /// Serializes the accumulated document into `out`.
    ///
    /// Walks the entry table forward, emitting tag, length, and, for
    /// primitive entries, the value data. Returns the number of octets
    /// written. The builder state is left untouched, so the same document
    /// can be emitted again.
    pub fn finish(&self, out: &mut [u8]) -> Result<usize, Error> {
        if let Some(err) = self.fault {
            return Err(err)
        }
        if self.depth != 0 {
            return Err(Error::NotAtTopLevel)
        }
        if self.len > out.len() {
            return Err(Error::TooLong)
        }
        let mut pos = 0;
        for entry in &self.entries {
            pos = entry.tag.write(out, pos)?;
            pos = length::write(out, pos, entry.len)?;
            if let Some(value) = entry.value {
                let data = self.resolve(value);
                let end = pos + data.len();
                out.get_mut(pos..end)
                    .ok_or(Error::TooLong)?
                    .copy_from_slice(data);
                pos = end;
            }
        }
        if pos != self.len {
            return Err(Error::Inconsistent)
        }
        Ok(pos)
    }

    /// Serializes the accumulated document into freshly allocated bytes.
    ///
    /// A convenience for callers that are not bound to preallocated
    /// buffers.
    pub fn finish_into_bytes(&self) -> Result<Bytes, Error> {
        let mut buf = vec![0; self.len];
        let len = self.finish(&mut buf)?;
        buf.truncate(len);
        Ok(Bytes::from(buf))
    }

    /// Wipes all internal state.
    ///
    /// Beyond what [`begin`][Self::begin] resets, this overwrites the
    /// entry table and the scratch arena so no element data survives in
    /// memory.
    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = Entry::cleared();
        }
        self.entries.clear();
        for octet in self.scratch.iter_mut() {
            *octet = 0;
        }
        self.scratch.clear();
        self.max_len = 0;
        self.len = 0;
        self.depth = 0;
        self.fault = None;
    }

    /// Appends a resolved primitive entry to the table.
    fn push_primitive(
        &mut self, tag: Tag, value: Value<'a>, len: usize
    ) -> Result<(), Error> {
        if self.entries.len() == self.max_entries {
            return Err(Error::TooManyTags)
        }
        if len > length::MAX {
            return Err(Error::TooLong)
        }
        let total = tag.encoded_len() + length::encoded_len(len) + len;
        self.charge(total)?;
        self.entries.push(Entry {
            tag, depth: self.depth, value: Some(value), len
        });
        Ok(())
    }

    /// Copies `value` into the scratch arena.
    fn scratch_push(&mut self, value: &[u8]) -> Result<Value<'a>, Error> {
        let start = self.scratch.len();
        if start + value.len() > self.scratch_size {
            return Err(Error::ScratchExhausted)
        }
        self.scratch.extend_from_slice(value);
        Ok(Value::Scratch { start, len: value.len() })
    }

    /// Adds `count` octets to the running length.
    fn charge(&mut self, count: usize) -> Result<(), Error> {
        let len = self.len.checked_add(count).ok_or(Error::TooLong)?;
        if len > self.max_len {
            return Err(Error::TooLong)
        }
        self.len = len;
        Ok(())
    }

    /// Resolves a value reference to its data.
    fn resolve(&self, value: Value<'a>) -> &[u8] {
        match value {
            Value::Borrowed(data) => data,
            Value::Scratch { start, len } => &self.scratch[start..start + len],
        }
    }

    /// Maps an internal result onto the visitor accept flag.
    ///
    /// The first error is parked in the fault slot for later inspection.
    fn note(&mut self, res: Result<(), Error>) -> bool {
        match res {
            Ok(()) => true,
            Err(err) => {
                if self.fault.is_none() {
                    self.fault = Some(err);
                }
                false
            }
        }
    }
}


/// Returns the length of a value reference.
fn value_len(value: Value) -> usize {
    match value {
        Value::Borrowed(data) => data.len(),
        Value::Scratch { len, .. } => len,
    }
}


//--- Visitor
//
// Re-emits everything a parser reports, so parser plus builder copy a TLV
// stream in one pass.

impl<'a> Visitor<'a> for Builder<'a> {
    fn primitive(
        &mut self, _frames: &Frames, _depth: usize, tag: Tag, value: &'a [u8]
    ) -> bool {
        let res = Builder::primitive(self, tag, value);
        self.note(res)
    }

    fn begin_constructed(
        &mut self, _frames: &Frames, _depth: usize, tag: Tag
    ) -> bool {
        let res = Builder::begin_constructed(self, tag);
        self.note(res)
    }

    fn finish_constructed(
        &mut self, _frames: &Frames, _depth: usize, _tag: Tag
    ) -> bool {
        let res = self.end_constructed();
        self.note(res)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use crate::parse::Parser;
    use super::*;

    fn builder<'a>() -> Builder<'a> {
        let mut res = Builder::new(32, 32, 128);
        res.begin(128);
        res
    }

    #[test]
    fn empty() {
        let builder = builder();
        let mut out = [0u8; 128];
        assert_eq!(builder.finish(&mut out), Ok(0));
    }

    #[test]
    fn single_primitive() {
        let mut builder = builder();
        builder.primitive(Tag::OCTET_STRING, &[1, 2, 3]).unwrap();
        let mut out = [0u8; 128];
        let len = builder.finish(&mut out).unwrap();
        assert_eq!(&out[..len], b"\x04\x03\x01\x02\x03");
    }

    #[test]
    fn flat_primitives() {
        let mut builder = builder();
        builder.primitive_u8(Tag::OCTET_STRING, 12).unwrap();
        builder.primitive_u16(Tag::OCTET_STRING, 1234).unwrap();
        builder.primitive_copied(Tag::OCTET_STRING, &[1, 1, 1]).unwrap();
        assert_eq!(builder.count(), 3);
        let mut out = [0u8; 128];
        let len = builder.finish(&mut out).unwrap();
        assert_eq!(len, 12);
        assert_eq!(
            &out[..len],
            b"\x04\x01\x0c\x04\x02\x04\xd2\x04\x03\x01\x01\x01"
        );
    }

    #[test]
    fn nested_primitives() {
        let mut builder = builder();
        builder.begin_constructed(Tag::SEQUENCE).unwrap();
        builder.primitive_u8(Tag::OCTET_STRING, 12).unwrap();
        builder.primitive_u16(Tag::OCTET_STRING, 1234).unwrap();
        builder.primitive_copied(Tag::OCTET_STRING, &[1, 1, 1]).unwrap();
        builder.end_constructed().unwrap();
        let mut out = [0u8; 128];
        let len = builder.finish(&mut out).unwrap();
        assert_eq!(len, 14);
        assert_eq!(&out[..2], b"\x30\x0c");
    }

    #[test]
    fn two_by_two_nested() {
        let mut builder = builder();
        for _ in 0..2 {
            builder.begin_constructed(Tag::SEQUENCE).unwrap();
            for _ in 0..2 {
                builder.begin_constructed(Tag::SEQUENCE).unwrap();
                builder.primitive_u8(Tag::OCTET_STRING, 12).unwrap();
                builder.primitive_u16(Tag::OCTET_STRING, 1234).unwrap();
                builder.primitive_copied(
                    Tag::OCTET_STRING, &[1, 1, 1]
                ).unwrap();
                builder.end_constructed().unwrap();
            }
            builder.end_constructed().unwrap();
        }
        let mut out = [0u8; 128];
        assert_eq!(builder.finish(&mut out), Ok(60));
    }

    #[test]
    fn small_constructed() {
        // `30 05` wrapping a one-octet and a two-octet primitive.
        let mut builder = builder();
        builder.begin_constructed(Tag::SEQUENCE).unwrap();
        builder.primitive(Tag::OCTET_STRING, &[0xaa]).unwrap();
        builder.primitive(Tag::ctx(0), &[0xbb, 0xcc]).unwrap();
        builder.end_constructed().unwrap();
        let mut out = [0u8; 16];
        let len = builder.finish(&mut out).unwrap();
        assert_eq!(&out[..len], b"\x30\x07\x04\x01\xaa\x80\x02\xbb\xcc");
    }

    #[test]
    fn long_form_header() {
        let value = [0u8; 0x80];
        let mut builder = Builder::new(4, 4, 0);
        builder.begin(256);
        builder.primitive(Tag::OCTET_STRING, &value).unwrap();
        let mut out = [0u8; 256];
        let len = builder.finish(&mut out).unwrap();
        assert_eq!(len, 0x84);
        assert_eq!(&out[..4], b"\x04\x82\x00\x80");
    }

    #[test]
    fn repeated_cycles() {
        let mut builder = Builder::new(4, 4, 16);
        let mut out = [0u8; 16];
        for _ in 0..3 {
            builder.begin(16);
            builder.primitive_u8(Tag::OCTET_STRING, 7).unwrap();
            let len = builder.finish(&mut out).unwrap();
            assert_eq!(&out[..len], b"\x04\x01\x07");
        }
    }

    #[test]
    fn too_many_tags() {
        let mut builder = Builder::new(1, 4, 16);
        builder.begin(64);
        builder.primitive_u8(Tag::OCTET_STRING, 1).unwrap();
        assert_eq!(
            builder.primitive_u8(Tag::OCTET_STRING, 2),
            Err(Error::TooManyTags)
        );
        assert_eq!(
            builder.begin_constructed(Tag::SEQUENCE),
            Err(Error::TooManyTags)
        );
    }

    #[test]
    fn depth_exceeded() {
        let mut builder = Builder::new(8, 2, 0);
        builder.begin(64);
        builder.begin_constructed(Tag::SEQUENCE).unwrap();
        builder.begin_constructed(Tag::SEQUENCE).unwrap();
        assert_eq!(
            builder.begin_constructed(Tag::SEQUENCE),
            Err(Error::DepthExceeded)
        );
    }

    #[test]
    fn too_long() {
        let mut builder = Builder::new(8, 8, 0);
        builder.begin(4);
        assert_eq!(
            builder.primitive(Tag::OCTET_STRING, &[0; 10]),
            Err(Error::TooLong)
        );

        // The header charge of a closing constructed can also overflow.
        let mut builder = Builder::new(8, 8, 0);
        builder.begin(4);
        builder.begin_constructed(Tag::SEQUENCE).unwrap();
        builder.primitive(Tag::OCTET_STRING, &[0; 2]).unwrap();
        assert_eq!(builder.end_constructed(), Err(Error::TooLong));
    }

    #[test]
    fn scratch_exhausted() {
        let mut builder = Builder::new(8, 8, 2);
        builder.begin(64);
        builder.primitive_u16(Tag::OCTET_STRING, 1).unwrap();
        assert_eq!(
            builder.primitive_u8(Tag::OCTET_STRING, 1),
            Err(Error::ScratchExhausted)
        );
    }

    #[test]
    fn misuse() {
        let mut below = builder();
        assert_eq!(below.end_constructed(), Err(Error::NotInConstructed));

        let mut open = builder();
        open.begin_constructed(Tag::SEQUENCE).unwrap();
        let mut out = [0u8; 16];
        assert_eq!(open.finish(&mut out), Err(Error::NotAtTopLevel));
    }

    #[test]
    fn output_too_small() {
        let mut builder = builder();
        builder.primitive(Tag::OCTET_STRING, &[1, 2, 3]).unwrap();
        let mut out = [0u8; 4];
        assert_eq!(builder.finish(&mut out), Err(Error::TooLong));
    }

    #[test]
    fn introspection() {
        let mut builder = builder();
        assert_eq!(builder.space(), 128);
        builder.begin_constructed(Tag::SEQUENCE).unwrap();
        assert_eq!(builder.current_depth(), 1);
        builder.primitive(Tag::OCTET_STRING, &[0xaa]).unwrap();
        assert_eq!(builder.count(), 2);
        assert_eq!(builder.current_len(), 3);
        builder.end_constructed().unwrap();
        assert_eq!(builder.current_depth(), 0);
        assert_eq!(builder.current_len(), 5);
        assert_eq!(builder.space(), 123);
    }

    #[test]
    fn copy_through_visitor() {
        let doc = b"\x30\x09\x04\x01\xaa\x31\x04\x04\x02\xbb\xcc";
        let mut copy = Builder::new(16, 8, 0);
        copy.begin(doc.len());
        Parser::new(8).parse(doc, &mut copy).unwrap();
        let mut out = [0u8; 32];
        let len = copy.finish(&mut out).unwrap();
        assert_eq!(&out[..len], doc);
    }

    #[test]
    fn roundtrip_built_document() {
        let mut builder = builder();
        builder.begin_constructed(Tag::SEQUENCE).unwrap();
        builder.primitive_u16(Tag::INTEGER, 0xbeef).unwrap();
        builder.begin_constructed(Tag::ctx(1)).unwrap();
        builder.primitive(Tag::OCTET_STRING, b"hello").unwrap();
        builder.end_constructed().unwrap();
        builder.end_constructed().unwrap();
        let first = builder.finish_into_bytes().unwrap();

        let mut copy = Builder::new(32, 32, 0);
        copy.begin(first.len());
        Parser::new(8).parse(&first, &mut copy).unwrap();
        let second = copy.finish_into_bytes().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn visitor_fault_surfaces() {
        let doc = b"\x30\x06\x04\x01\xaa\x04\x01\xbb";
        let mut copy = Builder::new(1, 8, 0);
        copy.begin(64);
        assert_eq!(
            Parser::new(8).parse(doc, &mut copy),
            Err(Error::Rejected)
        );
        assert_eq!(copy.fault(), Some(Error::TooManyTags));
        let mut out = [0u8; 16];
        assert_eq!(copy.finish(&mut out), Err(Error::TooManyTags));
    }

    #[test]
    fn clear_wipes() {
        let mut builder = builder();
        builder.primitive_copied(Tag::OCTET_STRING, b"secret").unwrap();
        builder.clear();
        assert_eq!(builder.count(), 0);
        assert_eq!(builder.current_len(), 0);
        let mut out = [0u8; 16];
        assert_eq!(builder.finish(&mut out), Ok(0));
    }
}
