//! Error handling.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::{error, fmt};


//------------ Error ---------------------------------------------------------

/// An error happened while parsing or building TLV data.
///
/// Every error is fatal to the call that produced it. A failed
/// [`Parser::parse`][crate::Parser::parse] leaves no partial result, and a
/// failed builder operation poisons the whole `begin`…`finish` cycle; the
/// caller must start over.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The identifier octets violate the encoding rules.
    ///
    /// Tags are limited to two octets, so the second octet of a long-form
    /// tag must have its continuation bit clear.
    MalformedTag,

    /// The length octets violate the encoding rules.
    ///
    /// This covers the indefinite form, long forms with more than two
    /// trailing octets, and decoded values above [`length::MAX`].
    ///
    /// [`length::MAX`]: crate::length::MAX
    MalformedLength,

    /// A declared length runs past the end of the available data.
    Truncated,

    /// The children of a constructed element exceed its declared length.
    Overrun,

    /// The top-level element did not consume the input exactly.
    TrailingData,

    /// An element is nested deeper than the configured maximum depth.
    DepthExceeded,

    /// A visitor callback declined an element.
    Rejected,

    /// The builder's entry table is exhausted.
    TooManyTags,

    /// The output would exceed the configured maximum length.
    TooLong,

    /// The builder's scratch arena is exhausted.
    ScratchExhausted,

    /// `end_constructed` was called with no constructed element open.
    NotInConstructed,

    /// `finish` was called with a constructed element still open.
    NotAtTopLevel,

    /// The serialized output did not match the accounted length.
    ///
    /// This is a defensive check. It indicates a defect in the builder, not
    /// bad input, and should be unreachable under correct use.
    Inconsistent,
}


//--- Display and Error

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Error::MalformedTag => "malformed tag octets",
            Error::MalformedLength => "malformed length octets",
            Error::Truncated => "unexpected end of data",
            Error::Overrun => "constructed value overrun",
            Error::TrailingData => "trailing data",
            Error::DepthExceeded => "maximum nesting depth exceeded",
            Error::Rejected => "element rejected by visitor",
            Error::TooManyTags => "entry table exhausted",
            Error::TooLong => "maximum output length exceeded",
            Error::ScratchExhausted => "scratch arena exhausted",
            Error::NotInConstructed => "no constructed element open",
            Error::NotAtTopLevel => "constructed element still open",
            Error::Inconsistent => "internal length accounting mismatch",
        })
    }
}

impl error::Error for Error { }
