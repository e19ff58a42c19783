//! The identifier octets of a TLV element.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::fmt;
use crate::error::Error;


//------------ Class ---------------------------------------------------------

/// The class of a tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Class {
    /// The universal class of the standardized types.
    Universal,

    /// The application class.
    Application,

    /// The context-specific class.
    ContextSpecific,

    /// The private class.
    Private,
}

impl Class {
    /// Returns the class bits in their position within a raw tag value.
    fn bits(self) -> u16 {
        match self {
            Class::Universal => Tag::UNIVERSAL,
            Class::Application => Tag::APPLICATION,
            Class::ContextSpecific => Tag::CONTEXT_SPECIFIC,
            Class::Private => Tag::PRIVATE,
        }
    }
}


//------------ Tag -----------------------------------------------------------

/// The tag of a TLV element.
///
/// Each element starts with a sequence of one or two octets called the
/// _identifier octets._ They encode the class of the tag, whether the
/// element uses primitive or constructed encoding, and the tag number.
/// The `Tag` type packs all of that into a single 16-bit value whose high
/// byte is the first identifier octet and whose low byte is the second
/// identifier octet, if present.
///
/// # Limitations
///
/// We can only handle up to two identifier octets. That is, we only support
/// tag numbers between 0 and 127. The continuation bit of the second octet
/// must be clear; anything longer is a [`MalformedTag`] error.
///
/// [`MalformedTag`]: crate::Error::MalformedTag
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct Tag(u16);

/// # Constants for Often Used Tag Values
///
impl Tag {
    /// The mask for checking the class.
    const CLASS_MASK: u16 = 0xc000;

    /// The mask for checking whether the element is constructed.
    ///
    /// A value of 0 indicates primitive encoding.
    const CONSTRUCTED_MASK: u16 = 0x2000;

    /// The mask of the first octet's number field.
    ///
    /// (5 bits – 0b0001_1111.)
    const FIRST_DATA_MASK: u16 = 0x1f00;

    /// The mask of the second octet's number field.
    ///
    /// (7 bits – 0b0111_1111.)
    const SECOND_DATA_MASK: u16 = 0x007f;

    /// The continuation bit of a tag octet.
    ///
    /// It is set in every identifier octet after the first except the last.
    const CONTINUES: u8 = 0x80;

    /// The largest tag number that fits into a single octet.
    const MAX_VAL_FIRST_OCTET: u8 = 0x1e;

    /// The largest tag number we can represent at all.
    const MAX_VAL_SECOND_OCTET: u8 = 0x7f;

    /// The tag value representing the ‘universal’ class.
    const UNIVERSAL: u16 = 0x0000;

    /// The tag value representing the ‘application’ class.
    const APPLICATION: u16 = 0x4000;

    /// The tag value representing the ‘context-specific’ class.
    const CONTEXT_SPECIFIC: u16 = 0x8000;

    /// The tag value representing the ‘private’ class.
    const PRIVATE: u16 = 0xc000;

    //--- Universal Tags
    //
    // See clause 8.4 of X.690. All constants are in primitive form.

    /// The tag for the BOOLEAN type, UNIVERSAL 1.
    pub const BOOLEAN: Self = Tag(0x0100);

    /// The tag for the INTEGER type, UNIVERSAL 2.
    pub const INTEGER: Self = Tag(0x0200);

    /// The tag for the BIT STRING type, UNIVERSAL 3.
    pub const BIT_STRING: Self = Tag(0x0300);

    /// The tag for the OCTET STRING type, UNIVERSAL 4.
    pub const OCTET_STRING: Self = Tag(0x0400);

    /// The tag for the NULL type, UNIVERSAL 5.
    pub const NULL: Self = Tag(0x0500);

    /// The tag for the OBJECT IDENTIFIER type, UNIVERSAL 6.
    pub const OID: Self = Tag(0x0600);

    /// The tag for the ENUMERATED type, UNIVERSAL 10.
    pub const ENUMERATED: Self = Tag(0x0a00);

    /// The tag for the UTF8String type, UNIVERSAL 12.
    pub const UTF8_STRING: Self = Tag(0x0c00);

    /// The tag for the SEQUENCE and SEQUENCE OF types, UNIVERSAL 16.
    pub const SEQUENCE: Self = Tag(0x1000);

    /// The tag for the SET and SET OF types, UNIVERSAL 17.
    pub const SET: Self = Tag(0x1100);

    /// The tag for the NumericString type, UNIVERSAL 18.
    pub const NUMERIC_STRING: Self = Tag(0x1200);

    /// The tag for the PrintableString type, UNIVERSAL 19.
    pub const PRINTABLE_STRING: Self = Tag(0x1300);

    /// The tag for the IA5String type, UNIVERSAL 22.
    pub const IA5_STRING: Self = Tag(0x1600);

    /// The tag for the UTCTime type, UNIVERSAL 23.
    pub const UTC_TIME: Self = Tag(0x1700);

    /// The tag for the GeneralizedTime type, UNIVERSAL 24.
    pub const GENERALIZED_TIME: Self = Tag(0x1800);

    /// The tag for the BMPString type, UNIVERSAL 30.
    pub const BMP_STRING: Self = Tag(0x1e00);
}

impl Tag {
    /// Creates a tag from its class bits and number.
    ///
    /// # Panics
    ///
    /// This function panics if the tag number is greater than
    /// `Self::MAX_VAL_SECOND_OCTET`.
    fn new(class_bits: u16, number: u8) -> Self {
        assert!(number <= Tag::MAX_VAL_SECOND_OCTET);
        if number <= Tag::MAX_VAL_FIRST_OCTET {
            Tag(class_bits | u16::from(number) << 8)
        }
        else {
            Tag(class_bits | Tag::FIRST_DATA_MASK | u16::from(number))
        }
    }

    /// Creates a tag in the universal class with the given number.
    ///
    /// # Panics
    ///
    /// This function panics if the tag number is greater than 127.
    pub fn universal(number: u8) -> Self {
        Tag::new(Tag::UNIVERSAL, number)
    }

    /// Creates a tag in the application class with the given number.
    ///
    /// # Panics
    ///
    /// This function panics if the tag number is greater than 127.
    pub fn application(number: u8) -> Self {
        Tag::new(Tag::APPLICATION, number)
    }

    /// Creates a tag in the context-specific class with the given number.
    ///
    /// # Panics
    ///
    /// This function panics if the tag number is greater than 127.
    pub fn ctx(number: u8) -> Self {
        Tag::new(Tag::CONTEXT_SPECIFIC, number)
    }

    /// Creates a tag in the private class with the given number.
    ///
    /// # Panics
    ///
    /// This function panics if the tag number is greater than 127.
    pub fn private(number: u8) -> Self {
        Tag::new(Tag::PRIVATE, number)
    }

    /// Creates a tag from the raw 16-bit packed value.
    pub fn from_raw(raw: u16) -> Self {
        Tag(raw)
    }

    /// Returns the raw 16-bit packed value.
    pub fn raw(self) -> u16 {
        self.0
    }

    /// Returns the class of the tag.
    pub fn class(self) -> Class {
        match self.0 & Tag::CLASS_MASK {
            Tag::UNIVERSAL => Class::Universal,
            Tag::APPLICATION => Class::Application,
            Tag::CONTEXT_SPECIFIC => Class::ContextSpecific,
            _ => Class::Private,
        }
    }

    /// Returns whether the tag is of the universal class.
    pub fn is_universal(self) -> bool {
        self.class() == Class::Universal
    }

    /// Returns whether the tag is of the application class.
    pub fn is_application(self) -> bool {
        self.class() == Class::Application
    }

    /// Returns whether the tag is of the context-specific class.
    pub fn is_context_specific(self) -> bool {
        self.class() == Class::ContextSpecific
    }

    /// Returns whether the tag is of the private class.
    pub fn is_private(self) -> bool {
        self.class() == Class::Private
    }

    /// Returns whether the tag marks a primitive element.
    pub fn is_primitive(self) -> bool {
        self.0 & Tag::CONSTRUCTED_MASK == 0
    }

    /// Returns whether the tag marks a constructed element.
    pub fn is_constructed(self) -> bool {
        self.0 & Tag::CONSTRUCTED_MASK != 0
    }

    /// Returns the tag with the constructed flag set.
    pub fn as_constructed(self) -> Self {
        Tag(self.0 | Tag::CONSTRUCTED_MASK)
    }

    /// Returns the tag with the constructed flag cleared.
    pub fn as_primitive(self) -> Self {
        Tag(self.0 & !Tag::CONSTRUCTED_MASK)
    }

    /// Returns the tag moved into the given class.
    pub fn with_class(self, class: Class) -> Self {
        Tag(self.0 & !Tag::CLASS_MASK | class.bits())
    }

    /// Returns the number of the tag.
    pub fn number(self) -> u8 {
        if self.is_long() {
            (self.0 & Tag::SECOND_DATA_MASK) as u8
        }
        else {
            ((self.0 & Tag::FIRST_DATA_MASK) >> 8) as u8
        }
    }

    /// Returns whether the tag takes the two-octet form.
    fn is_long(self) -> bool {
        self.0 & Tag::FIRST_DATA_MASK == Tag::FIRST_DATA_MASK
    }

    /// Returns the number of octets of the encoded form of the tag.
    pub fn encoded_len(self) -> usize {
        if self.is_long() { 2 }
        else { 1 }
    }

    /// Reads a tag from `data` at position `pos`.
    ///
    /// Returns the tag and the position of the first octet after it.
    pub fn read(data: &[u8], pos: usize) -> Result<(Self, usize), Error> {
        let first = *data.get(pos).ok_or(Error::Truncated)?;
        if u16::from(first) << 8 & Tag::FIRST_DATA_MASK
                != Tag::FIRST_DATA_MASK {
            return Ok((Tag(u16::from(first) << 8), pos + 1))
        }
        let second = *data.get(pos + 1).ok_or(Error::Truncated)?;
        if second & Tag::CONTINUES != 0 {
            // Three or more identifier octets are unsupported.
            return Err(Error::MalformedTag)
        }
        Ok((Tag(u16::from(first) << 8 | u16::from(second)), pos + 2))
    }

    /// Writes the encoded tag into `buf` at position `pos`.
    ///
    /// Returns the position of the first octet after the tag.
    pub fn write(self, buf: &mut [u8], pos: usize) -> Result<usize, Error> {
        let end = pos + self.encoded_len();
        let out = buf.get_mut(pos..end).ok_or(Error::TooLong)?;
        out[0] = (self.0 >> 8) as u8;
        if let Some(second) = out.get_mut(1) {
            *second = self.0 as u8;
        }
        Ok(end)
    }
}


//--- Display and Debug

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.as_primitive() {
            Tag::BOOLEAN => write!(f, "BOOLEAN"),
            Tag::INTEGER => write!(f, "INTEGER"),
            Tag::BIT_STRING => write!(f, "BIT STRING"),
            Tag::OCTET_STRING => write!(f, "OCTET STRING"),
            Tag::NULL => write!(f, "NULL"),
            Tag::OID => write!(f, "OBJECT IDENTIFIER"),
            Tag::ENUMERATED => write!(f, "ENUMERATED"),
            Tag::UTF8_STRING => write!(f, "UTF8String"),
            Tag::SEQUENCE => write!(f, "SEQUENCE"),
            Tag::SET => write!(f, "SET"),
            Tag::NUMERIC_STRING => write!(f, "NumericString"),
            Tag::PRINTABLE_STRING => write!(f, "PrintableString"),
            Tag::IA5_STRING => write!(f, "IA5String"),
            Tag::UTC_TIME => write!(f, "UTCTime"),
            Tag::GENERALIZED_TIME => write!(f, "GeneralizedTime"),
            Tag::BMP_STRING => write!(f, "BMPString"),
            tag => {
                match tag.class() {
                    Class::Universal => write!(f, "[UNIVERSAL ")?,
                    Class::Application => write!(f, "[APPLICATION ")?,
                    Class::ContextSpecific => write!(f, "[")?,
                    Class::Private => write!(f, "[PRIVATE ")?,
                }
                write!(f, "{}]", tag.number())
            }
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}


//============ Tests =========================================================
