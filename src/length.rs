//! The length octets of a TLV element.
//!
//! Only the definite form is supported. The length of a value can be
//! encoded in one of two ways, selected by the most significant bit of the
//! first octet. If it is clear, the remaining seven bits are the length
//! themselves. If it is set, the remaining bits give the number of octets
//! that follow and hold the big-endian length; we accept one or two such
//! octets. A first octet of `0x80` announces the indefinite form, which is
//! always an error here, as is any larger trailing-octet count.
//!
//! The encoder is deliberately asymmetric: any length above 127 is written
//! as `0x82` plus two octets, even when a single trailing octet would do.
//! Consumers of the encoded data may rely on this fixed three-octet framing
//! for offset arithmetic, so the decoder accepts the one-octet long form
//! but the encoder never produces it.

use crate::error::Error;


//------------ Constants -----------------------------------------------------

/// The largest length value the codec will accept or produce.
///
/// Lengths must fit a signed 16-bit integer so that offset arithmetic
/// cannot wrap on the smallest supported platforms.
pub const MAX: usize = 0x7fff;

/// The flag marking the long form in the first length octet.
const LONG_FLAG: u8 = 0x80;

/// The mask of the trailing-octet count in a long-form first octet.
const COUNT_MASK: u8 = 0x7f;


//------------ Functions -----------------------------------------------------

/// Reads a length from `data` at position `pos`.
///
/// Returns the length and the position of the first octet after it.
pub fn read(data: &[u8], pos: usize) -> Result<(usize, usize), Error> {
    let first = *data.get(pos).ok_or(Error::Truncated)?;
    if first & LONG_FLAG == 0 {
        return Ok((usize::from(first), pos + 1))
    }
    match first & COUNT_MASK {
        0 => {
            // The indefinite form.
            Err(Error::MalformedLength)
        }
        1 => {
            let value = *data.get(pos + 1).ok_or(Error::Truncated)?;
            Ok((usize::from(value), pos + 2))
        }
        2 => {
            let hi = *data.get(pos + 1).ok_or(Error::Truncated)?;
            let lo = *data.get(pos + 2).ok_or(Error::Truncated)?;
            let value = usize::from(hi) << 8 | usize::from(lo);
            if value > MAX {
                return Err(Error::MalformedLength)
            }
            Ok((value, pos + 3))
        }
        _ => Err(Error::MalformedLength)
    }
}

/// Returns the number of octets of the encoded form of `length`.
pub fn encoded_len(length: usize) -> usize {
    if length <= usize::from(COUNT_MASK) { 1 }
    else { 3 }
}

/// Writes the encoded length into `buf` at position `pos`.
///
/// Returns the position of the first octet after the length.
pub fn write(
    buf: &mut [u8], pos: usize, length: usize
) -> Result<usize, Error> {
    debug_assert!(length <= MAX);
    if length <= usize::from(COUNT_MASK) {
        let octet = buf.get_mut(pos).ok_or(Error::TooLong)?;
        *octet = length as u8;
        Ok(pos + 1)
    }
    else {
        let out = buf.get_mut(pos..pos + 3).ok_or(Error::TooLong)?;
        out[0] = LONG_FLAG | 2;
        out[1] = (length >> 8) as u8;
        out[2] = length as u8;
        Ok(pos + 3)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_short_form() {
        assert_eq!(read(b"\x00", 0).unwrap(), (0x00, 1));
        assert_eq!(read(b"\x12", 0).unwrap(), (0x12, 1));
        assert_eq!(read(b"\x7f", 0).unwrap(), (0x7f, 1));
    }

    #[test]
    fn read_long_form() {
        assert_eq!(read(b"\x81\x00", 0).unwrap(), (0, 2));
        assert_eq!(read(b"\x81\x80", 0).unwrap(), (0x80, 2));
        assert_eq!(read(b"\x81\xf0", 0).unwrap(), (0xf0, 2));
        assert_eq!(read(b"\x82\x00\x80", 0).unwrap(), (0x80, 3));
        assert_eq!(read(b"\x82\x7f\xff", 0).unwrap(), (0x7fff, 3));
    }

    #[test]
    fn read_failures() {
        // Indefinite form.
        assert_eq!(read(b"\x80", 0), Err(Error::MalformedLength));
        // More trailing octets than we support.
        assert_eq!(
            read(b"\x83\x00\x00\x01", 0), Err(Error::MalformedLength)
        );
        assert_eq!(read(b"\xff", 0), Err(Error::MalformedLength));
        // Value above MAX.
        assert_eq!(read(b"\x82\x80\x00", 0), Err(Error::MalformedLength));
        // Truncated forms.
        assert_eq!(read(b"", 0), Err(Error::Truncated));
        assert_eq!(read(b"\x81", 0), Err(Error::Truncated));
        assert_eq!(read(b"\x82\x01", 0), Err(Error::Truncated));
    }

    #[test]
    fn write_forms() {
        fn step(length: usize, expected: &[u8]) {
            let mut buf = [0u8; 4];
            let end = write(&mut buf, 0, length).unwrap();
            assert_eq!(&buf[..end], expected, "write failed for {}", length);
            assert_eq!(encoded_len(length), end);
        }

        step(0, b"\x00");
        step(0x12, b"\x12");
        step(0x7f, b"\x7f");
        // Always the two-octet long form above 127, never `81 80`.
        step(0x80, b"\x82\x00\x80");
        step(0xff, b"\x82\x00\xff");
        step(0x1234, b"\x82\x12\x34");
        step(MAX, b"\x82\x7f\xff");
    }

    #[test]
    fn long_form_asymmetry() {
        // Both decodings of 128 yield the same value; only one is written.
        assert_eq!(read(b"\x81\x80", 0).unwrap().0, 0x80);
        assert_eq!(read(b"\x82\x00\x80", 0).unwrap().0, 0x80);
        let mut buf = [0u8; 4];
        let end = write(&mut buf, 0, 0x80).unwrap();
        assert_eq!(&buf[..end], b"\x82\x00\x80");
    }

    #[test]
    fn write_failures() {
        let mut buf = [0u8; 2];
        assert_eq!(write(&mut buf, 2, 1), Err(Error::TooLong));
        assert_eq!(write(&mut buf, 0, 0x80), Err(Error::TooLong));
    }
}
