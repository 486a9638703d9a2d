//! String codec.
//!
//! Lengths count UTF-16 code units, and each unit is written as modified
//! UTF-8 in 1 to 3 bytes: surrogate halves are encoded individually, never
//! combined into a 4-byte sequence. The final chunk uses the most compact
//! header that fits (`x00-x1f` direct, `x30-x33` short, `'S'` + 2 bytes).
//! Longer values are preceded by `'R'` chunks of at most
//! [`CHUNK_UNITS`] units, and a chunk never ends on a high surrogate.

use std::io::{Read, Write};

use crate::cursor::{InputCursor, OutputCursor};
use crate::tag;
use crate::{Error, Result};

/// Maximum units per chunk.
pub const CHUNK_UNITS: usize = 0x8000;

/// Scratch buffer for encoding units before handing them to the cursor.
const SCRATCH: usize = 768;

#[inline]
fn is_high_surrogate(unit: u16) -> bool {
    (0xd800..=0xdbff).contains(&unit)
}

/// Writes `value` as a complete (possibly chunked) string.
pub fn write_str<W: Write>(out: &mut OutputCursor<W>, value: &str, chunk: usize) -> Result<()> {
    if value.is_ascii() {
        // Fast path: 1 Byte == 1 UTF-16 Unit, kein Surrogate-Split möglich.
        let mut rest = value.as_bytes();
        while rest.len() > chunk {
            write_header(out, false, chunk)?;
            out.write_bytes(&rest[..chunk])?;
            rest = &rest[chunk..];
        }
        write_header(out, true, rest.len())?;
        return out.write_bytes(rest);
    }
    let units: Vec<u16> = value.encode_utf16().collect();
    write_units(out, &units, chunk)
}

/// Writes raw UTF-16 code units as a string. Unpaired surrogates are allowed.
pub fn write_units<W: Write>(out: &mut OutputCursor<W>, units: &[u16], chunk: usize) -> Result<()> {
    debug_assert!(chunk >= 2, "string chunk must hold a surrogate pair");
    let mut rest = units;
    while rest.len() > chunk {
        let mut sublen = chunk;
        if is_high_surrogate(rest[sublen - 1]) {
            sublen -= 1;
        }
        write_header(out, false, sublen)?;
        encode_units(out, &rest[..sublen])?;
        rest = &rest[sublen..];
    }
    write_header(out, true, rest.len())?;
    encode_units(out, rest)
}

/// Writes a chunk header; final chunks take the compact forms.
pub(crate) fn write_header<W: Write>(out: &mut OutputCursor<W>, last: bool, len: usize) -> Result<()> {
    debug_assert!(len <= 0xffff, "chunk length {len} exceeds 16 bits");
    if !last {
        out.write_bytes(&[tag::STRING_CHUNK, (len >> 8) as u8, len as u8])
    } else if len <= tag::STRING_DIRECT_MAX {
        out.write_byte(len as u8)
    } else if len <= tag::STRING_SHORT_MAX {
        out.write_bytes(&[tag::STRING_SHORT + (len >> 8) as u8, len as u8])
    } else {
        out.write_bytes(&[tag::STRING, (len >> 8) as u8, len as u8])
    }
}

/// Kodiert UTF-16 Units als modifiziertes UTF-8 (1-3 Bytes pro Unit).
fn encode_units<W: Write>(out: &mut OutputCursor<W>, units: &[u16]) -> Result<()> {
    let mut scratch = [0u8; SCRATCH];
    let mut n = 0;
    for &unit in units {
        if n + 3 > SCRATCH {
            out.write_bytes(&scratch[..n])?;
            n = 0;
        }
        if unit < 0x80 {
            scratch[n] = unit as u8;
            n += 1;
        } else if unit < 0x800 {
            scratch[n] = 0xc0 | (unit >> 6) as u8;
            scratch[n + 1] = 0x80 | (unit & 0x3f) as u8;
            n += 2;
        } else {
            scratch[n] = 0xe0 | (unit >> 12) as u8;
            scratch[n + 1] = 0x80 | ((unit >> 6) & 0x3f) as u8;
            scratch[n + 2] = 0x80 | (unit & 0x3f) as u8;
            n += 3;
        }
    }
    out.write_bytes(&scratch[..n])
}

/// Parses the header of a string chunk.
///
/// Returns `(is_final, length)` or `None` if `tag` starts no string chunk.
pub(crate) fn read_header<R: Read>(tag: u8, input: &mut InputCursor<R>) -> Result<Option<(bool, usize)>> {
    let header = match tag {
        0x00..=0x1f => (true, usize::from(tag)),
        0x30..=0x33 => {
            let b0 = input.read_u8("string length")?;
            (true, (usize::from(tag - tag::STRING_SHORT) << 8) | usize::from(b0))
        }
        tag::STRING_CHUNK | tag::STRING => {
            let len = u16::from_be_bytes(input.read_array::<2>("string length")?);
            (tag == tag::STRING, usize::from(len))
        }
        _ => return Ok(None),
    };
    log::trace!("string chunk: final={}, {} units", header.0, header.1);
    Ok(Some(header))
}

/// Reads one modified UTF-8 sequence and returns its code unit.
pub(crate) fn read_unit<R: Read>(input: &mut InputCursor<R>) -> Result<u16> {
    let offset = input.position();
    let ch = input.read_u8("string data")?;
    if ch < 0x80 {
        Ok(u16::from(ch))
    } else if ch & 0xe0 == 0xc0 {
        let ch1 = input.read_u8("string data")?;
        Ok((u16::from(ch & 0x1f) << 6) | u16::from(ch1 & 0x3f))
    } else if ch & 0xf0 == 0xe0 {
        let [ch1, ch2] = input.read_array::<2>("string data")?;
        Ok((u16::from(ch & 0x0f) << 12) | (u16::from(ch1 & 0x3f) << 6) | u16::from(ch2 & 0x3f))
    } else {
        Err(Error::MalformedUtf8 { byte: ch, offset })
    }
}

/// Reads `count` code units into `out`.
///
/// ASCII runs are copied straight out of the cursor buffer.
pub(crate) fn read_units<R: Read>(input: &mut InputCursor<R>, count: usize, out: &mut Vec<u16>) -> Result<()> {
    let mut left = count;
    while left > 0 {
        let buf = input.fill_buf()?;
        if buf.is_empty() {
            return Err(Error::end_of_stream("string data", input.position()));
        }
        let ascii = buf.iter().take(left).take_while(|b| **b < 0x80).count();
        if ascii > 0 {
            out.extend(buf[..ascii].iter().map(|&b| u16::from(b)));
            input.consume(ascii);
            left -= ascii;
        } else {
            out.push(read_unit(input)?);
            left -= 1;
        }
    }
    Ok(())
}

/// Counts how many code units a string will occupy on the wire.
pub fn unit_len(value: &str) -> usize {
    value.encode_utf16().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &str, chunk: usize) -> Vec<u8> {
        let mut out = OutputCursor::new(Vec::new());
        write_str(&mut out, value, chunk).unwrap();
        out.into_inner().unwrap()
    }

    /// Liest alle Chunks eines Strings zurück in UTF-16 Units.
    fn decode_units(bytes: &[u8]) -> Vec<u16> {
        let mut input = InputCursor::new(bytes);
        let mut units = Vec::new();
        loop {
            let tag = input.read_u8("tag").unwrap();
            let (last, len) = read_header(tag, &mut input).unwrap().expect("string tag");
            read_units(&mut input, len, &mut units).unwrap();
            if last {
                break;
            }
        }
        assert_eq!(input.read_byte().unwrap(), None);
        units
    }

    fn round_trip(value: &str) -> String {
        String::from_utf16(&decode_units(&encode(value, CHUNK_UNITS))).unwrap()
    }

    #[test]
    fn empty_and_direct_headers() {
        assert_eq!(encode("", CHUNK_UNITS), [0x00]);
        assert_eq!(encode("hello", CHUNK_UNITS), b"\x05hello");
        let s31 = "a".repeat(31);
        assert_eq!(encode(&s31, CHUNK_UNITS)[0], 0x1f);
    }

    #[test]
    fn short_header_up_to_1023() {
        let s32 = "a".repeat(32);
        assert_eq!(&encode(&s32, CHUNK_UNITS)[..2], &[0x30, 0x20]);
        let s1023 = "a".repeat(1023);
        assert_eq!(&encode(&s1023, CHUNK_UNITS)[..2], &[0x33, 0xff]);
        let s1024 = "a".repeat(1024);
        assert_eq!(&encode(&s1024, CHUNK_UNITS)[..3], &[b'S', 0x04, 0x00]);
    }

    #[test]
    fn multi_byte_units() {
        // U+00E9 = 2 Bytes, U+20AC = 3 Bytes, U+1F600 = Surrogate-Paar (2 x 3 Bytes)
        let bytes = encode("é€😀", CHUNK_UNITS);
        assert_eq!(bytes[0], 4, "length counts UTF-16 units");
        assert_eq!(&bytes[1..3], &[0xc3, 0xa9]);
        assert_eq!(&bytes[3..6], &[0xe2, 0x82, 0xac]);
        assert_eq!(&bytes[6..9], &[0xed, 0xa0, 0xbd]);
        assert_eq!(&bytes[9..12], &[0xed, 0xb8, 0x80]);
        assert_eq!(round_trip("é€😀"), "é€😀");
    }

    #[test]
    fn long_ascii_is_chunked() {
        let s = "x".repeat(CHUNK_UNITS + 10);
        let bytes = encode(&s, CHUNK_UNITS);
        assert_eq!(&bytes[..3], &[b'R', 0x80, 0x00]);
        assert_eq!(&bytes[3 + CHUNK_UNITS..3 + CHUNK_UNITS + 1], &[0x0a]);
        assert_eq!(round_trip(&s), s);
    }

    #[test]
    fn chunk_never_ends_on_high_surrogate() {
        // "ab😀c" = a b D83D DE00 c; mit Chunkgröße 3 würde D83D am Ende landen
        let bytes = encode("ab😀c", 3);
        assert_eq!(&bytes[..3], &[b'R', 0x00, 0x02]);
        assert_eq!(String::from_utf16(&decode_units(&bytes)).unwrap(), "ab😀c");
    }

    #[test]
    fn lone_surrogates_survive_as_units() {
        let units = [0x61, 0xd800, 0x62];
        let mut out = OutputCursor::new(Vec::new());
        write_units(&mut out, &units, CHUNK_UNITS).unwrap();
        let bytes = out.into_inner().unwrap();
        assert_eq!(decode_units(&bytes), units);
    }

    #[test]
    fn bad_lead_byte_is_format_error() {
        let mut input = InputCursor::new(&[0xf8][..]);
        let err = read_unit(&mut input).unwrap_err();
        assert!(matches!(err, Error::MalformedUtf8 { byte: 0xf8, offset: 0 }), "{err:?}");
    }

    #[test]
    fn truncated_data_is_end_of_stream() {
        let mut input = InputCursor::new(&b"abc"[..]);
        let mut units = Vec::new();
        let err = read_units(&mut input, 5, &mut units).unwrap_err();
        assert!(err.is_end_of_stream(), "{err:?}");
    }

    #[test]
    fn unit_len_counts_surrogates_twice() {
        assert_eq!(unit_len("a😀"), 3);
    }
}
