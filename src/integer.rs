//! Int and long codecs.
//!
//! Both kinds use tiered compact forms: the value is folded into the tag for
//! small magnitudes, then 1, 2, 4 (and for longs 8) trailing big-endian bytes
//! are added relative to the zero point of each tag range. The encoder tests
//! the tiers from narrowest to widest and writes the first that fits.

use std::io::{Read, Write};

use crate::cursor::{InputCursor, OutputCursor};
use crate::tag;
use crate::Result;

/// Writes a 32-bit int in its narrowest form.
pub fn write_int<W: Write>(out: &mut OutputCursor<W>, value: i32) -> Result<()> {
    if (tag::INT_DIRECT_MIN..=tag::INT_DIRECT_MAX).contains(&value) {
        out.write_byte((value + i32::from(tag::INT_ZERO)) as u8)
    } else if (tag::INT_BYTE_MIN..=tag::INT_BYTE_MAX).contains(&value) {
        out.write_bytes(&[(i32::from(tag::INT_BYTE_ZERO) + (value >> 8)) as u8, value as u8])
    } else if (tag::INT_SHORT_MIN..=tag::INT_SHORT_MAX).contains(&value) {
        out.write_bytes(&[
            (i32::from(tag::INT_SHORT_ZERO) + (value >> 16)) as u8,
            (value >> 8) as u8,
            value as u8,
        ])
    } else {
        let [b3, b2, b1, b0] = value.to_be_bytes();
        out.write_bytes(&[tag::INT, b3, b2, b1, b0])
    }
}

/// Writes a 64-bit long in its narrowest form.
pub fn write_long<W: Write>(out: &mut OutputCursor<W>, value: i64) -> Result<()> {
    if (tag::LONG_DIRECT_MIN..=tag::LONG_DIRECT_MAX).contains(&value) {
        out.write_byte((value + i64::from(tag::LONG_ZERO)) as u8)
    } else if (tag::LONG_BYTE_MIN..=tag::LONG_BYTE_MAX).contains(&value) {
        out.write_bytes(&[(i64::from(tag::LONG_BYTE_ZERO) + (value >> 8)) as u8, value as u8])
    } else if (tag::LONG_SHORT_MIN..=tag::LONG_SHORT_MAX).contains(&value) {
        out.write_bytes(&[
            (i64::from(tag::LONG_SHORT_ZERO) + (value >> 16)) as u8,
            (value >> 8) as u8,
            value as u8,
        ])
    } else if let Ok(narrow) = i32::try_from(value) {
        let [b3, b2, b1, b0] = narrow.to_be_bytes();
        out.write_bytes(&[tag::LONG_INT, b3, b2, b1, b0])
    } else {
        let mut buf = [0u8; 9];
        buf[0] = tag::LONG;
        buf[1..].copy_from_slice(&value.to_be_bytes());
        out.write_bytes(&buf)
    }
}

/// Decodes the payload of an int tag. Returns `None` if `tag` is not an int form.
pub fn decode_int<R: Read>(tag: u8, input: &mut InputCursor<R>) -> Result<Option<i32>> {
    let value = match tag {
        0x80..=0xbf => i32::from(tag) - i32::from(tag::INT_ZERO),
        0xc0..=0xcf => {
            let b0 = input.read_u8("int")?;
            ((i32::from(tag) - i32::from(tag::INT_BYTE_ZERO)) << 8) + i32::from(b0)
        }
        0xd0..=0xd7 => {
            let [b1, b0] = input.read_array::<2>("int")?;
            ((i32::from(tag) - i32::from(tag::INT_SHORT_ZERO)) << 16) + (i32::from(b1) << 8) + i32::from(b0)
        }
        tag::INT => i32::from_be_bytes(input.read_array::<4>("int")?),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Decodes the payload of a long tag. Returns `None` if `tag` is not a long form.
pub fn decode_long<R: Read>(tag: u8, input: &mut InputCursor<R>) -> Result<Option<i64>> {
    let value = match tag {
        0xd8..=0xef => i64::from(tag) - i64::from(tag::LONG_ZERO),
        0xf0..=0xff => {
            let b0 = input.read_u8("long")?;
            ((i64::from(tag) - i64::from(tag::LONG_BYTE_ZERO)) << 8) + i64::from(b0)
        }
        0x38..=0x3f => {
            let [b1, b0] = input.read_array::<2>("long")?;
            ((i64::from(tag) - i64::from(tag::LONG_SHORT_ZERO)) << 16) + (i64::from(b1) << 8) + i64::from(b0)
        }
        tag::LONG_INT => i64::from(i32::from_be_bytes(input.read_array::<4>("long")?)),
        tag::LONG => i64::from_be_bytes(input.read_array::<8>("long")?),
        _ => return Ok(None),
    };
    Ok(Some(value))
}
