//! Binary codec.
//!
//! Same chunk layout as strings, but lengths count raw bytes: `x20-x2f`
//! direct (0-15 bytes), `x34-x37` short (up to 1023), `'B'` final chunk and
//! `'A'` non-final chunk, both with a 2-byte length.

use std::io::{Read, Write};

use crate::cursor::{InputCursor, OutputCursor};
use crate::tag;
use crate::Result;

/// Maximum bytes per chunk.
pub const CHUNK_BYTES: usize = 0x8000;

/// Writes `data` as a complete (possibly chunked) binary value.
pub fn write_binary<W: Write>(out: &mut OutputCursor<W>, data: &[u8], chunk: usize) -> Result<()> {
    let mut rest = data;
    while rest.len() > chunk {
        write_chunk(out, &rest[..chunk], false)?;
        rest = &rest[chunk..];
    }
    write_chunk(out, rest, true)
}

/// Writes one chunk; the final chunk uses the most compact header.
pub(crate) fn write_chunk<W: Write>(out: &mut OutputCursor<W>, data: &[u8], last: bool) -> Result<()> {
    let len = data.len();
    debug_assert!(len <= 0xffff, "chunk length {len} exceeds 16 bits");
    if !last {
        out.write_bytes(&[tag::BINARY_CHUNK, (len >> 8) as u8, len as u8])?;
    } else if len <= tag::BINARY_DIRECT_MAX {
        out.write_byte(tag::BINARY_DIRECT + len as u8)?;
    } else if len <= tag::BINARY_SHORT_MAX {
        out.write_bytes(&[tag::BINARY_SHORT + (len >> 8) as u8, len as u8])?;
    } else {
        out.write_bytes(&[tag::BINARY, (len >> 8) as u8, len as u8])?;
    }
    out.write_bytes(data)
}

/// Parses the header of a binary chunk.
///
/// Returns `(is_final, length)` or `None` if `tag` starts no binary chunk.
pub(crate) fn read_header<R: Read>(tag: u8, input: &mut InputCursor<R>) -> Result<Option<(bool, usize)>> {
    let header = match tag {
        0x20..=0x2f => (true, usize::from(tag - tag::BINARY_DIRECT)),
        0x34..=0x37 => {
            let b0 = input.read_u8("binary length")?;
            (true, (usize::from(tag - tag::BINARY_SHORT) << 8) | usize::from(b0))
        }
        tag::BINARY_CHUNK | tag::BINARY => {
            let len = u16::from_be_bytes(input.read_array::<2>("binary length")?);
            (tag == tag::BINARY, usize::from(len))
        }
        _ => return Ok(None),
    };
    log::trace!("binary chunk: final={}, {} bytes", header.0, header.1);
    Ok(Some(header))
}
