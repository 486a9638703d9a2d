//! Packet framing for streamed top-level values.
//!
//! A packet is a sequence of length-prefixed chunks closed by a zero-length
//! chunk. Each chunk header is a big-endian base-128 varint (high bit =
//! continuation). Writers always emit a leading `0x80` group, so a short
//! chunk reads `80 len`, a longer one `80 8x yy`, and the terminator `80 00`.
//! Readers accept any number of leading zero groups.

use crate::{Error, Result};

/// Terminal chunk header closing a packet.
pub const TERMINATOR: [u8; 2] = [0x80, 0x00];

/// Maximum varint groups accepted for a single chunk length.
const MAX_HEADER_GROUPS: usize = 10;

/// Encoded chunk header (at most 1 marker + 10 groups).
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChunkHeader {
    bytes: [u8; 1 + MAX_HEADER_GROUPS],
    len: usize,
}

impl ChunkHeader {
    /// Kodiert die Chunk-Länge: `0x80` gefolgt von den 7-Bit-Gruppen, MSB first.
    pub(crate) fn new(length: usize) -> Self {
        let mut groups = [0u8; MAX_HEADER_GROUPS];
        let mut count = 0;
        let mut rest = length;
        loop {
            groups[count] = (rest & 0x7f) as u8;
            count += 1;
            rest >>= 7;
            if rest == 0 {
                break;
            }
        }

        let mut bytes = [0u8; 1 + MAX_HEADER_GROUPS];
        bytes[0] = 0x80;
        for i in 0..count {
            let group = groups[count - 1 - i];
            bytes[1 + i] = if i + 1 < count { group | 0x80 } else { group };
        }
        Self { bytes, len: 1 + count }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Liest eine Chunk-Länge; `next` liefert das jeweils nächste Byte.
///
/// `offset` dient nur der Fehlermeldung.
pub(crate) fn read_chunk_length(offset: u64, mut next: impl FnMut() -> Result<u8>) -> Result<usize> {
    let mut length: usize = 0;
    for _ in 0..MAX_HEADER_GROUPS {
        let b = next()?;
        if length > (usize::MAX >> 7) {
            return Err(Error::packet(offset, "chunk length overflows"));
        }
        length = (length << 7) | usize::from(b & 0x7f);
        if b & 0x80 == 0 {
            return Ok(length);
        }
    }
    Err(Error::packet(offset, "chunk length header too long"))
}
