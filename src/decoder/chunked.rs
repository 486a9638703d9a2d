//! Element-wise reads on chunked strings and binaries.
//!
//! These keep the chunk state between calls, so a value of any size can be
//! consumed through a small buffer. While a chunked value is open every
//! other read fails with a state error.

use std::io::{self, Read};

use super::Decoder;
use crate::chunk::{ChunkState, ChunkStep, Chunked};
use crate::factory::ValueFactory;
use crate::{binary, string, tag};
use crate::{Error, Result};

/// Art des offenen Chunk-Werts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum ChunkKind {
    #[default]
    String,
    Binary,
}

impl ChunkKind {
    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Binary => "binary",
        }
    }

    fn chunk_name(self) -> &'static str {
        match self {
            Self::String => "string chunk",
            Self::Binary => "binary chunk",
        }
    }
}

impl<R: Read, F: ValueFactory> Decoder<R, F> {
    fn read_chunk_header(&mut self, kind: ChunkKind, tag: u8) -> Result<Option<(bool, usize)>> {
        match kind {
            ChunkKind::String => string::read_header(tag, &mut self.input),
            ChunkKind::Binary => binary::read_header(tag, &mut self.input),
        }
    }

    /// Öffnet einen Wert; `false` bei null.
    fn open_chunked(&mut self, kind: ChunkKind) -> Result<bool> {
        let tag = self.read_tag(kind.name())?;
        if tag == tag::NULL {
            return Ok(false);
        }
        let Some((last, len)) = self.read_chunk_header(kind, tag)? else {
            return Err(self.unexpected(kind.name(), tag));
        };
        self.check_length(len)?;
        self.chunk = ChunkState::open(last, len);
        self.chunk_kind = kind;
        Ok(true)
    }

    fn next_chunk(&mut self, kind: ChunkKind) -> Result<()> {
        let tag = self.input.read_u8(kind.chunk_name())?;
        let Some((last, len)) = self.read_chunk_header(kind, tag)? else {
            return Err(self.unexpected(kind.chunk_name(), tag));
        };
        self.chunk = ChunkState::open(last, len);
        Ok(())
    }

    /// Units im aktuellen Chunk, oder `None` am Ende des Werts.
    fn chunk_available(&mut self, kind: ChunkKind) -> Result<Option<usize>> {
        loop {
            match self.chunk.step() {
                ChunkStep::Start => {
                    if !self.open_chunked(kind)? {
                        return Ok(None);
                    }
                }
                _ if self.chunk_kind != kind => {
                    return Err(Error::state(format!(
                        "a {} value is open, cannot read {}",
                        self.chunk_kind.name(),
                        kind.name()
                    )));
                }
                ChunkStep::Available(n) => return Ok(Some(n)),
                ChunkStep::NextChunk => self.next_chunk(kind)?,
                ChunkStep::Finished => {
                    self.chunk = ChunkState::Idle;
                    return Ok(None);
                }
            }
        }
    }

    /// Reads one UTF-16 code unit of a string value.
    ///
    /// The first call consumes the string's start tag. Returns
    /// [`Chunked::EndOfValue`] once the value (or a null) is exhausted.
    pub fn read_char(&mut self) -> Result<Chunked<u16>> {
        match self.chunk_available(ChunkKind::String)? {
            Some(_) => {
                let unit = string::read_unit(&mut self.input)?;
                self.chunk.consume(1);
                Ok(Chunked::Item(unit))
            }
            None => Ok(Chunked::EndOfValue),
        }
    }

    /// Fills `buf` with code units of the open (or next) string value.
    ///
    /// Returns the number of units copied; a short count does not mean the
    /// value is exhausted, only `EndOfValue` does.
    pub fn read_chars(&mut self, buf: &mut [u16]) -> Result<Chunked<usize>> {
        let mut filled = 0;
        while filled < buf.len() {
            if filled > 0 && self.chunk.step() == ChunkStep::Finished {
                break;
            }
            let Some(n) = self.chunk_available(ChunkKind::String)? else {
                return Ok(if filled == 0 { Chunked::EndOfValue } else { Chunked::Item(filled) });
            };
            let take = n.min(buf.len() - filled);
            for slot in &mut buf[filled..filled + take] {
                *slot = string::read_unit(&mut self.input)?;
            }
            self.chunk.consume(take);
            filled += take;
        }
        Ok(Chunked::Item(filled))
    }

    /// Reads one byte of a binary value.
    pub fn read_byte(&mut self) -> Result<Chunked<u8>> {
        match self.chunk_available(ChunkKind::Binary)? {
            Some(_) => {
                let b = self.input.read_u8("binary data")?;
                self.chunk.consume(1);
                Ok(Chunked::Item(b))
            }
            None => Ok(Chunked::EndOfValue),
        }
    }

    /// Fills `buf` with bytes of the open (or next) binary value.
    pub fn read_bytes_into(&mut self, buf: &mut [u8]) -> Result<Chunked<usize>> {
        let mut filled = 0;
        while filled < buf.len() {
            if filled > 0 && self.chunk.step() == ChunkStep::Finished {
                break;
            }
            let Some(n) = self.chunk_available(ChunkKind::Binary)? else {
                return Ok(if filled == 0 { Chunked::EndOfValue } else { Chunked::Item(filled) });
            };
            let take = n.min(buf.len() - filled);
            self.input.read_exact(&mut buf[filled..filled + take], "binary data")?;
            self.chunk.consume(take);
            filled += take;
        }
        Ok(Chunked::Item(filled))
    }

    /// Opens the next binary value as an [`io::Read`] stream; `None` for null.
    ///
    /// The stream must be read to its end before the decoder is used again.
    pub fn binary_stream(&mut self) -> Result<Option<BinaryStream<'_, R, F>>> {
        if !self.open_chunked(ChunkKind::Binary)? {
            return Ok(None);
        }
        Ok(Some(BinaryStream {
            decoder: self,
            done: false,
        }))
    }
}

/// `io::Read` over one binary value, returned by [`Decoder::binary_stream`].
pub struct BinaryStream<'a, R, F> {
    decoder: &'a mut Decoder<R, F>,
    done: bool,
}

impl<R: Read, F: ValueFactory> Read for BinaryStream<'_, R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.done || buf.is_empty() {
            return Ok(0);
        }
        let result = self
            .decoder
            .read_bytes_into(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        match result {
            Chunked::Item(n) => Ok(n),
            Chunked::EndOfValue => {
                self.done = true;
                Ok(0)
            }
        }
    }
}
