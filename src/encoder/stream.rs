//! Streaming binary output: an `io::Write` adapter and a reader copy.

use std::io::{self, Read, Write};

use super::Encoder;
use crate::{binary, Error, Result};

impl<W: Write> Encoder<W> {
    /// Opens a binary value that is written incrementally.
    ///
    /// Full chunks are emitted as non-final `'A'` chunks while writing;
    /// [`BinaryWriter::finish`] writes the final chunk.
    pub fn binary_writer(&mut self) -> Result<BinaryWriter<'_, W>> {
        self.scalar_value()?;
        let chunk = self.config.binary_chunk();
        Ok(BinaryWriter {
            encoder: self,
            pending: Vec::with_capacity(chunk),
            chunk,
            finished: false,
        })
    }

    /// Copies `reader` to its end as one chunked binary value. Returns the
    /// number of bytes copied.
    pub fn write_byte_stream<R: Read>(&mut self, reader: &mut R) -> Result<u64> {
        self.scalar_value()?;
        let chunk = self.config.binary_chunk();
        let mut buf = vec![0u8; chunk];
        let mut total = 0u64;
        loop {
            let mut filled = 0;
            while filled < chunk {
                match reader.read(&mut buf[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            total += filled as u64;
            if filled < chunk {
                binary::write_chunk(&mut self.out, &buf[..filled], true)?;
                return Ok(total);
            }
            binary::write_chunk(&mut self.out, &buf, false)?;
        }
    }
}

/// `io::Write` adapter producing one chunked binary value.
///
/// Dropping the writer without [`finish`](BinaryWriter::finish) still closes
/// the value, but IO errors are lost then.
pub struct BinaryWriter<'a, W: Write> {
    encoder: &'a mut Encoder<W>,
    pending: Vec<u8>,
    chunk: usize,
    finished: bool,
}

impl<W: Write> BinaryWriter<'_, W> {
    fn emit(&mut self, last: bool) -> Result<()> {
        binary::write_chunk(&mut self.encoder.out, &self.pending, last)?;
        self.pending.clear();
        Ok(())
    }

    /// Writes the final chunk and closes the value.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.emit(true)
    }
}

impl<W: Write> Write for BinaryWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while !rest.is_empty() {
            let take = (self.chunk - self.pending.len()).min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.pending.len() == self.chunk {
                self.emit(false).map_err(to_io)?;
            }
        }
        Ok(buf.len())
    }

    /// Emits buffered bytes as a non-final chunk and flushes the sink.
    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            self.emit(false).map_err(to_io)?;
        }
        self.encoder.out.flush().map_err(to_io)
    }
}

impl<W: Write> Drop for BinaryWriter<'_, W> {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!("binary writer dropped without finish(), closing value");
            if let Err(e) = self.emit(true) {
                log::warn!("closing binary value failed: {e}");
            }
        }
    }
}

fn to_io(e: Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}
