//! Buffered byte cursors over `std::io` sources and sinks.
//!
//! [`InputCursor`] keeps a fixed working buffer: bytes in `[0, offset)` are
//! consumed, `[offset, length)` are buffered but unread. On underrun the unread
//! tail is compacted to the front and the buffer is refilled from the source.
//! [`OutputCursor`] accumulates writes and flushes them to the sink whenever
//! the buffer is full, or on an explicit [`OutputCursor::flush`].
//!
//! Both cursors optionally run in packet mode (see [`crate::packet`]): the
//! input side then stops at the end of the current packet, the output side
//! emits every flushed buffer as one packet chunk.

use std::io::{self, Read, Write};

use crate::packet::{self, ChunkHeader};
use crate::{Error, Result};

/// Default capacity of the decoder's working buffer.
pub const DEFAULT_INPUT_CAPACITY: usize = 256;
/// Default capacity of the encoder's working buffer.
pub const DEFAULT_OUTPUT_CAPACITY: usize = 4096;
/// Kleinste erlaubte Puffergröße (Tag + 8 Byte Payload müssen passen).
const MIN_CAPACITY: usize = 16;
/// Bytes vor/nach der Fehlerposition in `debug_context()`.
const CONTEXT_WINDOW: usize = 16;

/// Zustand eines geöffneten Packets auf der Leseseite.
#[derive(Debug, Clone, Copy)]
struct PacketRead {
    /// Noch unverbrauchte Payload-Bytes des aktuellen Chunks.
    remaining: usize,
    /// Terminal-Chunk (Länge 0) wurde gelesen.
    done: bool,
}

/// Buffered reader with single-byte pushback.
pub struct InputCursor<R> {
    source: R,
    buf: Box<[u8]>,
    offset: usize,
    length: usize,
    /// Absolute Stream-Position von `buf[0]`.
    base: u64,
    /// `unread()` ist nur direkt nach einem Payload-Byte erlaubt.
    can_unread: bool,
    packet: Option<PacketRead>,
}

impl<R: Read> InputCursor<R> {
    /// Creates a cursor with the default 256-byte buffer.
    pub fn new(source: R) -> Self {
        Self::with_capacity(source, DEFAULT_INPUT_CAPACITY)
    }

    /// Creates a cursor with a working buffer of `capacity` bytes (at least 16).
    pub fn with_capacity(source: R, capacity: usize) -> Self {
        Self {
            source,
            buf: vec![0u8; capacity.max(MIN_CAPACITY)].into_boxed_slice(),
            offset: 0,
            length: 0,
            base: 0,
            can_unread: false,
            packet: None,
        }
    }

    /// Absolute number of bytes consumed from the source so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.base + self.offset as u64
    }

    /// Kompaktiert den ungelesenen Rest nach vorne und liest nach.
    ///
    /// Gibt `false` zurück wenn die Quelle 0 Bytes liefert (EOF).
    fn fill(&mut self) -> Result<bool> {
        if self.offset > 0 {
            self.buf.copy_within(self.offset..self.length, 0);
            self.base += self.offset as u64;
            self.length -= self.offset;
            self.offset = 0;
            self.can_unread = false;
        }
        if self.length == self.buf.len() {
            return Ok(true);
        }
        loop {
            match self.source.read(&mut self.buf[self.length..]) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.length += n;
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(Error::end_of_stream("more input", self.base + self.length as u64));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Liest ein Byte ohne Packet-Logik.
    #[inline]
    fn raw_read_byte(&mut self) -> Result<Option<u8>> {
        if self.offset >= self.length && !self.fill()? {
            return Ok(None);
        }
        let b = self.buf[self.offset];
        self.offset += 1;
        Ok(Some(b))
    }

    /// Stellt sicher, dass im aktuellen Packet-Chunk Payload verfügbar ist.
    ///
    /// Liefert die Anzahl verfügbarer Bytes (`usize::MAX` außerhalb von
    /// Packets, 0 am Packet-Ende).
    fn packet_available(&mut self) -> Result<usize> {
        loop {
            let Some(state) = self.packet else {
                return Ok(usize::MAX);
            };
            if state.remaining > 0 {
                return Ok(state.remaining);
            }
            if state.done {
                return Ok(0);
            }
            let length = self.read_packet_header()?;
            self.packet = Some(PacketRead {
                remaining: length,
                done: length == 0,
            });
        }
    }

    fn read_packet_header(&mut self) -> Result<usize> {
        self.can_unread = false;
        let offset = self.position();
        let length = packet::read_chunk_length(offset, || {
            let pos = self.position();
            self.raw_read_byte()?
                .ok_or_else(|| Error::end_of_stream("packet header", pos))
        })?;
        log::trace!("packet chunk of {length} bytes at offset {offset}");
        Ok(length)
    }

    #[inline]
    fn consume_packet(&mut self, n: usize) {
        if let Some(state) = self.packet.as_mut() {
            state.remaining -= n;
        }
    }

    /// Reads one byte. `Ok(None)` signals a clean end of the source (or of
    /// the current packet).
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.packet.is_some() && self.packet_available()? == 0 {
            return Ok(None);
        }
        let pos = self.position();
        match self.raw_read_byte()? {
            Some(b) => {
                self.consume_packet(1);
                self.can_unread = true;
                Ok(Some(b))
            }
            None if self.packet.is_some() => Err(Error::end_of_stream("packet payload", pos)),
            None => Ok(None),
        }
    }

    /// Reads one byte that must be present.
    #[inline]
    pub fn read_u8(&mut self, expected: &'static str) -> Result<u8> {
        let pos = self.position();
        self.read_byte()?.ok_or_else(|| Error::end_of_stream(expected, pos))
    }

    /// Reads exactly `N` bytes (a fixed-width big-endian field).
    pub fn read_array<const N: usize>(&mut self, expected: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        self.read_exact(&mut out, expected)?;
        Ok(out)
    }

    /// Fills `out` completely or fails with an end-of-stream error.
    pub fn read_exact(&mut self, out: &mut [u8], expected: &'static str) -> Result<()> {
        let n = self.read_bytes(out)?;
        if n < out.len() {
            return Err(Error::end_of_stream(expected, self.position()));
        }
        Ok(())
    }

    /// Reads up to `out.len()` bytes, crossing buffer refills as needed.
    ///
    /// Returns fewer bytes only at the end of the source or packet.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> Result<usize> {
        let mut done = 0;
        while done < out.len() {
            let available = self.fill_buf()?;
            if available.is_empty() {
                break;
            }
            let n = available.len().min(out.len() - done);
            out[done..done + n].copy_from_slice(&available[..n]);
            self.consume(n);
            done += n;
        }
        Ok(done)
    }

    /// Returns the buffered unread bytes, refilling when empty.
    ///
    /// In packet mode the slice never extends past the current chunk. An
    /// empty slice means end of source or packet.
    pub fn fill_buf(&mut self) -> Result<&[u8]> {
        let limit = self.packet_available()?;
        if limit == 0 {
            return Ok(&[]);
        }
        if self.offset >= self.length && !self.fill()? {
            if self.packet.is_some() {
                return Err(Error::end_of_stream("packet payload", self.position()));
            }
            return Ok(&[]);
        }
        let end = self.length.min(self.offset.saturating_add(limit));
        Ok(&self.buf[self.offset..end])
    }

    /// Marks `n` bytes returned by [`fill_buf`](Self::fill_buf) as consumed.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(self.offset + n <= self.length, "consume past buffered data");
        self.offset += n;
        self.consume_packet(n);
        self.can_unread = n > 0;
    }

    /// Peeks at the next byte without consuming it.
    pub fn peek_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.fill_buf()?.first().copied())
    }

    /// Pushes the most recently read byte back.
    ///
    /// Only one byte of pushback is supported, and never across a refill or
    /// a packet chunk header.
    pub fn unread(&mut self) -> Result<()> {
        if !self.can_unread || self.offset == 0 {
            return Err(Error::state("unread past start of buffer"));
        }
        self.offset -= 1;
        if let Some(state) = self.packet.as_mut() {
            state.remaining += 1;
        }
        self.can_unread = false;
        Ok(())
    }

    /// Discards the working buffer, e.g. before handing the source to
    /// another reader. Fails while buffered bytes are still unread.
    pub fn reset_buffer(&mut self) -> Result<()> {
        if self.offset != self.length {
            return Err(Error::state(format!(
                "buffer reset with {} unread bytes",
                self.length - self.offset
            )));
        }
        self.base += self.offset as u64;
        self.offset = 0;
        self.length = 0;
        self.can_unread = false;
        Ok(())
    }

    /// Opens a packet. Returns `false` if the source is cleanly exhausted.
    pub fn begin_packet(&mut self) -> Result<bool> {
        if self.packet.is_some() {
            return Err(Error::state("packet already open"));
        }
        let offset = self.position();
        let Some(first) = self.raw_read_byte()? else {
            return Ok(false);
        };
        let mut first = Some(first);
        let length = packet::read_chunk_length(offset, || {
            if let Some(b) = first.take() {
                return Ok(b);
            }
            let pos = self.position();
            self.raw_read_byte()?
                .ok_or_else(|| Error::end_of_stream("packet header", pos))
        })?;
        log::debug!("packet start at offset {offset}, first chunk {length} bytes");
        self.can_unread = false;
        self.packet = Some(PacketRead {
            remaining: length,
            done: length == 0,
        });
        Ok(true)
    }

    /// Closes the current packet. Any unread payload is a format error.
    pub fn end_packet(&mut self) -> Result<()> {
        if self.packet.is_none() {
            return Err(Error::state("no packet open"));
        }
        if self.packet_available()? != 0 {
            return Err(Error::packet(self.position(), "trailing payload after value"));
        }
        self.packet = None;
        self.can_unread = false;
        log::debug!("packet end at offset {}", self.position());
        Ok(())
    }

    /// Renders the buffer around the last consumed byte as `[before] X [after]`.
    pub fn debug_context(&self) -> String {
        let at = self.offset.saturating_sub(1);
        let start = at.saturating_sub(CONTEXT_WINDOW);
        let end = self.length.min(at + 1 + CONTEXT_WINDOW);
        let mut out = String::with_capacity(4 * (end - start) + 6);
        out.push('[');
        render_bytes(&mut out, &self.buf[start..at]);
        out.push_str("] ");
        if at < self.length {
            render_bytes(&mut out, &self.buf[at..at + 1]);
        }
        out.push_str(" [");
        if at < self.length {
            render_bytes(&mut out, &self.buf[at + 1..end]);
        }
        out.push(']');
        out
    }

    /// Borrows the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Returns the underlying source. Buffered unread bytes are lost.
    pub fn into_inner(self) -> R {
        self.source
    }
}

/// Druckbare ASCII-Zeichen direkt, alles andere als `\xNN`.
fn render_bytes(out: &mut String, bytes: &[u8]) {
    use std::fmt::Write as _;
    for &b in bytes {
        if b.is_ascii_graphic() || b == b' ' {
            out.push(b as char);
        } else {
            let _ = write!(out, "\\x{b:02x}");
        }
    }
}

/// Buffered writer that flushes when its working buffer is full.
pub struct OutputCursor<W: Write> {
    sink: W,
    buf: Vec<u8>,
    capacity: usize,
    /// Bereits an den Sink übergebene Payload-Bytes.
    flushed: u64,
    packet: bool,
}

impl<W: Write> OutputCursor<W> {
    /// Creates a cursor with the default 4096-byte buffer.
    pub fn new(sink: W) -> Self {
        Self::with_capacity(sink, DEFAULT_OUTPUT_CAPACITY)
    }

    /// Creates a cursor with a working buffer of `capacity` bytes (at least 16).
    pub fn with_capacity(sink: W, capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        Self {
            sink,
            buf: Vec::with_capacity(capacity),
            capacity,
            flushed: 0,
            packet: false,
        }
    }

    /// Payload bytes written so far, flushed or not (packet headers excluded).
    pub fn position(&self) -> u64 {
        self.flushed + self.buf.len() as u64
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) -> Result<()> {
        if self.buf.len() >= self.capacity {
            self.flush_buffer()?;
        }
        self.buf.push(b);
        Ok(())
    }

    /// Appends `bytes`, flushing as often as the buffer fills up.
    pub fn write_bytes(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            if self.buf.len() >= self.capacity {
                self.flush_buffer()?;
            }
            let n = (self.capacity - self.buf.len()).min(bytes.len());
            self.buf.extend_from_slice(&bytes[..n]);
            bytes = &bytes[n..];
        }
        Ok(())
    }

    /// Übergibt den Pufferinhalt an den Sink (im Packet-Modus als ein Chunk).
    fn flush_buffer(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        if self.packet {
            self.sink.write_all(ChunkHeader::new(self.buf.len()).as_bytes())?;
        }
        self.sink.write_all(&self.buf)?;
        self.flushed += self.buf.len() as u64;
        self.buf.clear();
        Ok(())
    }

    /// Pushes all buffered bytes to the sink and flushes the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_buffer()?;
        self.sink.flush()?;
        Ok(())
    }

    /// Starts a packet: everything written until [`end_packet`](Self::end_packet)
    /// is emitted as length-prefixed chunks.
    pub fn begin_packet(&mut self) -> Result<()> {
        if self.packet {
            return Err(Error::state("packet already open"));
        }
        self.flush_buffer()?;
        self.packet = true;
        Ok(())
    }

    /// Emits the buffered tail as the last chunk and writes the terminator.
    pub fn end_packet(&mut self) -> Result<()> {
        if !self.packet {
            return Err(Error::state("no packet open"));
        }
        self.flush_buffer()?;
        self.sink.write_all(&packet::TERMINATOR)?;
        self.packet = false;
        Ok(())
    }

    /// `true` while a packet is open.
    pub fn in_packet(&self) -> bool {
        self.packet
    }

    /// Borrows the underlying sink. Buffered bytes are not yet visible there.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Flushes and returns the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.sink)
    }
}
