//! Hessian 2 Decoder
//!
//! A tag-dispatch state machine over a buffered [`InputCursor`]. Containers
//! are built through a [`ValueFactory`] and registered in the reference
//! table before their elements are read, so back-references (including
//! cyclic ones) resolve to the very container being filled.
//!
//! # Beispiel
//!
//! ```
//! use hessian2::decoder::Decoder;
//! use hessian2::Value;
//!
//! let bytes = [0x7a, 0x91, 0x03, b't', b'w', b'o'];
//! let mut dec = Decoder::new(&bytes[..]);
//! let value = dec.read_value().unwrap();
//! assert_eq!(value, Value::list(vec![Value::Int(1), "two".into()]));
//! ```

mod chunked;
mod composite;
mod rpc;
mod scalar;


use std::io::Read;

pub use chunked::BinaryStream;
pub use composite::ListStart;

use chunked::ChunkKind;

use crate::chunk::ChunkState;
use crate::class_def::ClassDefTable;
use crate::cursor::InputCursor;
use crate::factory::{DefaultFactory, ValueFactory};
use crate::options::DecoderOptions;
use crate::ref_table::RefTable;
use crate::type_table::TypeTable;
use crate::value::Value;
use crate::{datetime, float, integer, tag};
use crate::{Error, Result};

/// Länge der Wertbeschreibung in Fehlermeldungen.
const FOUND_MAX_LEN: usize = 64;

/// Dekodiert den ersten Wert aus `bytes`.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    Decoder::new(bytes).read_value()
}

/// Dekodiert alle Top-Level-Werte aus `bytes`.
pub fn decode_all(bytes: &[u8]) -> Result<Vec<Value>> {
    Decoder::new(bytes).values().collect()
}

/// Dekodiert eine Folge von Packets (Streaming-Modus).
pub fn decode_packets(bytes: &[u8]) -> Result<Vec<Value>> {
    let mut dec = Decoder::new(bytes);
    let mut values = Vec::new();
    while let Some(v) = dec.read_streaming_value()? {
        values.push(v);
    }
    Ok(values)
}

/// Streaming Hessian 2 decoder over any [`Read`] source.
pub struct Decoder<R, F = DefaultFactory> {
    input: InputCursor<R>,
    refs: RefTable,
    classes: ClassDefTable,
    types: TypeTable,
    chunk: ChunkState,
    chunk_kind: ChunkKind,
    factory: F,
    options: DecoderOptions,
    depth: usize,
    /// Verhindert rekursive Wertbeschreibungen beim Fehlerbau.
    describing: bool,
}

impl<R: Read> Decoder<R> {
    pub fn new(source: R) -> Self {
        Self::with_options(source, DecoderOptions::default())
    }

    pub fn with_options(source: R, options: DecoderOptions) -> Self {
        Self::with_factory(source, options, DefaultFactory)
    }
}

impl<R: Read, F: ValueFactory> Decoder<R, F> {
    /// Decoder that builds containers through `factory`.
    pub fn with_factory(source: R, options: DecoderOptions, factory: F) -> Self {
        Self {
            input: InputCursor::with_capacity(source, options.buffer_capacity),
            refs: RefTable::new(),
            classes: ClassDefTable::new(),
            types: TypeTable::new(),
            chunk: ChunkState::Idle,
            chunk_kind: ChunkKind::default(),
            factory,
            options,
            depth: 0,
            describing: false,
        }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// Absolute byte offset of the next unread byte.
    pub fn position(&self) -> u64 {
        self.input.position()
    }

    pub fn get_ref(&self) -> &R {
        self.input.get_ref()
    }

    /// Returns the source. Buffered but unread bytes are lost.
    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }

    // ========================================================================
    // Werte
    // ========================================================================

    /// Reads the next complete value.
    pub fn read_value(&mut self) -> Result<Value> {
        let mut tag = self.read_tag("value")?;
        while tag == tag::CLASS_DEF {
            self.read_class_def()?;
            tag = self.read_tag("object after class definition")?;
        }
        self.read_tagged(tag)
    }

    /// Reads the next top-level value, or `None` if the source is cleanly
    /// exhausted at this value boundary.
    pub fn read_next(&mut self) -> Result<Option<Value>> {
        if self.chunk.is_idle() && self.input.peek_byte()?.is_none() {
            return Ok(None);
        }
        self.read_value().map(Some)
    }

    /// Iterator over the remaining top-level values.
    pub fn values(&mut self) -> Values<'_, R, F> {
        Values { decoder: self, done: false }
    }

    /// Reads one packet-framed value; `None` on a clean end of stream at a
    /// packet boundary. Clears the reference table first; class definitions
    /// persist across packets.
    pub fn read_streaming_value(&mut self) -> Result<Option<Value>> {
        if !self.input.begin_packet()? {
            return Ok(None);
        }
        self.reset_references();
        let value = self.read_value()?;
        self.input.end_packet()?;
        Ok(Some(value))
    }

    fn read_tagged(&mut self, tag: u8) -> Result<Value> {
        if let Some(v) = integer::decode_int(tag, &mut self.input)? {
            return Ok(Value::Int(v));
        }
        if let Some(v) = integer::decode_long(tag, &mut self.input)? {
            return Ok(Value::Long(v));
        }
        if let Some(v) = float::decode_double(tag, &mut self.input)? {
            return Ok(Value::Double(v));
        }
        if let Some(v) = datetime::decode_date(tag, &mut self.input)? {
            return Ok(Value::Date(v));
        }
        match tag {
            tag::NULL => Ok(Value::Null),
            tag::TRUE => Ok(Value::Bool(true)),
            tag::FALSE => Ok(Value::Bool(false)),
            t if tag::is_string(t) => self.read_string_body(t).map(Value::String),
            t if tag::is_binary(t) => self.read_bytes_body(t).map(Value::Binary),
            tag::LIST_VARIABLE
            | tag::LIST_FIXED
            | tag::LIST_VARIABLE_UNTYPED
            | tag::LIST_FIXED_UNTYPED
            | 0x70..=0x7f => self.read_list(tag),
            tag::MAP | tag::MAP_UNTYPED => self.read_map(tag),
            tag::OBJECT | 0x60..=0x6f => self.read_object(tag),
            tag::REF => {
                let offset = self.input.position().saturating_sub(1);
                let index = self.read_int()?;
                log::trace!("back-reference #{index}");
                self.refs.get(index, offset).cloned()
            }
            _ => Err(self.unexpected("value", tag)),
        }
    }

    // ========================================================================
    // Hilfsfunktionen
    // ========================================================================

    /// Liest ein Tag; kein Chunk-Wert darf mehr offen sein.
    fn read_tag(&mut self, expected: &'static str) -> Result<u8> {
        if !self.chunk.is_idle() {
            return Err(Error::state("a chunked string or binary value is still open"));
        }
        self.input.read_u8(expected)
    }

    /// Baut einen `UnexpectedTag` Fehler für das gerade gelesene Tag.
    ///
    /// Versucht den gefundenen Wert zu dekodieren, damit die Meldung zeigt,
    /// was tatsächlich im Stream stand.
    fn unexpected(&mut self, expected: &'static str, tag: u8) -> Error {
        let offset = self.input.position().saturating_sub(1);
        let context = self.input.debug_context();
        let found = self.describe_found(tag);
        Error::UnexpectedTag {
            expected: expected.into(),
            tag,
            offset,
            found,
            context,
        }
    }

    fn describe_found(&mut self, tag: u8) -> String {
        if self.describing
            || tag == tag::END
            || tag::describe(tag) == "unknown"
            || self.input.unread().is_err()
        {
            return String::new();
        }
        self.describing = true;
        let saved = std::mem::take(&mut self.chunk);
        let found = match self.read_value() {
            Ok(v) => {
                let mut text = format!("{} {v:?}", v.kind());
                if text.len() > FOUND_MAX_LEN {
                    let mut end = FOUND_MAX_LEN;
                    while !text.is_char_boundary(end) {
                        end -= 1;
                    }
                    text.truncate(end);
                    text.push_str("...");
                }
                text
            }
            Err(_) => tag::describe(tag).to_string(),
        };
        self.chunk = saved;
        self.describing = false;
        found
    }

    /// Führt `f` eine Verschachtelungsebene tiefer aus.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.options.max_depth {
            return Err(Error::DepthLimitExceeded {
                max: self.options.max_depth,
                offset: self.input.position(),
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn check_length(&self, length: usize) -> Result<()> {
        match self.options.max_length {
            Some(max) if length > max => Err(Error::LengthLimitExceeded {
                length: length as u64,
                max,
                offset: self.input.position(),
            }),
            _ => Ok(()),
        }
    }

    // ========================================================================
    // Sitzung
    // ========================================================================

    /// Clears the reference table only.
    pub fn reset_references(&mut self) {
        self.refs.clear();
    }

    /// Clears references, class definitions and type names.
    pub fn reset(&mut self) {
        self.reset_references();
        self.classes.clear();
        self.types.clear();
        self.chunk = ChunkState::Idle;
        log::debug!("decoder session reset");
    }

    /// Discards the read buffer; fails while buffered bytes are unread.
    pub fn reset_buffer(&mut self) -> Result<()> {
        self.input.reset_buffer()
    }

    /// Number of reference slots in use.
    pub fn ref_count(&self) -> usize {
        self.refs.len()
    }

    /// Overwrites reference slot `index`, e.g. to substitute a resolved
    /// proxy for a placeholder.
    pub fn set_ref(&mut self, index: usize, value: Value) -> Result<()> {
        self.refs.set(index, value, self.input.position())
    }
}

/// Iterator returned by [`Decoder::values`].
pub struct Values<'a, R, F> {
    decoder: &'a mut Decoder<R, F>,
    done: bool,
}

impl<R: Read, F: ValueFactory> Iterator for Values<'_, R, F> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decoder.read_next() {
            Ok(Some(v)) => Some(Ok(v)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
