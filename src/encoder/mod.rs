//! Hessian 2 Encoder
//!
//! Writes values in the most compact wire form. Session state (reference
//! ids, class definitions, type names) lives in the encoder and mirrors the
//! decoder's tables slot for slot.
//!
//! # Beispiel
//!
//! ```
//! use hessian2::encoder::Encoder;
//! use hessian2::Value;
//!
//! let mut enc = Encoder::new(Vec::new());
//! enc.write_value(&Value::list(vec![Value::Int(1), "two".into()])).unwrap();
//! let bytes = enc.into_inner().unwrap();
//! assert_eq!(bytes, [0x7a, 0x91, 0x03, b't', b'w', b'o']);
//! ```

mod composite;
mod config;
mod rpc;
mod stream;

#[cfg(test)]
mod tests;

use std::io::Write;

pub use config::EncoderConfig;
pub use stream::BinaryWriter;

use crate::class_def::ClassDefTable;
use crate::cursor::OutputCursor;
use crate::ref_table::{EncoderRefs, RefSlot};
use crate::serialize::Serialize;
use crate::type_table::TypeTable;
use crate::value::Value;
use crate::{binary, datetime, float, integer, string, tag};
use crate::{Error, Result};

/// Kodiert einen einzelnen Wert in einen neuen Puffer.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    encode_with_config(value, EncoderConfig::default())
}

/// Wie [`encode`], mit expliziter Konfiguration.
pub fn encode_with_config(value: &Value, config: EncoderConfig) -> Result<Vec<u8>> {
    let mut enc = Encoder::with_config(Vec::new(), config);
    enc.write_value(value)?;
    enc.into_inner()
}

// ============================================================================
// Container-Rahmen
// ============================================================================

/// Ein offener Container; prüft die Reihenfolge der begin/end-Aufrufe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// `remaining` ist `None` für Listen variabler Länge.
    List { remaining: Option<usize> },
    /// `pending_value`: Schlüssel geschrieben, Wert fehlt noch.
    Map { pending_value: bool },
    Object { remaining: usize },
}

/// Streaming Hessian 2 encoder over any [`Write`] sink.
pub struct Encoder<W: Write> {
    out: OutputCursor<W>,
    refs: EncoderRefs,
    classes: ClassDefTable,
    types: TypeTable,
    frames: Vec<Frame>,
    /// `add_ref` hat für den nächsten Container bereits einen Slot vergeben.
    ref_claimed: bool,
    config: EncoderConfig,
}

impl<W: Write> Encoder<W> {
    pub fn new(sink: W) -> Self {
        Self::with_config(sink, EncoderConfig::default())
    }

    pub fn with_config(sink: W, config: EncoderConfig) -> Self {
        Self {
            out: OutputCursor::with_capacity(sink, config.buffer_capacity),
            refs: EncoderRefs::new(),
            classes: ClassDefTable::new(),
            types: TypeTable::new(),
            frames: Vec::new(),
            ref_claimed: false,
            config,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Bytes produced so far, buffered or not.
    pub fn position(&self) -> u64 {
        self.out.position()
    }

    /// Nesting depth of open lists, maps and objects.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    // ========================================================================
    // Slot-Buchhaltung
    // ========================================================================

    /// Zählt einen Wert im innersten offenen Container.
    fn begin_value(&mut self) -> Result<()> {
        match self.frames.last_mut() {
            Some(Frame::List { remaining: Some(0) }) => {
                Err(Error::state("write past the end of a fixed-length list"))
            }
            Some(Frame::List { remaining: Some(n) }) => {
                *n -= 1;
                Ok(())
            }
            Some(Frame::Object { remaining: 0 }) => {
                Err(Error::state("object has no fields left to write"))
            }
            Some(Frame::Object { remaining }) => {
                *remaining -= 1;
                Ok(())
            }
            Some(Frame::Map { pending_value }) => {
                *pending_value = !*pending_value;
                Ok(())
            }
            Some(Frame::List { remaining: None }) | None => Ok(()),
        }
    }

    /// Wie `begin_value`, aber für Werte ohne Referenz-Slot.
    fn scalar_value(&mut self) -> Result<()> {
        if self.ref_claimed {
            return Err(Error::state("add_ref must be followed by the container it registered"));
        }
        self.begin_value()
    }

    /// Verbraucht den von `add_ref` vergebenen Slot oder reserviert einen neuen.
    fn take_ref_slot(&mut self) {
        if !std::mem::take(&mut self.ref_claimed) {
            self.refs.reserve();
        }
    }

    /// Rollback nach fehlgeschlagenem Schreiben: offener Slot wird
    /// zurückgegeben, ein schon belegter nur vergessen.
    fn release_claim(&mut self, value: &Value) {
        if std::mem::take(&mut self.ref_claimed) {
            self.refs.unclaim(value);
        } else {
            self.refs.remove(value);
        }
    }

    fn ensure_top_level(&self, what: &str) -> Result<()> {
        if self.frames.is_empty() && !self.ref_claimed {
            Ok(())
        } else {
            Err(Error::state(format!("{what} is only valid between top-level values")))
        }
    }

    // ========================================================================
    // Skalare
    // ========================================================================

    pub fn write_null(&mut self) -> Result<()> {
        self.scalar_value()?;
        self.out.write_byte(tag::NULL)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.scalar_value()?;
        self.out.write_byte(if value { tag::TRUE } else { tag::FALSE })
    }

    pub fn write_int(&mut self, value: i32) -> Result<()> {
        self.scalar_value()?;
        integer::write_int(&mut self.out, value)
    }

    pub fn write_long(&mut self, value: i64) -> Result<()> {
        self.scalar_value()?;
        integer::write_long(&mut self.out, value)
    }

    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.scalar_value()?;
        float::write_double(&mut self.out, value)
    }

    /// Writes a date given in milliseconds since the Unix epoch.
    pub fn write_date(&mut self, millis: i64) -> Result<()> {
        self.scalar_value()?;
        datetime::write_date(&mut self.out, millis)
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.scalar_value()?;
        string::write_str(&mut self.out, value, self.config.string_chunk())
    }

    /// Writes raw UTF-16 code units; unpaired surrogates are allowed.
    pub fn write_string_units(&mut self, units: &[u16]) -> Result<()> {
        self.scalar_value()?;
        string::write_units(&mut self.out, units, self.config.string_chunk())
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.scalar_value()?;
        binary::write_binary(&mut self.out, data, self.config.binary_chunk())
    }

    /// Writes any [`Serialize`] value.
    pub fn serialize<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    // ========================================================================
    // Referenzen
    // ========================================================================

    /// Registers `value` for back-referencing.
    ///
    /// Returns `true` if the value was already written in this session, in
    /// which case a back-reference has just been emitted and the caller must
    /// not write the value again. Otherwise the next container begun takes
    /// the freshly assigned id. Scalars are never registered.
    pub fn add_ref(&mut self, value: &Value) -> Result<bool> {
        if self.ref_claimed {
            return Err(Error::state("add_ref called twice without writing a container"));
        }
        if value.identity().is_none() {
            return Ok(false);
        }
        match self.refs.claim(value) {
            RefSlot::Seen(id) => {
                self.write_ref(id)?;
                Ok(true)
            }
            RefSlot::New(_) => {
                self.ref_claimed = true;
                Ok(false)
            }
        }
    }

    /// Reference id of a container written earlier in this session.
    pub fn get_ref(&self, value: &Value) -> Option<usize> {
        self.refs.get(value)
    }

    /// Forgets `value`; it will be written in full next time.
    pub fn remove_ref(&mut self, value: &Value) -> bool {
        self.refs.remove(value)
    }

    /// Transfers the reference id of `old` to `new`.
    pub fn replace_ref(&mut self, old: &Value, new: &Value) -> bool {
        self.refs.replace(old, new)
    }

    /// Writes a back-reference to slot `index`.
    pub fn write_ref(&mut self, index: usize) -> Result<()> {
        if index >= self.refs.len() {
            return Err(Error::argument(format!(
                "reference {index} not assigned, {} slots in use",
                self.refs.len()
            )));
        }
        self.begin_value()?;
        log::trace!("back-reference #{index}");
        self.out.write_byte(tag::REF)?;
        integer::write_int(&mut self.out, wire_index(index, "reference")?)
    }

    // ========================================================================
    // Sitzung
    // ========================================================================

    /// Clears the reference table only.
    pub fn reset_references(&mut self) {
        self.refs.clear();
        self.ref_claimed = false;
    }

    /// Clears references, class definitions and type names.
    pub fn reset(&mut self) {
        if !self.frames.is_empty() {
            log::warn!("encoder reset with {} open containers", self.frames.len());
            self.frames.clear();
        }
        self.reset_references();
        self.classes.clear();
        self.types.clear();
        log::debug!("encoder session reset");
    }

    /// Writes one top-level value as a self-contained packet and flushes.
    ///
    /// References are cleared first; class definitions persist across
    /// packets.
    pub fn write_streaming_value(&mut self, value: &Value) -> Result<()> {
        self.ensure_top_level("write_streaming_value")?;
        self.reset_references();
        self.out.begin_packet()?;
        self.write_value(value)?;
        self.out.end_packet()?;
        log::debug!("packet written, stream offset {}", self.out.position());
        self.out.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()
    }

    pub fn sink(&self) -> &W {
        self.out.get_ref()
    }

    /// Flushes and returns the sink.
    pub fn into_inner(self) -> Result<W> {
        if !self.frames.is_empty() {
            log::warn!("encoder closed with {} open containers", self.frames.len());
        }
        self.out.into_inner()
    }
}

/// Längen und IDs werden als i32 kodiert.
fn wire_index(n: usize, what: &'static str) -> Result<i32> {
    i32::try_from(n).map_err(|_| Error::argument(format!("{what} {n} does not fit into an int")))
}
