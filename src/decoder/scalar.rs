//! Typed scalar reads.
//!
//! Each read accepts the tags of its own kind plus the cross-kind forms the
//! Hessian readers have always tolerated: `read_int` takes any number (and
//! booleans, null and dates), `read_string` renders numbers and booleans as
//! text, and so on. Narrowing conversions truncate.

use std::io::Read;

use super::Decoder;
use crate::factory::ValueFactory;
use crate::{binary, datetime, float, integer, string, tag};
use crate::{Error, Result};

/// Ein numerischer Wert beliebiger Breite.
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i32),
    Long(i64),
    Double(f64),
}

impl Number {
    fn to_i32(self) -> i32 {
        match self {
            Self::Int(v) => v,
            Self::Long(v) => v as i32,
            Self::Double(v) => v as i32,
        }
    }

    fn to_i64(self) -> i64 {
        match self {
            Self::Int(v) => i64::from(v),
            Self::Long(v) => v,
            Self::Double(v) => v as i64,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Self::Int(v) => f64::from(v),
            Self::Long(v) => v as f64,
            Self::Double(v) => v,
        }
    }

    fn is_nonzero(self) -> bool {
        match self {
            Self::Int(v) => v != 0,
            Self::Long(v) => v != 0,
            Self::Double(v) => v != 0.0,
        }
    }

    fn to_text(self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Long(v) => v.to_string(),
            Self::Double(v) => format!("{v:?}"),
        }
    }
}

impl<R: Read, F: ValueFactory> Decoder<R, F> {
    /// Int-, Long- oder Double-Form; `None` ohne Bytes zu verbrauchen.
    fn read_number(&mut self, tag: u8) -> Result<Option<Number>> {
        if let Some(v) = integer::decode_int(tag, &mut self.input)? {
            return Ok(Some(Number::Int(v)));
        }
        if let Some(v) = integer::decode_long(tag, &mut self.input)? {
            return Ok(Some(Number::Long(v)));
        }
        Ok(float::decode_double(tag, &mut self.input)?.map(Number::Double))
    }

    /// Wie `read_number`, akzeptiert zusätzlich Datumswerte (Millisekunden).
    fn read_numeric(&mut self, tag: u8) -> Result<Option<Number>> {
        if let Some(n) = self.read_number(tag)? {
            return Ok(Some(n));
        }
        Ok(datetime::decode_date(tag, &mut self.input)?.map(Number::Long))
    }

    pub fn read_null(&mut self) -> Result<()> {
        match self.read_tag("null")? {
            tag::NULL => Ok(()),
            tag => Err(self.unexpected("null", tag)),
        }
    }

    /// Reads a boolean; numbers are `true` when non-zero, null is `false`.
    pub fn read_bool(&mut self) -> Result<bool> {
        let tag = self.read_tag("boolean")?;
        match tag {
            tag::TRUE => Ok(true),
            tag::FALSE | tag::NULL => Ok(false),
            _ => match self.read_number(tag)? {
                Some(n) => Ok(n.is_nonzero()),
                None => Err(self.unexpected("boolean", tag)),
            },
        }
    }

    /// Reads an int; longs and doubles are truncated.
    pub fn read_int(&mut self) -> Result<i32> {
        let tag = self.read_tag("int")?;
        match tag {
            tag::NULL | tag::FALSE => Ok(0),
            tag::TRUE => Ok(1),
            _ => match self.read_numeric(tag)? {
                Some(n) => Ok(n.to_i32()),
                None => Err(self.unexpected("int", tag)),
            },
        }
    }

    pub fn read_long(&mut self) -> Result<i64> {
        let tag = self.read_tag("long")?;
        match tag {
            tag::NULL | tag::FALSE => Ok(0),
            tag::TRUE => Ok(1),
            _ => match self.read_numeric(tag)? {
                Some(n) => Ok(n.to_i64()),
                None => Err(self.unexpected("long", tag)),
            },
        }
    }

    pub fn read_double(&mut self) -> Result<f64> {
        let tag = self.read_tag("double")?;
        match tag {
            tag::NULL | tag::FALSE => Ok(0.0),
            tag::TRUE => Ok(1.0),
            _ => match self.read_numeric(tag)? {
                Some(n) => Ok(n.to_f64()),
                None => Err(self.unexpected("double", tag)),
            },
        }
    }

    /// Reads a date as milliseconds since the Unix epoch.
    pub fn read_date(&mut self) -> Result<i64> {
        let tag = self.read_tag("date")?;
        match datetime::decode_date(tag, &mut self.input)? {
            Some(ms) => Ok(ms),
            None => Err(self.unexpected("date", tag)),
        }
    }

    /// Reads a string; `None` for null. Booleans and numbers are rendered as
    /// text.
    pub fn read_string(&mut self) -> Result<Option<String>> {
        let tag = self.read_tag("string")?;
        match tag {
            tag::NULL => return Ok(None),
            tag::TRUE => return Ok(Some("true".into())),
            tag::FALSE => return Ok(Some("false".into())),
            t if tag::is_string(t) => return self.read_string_body(t).map(Some),
            _ => {}
        }
        match self.read_number(tag)? {
            Some(n) => Ok(Some(n.to_text())),
            None => Err(self.unexpected("string", tag)),
        }
    }

    /// Reads a string as raw UTF-16 code units, without surrogate checks.
    pub fn read_string_units(&mut self) -> Result<Option<Vec<u16>>> {
        match self.read_tag("string")? {
            tag::NULL => Ok(None),
            t if tag::is_string(t) => self.read_units_body(t).map(Some),
            t => Err(self.unexpected("string", t)),
        }
    }

    /// Reads a binary value; `None` for null.
    pub fn read_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        match self.read_tag("binary")? {
            tag::NULL => Ok(None),
            t if tag::is_binary(t) => self.read_bytes_body(t).map(Some),
            t => Err(self.unexpected("binary", t)),
        }
    }

    // ========================================================================
    // Chunk-Rümpfe
    // ========================================================================

    pub(super) fn read_string_body(&mut self, tag: u8) -> Result<String> {
        let units = self.read_units_body(tag)?;
        String::from_utf16(&units).map_err(|_| Error::UnpairedSurrogate {
            offset: self.input.position(),
        })
    }

    /// Liest alle Chunks eines Strings ab dem ersten Header-Tag.
    fn read_units_body(&mut self, mut tag: u8) -> Result<Vec<u16>> {
        let mut units = Vec::new();
        loop {
            let Some((last, len)) = string::read_header(tag, &mut self.input)? else {
                return Err(self.unexpected("string chunk", tag));
            };
            self.check_length(units.len() + len)?;
            units.reserve(len);
            string::read_units(&mut self.input, len, &mut units)?;
            if last {
                return Ok(units);
            }
            tag = self.input.read_u8("string chunk")?;
        }
    }

    pub(super) fn read_bytes_body(&mut self, mut tag: u8) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        loop {
            let Some((last, len)) = binary::read_header(tag, &mut self.input)? else {
                return Err(self.unexpected("binary chunk", tag));
            };
            self.check_length(data.len() + len)?;
            let start = data.len();
            data.resize(start + len, 0);
            self.input.read_exact(&mut data[start..], "binary data")?;
            if last {
                return Ok(data);
            }
            tag = self.input.read_u8("binary chunk")?;
        }
    }
}
