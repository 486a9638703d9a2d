//! Double codec.
//!
//! Doubles holding an exact small integer use the zero/one literals or a
//! signed byte/short payload. Values that survive the "mill" scaling
//! (`0.001 * round(v * 1000) == v`) use a 4-byte payload. Everything else is
//! written as 8 IEEE-754 bytes.

use std::io::{Read, Write};

use crate::cursor::{InputCursor, OutputCursor};
use crate::tag;
use crate::Result;

/// Writes a double in its narrowest exact form.
///
/// Negative zero always uses the full form so its sign bit survives.
pub fn write_double<W: Write>(out: &mut OutputCursor<W>, value: f64) -> Result<()> {
    if value == 0.0 && value.is_sign_negative() {
        return write_full(out, value);
    }

    let int_value = value as i32;
    if f64::from(int_value) == value {
        if int_value == 0 {
            return out.write_byte(tag::DOUBLE_ZERO);
        }
        if int_value == 1 {
            return out.write_byte(tag::DOUBLE_ONE);
        }
        if (-0x80..0x80).contains(&int_value) {
            return out.write_bytes(&[tag::DOUBLE_BYTE, int_value as u8]);
        }
        if (-0x8000..0x8000).contains(&int_value) {
            return out.write_bytes(&[tag::DOUBLE_SHORT, (int_value >> 8) as u8, int_value as u8]);
        }
    }

    if let Some(mills) = mill_form(value) {
        let [b3, b2, b1, b0] = mills.to_be_bytes();
        return out.write_bytes(&[tag::DOUBLE_MILL, b3, b2, b1, b0]);
    }

    write_full(out, value)
}

fn write_full<W: Write>(out: &mut OutputCursor<W>, value: f64) -> Result<()> {
    let mut buf = [0u8; 9];
    buf[0] = tag::DOUBLE;
    buf[1..].copy_from_slice(&value.to_bits().to_be_bytes());
    out.write_bytes(&buf)
}

/// Tausendstel-Darstellung, falls sie den Wert exakt reproduziert.
fn mill_form(value: f64) -> Option<i32> {
    let scaled = (value * 1000.0).round();
    // NaN und Unendlich fallen hier heraus
    if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&scaled) {
        return None;
    }
    let mills = scaled as i32;
    (mill_value(mills) == value).then_some(mills)
}

/// Value of a mill payload. Lossy by construction.
#[inline]
pub fn mill_value(mills: i32) -> f64 {
    0.001 * f64::from(mills)
}

/// Decodes the payload of a double tag. Returns `None` if `tag` is not a double form.
pub fn decode_double<R: Read>(tag: u8, input: &mut InputCursor<R>) -> Result<Option<f64>> {
    let value = match tag {
        tag::DOUBLE_ZERO => 0.0,
        tag::DOUBLE_ONE => 1.0,
        tag::DOUBLE_BYTE => f64::from(input.read_u8("double")? as i8),
        tag::DOUBLE_SHORT => f64::from(i16::from_be_bytes(input.read_array::<2>("double")?)),
        tag::DOUBLE_MILL => mill_value(i32::from_be_bytes(input.read_array::<4>("double")?)),
        tag::DOUBLE => f64::from_bits(u64::from_be_bytes(input.read_array::<8>("double")?)),
        _ => return Ok(None),
    };
    Ok(Some(value))
}
