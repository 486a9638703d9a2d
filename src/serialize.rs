//! Host-type classification for encoding.
//!
//! [`Serialize`] tells the encoder which wire kind a native value maps to and
//! writes it. Implementations exist for the Rust primitives, strings, byte
//! buffers, dates, sequences, maps and [`Value`] itself.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::BuildHasher;
use std::io::Write;

use indexmap::IndexMap;

use crate::datetime::Date;
use crate::encoder::Encoder;
use crate::value::{Kind, Value};
use crate::{Error, Result};

/// A native value the encoder can write.
pub trait Serialize {
    /// Wire kind this value is written as.
    fn kind(&self) -> Kind;

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()>;
}

/// Borrowed bytes written as a binary value (plain slices are lists).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bytes<'a>(pub &'a [u8]);

impl<T: Serialize + ?Sized> Serialize for &T {
    fn kind(&self) -> Kind {
        (**self).kind()
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        (**self).serialize(encoder)
    }
}

impl<T: Serialize + ?Sized> Serialize for Box<T> {
    fn kind(&self) -> Kind {
        (**self).kind()
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        (**self).serialize(encoder)
    }
}

impl Serialize for () {
    fn kind(&self) -> Kind {
        Kind::Null
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_null()
    }
}

impl Serialize for bool {
    fn kind(&self) -> Kind {
        Kind::Bool
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_bool(*self)
    }
}

macro_rules! impl_int {
    ($($t:ty),*) => {$(
        impl Serialize for $t {
            fn kind(&self) -> Kind {
                Kind::Int
            }

            fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
                encoder.write_int(i32::from(*self))
            }
        }
    )*};
}

macro_rules! impl_long {
    ($($t:ty),*) => {$(
        impl Serialize for $t {
            fn kind(&self) -> Kind {
                Kind::Long
            }

            fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
                let value = i64::try_from(*self).map_err(|_| {
                    Error::argument(format!("{} does not fit into a long", self))
                })?;
                encoder.write_long(value)
            }
        }
    )*};
}

impl_int!(i8, i16, i32, u8, u16);
impl_long!(i64, u32, u64, isize, usize);

impl Serialize for f32 {
    fn kind(&self) -> Kind {
        Kind::Double
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_double(f64::from(*self))
    }
}

impl Serialize for f64 {
    fn kind(&self) -> Kind {
        Kind::Double
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_double(*self)
    }
}

impl Serialize for str {
    fn kind(&self) -> Kind {
        Kind::String
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_string(self)
    }
}

impl Serialize for String {
    fn kind(&self) -> Kind {
        Kind::String
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_string(self)
    }
}

impl Serialize for char {
    fn kind(&self) -> Kind {
        Kind::String
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_string(self.encode_utf8(&mut [0; 4]))
    }
}

impl Serialize for Bytes<'_> {
    fn kind(&self) -> Kind {
        Kind::Binary
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_bytes(self.0)
    }
}

impl Serialize for Date {
    fn kind(&self) -> Kind {
        Kind::Date
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_date(self.millis())
    }
}

impl<T: Serialize> Serialize for Option<T> {
    fn kind(&self) -> Kind {
        self.as_ref().map_or(Kind::Null, Serialize::kind)
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        match self {
            Some(v) => v.serialize(encoder),
            None => encoder.write_null(),
        }
    }
}

/// Schreibt eine Sequenz als untypisierte Liste fester Länge.
fn write_seq<'a, W, T, I>(encoder: &mut Encoder<W>, len: usize, items: I) -> Result<()>
where
    W: Write,
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    encoder.write_list_begin(Some(len), None)?;
    for item in items {
        item.serialize(encoder)?;
    }
    encoder.write_list_end()
}

impl<T: Serialize> Serialize for [T] {
    fn kind(&self) -> Kind {
        Kind::List
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        write_seq(encoder, self.len(), self)
    }
}

impl<T: Serialize> Serialize for Vec<T> {
    fn kind(&self) -> Kind {
        Kind::List
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        write_seq(encoder, self.len(), self)
    }
}

impl<T: Serialize> Serialize for VecDeque<T> {
    fn kind(&self) -> Kind {
        Kind::List
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        write_seq(encoder, self.len(), self)
    }
}

/// Schreibt Paare als untypisierte Map.
fn write_pairs<'a, W, K, V, I>(encoder: &mut Encoder<W>, pairs: I) -> Result<()>
where
    W: Write,
    K: Serialize + 'a,
    V: Serialize + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    encoder.write_map_begin(None)?;
    for (k, v) in pairs {
        k.serialize(encoder)?;
        v.serialize(encoder)?;
    }
    encoder.write_map_end()
}

impl<K: Serialize, V: Serialize> Serialize for BTreeMap<K, V> {
    fn kind(&self) -> Kind {
        Kind::Map
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        write_pairs(encoder, self)
    }
}

impl<K: Serialize, V: Serialize, S: BuildHasher> Serialize for HashMap<K, V, S> {
    fn kind(&self) -> Kind {
        Kind::Map
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        write_pairs(encoder, self)
    }
}

impl<K: Serialize, V: Serialize, S: BuildHasher> Serialize for IndexMap<K, V, S> {
    fn kind(&self) -> Kind {
        Kind::Map
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        write_pairs(encoder, self)
    }
}

impl Serialize for Value {
    fn kind(&self) -> Kind {
        Value::kind(self)
    }

    fn serialize<W: Write>(&self, encoder: &mut Encoder<W>) -> Result<()> {
        encoder.write_value(self)
    }
}
