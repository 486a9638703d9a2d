//! Lists, maps, objects, class definitions and type annotations.

use std::io::Read;
use std::rc::Rc;

use super::Decoder;
use crate::factory::{ValueFactory, MAX_PREALLOC};
use crate::value::Value;
use crate::tag;
use crate::{Error, Result};

/// Header of a list opened with [`Decoder::read_list_start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListStart {
    pub type_name: Option<Rc<str>>,
    /// `None` for a variable-length list terminated by `'Z'`.
    pub len: Option<usize>,
}

impl<R: Read, F: ValueFactory> Decoder<R, F> {
    /// Parses the header that follows a list tag.
    fn list_header(&mut self, tag: u8) -> Result<ListStart> {
        let (type_name, len) = match tag {
            tag::LIST_VARIABLE => (self.read_type_annotation()?, None),
            tag::LIST_FIXED => {
                let t = self.read_type_annotation()?;
                (t, Some(self.read_length()?))
            }
            tag::LIST_VARIABLE_UNTYPED => (None, None),
            tag::LIST_FIXED_UNTYPED => (None, Some(self.read_length()?)),
            0x70..=0x77 => (self.read_type_annotation()?, Some(usize::from(tag - tag::LIST_DIRECT))),
            0x78..=0x7f => (None, Some(usize::from(tag - tag::LIST_DIRECT_UNTYPED))),
            _ => return Err(self.unexpected("list", tag)),
        };
        Ok(ListStart { type_name, len })
    }

    pub(super) fn read_list(&mut self, tag: u8) -> Result<Value> {
        let ListStart { type_name, len } = self.list_header(tag)?;
        self.nested(|d| {
            let list = d.factory.list(type_name, len)?;
            let value = Value::List(Rc::clone(&list));
            d.refs.push(value.clone());
            match len {
                Some(n) => {
                    for _ in 0..n {
                        let item = d.read_value()?;
                        list.borrow_mut().items.push(item);
                    }
                }
                None => {
                    while !d.is_end()? {
                        let item = d.read_value()?;
                        list.borrow_mut().items.push(item);
                    }
                    d.read_end()?;
                }
            }
            Ok(value)
        })
    }

    pub(super) fn read_map(&mut self, tag: u8) -> Result<Value> {
        let type_name = match tag {
            tag::MAP => self.read_type_annotation()?,
            _ => None,
        };
        self.nested(|d| {
            let map = d.factory.map(type_name)?;
            let value = Value::Map(Rc::clone(&map));
            d.refs.push(value.clone());
            while !d.is_end()? {
                let key = d.read_value()?;
                let val = d.read_value()?;
                map.borrow_mut().entries.push((key, val));
            }
            d.read_end()?;
            Ok(value)
        })
    }

    pub(super) fn read_object(&mut self, tag: u8) -> Result<Value> {
        let offset = self.input.position().saturating_sub(1);
        let index = match tag {
            tag::OBJECT => self.read_int()?,
            _ => i32::from(tag - tag::OBJECT_DIRECT),
        };
        let class = Rc::clone(self.classes.get(index, offset)?);
        self.nested(|d| {
            let obj = d.factory.object(&class)?;
            let value = Value::Object(Rc::clone(&obj));
            d.refs.push(value.clone());
            for i in 0..class.field_count() {
                let field = d.read_value()?;
                let mut obj = obj.borrow_mut();
                match obj.fields.get_mut(i) {
                    Some(slot) => *slot = field,
                    None => obj.fields.push(field),
                }
            }
            Ok(value)
        })
    }

    /// `'C'` Record: Typname, Feldanzahl, Feldnamen.
    pub(super) fn read_class_def(&mut self) -> Result<()> {
        let offset = self.input.position();
        let type_name: Rc<str> = match self.read_string()? {
            Some(name) if !name.is_empty() => name.into(),
            _ => return Err(Error::InvalidClassDefinition { offset }),
        };
        let count = self.read_length()?;
        let mut fields = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            fields.push(Rc::from(self.read_string()?.unwrap_or_default()));
        }
        let def = self.factory.resolve(type_name, fields)?;
        self.classes.push(def);
        Ok(())
    }

    /// Reads a list or map type annotation: a string the first time, an
    /// int index into the type table afterwards.
    pub fn read_type(&mut self) -> Result<Rc<str>> {
        let tag = self.read_tag("type")?;
        if tag::is_string(tag) {
            let name: Rc<str> = self.read_string_body(tag)?.into();
            let id = self.types.push(Rc::clone(&name));
            log::debug!("type name #{id} read: {name}");
            return Ok(name);
        }
        self.input.unread()?;
        let offset = self.input.position();
        let index = self.read_int()?;
        self.types.get(index, offset).cloned()
    }

    /// Wie [`read_type`](Decoder::read_type); ein leerer Name zählt als
    /// untypisiert, belegt aber seinen Slot in der Typtabelle.
    fn read_type_annotation(&mut self) -> Result<Option<Rc<str>>> {
        let name = self.read_type()?;
        Ok((!name.is_empty()).then_some(name))
    }

    /// Nicht-negative Länge, gegen `max_length` geprüft.
    pub(super) fn read_length(&mut self) -> Result<usize> {
        let offset = self.input.position();
        let n = self.read_int()?;
        let len = usize::try_from(n).map_err(|_| Error::InvalidLength {
            length: i64::from(n),
            offset,
        })?;
        self.check_length(len)?;
        Ok(len)
    }

    // ========================================================================
    // Streaming-Zugriff auf Container
    // ========================================================================

    /// Opens a list without materializing it; read the elements with the
    /// typed reads, then [`read_list_end`] for a variable-length list.
    ///
    /// The list takes a reference slot, so later back-references stay
    /// aligned; that slot holds an empty placeholder list.
    ///
    /// [`read_list_end`]: Decoder::read_list_end
    pub fn read_list_start(&mut self) -> Result<ListStart> {
        let tag = self.read_tag("list")?;
        let start = self.list_header(tag)?;
        let shell = self.factory.list(start.type_name.clone(), Some(0))?;
        self.refs.push(Value::List(shell));
        Ok(start)
    }

    /// Opens a map without materializing it and returns its type; pairs
    /// follow until [`is_end`](Decoder::is_end).
    pub fn read_map_start(&mut self) -> Result<Option<Rc<str>>> {
        let type_name = match self.read_tag("map")? {
            tag::MAP => self.read_type_annotation()?,
            tag::MAP_UNTYPED => None,
            t => return Err(self.unexpected("map", t)),
        };
        let shell = self.factory.map(type_name.clone())?;
        self.refs.push(Value::Map(shell));
        Ok(type_name)
    }

    /// `true` if the next byte is the `'Z'` terminator or the source is
    /// exhausted. Consumes nothing.
    pub fn is_end(&mut self) -> Result<bool> {
        Ok(matches!(self.input.peek_byte()?, None | Some(tag::END)))
    }

    /// Consumes the `'Z'` terminator.
    pub fn read_end(&mut self) -> Result<()> {
        match self.read_tag("end of list or map")? {
            tag::END => Ok(()),
            t => Err(self.unexpected("end of list or map", t)),
        }
    }

    pub fn read_list_end(&mut self) -> Result<()> {
        match self.read_tag("end of list")? {
            tag::END => Ok(()),
            t => Err(self.unexpected("end of list", t)),
        }
    }

    pub fn read_map_end(&mut self) -> Result<()> {
        match self.read_tag("end of map")? {
            tag::END => Ok(()),
            t => Err(self.unexpected("end of map", t)),
        }
    }
}
