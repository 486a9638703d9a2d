//! Lists, maps, objects and the recursive value writer.

use std::io::Write;
use std::rc::Rc;

use super::{wire_index, Encoder, Frame};
use crate::class_def::ClassDef;
use crate::value::Value;
use crate::{integer, string, tag};
use crate::{Error, Result};

impl<W: Write> Encoder<W> {
    /// Begins a list. `len = None` writes a variable-length list terminated
    /// by `'Z'`; a fixed length picks the compact direct form up to 7
    /// elements. Every begin must be matched by [`write_list_end`].
    ///
    /// [`write_list_end`]: Encoder::write_list_end
    pub fn write_list_begin(&mut self, len: Option<usize>, type_name: Option<&str>) -> Result<()> {
        check_type_name(type_name)?;
        let wire_len = len.map(|n| wire_index(n, "list length")).transpose()?;
        self.begin_value()?;
        self.take_ref_slot();
        match (len, wire_len, type_name) {
            (Some(n), _, Some(t)) if n <= tag::LIST_DIRECT_MAX => {
                self.out.write_byte(tag::LIST_DIRECT + n as u8)?;
                self.write_type(t)?;
            }
            (Some(n), _, None) if n <= tag::LIST_DIRECT_MAX => {
                self.out.write_byte(tag::LIST_DIRECT_UNTYPED + n as u8)?;
            }
            (_, Some(n), Some(t)) => {
                self.out.write_byte(tag::LIST_FIXED)?;
                self.write_type(t)?;
                integer::write_int(&mut self.out, n)?;
            }
            (_, Some(n), None) => {
                self.out.write_byte(tag::LIST_FIXED_UNTYPED)?;
                integer::write_int(&mut self.out, n)?;
            }
            (_, None, Some(t)) => {
                self.out.write_byte(tag::LIST_VARIABLE)?;
                self.write_type(t)?;
            }
            (_, None, None) => self.out.write_byte(tag::LIST_VARIABLE_UNTYPED)?,
        }
        self.frames.push(Frame::List { remaining: len });
        Ok(())
    }

    /// Closes the innermost list. A fixed-length list must be complete.
    pub fn write_list_end(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(Frame::List { remaining: None }) => {
                self.frames.pop();
                self.out.write_byte(tag::END)
            }
            Some(Frame::List { remaining: Some(0) }) => {
                self.frames.pop();
                Ok(())
            }
            Some(Frame::List { remaining: Some(n) }) => Err(Error::state(format!(
                "fixed-length list closed with {n} elements missing"
            ))),
            _ => Err(Error::state("write_list_end without an open list")),
        }
    }

    /// Begins a map (`'M' type` or untyped `'H'`). Keys and values are then
    /// written alternately.
    pub fn write_map_begin(&mut self, type_name: Option<&str>) -> Result<()> {
        check_type_name(type_name)?;
        self.begin_value()?;
        self.take_ref_slot();
        match type_name {
            Some(t) => {
                self.out.write_byte(tag::MAP)?;
                self.write_type(t)?;
            }
            None => self.out.write_byte(tag::MAP_UNTYPED)?,
        }
        self.frames.push(Frame::Map { pending_value: false });
        Ok(())
    }

    pub fn write_map_end(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Map { pending_value: false }) => {
                self.frames.pop();
                self.out.write_byte(tag::END)
            }
            Some(Frame::Map { pending_value: true }) => {
                Err(Error::state("map closed after a key without its value"))
            }
            _ => Err(Error::state("write_map_end without an open map")),
        }
    }

    /// Begins an object instance of `class`.
    ///
    /// The first instance of a class writes its definition record. Returns
    /// the class id. The field values follow in definition order.
    pub fn write_object_begin(&mut self, class: &Rc<ClassDef>) -> Result<usize> {
        if class.type_name().is_empty() {
            return Err(Error::argument("object class needs a non-empty type name"));
        }
        let field_count = wire_index(class.field_count(), "field count")?;
        self.begin_value()?;
        let (id, added) = self.classes.intern(class);
        if added {
            let chunk = self.config.string_chunk();
            self.out.write_byte(tag::CLASS_DEF)?;
            string::write_str(&mut self.out, class.type_name(), chunk)?;
            integer::write_int(&mut self.out, field_count)?;
            for field in class.fields() {
                string::write_str(&mut self.out, field, chunk)?;
            }
        }
        if id <= tag::OBJECT_DIRECT_MAX {
            self.out.write_byte(tag::OBJECT_DIRECT + id as u8)?;
        } else {
            self.out.write_byte(tag::OBJECT)?;
            integer::write_int(&mut self.out, wire_index(id, "class reference")?)?;
        }
        self.take_ref_slot();
        self.frames.push(Frame::Object {
            remaining: class.field_count(),
        });
        Ok(id)
    }

    /// Closes the innermost object; every field must have been written.
    pub fn write_object_end(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Object { remaining: 0 }) => {
                self.frames.pop();
                Ok(())
            }
            Some(Frame::Object { remaining }) => Err(Error::state(format!(
                "object closed with {remaining} fields missing"
            ))),
            _ => Err(Error::state("write_object_end without an open object")),
        }
    }

    /// Writes a value tree. Containers already written in this session
    /// become back-references, so shared and cyclic graphs round-trip.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.write_null(),
            Value::Bool(v) => self.write_bool(*v),
            Value::Int(v) => self.write_int(*v),
            Value::Long(v) => self.write_long(*v),
            Value::Double(v) => self.write_double(*v),
            Value::Date(v) => self.write_date(*v),
            Value::String(v) => self.write_string(v),
            Value::Binary(v) => self.write_bytes(v),
            Value::List(_) | Value::Map(_) | Value::Object(_) => self.write_container(value),
        }
    }

    /// Registriert den Container und schreibt ihn; bei Fehlern wird die
    /// Registrierung zurückgenommen.
    fn write_container(&mut self, value: &Value) -> Result<()> {
        if let Value::Object(obj) = value {
            let obj = obj.try_borrow().map_err(|_| borrowed())?;
            if obj.fields.len() != obj.class.field_count() {
                return Err(Error::argument(format!(
                    "object of class {} has {} values for {} fields",
                    obj.type_name(),
                    obj.fields.len(),
                    obj.class.field_count()
                )));
            }
        }
        if self.add_ref(value)? {
            return Ok(());
        }
        let result = match value {
            Value::List(list) => list.try_borrow().map_err(|_| borrowed()).and_then(|list| {
                self.write_list_begin(Some(list.items.len()), list.type_name.as_deref())?;
                for item in &list.items {
                    self.write_value(item)?;
                }
                self.write_list_end()
            }),
            Value::Map(map) => map.try_borrow().map_err(|_| borrowed()).and_then(|map| {
                self.write_map_begin(map.type_name.as_deref())?;
                for (k, v) in &map.entries {
                    self.write_value(k)?;
                    self.write_value(v)?;
                }
                self.write_map_end()
            }),
            Value::Object(obj) => obj.try_borrow().map_err(|_| borrowed()).and_then(|obj| {
                self.write_object_begin(&obj.class)?;
                for field in &obj.fields {
                    self.write_value(field)?;
                }
                self.write_object_end()
            }),
            _ => Ok(()),
        };
        if result.is_err() {
            self.release_claim(value);
        }
        result
    }

    /// Erstes Vorkommen: String, danach nur noch der Index.
    fn write_type(&mut self, name: &str) -> Result<()> {
        let (id, added) = self.types.intern(name);
        if added {
            string::write_str(&mut self.out, name, self.config.string_chunk())
        } else {
            integer::write_int(&mut self.out, wire_index(id, "type reference")?)
        }
    }
}

fn check_type_name(type_name: Option<&str>) -> Result<()> {
    match type_name {
        Some("") => Err(Error::argument("empty type name")),
        _ => Ok(()),
    }
}

fn borrowed() -> Error {
    Error::state("container is mutably borrowed while being written")
}
