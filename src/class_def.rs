//! Class definitions and the per-session class-definition cache.
//!
//! An object schema is `(type name, ordered field names)`. The first instance
//! of a schema writes a `'C'` record and assigns the next sequential id;
//! further instances only reference that id.

use std::fmt;
use std::rc::Rc;

use crate::intern::Interner;
use crate::{Error, Result};

/// Shape of an object: type name plus field names in wire order.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClassDef {
    type_name: Rc<str>,
    fields: Vec<Rc<str>>,
}

impl ClassDef {
    /// Creates a class definition. An empty type name is rejected.
    pub fn new<I, S>(type_name: &str, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if type_name.is_empty() {
            return Err(Error::argument("class definition needs a non-empty type name"));
        }
        Ok(Self {
            type_name: type_name.into(),
            fields: fields.into_iter().map(|f| Rc::from(f.as_ref())).collect(),
        })
    }

    /// Interne Variante für bereits dekodierte Namen (Decoder prüft den Typ).
    pub(crate) fn from_parts(type_name: Rc<str>, fields: Vec<Rc<str>>) -> Self {
        Self { type_name, fields }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[Rc<str>] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Position of `name` in the field list.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| &**f == name)
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.type_name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(field)?;
        }
        f.write_str("}")
    }
}

/// Session-scoped class-definition cache, indexed by sequential id.
#[derive(Debug, Default)]
pub struct ClassDefTable {
    defs: Interner<ClassDef>,
}

impl ClassDefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder side: returns the id for `def` and whether it was new (in
    /// which case the caller must write the definition record).
    pub fn intern(&mut self, def: &Rc<ClassDef>) -> (usize, bool) {
        let (id, added) = self.defs.intern(Rc::clone(def));
        if added {
            log::debug!("class definition #{id}: {def:?}");
        }
        (id, added)
    }

    /// Decoder side: appends a definition read from the stream.
    pub fn push(&mut self, def: Rc<ClassDef>) -> usize {
        let id = self.defs.push(def);
        log::debug!("class definition #{id} read: {:?}", self.defs.get(id));
        id
    }

    /// Looks up a wire class reference read at `offset`.
    pub fn get(&self, index: i32, offset: u64) -> Result<&Rc<ClassDef>> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.defs.get(i))
            .ok_or(Error::InvalidClassReference {
                index,
                len: self.defs.len(),
                offset,
            })
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.len() == 0
    }

    pub fn clear(&mut self) {
        self.defs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, fields: &[&str]) -> Rc<ClassDef> {
        Rc::new(ClassDef::new(name, fields.iter().copied()).unwrap())
    }

    #[test]
    fn empty_type_name_is_rejected() {
        let err = ClassDef::new("", ["a"]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Argument);
    }

    #[test]
    fn same_shape_shares_an_id() {
        let mut table = ClassDefTable::new();
        assert_eq!(table.intern(&def("Point", &["x", "y"])), (0, true));
        assert_eq!(table.intern(&def("Point", &["x", "y"])), (0, false));
        assert_eq!(table.intern(&def("Point", &["x", "y", "z"])), (1, true));
        assert_eq!(table.intern(&def("Line", &["x", "y"])), (2, true));
    }

    #[test]
    fn out_of_range_reference_is_format_error() {
        let mut table = ClassDefTable::new();
        table.push(def("A", &[]));
        assert!(table.get(0, 0).is_ok());
        let err = table.get(1, 12).unwrap_err();
        assert_eq!(err, Error::InvalidClassReference { index: 1, len: 1, offset: 12 });
        assert!(table.get(-1, 0).unwrap_err().is_format());
    }

    #[test]
    fn field_lookup() {
        let d = def("Point", &["x", "y"]);
        assert_eq!(d.field_index("y"), Some(1));
        assert_eq!(d.field_index("z"), None);
        assert_eq!(format!("{d:?}"), "Point{x, y}");
    }
}
