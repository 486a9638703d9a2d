//! Construction boundary between the decoder and the host's value model.
//!
//! The decoder never builds containers itself: it asks a [`ValueFactory`]
//! for an empty shell, registers the shell in the reference table and only
//! then reads the elements into it. A back-reference to a container that is
//! still being filled therefore resolves to the same shell, which is how
//! cyclic graphs are reconstructed.

use std::cell::RefCell;
use std::rc::Rc;

use crate::class_def::ClassDef;
use crate::value::{List, ListRef, Map, MapRef, Object, ObjectRef};
use crate::Result;

/// Obergrenze für Vorab-Allokation aus (unvertrauenswürdigen) Längenangaben.
pub const MAX_PREALLOC: usize = 1024;

/// Creates the native containers the decoder fills.
pub trait ValueFactory {
    /// Resolves a class definition read from the stream to a schema handle.
    ///
    /// Called once per `'C'` record. Implementations may share handles across
    /// sessions or reject unknown types with an error.
    fn resolve(&mut self, type_name: Rc<str>, fields: Vec<Rc<str>>) -> Result<Rc<ClassDef>> {
        Ok(Rc::new(ClassDef::from_parts(type_name, fields)))
    }

    /// An empty list; `len` is the declared length of a fixed-length list.
    fn list(&mut self, type_name: Option<Rc<str>>, len: Option<usize>) -> Result<ListRef>;

    /// An empty map.
    fn map(&mut self, type_name: Option<Rc<str>>) -> Result<MapRef>;

    /// An object of `class` with every field set to `Null`.
    fn object(&mut self, class: &Rc<ClassDef>) -> Result<ObjectRef>;
}

/// Builds plain [`Value`](crate::Value) containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory;

impl ValueFactory for DefaultFactory {
    fn list(&mut self, type_name: Option<Rc<str>>, len: Option<usize>) -> Result<ListRef> {
        let items = Vec::with_capacity(len.unwrap_or(0).min(MAX_PREALLOC));
        Ok(Rc::new(RefCell::new(List { type_name, items })))
    }

    fn map(&mut self, type_name: Option<Rc<str>>) -> Result<MapRef> {
        Ok(Rc::new(RefCell::new(Map {
            type_name,
            entries: Vec::new(),
        })))
    }

    fn object(&mut self, class: &Rc<ClassDef>) -> Result<ObjectRef> {
        Ok(Rc::new(RefCell::new(Object::new(Rc::clone(class)))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prealloc_is_capped() {
        let list = DefaultFactory.list(None, Some(usize::MAX)).unwrap();
        assert!(list.borrow().items.capacity() <= MAX_PREALLOC);
        assert!(list.borrow().items.is_empty());
    }

    #[test]
    fn object_fields_start_null() {
        let class = DefaultFactory.resolve("P".into(), vec!["a".into(), "b".into()]).unwrap();
        let obj = DefaultFactory.object(&class).unwrap();
        assert_eq!(obj.borrow().fields.len(), 2);
        assert!(obj.borrow().fields.iter().all(crate::Value::is_null));
    }
}
