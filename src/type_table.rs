//! Type-name table for list and map type annotations.
//!
//! The first occurrence of a type name is written as a string; every later
//! occurrence in the same session is written as an int index into this table.

use std::rc::Rc;

use crate::intern::Interner;
use crate::{Error, Result};

/// Session-scoped `type name → id` table.
#[derive(Debug, Default)]
pub struct TypeTable {
    names: Interner<str>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `name`, registering it if unseen.
    pub fn intern(&mut self, name: &str) -> (usize, bool) {
        if let Some(id) = self.names.find(name) {
            return (id, false);
        }
        let id = self.names.push(name.into());
        log::debug!("type name #{id}: {name}");
        (id, true)
    }

    /// Decoder side: appends a name read from the stream.
    pub fn push(&mut self, name: Rc<str>) -> usize {
        self.names.push(name)
    }

    /// Resolves a wire type reference read at `offset`.
    pub fn get(&self, index: i32, offset: u64) -> Result<&Rc<str>> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names.get(i))
            .ok_or(Error::InvalidTypeReference {
                index,
                len: self.names.len(),
                offset,
            })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.len() == 0
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}
