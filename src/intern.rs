//! Append-only interner: sequential ids for shared `Rc` entries.
//!
//! Backs the type-name table and the class-definition cache. Entries live in
//! an arena `Vec` indexed by id; a lookup map from entry to first id is built
//! lazily once the table outgrows a linear scan.

use std::borrow::Borrow;
use std::hash::Hash;
use std::rc::Rc;

use crate::FastHashMap;

/// Ab dieser Größe wird statt linearer Suche eine HashMap verwendet.
/// Typ- und Klassentabellen haben typischerweise 1-20 Einträge.
const LINEAR_THRESHOLD: usize = 64;

/// Sequential id assignment for `Rc<T>` entries.
#[derive(Debug, Clone)]
pub(crate) struct Interner<T: ?Sized> {
    entries: Vec<Rc<T>>,
    lookup: Option<FastHashMap<Rc<T>, usize>>,
}

impl<T: ?Sized + Hash + Eq> Interner<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            lookup: None,
        }
    }

    /// Lookup Eintrag → erste vergebene ID.
    pub(crate) fn find<Q>(&self, value: &Q) -> Option<usize>
    where
        Rc<T>: Borrow<Q>,
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if let Some(ref map) = self.lookup {
            map.get(value).copied()
        } else {
            self.entries.iter().position(|e| Borrow::<Q>::borrow(&**e) == value)
        }
    }

    /// Hängt den Eintrag immer an, auch wenn er schon existiert.
    ///
    /// Decoder-Seite: IDs sind positionsbasiert, doppelte Definitionen im
    /// Stream bekommen eigene IDs. Der Lookup zeigt weiter auf die erste ID.
    pub(crate) fn push(&mut self, value: Rc<T>) -> usize {
        let id = self.entries.len();
        if self.lookup.is_none() && id + 1 >= LINEAR_THRESHOLD {
            let mut map = FastHashMap::with_capacity_and_hasher(id + 1, Default::default());
            for (i, e) in self.entries.iter().enumerate() {
                map.entry(Rc::clone(e)).or_insert(i);
            }
            self.lookup = Some(map);
        }
        if let Some(ref mut map) = self.lookup {
            map.entry(Rc::clone(&value)).or_insert(id);
        }
        self.entries.push(value);
        id
    }

    /// Returns the id of `value`, adding it first if unseen. The flag is
    /// `true` when the entry was newly added.
    pub(crate) fn intern(&mut self, value: Rc<T>) -> (usize, bool) {
        if let Some(id) = self.find::<T>(&*value) {
            return (id, false);
        }
        (self.push(value), true)
    }

    pub(crate) fn get(&self, id: usize) -> Option<&Rc<T>> {
        self.entries.get(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.lookup = None;
    }
}

impl<T: ?Sized + Hash + Eq> Default for Interner<T> {
    fn default() -> Self {
        Self::new()
    }
}
