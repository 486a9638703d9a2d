//! Back-reference tables.
//!
//! Every list, map and object occupies the next slot of a session-wide
//! reference table, in stream order, on both sides. The decoder keeps the
//! decoded containers in a [`RefTable`]; the encoder tracks identities in an
//! [`EncoderRefs`] so that a container seen twice is written as `x51 int`.

use crate::value::Value;
use crate::{Error, FastHashMap, Result};

/// Decoder-side table: slot index → decoded container.
#[derive(Debug, Default)]
pub struct RefTable {
    values: Vec<Value>,
}

impl RefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` and returns its slot.
    pub fn push(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len() - 1
    }

    /// Resolves a wire back-reference read at `offset`.
    pub fn get(&self, index: i32, offset: u64) -> Result<&Value> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.values.get(i))
            .ok_or(Error::InvalidReference {
                index,
                len: self.values.len(),
                offset,
            })
    }

    /// Overwrites an existing slot; `offset` is the decoder position.
    pub fn set(&mut self, index: usize, value: Value, offset: u64) -> Result<()> {
        let len = self.values.len();
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::InvalidReference {
                index: i32::try_from(index).unwrap_or(i32::MAX),
                len,
                offset,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Identity map: object address → reference id.
///
/// Keys are compared by identity only, never by content.
#[derive(Debug, Default)]
pub struct IdentityMap {
    ids: FastHashMap<usize, usize>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`.
    ///
    /// A fresh key stores and returns `value`. An existing key keeps its id
    /// (and returns it) unless `replace` is set, in which case the new value
    /// is stored and the previous id returned.
    pub fn put(&mut self, key: usize, value: usize, replace: bool) -> usize {
        use hashbrown::hash_map::Entry;
        match self.ids.entry(key) {
            Entry::Occupied(mut e) => {
                let old = *e.get();
                if replace {
                    e.insert(value);
                }
                old
            }
            Entry::Vacant(e) => {
                e.insert(value);
                value
            }
        }
    }

    pub fn get(&self, key: usize) -> Option<usize> {
        self.ids.get(&key).copied()
    }

    pub fn remove(&mut self, key: usize) -> Option<usize> {
        self.ids.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// Outcome of [`EncoderRefs::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSlot {
    /// Already written: emit a back-reference to this id.
    Seen(usize),
    /// Newly registered under this id: write the value in full.
    New(usize),
}

/// Encoder-side reference assignment.
///
/// Registered containers are pinned (a clone of the handle is kept) so their
/// addresses cannot be reused by a later allocation in the same session.
#[derive(Debug, Default)]
pub struct EncoderRefs {
    ids: IdentityMap,
    pinned: Vec<Value>,
    next: usize,
}

impl EncoderRefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks `value` up by identity and registers it if unseen.
    ///
    /// Scalars have no identity and always get a fresh anonymous slot.
    pub fn claim(&mut self, value: &Value) -> RefSlot {
        let Some(key) = value.identity() else {
            return RefSlot::New(self.reserve());
        };
        let id = self.ids.put(key, self.next, false);
        if id == self.next {
            self.next += 1;
            self.pinned.push(value.clone());
            RefSlot::New(id)
        } else {
            RefSlot::Seen(id)
        }
    }

    /// Takes a slot for a container without identity (e.g. a list written
    /// through the streaming API) so that ids stay aligned with the decoder.
    pub fn reserve(&mut self) -> usize {
        self.next += 1;
        self.next - 1
    }

    pub fn get(&self, value: &Value) -> Option<usize> {
        value.identity().and_then(|key| self.ids.get(key))
    }

    /// Forgets `value`; later occurrences are written in full again.
    pub fn remove(&mut self, value: &Value) -> bool {
        value.identity().and_then(|key| self.ids.remove(key)).is_some()
    }

    /// Nimmt eine `claim`-Vergabe zurück, deren Container nie geschrieben wurde.
    pub fn unclaim(&mut self, value: &Value) {
        if let Some(id) = value.identity().and_then(|key| self.ids.remove(key)) {
            if id + 1 == self.next {
                self.next = id;
            }
        }
    }

    /// Moves the id of `old` over to `new`.
    pub fn replace(&mut self, old: &Value, new: &Value) -> bool {
        let (Some(old_key), Some(new_key)) = (old.identity(), new.identity()) else {
            return false;
        };
        let Some(id) = self.ids.remove(old_key) else {
            return false;
        };
        self.ids.put(new_key, id, true);
        self.pinned.push(new.clone());
        true
    }

    /// Number of slots handed out so far.
    pub fn len(&self) -> usize {
        self.next
    }

    pub fn is_empty(&self) -> bool {
        self.next == 0
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.pinned.clear();
        self.next = 0;
    }
}
