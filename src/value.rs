//! Decoded value model.
//!
//! [`Value`] covers the closed set of wire kinds. Lists, maps and objects are
//! shared handles (`Rc<RefCell<_>>`), so a back-reference on the wire decodes
//! to the very same container as its target, and cyclic graphs are
//! representable. Equality and `Debug` are cycle-safe.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::class_def::ClassDef;
use crate::datetime::Date;
use crate::FastHashSet;

pub type ListRef = Rc<RefCell<List>>;
pub type MapRef = Rc<RefCell<Map>>;
pub type ObjectRef = Rc<RefCell<Object>>;

/// The wire kinds a value can be classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Long,
    Double,
    Date,
    String,
    Binary,
    List,
    Map,
    Object,
}

impl Kind {
    pub fn is_composite(self) -> bool {
        matches!(self, Self::List | Self::Map | Self::Object)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Date => "date",
            Self::String => "string",
            Self::Binary => "binary",
            Self::List => "list",
            Self::Map => "map",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// A list with an optional element type annotation.
#[derive(Clone, Default)]
pub struct List {
    pub type_name: Option<Rc<str>>,
    pub items: Vec<Value>,
}

/// A map with an optional type annotation; entries keep wire order.
#[derive(Clone, Default)]
pub struct Map {
    pub type_name: Option<Rc<str>>,
    pub entries: Vec<(Value, Value)>,
}

impl Map {
    /// First value stored under the string key `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Replaces the value of an equal key, or appends a new entry.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An object instance: a class definition plus one value per field.
#[derive(Clone)]
pub struct Object {
    pub class: Rc<ClassDef>,
    pub fields: Vec<Value>,
}

impl Object {
    /// All fields start out `Null`.
    pub fn new(class: Rc<ClassDef>) -> Self {
        let fields = vec![Value::Null; class.field_count()];
        Self { class, fields }
    }

    pub fn type_name(&self) -> &str {
        self.class.type_name()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.class.field_index(name).and_then(|i| self.fields.get(i))
    }

    /// Sets a field by name. Returns `false` if the class has no such field.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.class.field_index(name) {
            Some(i) if i < self.fields.len() => {
                self.fields[i] = value;
                true
            }
            _ => false,
        }
    }
}

/// A decoded (or to-be-encoded) Hessian value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    /// Milliseconds since the Unix epoch.
    Date(i64),
    String(String),
    Binary(Vec<u8>),
    List(ListRef),
    Map(MapRef),
    Object(ObjectRef),
}

impl Value {
    /// Untyped list.
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(Rc::new(RefCell::new(List { type_name: None, items })))
    }

    /// List with a type annotation.
    pub fn typed_list(type_name: &str, items: Vec<Value>) -> Self {
        Self::List(Rc::new(RefCell::new(List {
            type_name: Some(type_name.into()),
            items,
        })))
    }

    /// Untyped map from entries in iteration order.
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Self::Map(Rc::new(RefCell::new(Map { type_name: None, entries })))
    }

    /// Map with a type annotation.
    pub fn typed_map(type_name: &str, entries: Vec<(Value, Value)>) -> Self {
        Self::Map(Rc::new(RefCell::new(Map {
            type_name: Some(type_name.into()),
            entries,
        })))
    }

    /// Object instance; `fields` must follow the class's field order.
    pub fn object(class: Rc<ClassDef>, fields: Vec<Value>) -> Self {
        Self::Object(Rc::new(RefCell::new(Object { class, fields })))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Bool,
            Self::Int(_) => Kind::Int,
            Self::Long(_) => Kind::Long,
            Self::Double(_) => Kind::Double,
            Self::Date(_) => Kind::Date,
            Self::String(_) => Kind::String,
            Self::Binary(_) => Kind::Binary,
            Self::List(_) => Kind::List,
            Self::Map(_) => Kind::Map,
            Self::Object(_) => Kind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Int or long that fits into 64 bits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Identity comparison: `true` only for two handles to the same container.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Adresse des geteilten Containers, `None` für Skalare.
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            Self::List(l) => Some(Rc::as_ptr(l) as *const () as usize),
            Self::Map(m) => Some(Rc::as_ptr(m) as *const () as usize),
            Self::Object(o) => Some(Rc::as_ptr(o) as *const () as usize),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}

impl From<Date> for Value {
    fn from(v: Date) -> Self {
        Self::Date(v.millis())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// Zyklen-sichere Gleichheit
// ============================================================================

impl PartialEq for Value {
    /// Structural equality. Container pairs already under (or through)
    /// comparison are assumed equal, which makes cyclic graphs comparable
    /// and shared sub-graphs cost one visit per pair.
    fn eq(&self, other: &Self) -> bool {
        eq_in(self, other, &mut FastHashSet::default())
    }
}

/// Paare bleiben nach dem Vergleich im Set: jedes Ergebnis ist eine reine
/// Konjunktion, ein einziges `false` entscheidet also den Gesamtvergleich.
fn eq_in(a: &Value, b: &Value, assumed: &mut FastHashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Long(x), Value::Long(y)) => x == y,
        (Value::Double(x), Value::Double(y)) => x == y || x.to_bits() == y.to_bits(),
        (Value::Date(x), Value::Date(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Binary(x), Value::Binary(y)) => x == y,
        (Value::List(_), Value::List(_)) | (Value::Map(_), Value::Map(_)) | (Value::Object(_), Value::Object(_)) => {
            let (Some(pa), Some(pb)) = (a.identity(), b.identity()) else {
                return false;
            };
            if pa == pb || !assumed.insert((pa, pb)) {
                return true;
            }
            match (a, b) {
                (Value::List(x), Value::List(y)) => {
                    let (x, y) = (x.borrow(), y.borrow());
                    x.type_name == y.type_name
                        && x.items.len() == y.items.len()
                        && x.items.iter().zip(&y.items).all(|(i, j)| eq_in(i, j, assumed))
                }
                (Value::Map(x), Value::Map(y)) => {
                    let (x, y) = (x.borrow(), y.borrow());
                    x.type_name == y.type_name
                        && x.entries.len() == y.entries.len()
                        && x.entries
                            .iter()
                            .zip(&y.entries)
                            .all(|((k1, v1), (k2, v2))| eq_in(k1, k2, assumed) && eq_in(v1, v2, assumed))
                }
                (Value::Object(x), Value::Object(y)) => {
                    let (x, y) = (x.borrow(), y.borrow());
                    x.class == y.class
                        && x.fields.len() == y.fields.len()
                        && x.fields.iter().zip(&y.fields).all(|(i, j)| eq_in(i, j, assumed))
                }
                _ => false,
            }
        }
        _ => false,
    }
}

// ============================================================================
// Zyklen-sicheres Debug
// ============================================================================

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_in(self, f, &mut Vec::new())
    }
}

/// `path` hält die Container auf dem aktuellen Pfad; Rückkanten → `<cycle>`.
fn debug_in(value: &Value, f: &mut fmt::Formatter<'_>, path: &mut Vec<usize>) -> fmt::Result {
    if let Some(id) = value.identity() {
        if path.contains(&id) {
            return f.write_str("<cycle>");
        }
        path.push(id);
    }
    let result = match value {
        Value::Null => f.write_str("null"),
        Value::Bool(v) => write!(f, "{v}"),
        Value::Int(v) => write!(f, "{v}"),
        Value::Long(v) => write!(f, "{v}L"),
        Value::Double(v) => write!(f, "{v:?}"),
        Value::Date(v) => write!(f, "Date({v})"),
        Value::String(v) => write!(f, "{v:?}"),
        Value::Binary(v) => write!(f, "Binary({v:02x?})"),
        Value::List(list) => debug_list(&list.borrow(), f, path),
        Value::Map(map) => debug_map(&map.borrow(), f, path),
        Value::Object(obj) => debug_object(&obj.borrow(), f, path),
    };
    if value.identity().is_some() {
        path.pop();
    }
    result
}

fn debug_list(list: &List, f: &mut fmt::Formatter<'_>, path: &mut Vec<usize>) -> fmt::Result {
    if let Some(t) = &list.type_name {
        f.write_str(t)?;
    }
    f.write_str("[")?;
    for (i, item) in list.items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        debug_in(item, f, path)?;
    }
    f.write_str("]")
}

fn debug_map(map: &Map, f: &mut fmt::Formatter<'_>, path: &mut Vec<usize>) -> fmt::Result {
    if let Some(t) = &map.type_name {
        f.write_str(t)?;
    }
    f.write_str("{")?;
    for (i, (k, v)) in map.entries.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        debug_in(k, f, path)?;
        f.write_str(": ")?;
        debug_in(v, f, path)?;
    }
    f.write_str("}")
}

fn debug_object(obj: &Object, f: &mut fmt::Formatter<'_>, path: &mut Vec<usize>) -> fmt::Result {
    write!(f, "{} {{", obj.type_name())?;
    for (i, value) in obj.fields.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        let name = obj.class.fields().get(i).map_or("?", |n| &**n);
        write!(f, " {name}: ")?;
        debug_in(value, f, path)?;
    }
    f.write_str(" }")
}
