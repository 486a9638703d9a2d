//! JSON bridge for [`Value`] trees.
//!
//! Plain JSON covers null, booleans, numbers, strings, untyped lists and
//! string-keyed maps. Everything else uses `$`-prefixed marker objects:
//!
//! | Value                        | JSON                                         |
//! |------------------------------|----------------------------------------------|
//! | binary                       | `{"$binary": "<base64>"}`                    |
//! | date                         | `{"$date": <ms>}`                            |
//! | NaN / infinite double        | `{"$double": "NaN"}`                         |
//! | typed list                   | `{"$list": "<type>", "$items": [...]}`       |
//! | typed map, non-string or repeated keys | `{"$map": "<type>"\|null, "$entries": [[k, v], ...]}` |
//! | object                       | `{"$class": "<type>", "$fields": {...}}`     |
//! | object, repeated field names | `{"$class": "<type>", "$fields": [[name, v], ...]}` |
//! | repeated or cyclic container | `{"$ref": <index>}`                          |
//!
//! `$ref` indices count containers in first-visit order, which is the order
//! of the reference slots on the wire.

use std::rc::Rc;

use base64::Engine;
use serde_json::{json, Map as JsonMap, Number, Value as Json};

use crate::class_def::ClassDef;
use crate::value::{List, Map, Object, Value};
use crate::{Error, FastHashMap, FastHashSet, FastIndexMap, Result};

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Converts a value tree to JSON.
pub fn to_json(value: &Value) -> Json {
    ToJson::default().convert(value)
}

/// Converts several top-level values; reference indices restart per value.
pub fn to_json_array(values: &[Value]) -> Json {
    Json::Array(values.iter().map(to_json).collect())
}

/// Converts JSON (as produced by [`to_json`]) back to a value tree.
pub fn from_json(json: &Json) -> Result<Value> {
    FromJson::default().convert(json)
}

// ============================================================================
// Value → JSON
// ============================================================================

#[derive(Default)]
struct ToJson {
    /// Container-Adresse → Referenz-Index.
    seen: FastHashMap<usize, usize>,
}

impl ToJson {
    fn convert(&mut self, value: &Value) -> Json {
        if let Some(id) = value.identity() {
            if let Some(index) = self.seen.get(&id) {
                return json!({ "$ref": index });
            }
            let index = self.seen.len();
            self.seen.insert(id, index);
        }
        match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(v) => json!(v),
            Value::Long(v) => json!(v),
            Value::Double(v) => match Number::from_f64(*v) {
                Some(n) => Json::Number(n),
                None => json!({ "$double": v.to_string() }),
            },
            Value::Date(ms) => json!({ "$date": ms }),
            Value::String(s) => Json::String(s.clone()),
            Value::Binary(b) => json!({ "$binary": BASE64.encode(b) }),
            Value::List(list) => self.list(&list.borrow()),
            Value::Map(map) => self.map(&map.borrow()),
            Value::Object(obj) => self.object(&obj.borrow()),
        }
    }

    fn list(&mut self, list: &List) -> Json {
        let items: Vec<Json> = list.items.iter().map(|v| self.convert(v)).collect();
        match &list.type_name {
            None => Json::Array(items),
            Some(t) => json!({ "$list": &**t, "$items": items }),
        }
    }

    fn map(&mut self, map: &Map) -> Json {
        let mut keys = FastHashSet::default();
        let plain = map.type_name.is_none()
            && map
                .entries
                .iter()
                .all(|(k, _)| k.as_str().is_some_and(|s| !s.starts_with('$') && keys.insert(s)));
        if plain {
            let mut out = JsonMap::new();
            for (k, v) in &map.entries {
                let value = self.convert(v);
                if let Some(key) = k.as_str() {
                    out.insert(key.to_string(), value);
                }
            }
            return Json::Object(out);
        }
        let entries: Vec<Json> = map
            .entries
            .iter()
            .map(|(k, v)| {
                let k = self.convert(k);
                Json::Array(vec![k, self.convert(v)])
            })
            .collect();
        json!({ "$map": map.type_name.as_deref(), "$entries": entries })
    }

    fn object(&mut self, obj: &Object) -> Json {
        let names = obj.class.fields();
        let mut seen = FastHashSet::default();
        if names.iter().all(|n| seen.insert(&**n)) {
            let mut fields = JsonMap::new();
            for (name, value) in names.iter().zip(&obj.fields) {
                let value = self.convert(value);
                fields.insert(name.to_string(), value);
            }
            return json!({ "$class": obj.type_name(), "$fields": fields });
        }
        let pairs: Vec<Json> = names
            .iter()
            .zip(&obj.fields)
            .map(|(name, value)| Json::Array(vec![Json::String(name.to_string()), self.convert(value)]))
            .collect();
        json!({ "$class": obj.type_name(), "$fields": pairs })
    }
}

// ============================================================================
// JSON → Value
// ============================================================================

#[derive(Default)]
struct FromJson {
    /// Container in Besuchsreihenfolge, für `$ref`.
    refs: Vec<Value>,
    /// Gleiche Klassenformen teilen sich eine Definition.
    classes: FastIndexMap<(String, Vec<String>), Rc<ClassDef>>,
}

impl FromJson {
    fn convert(&mut self, json: &Json) -> Result<Value> {
        match json {
            Json::Null => Ok(Value::Null),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => Ok(number(n)),
            Json::String(s) => Ok(Value::String(s.clone())),
            Json::Array(items) => self.list(None, items),
            Json::Object(map) => self.object(map),
        }
    }

    fn list(&mut self, type_name: Option<&str>, items: &[Json]) -> Result<Value> {
        let value = match type_name {
            Some(t) => Value::typed_list(t, Vec::with_capacity(items.len())),
            None => Value::list(Vec::with_capacity(items.len())),
        };
        self.refs.push(value.clone());
        if let Value::List(list) = &value {
            for item in items {
                let item = self.convert(item)?;
                list.borrow_mut().items.push(item);
            }
        }
        Ok(value)
    }

    fn object(&mut self, map: &JsonMap<String, Json>) -> Result<Value> {
        if let Some(index) = map.get("$ref") {
            let index = index
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| Error::argument("$ref needs a non-negative integer"))?;
            return self
                .refs
                .get(index)
                .cloned()
                .ok_or_else(|| Error::argument(format!("$ref {index} points past {} containers", self.refs.len())));
        }
        if let Some(ms) = map.get("$date") {
            let ms = ms.as_i64().ok_or_else(|| Error::argument("$date needs an integer"))?;
            return Ok(Value::Date(ms));
        }
        if let Some(data) = map.get("$binary") {
            let text = data.as_str().ok_or_else(|| Error::argument("$binary needs a string"))?;
            let bytes = BASE64
                .decode(text)
                .map_err(|e| Error::argument(format!("$binary: {e}")))?;
            return Ok(Value::Binary(bytes));
        }
        if let Some(text) = map.get("$double") {
            let v = text
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| Error::argument("$double needs a numeric string"))?;
            return Ok(Value::Double(v));
        }
        if let Some(t) = map.get("$list") {
            let t = t.as_str().ok_or_else(|| Error::argument("$list needs a type string"))?;
            let items = map.get("$items").and_then(Json::as_array).map_or(&[][..], Vec::as_slice);
            return self.list(Some(t), items);
        }
        if map.contains_key("$entries") {
            return self.entries(map);
        }
        if let Some(t) = map.get("$class") {
            let t = t.as_str().ok_or_else(|| Error::argument("$class needs a type string"))?;
            return self.class_instance(t, map.get("$fields"));
        }
        let value = Value::map(Vec::with_capacity(map.len()));
        self.refs.push(value.clone());
        if let Value::Map(m) = &value {
            for (k, v) in map {
                let v = self.convert(v)?;
                m.borrow_mut().entries.push((Value::String(k.clone()), v));
            }
        }
        Ok(value)
    }

    fn entries(&mut self, map: &JsonMap<String, Json>) -> Result<Value> {
        let value = match map.get("$map").and_then(Json::as_str) {
            Some(t) => Value::typed_map(t, Vec::new()),
            None => Value::map(Vec::new()),
        };
        self.refs.push(value.clone());
        let entries = map
            .get("$entries")
            .and_then(Json::as_array)
            .ok_or_else(|| Error::argument("$entries needs an array"))?;
        if let Value::Map(m) = &value {
            for entry in entries {
                let [k, v] = entry.as_array().map(Vec::as_slice).unwrap_or_default() else {
                    return Err(Error::argument("$entries items must be [key, value] pairs"));
                };
                let k = self.convert(k)?;
                let v = self.convert(v)?;
                m.borrow_mut().entries.push((k, v));
            }
        }
        Ok(value)
    }

    fn class_instance(&mut self, type_name: &str, fields: Option<&Json>) -> Result<Value> {
        let fields: Vec<(&str, &Json)> = match fields {
            Some(Json::Object(f)) => f.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            Some(Json::Array(pairs)) => pairs
                .iter()
                .map(|pair| match pair.as_array().map(Vec::as_slice) {
                    Some([Json::String(name), v]) => Ok((name.as_str(), v)),
                    _ => Err(Error::argument("$fields items must be [name, value] pairs")),
                })
                .collect::<Result<_>>()?,
            Some(_) => return Err(Error::argument("$fields needs an object or an array of pairs")),
            None => Vec::new(),
        };
        let names: Vec<String> = fields.iter().map(|(k, _)| k.to_string()).collect();
        let key = (type_name.to_string(), names);
        let class = match self.classes.get(&key) {
            Some(class) => Rc::clone(class),
            None => {
                let class = Rc::new(ClassDef::new(type_name, &key.1)?);
                self.classes.insert(key, Rc::clone(&class));
                class
            }
        };
        let value = Value::object(Rc::clone(&class), vec![Value::Null; class.field_count()]);
        self.refs.push(value.clone());
        if let Value::Object(obj) = &value {
            for (i, (_, v)) in fields.iter().enumerate() {
                let v = self.convert(v)?;
                obj.borrow_mut().fields[i] = v;
            }
        }
        Ok(value)
    }
}

/// Ganzzahlen werden int wenn sie passen, sonst long; der Rest double.
fn number(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        return i32::try_from(i).map_or(Value::Long(i), Value::Int);
    }
    Value::Double(n.as_f64().unwrap_or(f64::NAN))
}
