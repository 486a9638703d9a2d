//! hessian2 – Hessian 2.0 binary serialization for Rust
//!
//! A streaming encoder/decoder pair for the Hessian 2.0 wire format:
//! compact tag-prefixed values, session-scoped back-references, class
//! definitions and type names, chunked strings and binaries, packet framing
//! and the RPC call/reply envelope.
//!
//! # Beispiel
//!
//! ```
//! use hessian2::{decode, encode, ClassDef, Value};
//! use std::rc::Rc;
//!
//! let point = Rc::new(ClassDef::new("Point", ["x", "y"]).unwrap());
//! let a = Value::object(Rc::clone(&point), vec![Value::Int(1), Value::Int(2)]);
//! let value = Value::list(vec![a.clone(), a]);
//!
//! let bytes = encode(&value).unwrap();
//! let decoded = decode(&bytes).unwrap();
//! assert_eq!(decoded, value);
//!
//! // Shared identity survives the round trip.
//! let list = decoded.as_list().unwrap().borrow();
//! assert!(list.items[0].ptr_eq(&list.items[1]));
//! ```

pub mod binary;
pub mod chunk;
pub mod class_def;
pub mod cursor;
pub mod datetime;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod factory;
pub mod float;
mod intern;
pub mod integer;
pub mod json;
pub mod options;
pub mod packet;
pub mod ref_table;
pub mod rpc;
pub mod serialize;
pub mod string;
pub mod tag;
pub mod type_table;
pub mod value;

pub use error::{Error, ErrorKind, Result};

/// HashMap mit ahash für interne Tabellen (nicht DoS-resistent).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// HashSet mit ahash.
pub(crate) type FastHashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;

/// IndexMap mit ahash (deterministische Iteration + schnelles Hashing).
pub(crate) type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

// Public API: Werte
pub use chunk::Chunked;
pub use class_def::ClassDef;
pub use datetime::Date;
pub use value::{Kind, List, ListRef, Map, MapRef, Object, ObjectRef, Value};

// Public API: Encoder/Decoder
pub use decoder::{decode, decode_all, decode_packets, Decoder};
pub use encoder::{encode, encode_with_config, Encoder, EncoderConfig};
pub use factory::{DefaultFactory, ValueFactory};
pub use options::DecoderOptions;
pub use serialize::{Bytes, Serialize};

// Public API: RPC
pub use rpc::{Call, Fault, Reply};
