//! Call, reply and fault records of the RPC framing layer.
//!
//! Only the framing is implemented here; transports are out of scope. The
//! encoder writes these records (see `Encoder::call`, `Encoder::write_reply`,
//! `Encoder::write_fault`) and the decoder reads them back.

use crate::value::{Map, Value};

/// Protocol version written by this crate.
pub const VERSION: (u8, u8) = (crate::tag::MAJOR_VERSION, crate::tag::MINOR_VERSION);

/// A decoded method call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Version header, if the call carried one.
    pub version: Option<(u8, u8)>,
    pub method: String,
    pub args: Vec<Value>,
}

/// A decoded reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Value(Value),
    Fault(Fault),
}

impl Reply {
    /// The reply value, or the fault as an error-like value.
    pub fn into_result(self) -> std::result::Result<Value, Fault> {
        match self {
            Self::Value(v) => Ok(v),
            Self::Fault(f) => Err(f),
        }
    }
}

/// A remote fault: `code`, `message` and an optional `detail` value.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub code: String,
    pub message: String,
    pub detail: Value,
}

impl Fault {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            detail: Value::Null,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    /// Liest die bekannten Schlüssel aus der Fault-Map; fehlende bleiben leer.
    pub(crate) fn from_map(map: &Map) -> Self {
        let text = |key: &str| map.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        Self {
            code: text("code"),
            message: text("message"),
            detail: map.get("detail").cloned().unwrap_or(Value::Null),
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
