//! RPC framing: version header, call, reply, fault, envelope, message.

use std::io::Write;

use super::{wire_index, Encoder};
use crate::rpc::Fault;
use crate::value::Value;
use crate::{integer, string, tag};
use crate::{Error, Result};

impl<W: Write> Encoder<W> {
    /// Writes the `H 0x02 0x00` version header.
    pub fn write_version(&mut self) -> Result<()> {
        self.ensure_top_level("version header")?;
        self.out
            .write_bytes(&[tag::VERSION, tag::MAJOR_VERSION, tag::MINOR_VERSION])
    }

    /// Writes a call header; exactly `arg_count` values must follow.
    pub fn start_call(&mut self, method: &str, arg_count: usize) -> Result<()> {
        self.ensure_top_level("call")?;
        if method.is_empty() {
            return Err(Error::argument("call needs a method name"));
        }
        self.out.write_byte(tag::CALL)?;
        string::write_str(&mut self.out, method, self.config.string_chunk())?;
        integer::write_int(&mut self.out, wire_index(arg_count, "argument count")?)
    }

    /// Writes a complete versioned call and flushes.
    pub fn call(&mut self, method: &str, args: &[Value]) -> Result<()> {
        self.write_version()?;
        self.start_call(method, args.len())?;
        for arg in args {
            self.write_value(arg)?;
        }
        self.flush()
    }

    /// Writes the version header and the reply tag; one value must follow.
    pub fn start_reply(&mut self) -> Result<()> {
        self.write_version()?;
        self.out.write_byte(tag::REPLY)
    }

    /// Writes a complete reply and flushes.
    pub fn write_reply(&mut self, value: &Value) -> Result<()> {
        self.start_reply()?;
        self.write_value(value)?;
        self.flush()
    }

    /// Writes a fault reply: `F` and an untyped map of `code`, `message` and,
    /// when not null, `detail`.
    pub fn write_fault(&mut self, fault: &Fault) -> Result<()> {
        self.write_version()?;
        self.out.write_byte(tag::FAULT)?;
        self.write_map_begin(None)?;
        self.write_string("code")?;
        self.write_string(&fault.code)?;
        self.write_string("message")?;
        self.write_string(&fault.message)?;
        if !fault.detail.is_null() {
            self.write_string("detail")?;
            self.write_value(&fault.detail)?;
        }
        self.write_map_end()?;
        self.flush()
    }

    /// Opens an envelope for `method`; close it with [`complete_envelope`].
    ///
    /// [`complete_envelope`]: Encoder::complete_envelope
    pub fn start_envelope(&mut self, method: &str) -> Result<()> {
        self.ensure_top_level("envelope")?;
        self.out.write_byte(tag::ENVELOPE)?;
        string::write_str(&mut self.out, method, self.config.string_chunk())
    }

    pub fn complete_envelope(&mut self) -> Result<()> {
        self.ensure_top_level("envelope end")?;
        self.out.write_byte(tag::END)
    }

    /// Writes the message header `p 0x02 0x00`.
    pub fn start_message(&mut self) -> Result<()> {
        self.ensure_top_level("message")?;
        self.out
            .write_bytes(&[tag::MESSAGE, tag::MAJOR_VERSION, tag::MINOR_VERSION])
    }

    pub fn complete_message(&mut self) -> Result<()> {
        self.ensure_top_level("message end")?;
        self.out.write_byte(tag::END)
    }
}
