//! RPC framing on the decoder side.

use std::io::Read;

use super::Decoder;
use crate::factory::ValueFactory;
use crate::rpc::{Call, Fault, Reply};
use crate::value::Value;
use crate::tag;
use crate::{Error, Result};

impl<R: Read, F: ValueFactory> Decoder<R, F> {
    /// Reads an `H major minor` version header.
    pub fn read_version(&mut self) -> Result<(u8, u8)> {
        match self.read_tag("version header")? {
            tag::VERSION => {
                let [major, minor] = self.input.read_array::<2>("version")?;
                Ok((major, minor))
            }
            t => Err(self.unexpected("version header", t)),
        }
    }

    fn read_optional_version(&mut self) -> Result<Option<(u8, u8)>> {
        if self.input.peek_byte()? == Some(tag::VERSION) {
            return self.read_version().map(Some);
        }
        Ok(None)
    }

    fn read_method(&mut self) -> Result<String> {
        self.read_string()?
            .ok_or_else(|| Error::state("method name is null"))
    }

    /// Reads a complete call: optional version, `C`, method, arguments.
    pub fn read_call(&mut self) -> Result<Call> {
        let version = self.read_optional_version()?;
        match self.read_tag("call")? {
            tag::CALL => {}
            t => return Err(self.unexpected("call", t)),
        }
        let method = self.read_method()?;
        let count = self.read_length()?;
        let mut args = Vec::with_capacity(count.min(crate::factory::MAX_PREALLOC));
        for _ in 0..count {
            args.push(self.read_value()?);
        }
        log::debug!("call {method} with {count} arguments");
        Ok(Call { version, method, args })
    }

    /// Reads a reply: optional version, then `R value` or `F fault-map`.
    pub fn read_reply(&mut self) -> Result<Reply> {
        self.read_optional_version()?;
        match self.read_tag("reply")? {
            tag::REPLY => self.read_value().map(Reply::Value),
            tag::FAULT => {
                let map = match self.read_tag("fault map")? {
                    t @ (tag::MAP | tag::MAP_UNTYPED) => self.read_map(t)?,
                    t => return Err(self.unexpected("fault map", t)),
                };
                let fault = match &map {
                    Value::Map(m) => Fault::from_map(&m.borrow()),
                    _ => Fault::new("", ""),
                };
                log::debug!("fault reply: {fault}");
                Ok(Reply::Fault(fault))
            }
            t => Err(self.unexpected("reply", t)),
        }
    }

    /// Reads an envelope header and returns its method name.
    pub fn read_envelope(&mut self) -> Result<String> {
        self.read_optional_version()?;
        match self.read_tag("envelope")? {
            tag::ENVELOPE => self.read_method(),
            t => Err(self.unexpected("envelope", t)),
        }
    }

    pub fn complete_envelope(&mut self) -> Result<()> {
        self.read_end()
    }

    /// Reads a message header (`p` or `P`) and returns its version.
    pub fn start_message(&mut self) -> Result<(u8, u8)> {
        match self.read_tag("message")? {
            tag::MESSAGE | tag::MESSAGE_ALT => {
                let [major, minor] = self.input.read_array::<2>("message version")?;
                Ok((major, minor))
            }
            t => Err(self.unexpected("message", t)),
        }
    }

    /// Consumes the message terminator (`Z` or `z`).
    pub fn complete_message(&mut self) -> Result<()> {
        match self.read_tag("end of message")? {
            tag::END | tag::MESSAGE_END_ALT => Ok(()),
            t => Err(self.unexpected("end of message", t)),
        }
    }
}
