//! Decoder options.
//!
//! The wire format itself has no negotiable options; these settings only
//! control buffering and the hardening limits applied to untrusted input.
//!
//! # Beispiel
//!
//! ```
//! use hessian2::DecoderOptions;
//!
//! let opts = DecoderOptions::default()
//!     .with_max_depth(64)
//!     .with_max_length(1 << 20);
//!
//! assert_eq!(opts.max_depth(), 64);
//! assert_eq!(opts.max_length(), Some(1 << 20));
//! assert_eq!(opts.buffer_capacity(), 256);
//! ```

use crate::cursor::DEFAULT_INPUT_CAPACITY;

/// Default nesting limit for lists, maps and objects.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Options controlling a [`Decoder`](crate::decoder::Decoder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    pub(crate) buffer_capacity: usize,
    pub(crate) max_depth: usize,
    pub(crate) max_length: Option<usize>,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_INPUT_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
            max_length: None,
        }
    }
}

impl DecoderOptions {
    // --- Getter ---

    /// Size of the read buffer in bytes.
    pub fn buffer_capacity(&self) -> usize { self.buffer_capacity }
    /// Maximum composite nesting depth.
    pub fn max_depth(&self) -> usize { self.max_depth }
    /// Maximum declared list length, or string/binary length in units.
    pub fn max_length(&self) -> Option<usize> { self.max_length }

    // --- Builder-Setter (Fluent API) ---

    /// Setzt die Puffergröße.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self { self.buffer_capacity = capacity; self }
    /// Setzt die maximale Verschachtelungstiefe.
    pub fn with_max_depth(mut self, depth: usize) -> Self { self.max_depth = depth; self }
    /// Setzt das Längenlimit.
    pub fn with_max_length(mut self, len: usize) -> Self { self.max_length = Some(len); self }

    // --- Mutable Setter ---

    /// Setzt die maximale Verschachtelungstiefe.
    pub fn set_max_depth(&mut self, depth: usize) { self.max_depth = depth; }
    /// Setzt oder entfernt das Längenlimit.
    pub fn set_max_length(&mut self, len: Option<usize>) { self.max_length = len; }
}
