use crate::binary::CHUNK_BYTES;
use crate::cursor::DEFAULT_OUTPUT_CAPACITY;
use crate::string::CHUNK_UNITS;

/// Encoder-Konfiguration (Puffer und Chunk-Größen).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Größe des Schreibpuffers in Bytes.
    pub buffer_capacity: usize,
    /// UTF-16 Einheiten pro String-Chunk (höchstens 0x8000).
    pub string_chunk_size: usize,
    /// Bytes pro Binary-Chunk (höchstens 0x8000).
    pub binary_chunk_size: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_OUTPUT_CAPACITY,
            string_chunk_size: CHUNK_UNITS,
            binary_chunk_size: CHUNK_BYTES,
        }
    }
}

impl EncoderConfig {
    /// Setzt die Puffergröße.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Smaller string chunks; clamped to `2..=0x8000` so a surrogate pair
    /// always fits.
    pub fn with_string_chunk_size(mut self, units: usize) -> Self {
        self.string_chunk_size = units.clamp(2, CHUNK_UNITS);
        self
    }

    /// Smaller binary chunks; clamped to `1..=0x8000`.
    pub fn with_binary_chunk_size(mut self, bytes: usize) -> Self {
        self.binary_chunk_size = bytes.clamp(1, CHUNK_BYTES);
        self
    }

    /// Effektive Chunk-Größen (auch bei direkt gesetzten Feldern begrenzt).
    pub(crate) fn string_chunk(&self) -> usize {
        self.string_chunk_size.clamp(2, CHUNK_UNITS)
    }

    pub(crate) fn binary_chunk(&self) -> usize {
        self.binary_chunk_size.clamp(1, CHUNK_BYTES)
    }
}
