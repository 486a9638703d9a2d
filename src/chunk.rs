//! Chunk state for streaming string and binary values.
//!
//! A logical string or binary value is a run of chunks, each with its own
//! length; only the last one is marked final. Element-wise reads keep two
//! levels of state between calls: the units left in the current chunk and
//! whether that chunk is the final one. Once the final chunk is drained the
//! next read reports [`Chunked::EndOfValue`], which callers must not confuse
//! with the end of the underlying stream.

/// Result of an element-wise read on a chunked value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunked<T> {
    /// The next element (or a count of elements copied into a buffer).
    Item(T),
    /// The logical value is complete (or was `null`).
    EndOfValue,
}

impl<T> Chunked<T> {
    /// Returns the item, or `None` at end of value.
    pub fn item(self) -> Option<T> {
        match self {
            Self::Item(v) => Some(v),
            Self::EndOfValue => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::EndOfValue)
    }
}

/// Two-level chunk state shared by the decoder's element reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ChunkState {
    /// Kein Wert offen; der nächste Read beginnt mit einem Tag.
    #[default]
    Idle,
    /// Ein Chunk ist offen.
    Open { last: bool, remaining: usize },
}

/// What the decoder has to do next to produce an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChunkStep {
    /// `n` units are available in the current chunk.
    Available(usize),
    /// Current chunk is drained but more follow: read a continuation header.
    NextChunk,
    /// Final chunk is drained: report end of value.
    Finished,
    /// No value open: read a start tag.
    Start,
}

impl ChunkState {
    pub(crate) fn open(last: bool, remaining: usize) -> Self {
        Self::Open { last, remaining }
    }

    pub(crate) fn step(&self) -> ChunkStep {
        match *self {
            Self::Idle => ChunkStep::Start,
            Self::Open { remaining, .. } if remaining > 0 => ChunkStep::Available(remaining),
            Self::Open { last: true, .. } => ChunkStep::Finished,
            Self::Open { last: false, .. } => ChunkStep::NextChunk,
        }
    }

    /// Verbraucht `n` Einheiten des offenen Chunks.
    pub(crate) fn consume(&mut self, n: usize) {
        if let Self::Open { remaining, .. } = self {
            debug_assert!(*remaining >= n, "chunk underflow");
            *remaining -= n;
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
