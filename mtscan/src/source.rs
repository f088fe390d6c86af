use std::ops::{Deref, Range};
use std::sync::Arc;

use crate::errors::ScanResult;

/// A contiguous byte region that can be shared across worker threads.
///
/// Memory-mapped files (`memmap2::Mmap`) and plain `Vec<u8>` both qualify.
pub trait SourceBytes: Deref<Target = [u8]> + Send + Sync + 'static {}

impl<T> SourceBytes for T where T: Deref<Target = [u8]> + Send + Sync + 'static {}

/// A cheaply cloneable view into an `Arc`-backed byte region.
///
/// Unlike a plain slice, the view owns a handle to its backing storage, so
/// it can cross thread boundaries without copying the underlying bytes.
#[derive(Debug)]
pub struct SharedSlice<S> {
    source: Arc<S>,
    range: Range<usize>,
}

impl<S: SourceBytes> SharedSlice<S> {
    /// A view of `range` within `source`. The range is clamped to the
    /// source length.
    pub fn new(source: Arc<S>, range: Range<usize>) -> Self {
        let len = source.len();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        Self {
            source,
            range: start..end,
        }
    }

    /// A view of the whole source.
    pub fn full(source: Arc<S>) -> Self {
        let len = source.len();
        Self {
            source,
            range: 0..len,
        }
    }

    pub fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.source[self.range.clone()]
    }
}

impl<S: SourceBytes> AsRef<[u8]> for SharedSlice<S> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl<S> Clone for SharedSlice<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            range: self.range.clone(),
        }
    }
}

/// A source of successive delimiter-separated chunks.
///
/// Implemented by the random-access and the streaming splitter; the
/// Round-Robin producer is generic over this trait. Chunks must be owned or
/// `Arc`-backed so they can be handed to worker threads.
pub trait ChunkSource {
    type Chunk: AsRef<[u8]> + Send + 'static;

    /// The next chunk, or `None` once the source is exhausted. Empty chunks
    /// between adjacent delimiters are yielded like any other.
    fn next_chunk(&mut self) -> ScanResult<Option<Self::Chunk>>;
}
