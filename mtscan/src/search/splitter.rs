use std::io::BufRead;
use std::sync::Arc;

use crate::errors::ScanResult;
use crate::source::{ChunkSource, SharedSlice, SourceBytes};

/// Zero-copy splitter over a borrowed byte range.
///
/// Each call yields the next maximal sub-slice free of the delimiter; the
/// delimiter itself is consumed and not included. Two adjacent delimiters
/// produce an empty chunk, a trailing delimiter does not produce a final
/// empty chunk, and a non-delimited tail is yielded as-is.
#[derive(Debug, Clone)]
pub struct RangeSplitter<'a> {
    data: &'a [u8],
    pos: usize,
    delimiter: u8,
    exhausted: bool,
}

impl<'a> RangeSplitter<'a> {
    pub fn new(data: &'a [u8], delimiter: u8) -> Self {
        Self {
            data,
            pos: 0,
            delimiter,
            exhausted: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn bytes_left(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl<'a> Iterator for RangeSplitter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.data.len() {
            self.exhausted = true;
            return None;
        }
        match memchr::memchr(self.delimiter, &self.data[self.pos..]) {
            Some(at) => {
                let chunk = &self.data[self.pos..self.pos + at];
                self.pos += at + 1;
                Some(chunk)
            }
            None => {
                let chunk = &self.data[self.pos..];
                self.pos = self.data.len();
                Some(chunk)
            }
        }
    }
}

/// Splitter over an `Arc`-backed byte region, yielding chunks that can be
/// handed to worker threads without copying. Same chunking contract as
/// [`RangeSplitter`].
#[derive(Debug)]
pub struct SharedRangeSplitter<S> {
    source: Arc<S>,
    pos: usize,
    end: usize,
    delimiter: u8,
}

impl<S: SourceBytes> SharedRangeSplitter<S> {
    pub fn new(source: Arc<S>, delimiter: u8) -> Self {
        let end = source.len();
        Self {
            source,
            pos: 0,
            end,
            delimiter,
        }
    }
}

impl<S: SourceBytes> ChunkSource for SharedRangeSplitter<S> {
    type Chunk = SharedSlice<S>;

    fn next_chunk(&mut self) -> ScanResult<Option<SharedSlice<S>>> {
        if self.pos >= self.end {
            return Ok(None);
        }
        let range = match memchr::memchr(self.delimiter, &self.source[self.pos..self.end]) {
            Some(at) => {
                let range = self.pos..self.pos + at;
                self.pos += at + 1;
                range
            }
            None => {
                let range = self.pos..self.end;
                self.pos = self.end;
                range
            }
        };
        Ok(Some(SharedSlice::new(Arc::clone(&self.source), range)))
    }
}

/// Splitter over a forward-only byte stream, yielding owned chunks.
///
/// Reads up to and including the delimiter (or EOF) per chunk; the chunking
/// contract matches [`RangeSplitter`]. I/O errors surface to the caller.
#[derive(Debug)]
pub struct StreamSplitter<R> {
    reader: R,
    delimiter: u8,
    exhausted: bool,
}

impl<R: BufRead> StreamSplitter<R> {
    pub fn new(reader: R, delimiter: u8) -> Self {
        Self {
            reader,
            delimiter,
            exhausted: false,
        }
    }
}

impl<R: BufRead> ChunkSource for StreamSplitter<R> {
    type Chunk = Vec<u8>;

    fn next_chunk(&mut self) -> ScanResult<Option<Vec<u8>>> {
        if self.exhausted {
            return Ok(None);
        }
        let mut chunk = Vec::new();
        let read = self.reader.read_until(self.delimiter, &mut chunk)?;
        if read == 0 {
            self.exhausted = true;
            return Ok(None);
        }
        if chunk.last() == Some(&self.delimiter) {
            chunk.pop();
        } else {
            // non-delimited tail: the stream is done
            self.exhausted = true;
        }
        Ok(Some(chunk))
    }
}
