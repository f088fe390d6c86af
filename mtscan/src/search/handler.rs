use crate::results::Finding;
use crate::search::matcher::Matcher;
use crate::search::tokenizer::LineTokenizer;

/// Accumulates the findings of one worker.
///
/// Chunk indices arrive 0-based and are externalized 1-based.
/// `last_chunk_index` advances on every chunk, matching or not; the
/// divide-and-conquer offset recovery depends on it being exact.
#[derive(Debug, Clone)]
pub struct ChunkHandler<M> {
    tokenizer: LineTokenizer<M>,
    findings: Vec<Finding>,
    last_chunk_index: u64,
}

impl<M: Matcher> ChunkHandler<M> {
    pub fn new(tokenizer: LineTokenizer<M>) -> Self {
        Self {
            tokenizer,
            findings: Vec::new(),
            last_chunk_index: 0,
        }
    }

    /// Tokenizes one chunk and records every match.
    pub fn on_chunk(&mut self, chunk_index: u64, chunk: &[u8]) {
        let findings = &mut self.findings;
        self.tokenizer.scan(chunk, |range| {
            findings.push(Finding {
                line_number: chunk_index + 1,
                in_line_offset: range.start as u64 + 1,
                bytes: chunk[range].to_vec(),
            });
        });
        self.last_chunk_index = chunk_index + 1;
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn last_chunk_index(&self) -> u64 {
        self.last_chunk_index
    }

    /// Moves the findings out, leaving the handler empty.
    pub fn take_findings(&mut self) -> Vec<Finding> {
        std::mem::take(&mut self.findings)
    }

    pub fn into_parts(self) -> (Vec<Finding>, u64) {
        (self.findings, self.last_chunk_index)
    }
}
