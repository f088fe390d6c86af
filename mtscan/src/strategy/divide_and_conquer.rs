use std::ops::Range;
use std::sync::{mpsc, Arc};

use tracing::debug;

use crate::errors::ScanResult;
use crate::processors::TaskPool;
use crate::results::Finding;
use crate::search::handler::ChunkHandler;
use crate::search::matcher::Matcher;
use crate::search::splitter::RangeSplitter;
use crate::search::tokenizer::LineTokenizer;
use crate::source::SourceBytes;

/// Scans `source` by partitioning it into delimiter-aligned byte ranges and
/// fanning the partitions out to a task pool.
///
/// Each worker numbers its chunks locally from zero; after the pool drains,
/// the global line numbers are recovered by summing the workers'
/// `last_chunk_index` values in partition order. The total count goes to
/// `count_sink` first, then every finding in ascending
/// `(line_number, in_line_offset)` order to `finding_sink`.
pub fn divide_and_conquer<S, M, NS, FS>(
    source: Arc<S>,
    tokenizer: LineTokenizer<M>,
    mut count_sink: NS,
    mut finding_sink: FS,
    delimiter: u8,
    workers: usize,
) -> ScanResult<()>
where
    S: SourceBytes,
    M: Matcher + Clone + Send + 'static,
    NS: FnMut(u64) -> ScanResult<()>,
    FS: FnMut(Finding) -> ScanResult<()>,
{
    let workers = workers.max(1);
    let partitions = partition(&source, delimiter, workers);
    debug!(
        partitions = partitions.len(),
        workers, "divide-and-conquer fan-out"
    );

    let mut pool = TaskPool::new(workers);
    pool.run();

    let (results_tx, results_rx) = mpsc::channel();
    for (index, range) in partitions.into_iter().enumerate() {
        let source = Arc::clone(&source);
        let mut handler = ChunkHandler::new(tokenizer.clone());
        let results_tx = results_tx.clone();
        pool.submit(move || {
            let data = &source[range];
            for (chunk_index, chunk) in RangeSplitter::new(data, delimiter).enumerate() {
                handler.on_chunk(chunk_index as u64, chunk);
            }
            let _ = results_tx.send((index, handler.into_parts()));
        });
    }
    drop(results_tx);
    pool.wait()?;

    let mut results: Vec<(usize, (Vec<Finding>, u64))> = results_rx.iter().collect();
    results.sort_by_key(|&(index, _)| index);

    let total: u64 = results
        .iter()
        .map(|(_, (findings, _))| findings.len() as u64)
        .sum();
    count_sink(total)?;

    let mut chunk_offset = 0u64;
    for (_, (findings, last_chunk_index)) in results {
        for mut finding in findings {
            finding.line_number += chunk_offset;
            finding_sink(finding)?;
        }
        chunk_offset += last_chunk_index;
    }
    Ok(())
}

/// Splits `data` into up to `workers` contiguous ranges, each ending just
/// past a delimiter (the final one ends at the data end).
///
/// A run of consecutive delimiters at a boundary is attributed entirely to
/// the partition that reached it, so local chunk boundaries always line up
/// with global ones. With more workers than chunks the loop simply stops
/// early and the tail workers receive nothing.
fn partition(data: &[u8], delimiter: u8, workers: usize) -> Vec<Range<usize>> {
    let mut parts = Vec::with_capacity(workers);
    if data.is_empty() {
        return parts;
    }

    let width = (data.len() / workers).max(1);
    let mut first = 0;
    while first < data.len() {
        let mut last = if parts.len() + 1 < workers {
            let probe = first + width.min(data.len() - first);
            match memchr::memchr(delimiter, &data[probe..]) {
                Some(at) => probe + at,
                None => data.len(),
            }
        } else {
            data.len()
        };
        while last < data.len() && data[last] == delimiter {
            last += 1;
        }
        parts.push(first..last);
        first = last;
    }
    parts
}
