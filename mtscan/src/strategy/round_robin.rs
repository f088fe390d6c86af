use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::errors::{ScanError, ScanResult};
use crate::processors::ThreadedChunkProcessor;
use crate::results::Finding;
use crate::search::handler::ChunkHandler;
use crate::search::matcher::Matcher;
use crate::search::tokenizer::LineTokenizer;
use crate::source::ChunkSource;

/// Scans a chunk source by reading sequentially and distributing chunks
/// cyclically over queue-backed workers.
///
/// The producer stamps every chunk with its global index before routing it,
/// so no offset recovery is needed afterwards: worker `i` sees exactly the
/// subsequence `k mod (W−1) == i`, in order. Empty chunks are routed like
/// any other; they advance the index and the routing counter but cannot
/// match. With `workers == 1` everything runs inline on the caller's
/// thread.
pub fn round_robin<R, M, NS, FS>(
    mut reader: R,
    tokenizer: LineTokenizer<M>,
    mut count_sink: NS,
    mut finding_sink: FS,
    workers: usize,
) -> ScanResult<()>
where
    R: ChunkSource,
    M: Matcher + Clone + Send + 'static,
    NS: FnMut(u64) -> ScanResult<()>,
    FS: FnMut(Finding) -> ScanResult<()>,
{
    let workers = workers.max(1);

    if workers == 1 {
        let mut handler = ChunkHandler::new(tokenizer);
        let mut chunk_index = 0u64;
        while let Some(chunk) = reader.next_chunk()? {
            handler.on_chunk(chunk_index, chunk.as_ref());
            chunk_index += 1;
        }
        let (findings, _) = handler.into_parts();
        count_sink(findings.len() as u64)?;
        for finding in findings {
            finding_sink(finding)?;
        }
        return Ok(());
    }

    // the producer thread is the W-th worker; only the external ones own
    // SPSC queues
    let processor_count = workers - 1;
    debug!(processor_count, "round-robin fan-out");

    let handlers: Vec<Arc<Mutex<ChunkHandler<M>>>> = (0..processor_count)
        .map(|_| Arc::new(Mutex::new(ChunkHandler::new(tokenizer.clone()))))
        .collect();

    let mut processors: Vec<ThreadedChunkProcessor<(u64, R::Chunk)>> = handlers
        .iter()
        .map(|handler| {
            let handler = Arc::clone(handler);
            ThreadedChunkProcessor::new(move |(chunk_index, chunk): (u64, R::Chunk)| {
                let mut handler = handler
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                handler.on_chunk(chunk_index, chunk.as_ref());
            })
        })
        .collect();

    for processor in &mut processors {
        processor.start();
    }

    let mut chunk_index = 0u64;
    let mut read_error = None;
    loop {
        match reader.next_chunk() {
            Ok(Some(chunk)) => {
                let target = (chunk_index % processor_count as u64) as usize;
                processors[target].push((chunk_index, chunk));
                chunk_index += 1;
            }
            Ok(None) => break,
            Err(error) => {
                read_error = Some(error);
                break;
            }
        }
    }

    let mut stop_error: Option<ScanError> = None;
    for processor in &mut processors {
        if let Err(error) = processor.stop() {
            stop_error.get_or_insert(error);
        }
    }
    if let Some(error) = read_error {
        return Err(error);
    }
    if let Some(error) = stop_error {
        return Err(error);
    }
    drop(processors);

    let per_worker: Vec<Vec<Finding>> = handlers
        .iter()
        .map(|handler| {
            handler
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .take_findings()
        })
        .collect();

    let total: u64 = per_worker.iter().map(|findings| findings.len() as u64).sum();
    count_sink(total)?;

    merge_findings(per_worker, &mut finding_sink)
}

/// K-way merge of per-worker finding lists into one globally ordered
/// stream. Each list is already sorted, so repeatedly emitting the smallest
/// head suffices.
fn merge_findings<FS>(lists: Vec<Vec<Finding>>, finding_sink: &mut FS) -> ScanResult<()>
where
    FS: FnMut(Finding) -> ScanResult<()>,
{
    let mut streams: Vec<std::iter::Peekable<std::vec::IntoIter<Finding>>> = lists
        .into_iter()
        .filter(|list| !list.is_empty())
        .map(|list| list.into_iter().peekable())
        .collect();

    while !streams.is_empty() {
        let mut smallest = 0;
        let mut smallest_key = (u64::MAX, u64::MAX);
        for (index, stream) in streams.iter_mut().enumerate() {
            if let Some(finding) = stream.peek() {
                let key = finding.key();
                if key < smallest_key {
                    smallest_key = key;
                    smallest = index;
                }
            }
        }

        if let Some(finding) = streams[smallest].next() {
            finding_sink(finding)?;
        }
        if streams[smallest].peek().is_none() {
            streams.swap_remove(smallest);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::matcher::BoyerMooreMatcher;
    use crate::search::splitter::{SharedRangeSplitter, StreamSplitter};

    fn run_shared(data: &[u8], pattern: &[u8], workers: usize) -> (u64, Vec<Finding>) {
        let reader = SharedRangeSplitter::new(Arc::new(data.to_vec()), b'\n');
        run(reader, pattern, workers)
    }

    fn run_streamed(data: &'static [u8], pattern: &[u8], workers: usize) -> (u64, Vec<Finding>) {
        let reader = StreamSplitter::new(data, b'\n');
        run(reader, pattern, workers)
    }

    fn run<R: ChunkSource>(reader: R, pattern: &[u8], workers: usize) -> (u64, Vec<Finding>) {
        let tokenizer = LineTokenizer::new(BoyerMooreMatcher::new(pattern));
        let mut total = 0;
        let mut findings = Vec::new();
        round_robin(
            reader,
            tokenizer,
            |count| {
                total = count;
                Ok(())
            },
            |finding| {
                findings.push(finding);
                Ok(())
            },
            workers,
        )
        .unwrap();
        (total, findings)
    }

    #[test]
    fn single_worker_runs_inline() {
        let (total, findings) = run_shared(b"bad\nmad\nhad\n", b"ad", 1);
        assert_eq!(total, 3);
        let keys: Vec<_> = findings.iter().map(Finding::key).collect();
        assert_eq!(keys, vec![(1, 2), (2, 2), (3, 2)]);
    }

    #[test]
    fn workers_merge_back_into_global_order() {
        for workers in [2, 3, 4, 8] {
            let (total, findings) = run_shared(b"bad\nmad\nhad\nsad\nrad\n", b"ad", workers);
            assert_eq!(total, 5, "workers = {}", workers);
            let keys: Vec<_> = findings.iter().map(Finding::key).collect();
            assert_eq!(
                keys,
                vec![(1, 2), (2, 2), (3, 2), (4, 2), (5, 2)],
                "workers = {}",
                workers
            );
        }
    }

    #[test]
    fn empty_chunks_keep_the_numbering_exact() {
        let (total, findings) = run_shared(b"\n\nad\n\nad", b"ad", 3);
        assert_eq!(total, 2);
        let keys: Vec<_> = findings.iter().map(Finding::key).collect();
        assert_eq!(keys, vec![(3, 1), (5, 1)]);
    }

    #[test]
    fn streamed_chunks_match_shared_chunks() {
        let data: &'static [u8] = b"one ad\ntwo\nthree ad ad\n";
        for workers in [1, 2, 4] {
            let shared = run_shared(data, b"ad", workers);
            let streamed = run_streamed(data, b"ad", workers);
            assert_eq!(shared, streamed, "workers = {}", workers);
        }
    }

    #[test]
    fn empty_source_reports_zero() {
        let (total, findings) = run_shared(b"", b"ad", 4);
        assert_eq!(total, 0);
        assert!(findings.is_empty());
    }

    #[test]
    fn merge_orders_within_a_line_by_offset() {
        let lists = vec![
            vec![
                Finding {
                    line_number: 1,
                    in_line_offset: 4,
                    bytes: b"x".to_vec(),
                },
                Finding {
                    line_number: 2,
                    in_line_offset: 1,
                    bytes: b"x".to_vec(),
                },
            ],
            vec![Finding {
                line_number: 1,
                in_line_offset: 9,
                bytes: b"x".to_vec(),
            }],
        ];
        let mut keys = Vec::new();
        merge_findings(lists, &mut |finding: Finding| {
            keys.push(finding.key());
            Ok(())
        })
        .unwrap();
        assert_eq!(keys, vec![(1, 4), (1, 9), (2, 1)]);
    }
}
