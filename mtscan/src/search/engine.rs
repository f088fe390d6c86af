use std::io::BufRead;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{ScanConfig, Strategy};
use crate::errors::ScanResult;
use crate::pattern::Pattern;
use crate::results::{Finding, ScanSummary};
use crate::search::matcher::PatternMatcher;
use crate::search::splitter::{SharedRangeSplitter, StreamSplitter};
use crate::search::tokenizer::LineTokenizer;
use crate::source::SourceBytes;
use crate::strategy::{divide_and_conquer, round_robin};

/// Scans a random-access byte source.
///
/// The count sink is invoked exactly once, before any finding; findings
/// arrive in ascending `(line_number, in_line_offset)` order regardless of
/// the worker count or strategy.
pub fn scan<S, NS, FS>(
    source: Arc<S>,
    config: &ScanConfig,
    mut count_sink: NS,
    finding_sink: FS,
) -> ScanResult<ScanSummary>
where
    S: SourceBytes,
    NS: FnMut(u64) -> ScanResult<()>,
    FS: FnMut(Finding) -> ScanResult<()>,
{
    let pattern = Pattern::new(&config.pattern)?;
    let tokenizer = LineTokenizer::new(PatternMatcher::new(&pattern));
    let workers = config.thread_count.get();

    info!(
        pattern = %config.pattern,
        bytes = source.len(),
        workers,
        "starting scan"
    );

    let mut total = 0u64;
    match config.strategy {
        Strategy::Auto | Strategy::DivideAndConquer => {
            debug!("using divide-and-conquer strategy");
            divide_and_conquer(
                source,
                tokenizer,
                |count| {
                    total = count;
                    count_sink(count)
                },
                finding_sink,
                config.delimiter,
                workers,
            )?;
        }
        Strategy::RoundRobin => {
            debug!("using round-robin strategy");
            let reader = SharedRangeSplitter::new(source, config.delimiter);
            round_robin(
                reader,
                tokenizer,
                |count| {
                    total = count;
                    count_sink(count)
                },
                finding_sink,
                workers,
            )?;
        }
    }

    info!(total, "scan complete");
    Ok(ScanSummary {
        total_findings: total,
    })
}

/// Scans a forward-only byte stream. Streams cannot be partitioned, so this
/// always runs the round-robin strategy.
pub fn scan_stream<R, NS, FS>(
    reader: R,
    config: &ScanConfig,
    mut count_sink: NS,
    finding_sink: FS,
) -> ScanResult<ScanSummary>
where
    R: BufRead,
    NS: FnMut(u64) -> ScanResult<()>,
    FS: FnMut(Finding) -> ScanResult<()>,
{
    let pattern = Pattern::new(&config.pattern)?;
    let tokenizer = LineTokenizer::new(PatternMatcher::new(&pattern));
    let workers = config.thread_count.get();

    info!(pattern = %config.pattern, workers, "starting stream scan");
    if config.strategy == Strategy::DivideAndConquer {
        debug!("divide-and-conquer is unavailable for streams, using round-robin");
    }

    let mut total = 0u64;
    round_robin(
        StreamSplitter::new(reader, config.delimiter),
        tokenizer,
        |count| {
            total = count;
            count_sink(count)
        },
        finding_sink,
        workers,
    )?;

    info!(total, "stream scan complete");
    Ok(ScanSummary {
        total_findings: total,
    })
}

/// Convenience wrapper collecting the count and the findings in memory.
pub fn scan_collect<S: SourceBytes>(
    source: Arc<S>,
    config: &ScanConfig,
) -> ScanResult<(u64, Vec<Finding>)> {
    let mut total = 0u64;
    let mut findings = Vec::new();
    scan(
        source,
        config,
        |count| {
            total = count;
            Ok(())
        },
        |finding| {
            findings.push(finding);
            Ok(())
        },
    )?;
    Ok((total, findings))
}
