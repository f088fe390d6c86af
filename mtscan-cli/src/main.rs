use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use memmap2::Mmap;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use mtscan::{scan, scan_stream, Finding, Pattern, ScanConfig, ScanError, ScanResult, Strategy};

const LONG_ABOUT: &str = "\
Searches an input file (or stdin) for every occurrence of a byte pattern, \
line by line.

The pattern may contain 7-bit ASCII bytes (0x00..=0x7E, excluding CR and LF) \
and the wildcard '?', which matches any single byte. Matches never span \
lines and never overlap.

Output: the first line is the total number of matches; every following line \
is '<line> <offset> <match>' with 1-based coordinates, in ascending order.

Examples:
    mtscan input.txt '?ad'     finds \"bad\", \"mad\", \" ad\", \";ad\", ...
    mtscan input.txt 'wor:d'   a colon is an ordinary byte
    cat input.txt | mtscan - 'wor:d'";

#[derive(Parser)]
#[command(author, version, about = "Parallel wildcard-pattern line scanner", long_about = LONG_ABOUT)]
struct Cli {
    /// Input file, or '-' to read stdin
    input: PathBuf,

    /// Pattern to search for; '?' matches any single byte
    pattern: String,

    /// Number of threads to use
    #[arg(short = 'j', long = "threads")]
    threads: Option<NonZeroUsize>,

    /// Parallel strategy (auto|dc|rr)
    #[arg(short = 's', long = "strategy", default_value = "auto")]
    strategy: String,

    /// Show only the total count
    #[arg(long = "stats")]
    stats: bool,

    /// Configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> ScanResult<()> {
    let cli = Cli::parse();

    let strategy = match cli.strategy.as_str() {
        "auto" => Strategy::Auto,
        "dc" | "divide-and-conquer" => Strategy::DivideAndConquer,
        "rr" | "round-robin" => Strategy::RoundRobin,
        other => {
            return Err(ScanError::config_error(format!(
                "invalid strategy '{}'. Valid values are: auto, dc, rr",
                other
            )))
        }
    };

    let file_config = ScanConfig::load_from(cli.config.as_deref())?;
    let cli_config = ScanConfig {
        pattern: cli.pattern.clone(),
        strategy,
        thread_count: cli.threads.unwrap_or(file_config.thread_count),
        log_level: cli.log_level.clone().unwrap_or_else(|| "warn".to_string()),
        stats_only: cli.stats,
        ..ScanConfig::default()
    };
    let config = file_config.merge_with_cli(cli_config);

    init_logging(&config.log_level);

    // fail on a bad pattern before touching the input
    Pattern::new(&config.pattern)?;

    let stdout = io::stdout();
    let out = RefCell::new(BufWriter::new(stdout.lock()));

    let count_sink = |count: u64| -> ScanResult<()> {
        writeln!(out.borrow_mut(), "{count}")?;
        Ok(())
    };
    let stats_only = config.stats_only;
    let finding_sink = |finding: Finding| -> ScanResult<()> {
        if stats_only {
            return Ok(());
        }
        let mut out = out.borrow_mut();
        write!(out, "{} {} ", finding.line_number, finding.in_line_offset)?;
        out.write_all(&finding.bytes)?;
        out.write_all(b"\n")?;
        Ok(())
    };

    if cli.input.as_os_str() == "-" {
        debug!("reading stdin");
        let stdin = io::stdin();
        scan_stream(stdin.lock(), &config, count_sink, finding_sink)?;
    } else {
        scan_file(&cli.input, &config, count_sink, finding_sink)?;
    }

    out.borrow_mut().flush()?;
    Ok(())
}

fn scan_file<NS, FS>(
    path: &Path,
    config: &ScanConfig,
    mut count_sink: NS,
    finding_sink: FS,
) -> ScanResult<()>
where
    NS: FnMut(u64) -> ScanResult<()>,
    FS: FnMut(Finding) -> ScanResult<()>,
{
    if !path.exists() {
        return Err(ScanError::input(format!(
            "input file {} doesn't exist",
            path.display()
        )));
    }

    let metadata = path.metadata()?;
    if !metadata.is_file() {
        return Err(ScanError::input(format!(
            "input file {} is not regular",
            path.display()
        )));
    }

    if metadata.len() == 0 {
        // nothing to scan; zero-length files also cannot be mapped
        info!("input file {} is empty", path.display());
        count_sink(0)?;
        return Ok(());
    }

    let file = File::open(path)?;
    match unsafe { Mmap::map(&file) } {
        Ok(mmap) => {
            debug!(bytes = mmap.len(), "memory-mapped {}", path.display());
            scan(Arc::new(mmap), config, count_sink, finding_sink)?;
        }
        Err(error) => {
            warn!(
                "mapping {} failed ({error}), falling back to stream mode",
                path.display()
            );
            scan_stream(BufReader::new(file), config, count_sink, finding_sink)?;
        }
    }
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
