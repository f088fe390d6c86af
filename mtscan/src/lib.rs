//! Core library of `mtscan`: a parallel wildcard-pattern line scanner.
//!
//! Given a byte source and a pattern whose `?` bytes match any single input
//! byte, the scan reports every non-overlapping occurrence tagged with its
//! 1-based line number and in-line offset, in deterministic ascending order,
//! whatever the worker count.

pub mod config;
pub mod errors;
pub mod pattern;
pub mod processors;
pub mod results;
pub mod search;
pub mod source;
pub mod strategy;

// Re-export commonly used types
pub use config::{ScanConfig, Strategy};
pub use errors::{ScanError, ScanResult};
pub use pattern::Pattern;
pub use results::{Finding, ScanSummary};
pub use search::{scan, scan_collect, scan_stream};
