//! Pattern search pipeline: matcher, delimiter splitters, line tokenizer,
//! per-worker chunk handler and the scan entry points.

pub mod engine;
pub mod handler;
pub mod matcher;
pub mod splitter;
pub mod tokenizer;

pub use engine::{scan, scan_collect, scan_stream};
pub use matcher::{Matcher, PatternMatcher};
pub use tokenizer::LineTokenizer;
