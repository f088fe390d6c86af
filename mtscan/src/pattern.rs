use crate::errors::{ScanError, ScanResult};

/// The single-byte wildcard: matches any one input byte.
pub const WILDCARD: u8 = b'?';

/// A validated search pattern.
///
/// Accepted bytes are the inclusive range `0x00..=0x7E` excluding `\r` and
/// `\n`, plus the wildcard `?`. Presence of any wildcard is recorded at
/// construction time and selects the masked matcher downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    bytes: Vec<u8>,
    has_wildcards: bool,
}

impl Pattern {
    /// Validates `text` and builds a pattern from it.
    pub fn new(text: impl AsRef<[u8]>) -> ScanResult<Self> {
        let bytes = text.as_ref();
        if bytes.is_empty() {
            return Err(ScanError::invalid_pattern("pattern must not be empty"));
        }

        let mut has_wildcards = false;
        for (i, &b) in bytes.iter().enumerate() {
            if b == WILDCARD {
                has_wildcards = true;
            } else if b > 0x7E || b == b'\n' || b == b'\r' {
                return Err(ScanError::invalid_pattern(format!(
                    "byte {:#04x} at position {} is outside the accepted alphabet",
                    b, i
                )));
            }
        }

        Ok(Self {
            bytes: bytes.to_vec(),
            has_wildcards,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when the pattern contains at least one `?`.
    pub fn has_wildcards(&self) -> bool {
        self.has_wildcards
    }
}

/// Byte comparator for wildcard-bearing patterns.
///
/// Argument order is `(text, pattern)`: only the pattern side carries the
/// wildcard, so the comparator is not symmetric.
#[inline]
pub fn wildcard_eq(text: u8, pattern: u8) -> bool {
    pattern == WILDCARD || text == pattern
}

/// Byte comparator for literal patterns.
#[inline]
pub fn exact_eq(text: u8, pattern: u8) -> bool {
    text == pattern
}
