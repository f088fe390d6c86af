use std::ops::Range;

use crate::pattern::{wildcard_eq, Pattern};

const ALPHABET_SIZE: usize = 256;

/// Finds the first occurrence of a pattern in a byte range.
pub trait Matcher {
    /// Returns the range of the first match, or `None` when the pattern does
    /// not occur. An empty pattern matches at the start: `Some(0..0)`.
    fn find_first(&self, haystack: &[u8]) -> Option<Range<usize>>;
}

/// Boyer–Moore searcher with the bad-character heuristic, for literal
/// patterns.
///
/// `last_occurrence[b]` is the highest pattern index holding byte `b`, or
/// `-1` when `b` does not occur in the pattern.
#[derive(Debug, Clone)]
pub struct BoyerMooreMatcher {
    pattern: Vec<u8>,
    last_occurrence: [i32; ALPHABET_SIZE],
}

impl BoyerMooreMatcher {
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        let pattern = pattern.into();
        let mut last_occurrence = [-1i32; ALPHABET_SIZE];
        for (i, &b) in pattern.iter().enumerate() {
            last_occurrence[b as usize] = i as i32;
        }
        Self {
            pattern,
            last_occurrence,
        }
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }
}

impl Matcher for BoyerMooreMatcher {
    fn find_first(&self, haystack: &[u8]) -> Option<Range<usize>> {
        let m = self.pattern.len();
        if m == 0 {
            return Some(0..0);
        }

        let mut first = 0;
        while first + m <= haystack.len() {
            // compare right to left; k counts bytes still unmatched
            let mut k = m;
            while k > 0 && haystack[first + k - 1] == self.pattern[k - 1] {
                k -= 1;
            }
            if k == 0 {
                return Some(first..first + m);
            }

            let mismatch = haystack[first + k - 1];
            let shift = (k as i32 - 1 - self.last_occurrence[mismatch as usize]).max(1);
            first += shift as usize;
        }
        None
    }
}

/// Boyer–Moore searcher generalized over a byte comparator, for
/// wildcard-bearing patterns.
///
/// The comparator receives `(text_byte, pattern_byte)` in that order; the
/// wildcard lives on the pattern side, so the relation is not symmetric.
/// A byte-indexed skip table cannot be precomputed under an arbitrary
/// comparator, so on a mismatch the searcher instead scans inward for the
/// next pattern position that would accept the offending text byte and
/// shifts by that distance.
#[derive(Debug, Clone)]
pub struct MaskedBoyerMooreMatcher<C = fn(u8, u8) -> bool> {
    pattern: Vec<u8>,
    comparator: C,
}

impl MaskedBoyerMooreMatcher {
    /// Builds a searcher with the standard wildcard comparator.
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self::with_comparator(pattern, wildcard_eq)
    }
}

impl<C: Fn(u8, u8) -> bool> MaskedBoyerMooreMatcher<C> {
    pub fn with_comparator(pattern: impl Into<Vec<u8>>, comparator: C) -> Self {
        Self {
            pattern: pattern.into(),
            comparator,
        }
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }
}

impl<C: Fn(u8, u8) -> bool> Matcher for MaskedBoyerMooreMatcher<C> {
    fn find_first(&self, haystack: &[u8]) -> Option<Range<usize>> {
        let m = self.pattern.len();
        if m == 0 {
            return Some(0..0);
        }

        let mut first = 0;
        while first + m <= haystack.len() {
            // r is the reverse position: pattern byte m-1-r against the
            // corresponding text byte under the current alignment
            let mut r = 0;
            while r < m && (self.comparator)(haystack[first + m - 1 - r], self.pattern[m - 1 - r]) {
                r += 1;
            }
            if r == m {
                return Some(first..first + m);
            }

            // scan inward until the offending text byte would be accepted;
            // shift by the distance covered (m - r when it never is)
            let mismatch = haystack[first + m - 1 - r];
            let mut next = r + 1;
            while next < m && !(self.comparator)(mismatch, self.pattern[m - 1 - next]) {
                next += 1;
            }
            first += next - r;
        }
        None
    }
}

/// Naive `O(n·m)` sliding-window searcher with the same contract as the
/// Boyer–Moore variants. Reference oracle for the property tests.
#[derive(Debug, Clone)]
pub struct NaiveMatcher<C = fn(u8, u8) -> bool> {
    pattern: Vec<u8>,
    comparator: C,
}

impl NaiveMatcher {
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self::with_comparator(pattern, crate::pattern::exact_eq)
    }
}

impl<C: Fn(u8, u8) -> bool> NaiveMatcher<C> {
    pub fn with_comparator(pattern: impl Into<Vec<u8>>, comparator: C) -> Self {
        Self {
            pattern: pattern.into(),
            comparator,
        }
    }
}

impl<C: Fn(u8, u8) -> bool> Matcher for NaiveMatcher<C> {
    fn find_first(&self, haystack: &[u8]) -> Option<Range<usize>> {
        let m = self.pattern.len();
        if m == 0 {
            return Some(0..0);
        }
        if haystack.len() < m {
            return None;
        }

        (0..=haystack.len() - m).find_map(|first| {
            let window = &haystack[first..first + m];
            window
                .iter()
                .zip(&self.pattern)
                .all(|(&t, &p)| (self.comparator)(t, p))
                .then(|| first..first + m)
        })
    }
}

/// Strategy for pattern matching, selected by the shape of the pattern.
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    /// No wildcards: skip-table Boyer–Moore.
    Literal(BoyerMooreMatcher),
    /// At least one wildcard: comparator-driven Boyer–Moore.
    Masked(MaskedBoyerMooreMatcher),
}

/// Matcher for a validated pattern.
///
/// Construction inspects the pattern once and picks the specialization;
/// the matcher is read-shared for the whole scan and never mutated.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    strategy: MatchStrategy,
}

impl PatternMatcher {
    pub fn new(pattern: &Pattern) -> Self {
        let strategy = if pattern.has_wildcards() {
            MatchStrategy::Masked(MaskedBoyerMooreMatcher::new(pattern.as_bytes()))
        } else {
            MatchStrategy::Literal(BoyerMooreMatcher::new(pattern.as_bytes()))
        };
        Self { strategy }
    }

    pub fn strategy(&self) -> &MatchStrategy {
        &self.strategy
    }
}

impl Matcher for PatternMatcher {
    fn find_first(&self, haystack: &[u8]) -> Option<Range<usize>> {
        match &self.strategy {
            MatchStrategy::Literal(matcher) => matcher.find_first(haystack),
            MatchStrategy::Masked(matcher) => matcher.find_first(haystack),
        }
    }
}
