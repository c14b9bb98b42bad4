//! Pattern search over a file with pending edits applied.
//!
//! [`View::search`](crate::View::search) returns a [`Matches`] iterator that
//! reads the file in chunks of `pattern.len() * 64` bytes, capped at the
//! configured chunk size. Consecutive chunks overlap by `pattern.len() - 1`
//! bytes, so a match that straddles a chunk boundary is reported once.
//!
//! # Example
//!
//! ```rust,no_run
//! use hexlay::{Config, SearchQuery, View};
//!
//! let mut view = View::new("firmware.bin", Config::default());
//! view.init()?;
//! for found in view.search(&SearchQuery::parse_hex("DE AD BE EF")?)? {
//!     let (start, end) = found?;
//!     println!("{:#x}..={:#x}", start, end);
//! }
//! # Ok::<(), hexlay::Error>(())
//! ```

use crate::view::View;
use crate::{Error, Result};

/// Multiplier applied to the pattern length to size each search chunk.
pub const CHUNK_FACTOR: usize = 64;

/// What to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// A string, matched against its UTF-8 bytes.
    Text {
        /// The string to find.
        text: String,
        /// Match ASCII letters exactly when true, in either case when false.
        case_sensitive: bool,
    },
    /// A raw byte sequence.
    Hex(Vec<u8>),
}

impl SearchQuery {
    /// A case-sensitive text query.
    pub fn text(text: impl Into<String>) -> Self {
        SearchQuery::Text {
            text: text.into(),
            case_sensitive: true,
        }
    }

    /// A text query that folds ASCII case.
    pub fn text_insensitive(text: impl Into<String>) -> Self {
        SearchQuery::Text {
            text: text.into(),
            case_sensitive: false,
        }
    }

    /// A byte query.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        SearchQuery::Hex(bytes.into())
    }

    /// Parses a hex string such as `"DEADBEEF"`, `"de ad be ef"` or
    /// `"0xDE,0xAD"` into a byte query.
    pub fn parse_hex(input: &str) -> Result<Self> {
        parse_hex_bytes(input).map(SearchQuery::Hex)
    }

    /// Returns the byte pattern for this query.
    pub fn pattern(&self) -> Pattern {
        match self {
            SearchQuery::Text {
                text,
                case_sensitive,
            } => Pattern {
                bytes: text.as_bytes().to_vec(),
                case_sensitive: *case_sensitive,
            },
            SearchQuery::Hex(bytes) => Pattern {
                bytes: bytes.clone(),
                case_sensitive: true,
            },
        }
    }
}

/// Parses hex digits into bytes.
///
/// Tokens may be separated by whitespace or commas and may carry a `0x`
/// prefix. Fails with [`Error::InvalidPattern`] on empty input, non-hex
/// characters or an odd digit count.
pub fn parse_hex_bytes(input: &str) -> Result<Vec<u8>> {
    let mut digits = String::new();
    for token in input.split(|c: char| c.is_whitespace() || c == ',') {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        digits.push_str(token);
    }

    if digits.is_empty() {
        return Err(Error::InvalidPattern("hex pattern is empty".into()));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(Error::InvalidPattern(format!(
            "'{}' is not a hex digit",
            bad
        )));
    }
    if digits.len() % 2 != 0 {
        return Err(Error::InvalidPattern(
            "hex pattern has an odd number of digits".into(),
        ));
    }

    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair)
                .map_err(|e| Error::InvalidPattern(e.to_string()))?;
            u8::from_str_radix(pair, 16).map_err(|e| Error::InvalidPattern(e.to_string()))
        })
        .collect()
}

/// A byte pattern with its comparison mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    bytes: Vec<u8>,
    case_sensitive: bool,
}

impl Pattern {
    /// Pattern length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for the empty pattern, which never matches.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if `window` equals the pattern under its comparison mode.
    pub fn matches(&self, window: &[u8]) -> bool {
        if self.case_sensitive {
            window == self.bytes.as_slice()
        } else {
            window.eq_ignore_ascii_case(&self.bytes)
        }
    }

    /// Chunk length used when scanning for this pattern.
    pub(crate) fn chunk_len(&self, max_chunk_size: usize) -> usize {
        self.len().saturating_mul(CHUNK_FACTOR).min(max_chunk_size)
    }
}

/// Lazy iterator over inclusive `(start, end)` offsets of each match.
///
/// Matches come in ascending order and may overlap. The sequence is finite,
/// ends at the first I/O error, and can be replayed with
/// [`restart`](Self::restart) or by cloning before iterating.
#[derive(Debug, Clone)]
pub struct Matches<'v> {
    view: &'v View,
    pattern: Pattern,
    chunk_len: usize,
    base: u64,
    chunk: Vec<u8>,
    cursor: usize,
    loaded: bool,
    done: bool,
}

impl<'v> Matches<'v> {
    pub(crate) fn new(view: &'v View, pattern: Pattern, max_chunk_size: usize) -> Result<Self> {
        let chunk_len = pattern.chunk_len(max_chunk_size);
        if pattern.len() > chunk_len {
            return Err(Error::InvalidPattern(format!(
                "pattern of {} bytes exceeds the maximum chunk size of {} bytes",
                pattern.len(),
                max_chunk_size
            )));
        }
        let done = pattern.is_empty();
        Ok(Self {
            view,
            pattern,
            chunk_len,
            base: 0,
            chunk: Vec::new(),
            cursor: 0,
            loaded: false,
            done,
        })
    }

    /// Rewinds to the start of the file.
    pub fn restart(&mut self) {
        self.base = 0;
        self.chunk.clear();
        self.cursor = 0;
        self.loaded = false;
        self.done = self.pattern.is_empty();
    }

    /// Returns the pattern being searched for.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }
}

impl Iterator for Matches<'_> {
    type Item = Result<(u64, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        let m = self.pattern.len();
        loop {
            if self.done {
                return None;
            }

            if !self.loaded {
                match self.view.read(self.base, self.chunk_len) {
                    Ok(data) => {
                        self.chunk = data;
                        self.cursor = 0;
                        self.loaded = true;
                    }
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }

            while self.cursor + m <= self.chunk.len() {
                let i = self.cursor;
                self.cursor += 1;
                if self.pattern.matches(&self.chunk[i..i + m]) {
                    let start = self.base + i as u64;
                    return Some(Ok((start, start + m as u64 - 1)));
                }
            }

            if self.chunk.len() < self.chunk_len {
                self.done = true;
                continue;
            }
            // Keep the last m - 1 bytes in the next chunk.
            self.base += (self.chunk_len - m + 1) as u64;
            self.loaded = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        let expected = SearchQuery::Hex(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(SearchQuery::parse_hex("DEADBEEF").unwrap(), expected);
        assert_eq!(SearchQuery::parse_hex("de ad be ef").unwrap(), expected);
        assert_eq!(SearchQuery::parse_hex("0xDE,0xAD, 0xBE 0xef").unwrap(), expected);
    }

    #[test]
    fn test_parse_hex_rejects() {
        assert!(matches!(
            SearchQuery::parse_hex(""),
            Err(Error::InvalidPattern(_))
        ));
        assert!(SearchQuery::parse_hex("ABC").is_err());
        assert!(SearchQuery::parse_hex("GG").is_err());
    }

    #[test]
    fn test_pattern_case_folding() {
        let pattern = SearchQuery::text_insensitive("HeLLo").pattern();
        assert!(pattern.matches(b"hello"));
        assert!(pattern.matches(b"HELLO"));
        assert!(!pattern.matches(b"hellp"));

        let exact = SearchQuery::text("HeLLo").pattern();
        assert!(!exact.matches(b"hello"));
    }

    #[test]
    fn test_chunk_len_capped() {
        let pattern = SearchQuery::bytes(vec![0; 4]).pattern();
        assert_eq!(pattern.chunk_len(1024 * 1024), 256);
        assert_eq!(pattern.chunk_len(100), 100);
    }
}
