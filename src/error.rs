//! Error types for overlay, file channel and view operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when viewing and editing a file through `hexlay`, along with
//! a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Malformed
//! input fails fast and is never retried; I/O failures carry the operation,
//! offset and length that failed:
//!
//! ```rust,no_run
//! use hexlay::{Config, Error, View};
//!
//! fn patch(path: &str) -> hexlay::Result<()> {
//!     let mut view = View::new(path, Config::default());
//!     match view.init() {
//!         Ok(()) => {}
//!         Err(Error::Open { path, source }) => {
//!             eprintln!("cannot open {}: {}", path.display(), source);
//!             return Err(Error::NotInitialized);
//!         }
//!         Err(e) => return Err(e),
//!     }
//!
//!     view.edit(0x10, 0xFF)?;
//!     view.save(true)?;
//!     Ok(())
//! }
//! ```

use std::io;
use std::path::PathBuf;

/// The kind of positional I/O that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    /// Reading a range of the file.
    Read,
    /// Writing a chunk back to the file.
    Write,
    /// Querying file metadata.
    Stat,
    /// Flushing file contents to disk.
    Sync,
}

impl std::fmt::Display for IoOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Stat => write!(f, "stat"),
            Self::Sync => write!(f, "sync"),
        }
    }
}

/// The main error type for `hexlay` operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | Input | [`InvalidOffset`][Self::InvalidOffset], [`RangeError`][Self::RangeError], [`InvalidLength`][Self::InvalidLength], [`InvalidPattern`][Self::InvalidPattern] | Malformed caller arguments |
/// | Bounds | [`OutOfBounds`][Self::OutOfBounds], [`RangeTooLarge`][Self::RangeTooLarge] | Accessor or request exceeds a limit |
/// | Lifecycle | [`Open`][Self::Open], [`NotInitialized`][Self::NotInitialized], [`AlreadySaving`][Self::AlreadySaving] | File handle or save discipline |
/// | I/O | [`Io`][Self::Io], [`PositionalIo`][Self::PositionalIo] | File system operations |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred outside of a positional read or write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A positional read, write or stat call failed.
    ///
    /// The failed edits of a save are still in the overlay when this is
    /// returned from [`View::save`](crate::View::save); the chunk is only
    /// drained after its write succeeded.
    #[error("I/O error during {operation} at offset {offset:#x} ({length} bytes): {source}")]
    PositionalIo {
        /// The operation that failed.
        operation: IoOperation,
        /// File offset of the request.
        offset: u64,
        /// Length of the request in bytes.
        length: usize,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The offset cannot be used.
    ///
    /// Returned when offset arithmetic would overflow, or when an edit targets
    /// a byte past the end of the file.
    #[error("Invalid offset {offset:#x}: {reason}")]
    InvalidOffset {
        /// The rejected offset.
        offset: u64,
        /// Why the offset was rejected.
        reason: String,
    },

    /// A range was given with `start > end` while strict range ordering is on.
    ///
    /// With the default lenient ordering the bounds are swapped instead.
    #[error("Range start {start:#x} is after range end {end:#x}")]
    RangeError {
        /// The given start offset.
        start: u64,
        /// The given end offset.
        end: u64,
    },

    /// A byte accessor was asked for data outside the buffer.
    #[error("Access of {size} bytes at offset {offset} is out of bounds for a buffer of {capacity} bytes")]
    OutOfBounds {
        /// Offset into the buffer.
        offset: usize,
        /// Number of bytes requested.
        size: usize,
        /// Buffer length.
        capacity: usize,
    },

    /// A single request touches more bytes than allowed.
    ///
    /// Raised for reads and writes above the configured chunk cap and for
    /// range edits too large to hold in memory. Callers that need to touch
    /// more bytes must split the request.
    #[error("Requested {requested} bytes, which exceeds the limit of {max} bytes")]
    RangeTooLarge {
        /// Number of bytes requested.
        requested: usize,
        /// Largest request accepted.
        max: usize,
    },

    /// The backing file could not be opened for reading and writing.
    #[error("Failed to open '{}': {source}", path.display())]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The view was used before [`View::init`](crate::View::init) succeeded.
    #[error("View is not initialized")]
    NotInitialized,

    /// A save was requested while another save is still running.
    #[error("Can't save while already saving")]
    AlreadySaving,

    /// A window length of zero was requested.
    #[error("Window length must be greater than 0")]
    InvalidLength,

    /// The configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A search pattern could not be parsed.
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    /// A string contains characters the requested encoding can't represent.
    #[error("Character {character:?} can't be encoded as {encoding}")]
    UnsupportedEncoding {
        /// The first offending character.
        character: char,
        /// Name of the encoding.
        encoding: &'static str,
    },
}

impl Error {
    /// Returns true if this error was caused by malformed caller input.
    ///
    /// Input errors are deterministic: repeating the call with the same
    /// arguments fails the same way.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidOffset { .. }
                | Error::RangeError { .. }
                | Error::OutOfBounds { .. }
                | Error::RangeTooLarge { .. }
                | Error::InvalidLength
                | Error::InvalidConfig(_)
                | Error::InvalidPattern(_)
                | Error::UnsupportedEncoding { .. }
        )
    }

    /// Returns true if this error came from the file system.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::PositionalIo { .. } | Error::Open { .. }
        )
    }

    /// Returns the file offset associated with this error, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Error::PositionalIo { offset, .. } => Some(*offset),
            Error::InvalidOffset { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Creates an InvalidOffset error.
    pub fn invalid_offset(offset: u64, reason: impl Into<String>) -> Self {
        Error::InvalidOffset {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a PositionalIo error.
    pub fn positional(
        operation: IoOperation,
        offset: u64,
        length: usize,
        source: io::Error,
    ) -> Self {
        Error::PositionalIo {
            operation,
            offset,
            length,
            source,
        }
    }
}

/// A specialized Result type for `hexlay` operations.
///
/// This is defined as `std::result::Result<T, Error>` for convenience.
pub type Result<T> = std::result::Result<T, Error>;
