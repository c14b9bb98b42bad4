//! Exit codes for the CLI tool.

use hexlay::Error;

/// Completed successfully
pub const SUCCESS: i32 = 0;
/// Completed, but not everything requested was done
pub const WARNING: i32 = 1;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Search finished without a match
pub const NO_MATCH: i32 = 3;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Ctrl+C (128 + SIGINT)
pub const USER_INTERRUPT: i32 = 130;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Warning,
    FatalError,
    NoMatch,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::Warning => WARNING,
            Self::FatalError => FATAL_ERROR,
            Self::NoMatch => NO_MATCH,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Maps a hexlay error to the exit code reported for it.
///
/// File system failures and rejected input get their own codes so scripts
/// can tell "the file is unreadable" apart from "the arguments were wrong".
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    if error.is_io_error() {
        ExitCode::IoError
    } else if error.is_input_error() {
        ExitCode::BadArgs
    } else {
        ExitCode::FatalError
    }
}
