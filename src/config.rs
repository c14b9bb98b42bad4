//! Configuration for views, file channels and edit overlays.
//!
//! A [`Config`] is built once at startup and handed to [`View::new`]. The
//! library never reads process-wide state; front ends map their own flags or
//! environment onto the struct.
//!
//! [`View::new`]: crate::View::new

use crate::buffer::Endian;
use crate::overlay::{EditOverlay, LogOverlay, MapOverlay};
use crate::{Error, Result};

/// Default maximum bytes moved by a single read or write call (1 MiB).
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Upper bound accepted for [`Config::max_chunk_size`] (256 MiB).
pub const MAX_CHUNK_SIZE_LIMIT: usize = 256 * 1024 * 1024;

/// Default number of bytes loaded into a view window.
pub const DEFAULT_WINDOW_SIZE: usize = 64;

/// Which edit overlay strategy a view instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayKind {
    /// Append-only log of `(offset, value)` pairs, compacted by
    /// [`EditOverlay::optimize`].
    #[default]
    Log,
    /// Offset-keyed ordered map.
    Map,
}

impl OverlayKind {
    /// Builds an empty overlay of this kind.
    pub fn build(self, config: &Config) -> Box<dyn EditOverlay + Send> {
        match self {
            OverlayKind::Log => Box::new(LogOverlay::new(config.range_order)),
            OverlayKind::Map => Box::new(MapOverlay::new(config.range_order)),
        }
    }

    /// Returns the strategy name.
    pub fn name(self) -> &'static str {
        match self {
            OverlayKind::Log => "log",
            OverlayKind::Map => "map",
        }
    }
}

impl std::str::FromStr for OverlayKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "log" | "arrayoffset" => Ok(OverlayKind::Log),
            "map" | "object" => Ok(OverlayKind::Map),
            other => Err(Error::InvalidConfig(format!(
                "unknown overlay strategy '{}'",
                other
            ))),
        }
    }
}

/// How range operations treat a start offset that is after the end offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeOrder {
    /// Swap the bounds and carry on.
    #[default]
    Lenient,
    /// Reject the call with [`Error::RangeError`].
    Strict,
}

impl RangeOrder {
    /// Returns `(low, high)` for the given bounds, or an error in strict mode
    /// when `start > end`.
    pub fn normalize(self, start: u64, end: u64) -> Result<(u64, u64)> {
        if start <= end {
            return Ok((start, end));
        }
        match self {
            RangeOrder::Lenient => Ok((end, start)),
            RangeOrder::Strict => Err(Error::RangeError { start, end }),
        }
    }
}

/// Configuration consumed by [`View`](crate::View), its file channel and its
/// overlay.
///
/// # Example
///
/// ```rust
/// use hexlay::config::{Config, OverlayKind, RangeOrder};
///
/// let config = Config::new()
///     .overlay(OverlayKind::Map)
///     .max_chunk_size(4 * 1024 * 1024)
///     .range_order(RangeOrder::Strict);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Overlay strategy to instantiate.
    ///
    /// Default: [`OverlayKind::Log`].
    pub overlay: OverlayKind,

    /// Maximum bytes moved by a single read or write call.
    ///
    /// Bounds peak memory during load, search and save.
    /// Default: 1 MiB. Valid range: 1 byte to 256 MiB.
    pub max_chunk_size: usize,

    /// Treatment of inverted ranges.
    ///
    /// Default: [`RangeOrder::Lenient`].
    pub range_order: RangeOrder,

    /// Initial window length of a view.
    ///
    /// Default: 64 bytes.
    pub window_size: usize,

    /// Default byte order of loaded windows.
    ///
    /// Default: [`Endian::Big`].
    pub endian: Endian,

    /// Flush file data to disk at the end of a save.
    ///
    /// Default: true.
    pub sync_on_save: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overlay: OverlayKind::default(),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            range_order: RangeOrder::default(),
            window_size: DEFAULT_WINDOW_SIZE,
            endian: Endian::Big,
            sync_on_save: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with small chunks for memory-constrained hosts.
    pub fn low_memory() -> Self {
        Self {
            max_chunk_size: 64 * 1024,
            ..Self::default()
        }
    }

    /// Creates a configuration with large chunks and the map overlay, suited
    /// to saving many scattered edits in big files.
    pub fn high_throughput() -> Self {
        Self {
            overlay: OverlayKind::Map,
            max_chunk_size: 16 * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Sets the overlay strategy.
    pub fn overlay(mut self, kind: OverlayKind) -> Self {
        self.overlay = kind;
        self
    }

    /// Sets the maximum chunk size.
    pub fn max_chunk_size(mut self, bytes: usize) -> Self {
        self.max_chunk_size = bytes;
        self
    }

    /// Sets the range ordering mode.
    pub fn range_order(mut self, order: RangeOrder) -> Self {
        self.range_order = order;
        self
    }

    /// Shorthand for `range_order(RangeOrder::Strict)` when `strict` is true.
    pub fn strict_ranges(mut self, strict: bool) -> Self {
        self.range_order = if strict {
            RangeOrder::Strict
        } else {
            RangeOrder::Lenient
        };
        self
    }

    /// Sets the initial window length.
    pub fn window_size(mut self, bytes: usize) -> Self {
        self.window_size = bytes;
        self
    }

    /// Sets the default byte order.
    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Sets whether a save ends with an fsync.
    pub fn sync_on_save(mut self, sync: bool) -> Self {
        self.sync_on_save = sync;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error if any values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "max_chunk_size must be greater than 0".into(),
            ));
        }

        if self.max_chunk_size > MAX_CHUNK_SIZE_LIMIT {
            return Err(Error::InvalidConfig(format!(
                "max_chunk_size cannot exceed {} bytes",
                MAX_CHUNK_SIZE_LIMIT
            )));
        }

        if self.window_size == 0 {
            return Err(Error::InvalidConfig(
                "window_size must be greater than 0".into(),
            ));
        }

        if self.window_size > self.max_chunk_size {
            return Err(Error::InvalidConfig(
                "window_size cannot exceed max_chunk_size".into(),
            ));
        }

        Ok(())
    }
}
