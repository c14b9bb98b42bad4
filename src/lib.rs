//! # hexlay
//!
//! The storage core of a hex editor: view, search and edit arbitrary offsets
//! of a large file without touching it until an explicit save.
//!
//! Pending edits live in a sparse in-memory overlay keyed by file offset.
//! Every read goes through the overlay, so callers see the file as it will be
//! after saving. A save streams the file back in bounded chunks, skipping
//! chunks that have no edits and removing edits from the overlay only once
//! their chunk was written.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hexlay::{Config, SearchQuery, View, Result};
//!
//! fn main() -> Result<()> {
//!     let mut view = View::new("image.bin", Config::default());
//!     view.init()?;
//!
//!     // Patch every occurrence of a magic number
//!     let query = SearchQuery::parse_hex("CA FE BA BE")?;
//!     for (start, _) in view.search_all(&query)? {
//!         view.edit_range(start, start + 3, &[0xDEu8, 0xAD, 0xBE, 0xEF][..])?;
//!     }
//!
//!     let result = view.save(true)?;
//!     println!(
//!         "{} edits written in {} chunks ({} skipped)",
//!         result.edits_applied, result.chunks_written, result.chunks_skipped
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Overlay Strategies
//!
//! | Strategy | Store | Lookup | Notes |
//! |----------|-------|--------|-------|
//! | [`LogOverlay`] | O(1) append | newest-first scan | compacted by `optimize` |
//! | [`MapOverlay`] | O(log n) | O(log n) | one entry per offset |
//!
//! Pick one through [`Config`] and [`OverlayKind`], or pass any [`EditOverlay`]
//! implementation to [`View::with_overlay`].
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`AsyncView`], a tokio facade |
//! | `cli` | The `hexlay` command-line tool |
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger.
//! Durations of loads, saves, searches, compaction and range operations are
//! logged at `debug` level under the `hexlay::timing` target.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod buffer;
pub mod channel;
pub mod config;
pub mod error;
pub mod inspect;
pub mod overlay;
pub mod search;
pub mod timing;
pub mod view;

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod async_view;

pub use buffer::{ByteBuffer, Encoding, Endian, Scalar};
pub use channel::FileChannel;
pub use config::{Config, OverlayKind, RangeOrder};
pub use error::{Error, Result};
pub use inspect::{Line, OffsetValues};
pub use overlay::{EditOverlay, LogOverlay, Lookup, MapOverlay, Values};
pub use search::{Matches, Pattern, SearchQuery};
pub use view::{NoObserver, SaveResult, View, ViewObserver, ViewState};

#[cfg(feature = "async")]
pub use async_view::AsyncView;
