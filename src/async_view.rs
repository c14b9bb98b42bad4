//! Async facade over [`View`] for tokio applications.
//!
//! [`View`] does blocking positional I/O. [`AsyncView`] moves each call onto
//! tokio's blocking pool and serializes access through an async mutex, so a
//! load issued while a save is running waits for the save to finish. A second
//! save requested while one is queued or running fails immediately with
//! [`Error::AlreadySaving`] instead of waiting.
//!
//! # Example
//!
//! ```rust,no_run
//! use hexlay::{AsyncView, Config};
//!
//! # async fn example() -> hexlay::Result<()> {
//! let view = AsyncView::open("data.bin", Config::default()).await?;
//! view.edit(0, 0x7F).await?;
//! let result = view.save(true).await?;
//! println!("{} edits saved", result.edits_applied);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::buffer::{ByteBuffer, Endian};
use crate::config::Config;
use crate::inspect::OffsetValues;
use crate::overlay::Values;
use crate::search::SearchQuery;
use crate::view::{SaveGuard, SaveResult, View};
use crate::{Error, Result};

/// A cloneable, task-safe handle to a [`View`].
#[derive(Debug, Clone)]
pub struct AsyncView {
    inner: Arc<Mutex<View>>,
    save_requested: Arc<AtomicBool>,
}

impl AsyncView {
    /// Wraps an existing view.
    pub fn new(view: View) -> Self {
        Self {
            inner: Arc::new(Mutex::new(view)),
            save_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a view of `path` and initializes it on the blocking pool.
    pub async fn open(path: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let path = path.into();
        let view = tokio::task::spawn_blocking(move || {
            let mut view = View::new(path, config);
            view.init()?;
            Ok::<_, Error>(view)
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;
        Ok(Self::new(view))
    }

    /// Runs `f` with exclusive access to the view on the blocking pool.
    pub async fn with<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut View) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut view = Arc::clone(&self.inner).lock_owned().await;
        tokio::task::spawn_blocking(move || f(&mut view))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }

    /// Returns true while a save is queued or running.
    pub fn is_saving(&self) -> bool {
        self.save_requested.load(Ordering::Acquire)
    }

    /// See [`View::init`].
    pub async fn init(&self) -> Result<()> {
        self.with(View::init).await
    }

    /// See [`View::size`].
    pub async fn size(&self) -> Result<u64> {
        self.with(|view| view.size()).await
    }

    /// Moves the window; see [`View::set_position`].
    pub async fn set_position(&self, position: u64) {
        self.inner.lock().await.set_position(position);
    }

    /// Loads the window and returns a copy of its contents.
    pub async fn load_view(&self, force: bool) -> Result<ByteBuffer> {
        self.with(move |view| {
            view.load_view(force)?;
            view.window().cloned().ok_or(Error::NotInitialized)
        })
        .await
    }

    /// See [`View::read`].
    pub async fn read(&self, pos: u64, len: usize) -> Result<Vec<u8>> {
        self.with(move |view| view.read(pos, len)).await
    }

    /// See [`View::edit`].
    pub async fn edit(&self, offset: u64, value: u8) -> Result<()> {
        self.with(move |view| view.edit(offset, value)).await
    }

    /// Fills `[start, end]` with `value`; see [`View::edit_range`].
    pub async fn edit_fill(&self, start: u64, end: u64, value: u8) -> Result<()> {
        self.with(move |view| view.edit_range(start, end, value))
            .await
    }

    /// Writes `bytes` starting at `start`.
    pub async fn edit_bytes(&self, start: u64, bytes: Vec<u8>) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.with(move |view| {
            let end = start
                .checked_add(bytes.len() as u64 - 1)
                .ok_or_else(|| Error::invalid_offset(start, "range end overflows u64"))?;
            view.edit_range(start, end, Values::Sequence(&bytes))
        })
        .await
    }

    /// See [`View::has_edits`].
    pub async fn has_edits(&self) -> Result<bool> {
        self.with(|view| view.has_edits()).await
    }

    /// Saves pending edits; see [`View::save`].
    ///
    /// Fails with [`Error::AlreadySaving`] without waiting if another save is
    /// queued or running on any clone of this handle.
    pub async fn save(&self, optimize: bool) -> Result<SaveResult> {
        let guard = SaveGuard::acquire(&self.save_requested)?;
        let result = self.with(move |view| view.save(optimize)).await;
        drop(guard);
        result
    }

    /// See [`View::search_all`].
    pub async fn search_all(&self, query: SearchQuery) -> Result<Vec<(u64, u64)>> {
        self.with(move |view| view.search_all(&query)).await
    }

    /// See [`View::inspect`].
    pub async fn inspect(&self, offset: u64, endian: Endian) -> Result<OffsetValues> {
        self.with(move |view| view.inspect(offset, endian)).await
    }
}
