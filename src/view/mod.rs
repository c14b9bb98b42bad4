//! A window onto a file with pending edits layered on top.
//!
//! A [`View`] owns one [`FileChannel`] and one [`EditOverlay`]. Reads go
//! through the channel and have the overlay applied before they are returned,
//! so callers always see the file as it will look after the next save. Edits
//! only touch the overlay until [`View::save`] streams them back to disk.
//!
//! # Example
//!
//! ```rust,no_run
//! use hexlay::{Config, View};
//!
//! let mut view = View::new("disk.img", Config::default());
//! view.init()?;
//!
//! view.set_position(0x200);
//! view.load_view(false)?;
//! if let Some(line) = view.line(0, 16) {
//!     println!("{:08X}  {}", line.offset, line.render_hex());
//! }
//!
//! view.edit(0x1FE, 0x55)?;
//! view.edit(0x1FF, 0xAA)?;
//! let result = view.save(true)?;
//! println!("wrote {} chunks", result.chunks_written);
//! # Ok::<(), hexlay::Error>(())
//! ```

mod observer;
mod save;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::buffer::{ByteBuffer, Endian};
use crate::channel::FileChannel;
use crate::config::Config;
use crate::inspect::{INSPECT_WIDTH, Line, OffsetValues};
use crate::overlay::{EditOverlay, Lookup, Values};
use crate::search::{Matches, SearchQuery};
use crate::timing::Timer;
use crate::{Error, Result};

pub use self::observer::{NoObserver, ViewObserver};
pub use self::save::SaveResult;
pub(crate) use self::save::SaveGuard;

/// Lifecycle state of a [`View`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Created, [`View::init`] not called yet.
    Unopened,
    /// File is open; reads, edits and saves are allowed.
    Ready,
    /// A save is in progress.
    Saving,
    /// [`View::init`] failed; see [`View::failure`].
    Failed,
}

/// An editable window onto a single file.
pub struct View {
    path: PathBuf,
    config: Config,
    channel: Option<FileChannel>,
    overlay: Box<dyn EditOverlay + Send>,
    window: ByteBuffer,
    position: u64,
    length: usize,
    loaded: bool,
    state: ViewState,
    failure: Option<String>,
    saving: Arc<AtomicBool>,
    observer: Box<dyn ViewObserver>,
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("path", &self.path)
            .field("state", &self.state())
            .field("overlay", &self.overlay.name())
            .field("pending", &self.overlay.len())
            .field("position", &self.position)
            .field("length", &self.length)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

impl View {
    /// Creates a view of `path` using the overlay strategy named in `config`.
    ///
    /// Nothing is opened until [`init`](Self::init).
    pub fn new(path: impl AsRef<Path>, config: Config) -> Self {
        let overlay = config.overlay.build(&config);
        Self::with_overlay(path, config, overlay)
    }

    /// Creates a view with a caller-supplied overlay.
    pub fn with_overlay(
        path: impl AsRef<Path>,
        config: Config,
        overlay: Box<dyn EditOverlay + Send>,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            window: ByteBuffer::new().with_endian(config.endian),
            length: config.window_size,
            config,
            channel: None,
            overlay,
            position: 0,
            loaded: false,
            state: ViewState::Unopened,
            failure: None,
            saving: Arc::new(AtomicBool::new(false)),
            observer: Box::new(NoObserver),
        }
    }

    /// Installs an observer, replacing the previous one.
    pub fn set_observer(&mut self, observer: impl ViewObserver + 'static) {
        self.observer = Box::new(observer);
    }

    /// Validates the configuration and opens the file.
    ///
    /// On failure the view enters [`ViewState::Failed`] and keeps the error
    /// message; a later call may retry. Calling this on a ready view does
    /// nothing.
    pub fn init(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Ok(());
        }
        let _timer = Timer::start("init");

        let opened = self
            .config
            .validate()
            .and_then(|()| FileChannel::open(&self.path, &self.config));
        match opened {
            Ok(channel) => {
                self.channel = Some(channel);
                self.state = ViewState::Ready;
                self.failure = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to initialize view of {}: {}", self.path.display(), e);
                self.state = ViewState::Failed;
                self.failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> ViewState {
        if self.saving.load(Ordering::Acquire) {
            ViewState::Saving
        } else {
            self.state
        }
    }

    /// Returns the message of the error that put the view in
    /// [`ViewState::Failed`].
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Returns true while a save holds the saving flag.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Returns the configuration the view was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the path of the viewed file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn channel(&self) -> Result<&FileChannel> {
        self.channel.as_ref().ok_or(Error::NotInitialized)
    }

    /// Returns the file name without directories.
    pub fn filename(&self) -> Result<&str> {
        Ok(self.channel()?.basename())
    }

    /// Returns the file size, remembered after the first call.
    pub fn size(&self) -> Result<u64> {
        self.channel()?.size()
    }

    /// Forgets the remembered file size.
    ///
    /// Call after the file was resized by someone else.
    pub fn refresh_size(&self) -> Result<()> {
        self.channel()?.invalidate_size();
        Ok(())
    }

    /// Returns the file offset of the window.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Moves the window and unloads it.
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
        self.invalidate();
    }

    /// Returns the requested window length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Resizes the window and unloads it.
    pub fn set_length(&mut self, length: usize) -> Result<()> {
        if length == 0 {
            return Err(Error::InvalidLength);
        }
        self.length = length;
        self.invalidate();
        Ok(())
    }

    /// Marks the window as stale.
    pub fn invalidate(&mut self) {
        self.loaded = false;
        self.observer.on_unloaded();
    }

    /// Returns true if the window matches the current position, length and
    /// edits.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Loads `[position, position + length)` into the window with pending
    /// edits applied.
    ///
    /// Returns `Ok(false)` without touching the file when the window is
    /// already loaded and `force` is false.
    pub fn load_view(&mut self, force: bool) -> Result<bool> {
        if self.loaded && !force {
            return Ok(false);
        }
        let mut timer = Timer::start("load_view");

        let data = self.read(self.position, self.length)?;
        let len = data.len();
        self.window.swap_buffer(data);
        self.loaded = true;
        self.observer.on_loaded(self.position, len);

        timer.note(|| format!("{} bytes at {:#x}", len, self.position));
        Ok(true)
    }

    /// Returns the loaded window, or `None` if it is stale.
    pub fn window(&self) -> Option<&ByteBuffer> {
        self.loaded.then_some(&self.window)
    }

    /// Sets the byte order of the window's typed accessors.
    pub fn set_endian(&mut self, endian: Endian) {
        self.window.set_endian(endian);
    }

    /// Maps an offset into the loaded window to a file offset.
    pub fn file_offset(&self, buffer_offset: usize) -> Option<u64> {
        self.loaded
            .then(|| self.position.checked_add(buffer_offset as u64))
            .flatten()
    }

    /// Reads up to `len` bytes at `pos` with pending edits applied.
    ///
    /// The result is short at the end of the file. Nothing is drained.
    pub fn read(&self, pos: u64, len: usize) -> Result<Vec<u8>> {
        let mut data = self.channel()?.read_range(pos, len)?;
        self.overlay.overlay_buffer(pos, &mut data)?;
        Ok(data)
    }

    /// Returns the overlay holding pending edits.
    pub fn overlay(&self) -> &dyn EditOverlay {
        self.overlay.as_ref()
    }

    /// Sets the byte at `offset`.
    ///
    /// Fails with [`Error::NotInitialized`] before [`init`](Self::init) and
    /// with [`Error::InvalidOffset`] if `offset` is at or past the end of the
    /// file.
    pub fn edit(&mut self, offset: u64, value: u8) -> Result<()> {
        self.check_within_file(offset)?;
        self.overlay.store_offset(offset, value)?;
        log::trace!("Edited {:#x} = {:#04x}", offset, value);
        self.invalidate();
        Ok(())
    }

    /// Sets every byte in the inclusive range `[start, end]`.
    ///
    /// Inverted bounds follow the configured [`RangeOrder`]. Fails with
    /// [`Error::NotInitialized`] before [`init`](Self::init) and with
    /// [`Error::InvalidOffset`] if the higher bound is past the end of the
    /// file, in which case nothing is stored.
    ///
    /// [`RangeOrder`]: crate::RangeOrder
    pub fn edit_range<'a>(
        &mut self,
        start: u64,
        end: u64,
        values: impl Into<Values<'a>>,
    ) -> Result<()> {
        let (_, high) = self.overlay.range_order().normalize(start, end)?;
        self.check_within_file(high)?;
        self.overlay.store_offset_range(start, end, values.into())?;
        self.invalidate();
        Ok(())
    }

    /// Sets the bytes at each listed offset.
    ///
    /// An empty list is a no-op. Otherwise fails with
    /// [`Error::NotInitialized`] before [`init`](Self::init) and with
    /// [`Error::InvalidOffset`] if any offset is past the end of the file,
    /// in which case nothing is stored.
    pub fn edit_offsets<'a>(
        &mut self,
        offsets: &[u64],
        values: impl Into<Values<'a>>,
    ) -> Result<()> {
        let Some(&high) = offsets.iter().max() else {
            return Ok(());
        };
        self.check_within_file(high)?;
        self.overlay.store_offsets(offsets, values.into())?;
        self.invalidate();
        Ok(())
    }

    fn check_within_file(&self, offset: u64) -> Result<()> {
        let size = self.size()?;
        if offset >= size {
            return Err(Error::invalid_offset(
                offset,
                format!("past the end of a {} byte file", size),
            ));
        }
        Ok(())
    }

    /// Returns the pending value at `offset`, if any.
    pub fn pending(&self, offset: u64) -> Result<Lookup> {
        self.overlay.peek(offset)
    }

    /// Returns true if any edit is waiting to be saved.
    pub fn has_edits(&self) -> Result<bool> {
        self.overlay.has_edits()
    }

    /// Compacts the overlay.
    pub fn optimize(&mut self) -> Result<()> {
        self.overlay.optimize()
    }

    /// Writes every pending edit to the file.
    ///
    /// The file is processed in chunks of at most the configured chunk size.
    /// Chunks without edits are skipped. A chunk with edits is read, patched
    /// and written back in place. Its edits leave the overlay only once the
    /// write is durable: after the closing `sync` when
    /// [`Config::sync_on_save`] is set, otherwise right after the chunk's
    /// write. A failed write or sync therefore leaves the affected edits
    /// pending, ready for another save. The save stops as soon as no edits
    /// remain ahead of the current chunk.
    ///
    /// Fails with [`Error::AlreadySaving`] if another save is running.
    pub fn save(&mut self, optimize: bool) -> Result<SaveResult> {
        let channel = self.channel.as_ref().ok_or(Error::NotInitialized)?;
        let _guard = SaveGuard::acquire(&self.saving)?;
        let mut timer = Timer::start("save");

        if optimize {
            self.overlay.optimize()?;
        }

        let size = channel.size()?;
        let chunk = channel.max_chunk_size() as u64;
        let sync = self.config.sync_on_save;
        let mut result = SaveResult::default();
        // Spans written but not yet drained, waiting on the sync.
        let mut written: Vec<(u64, u64)> = Vec::new();
        let mut pos = 0u64;

        log::debug!(
            "Saving {} pending entries to {} ({} bytes)",
            self.overlay.len(),
            channel.basename(),
            size
        );

        while pos < size {
            if !self.overlay.has_edits_in_range(pos, u64::MAX)? {
                break;
            }
            let len = chunk.min(size - pos);
            let end = pos + len - 1;

            if !self.overlay.has_edits_in_range(pos, end)? {
                result.chunks_skipped += 1;
            } else {
                let mut data = channel.read_range(pos, len as usize)?;
                if data.is_empty() {
                    log::warn!("File ended at {:#x} before its recorded size", pos);
                    break;
                }
                let last = pos + data.len() as u64 - 1;

                self.overlay.overlay_buffer(pos, &mut data)?;
                channel.write_at(pos, &data)?;
                if sync {
                    written.push((pos, last));
                } else {
                    result.edits_applied += self.overlay.take_range(pos, last)?.len();
                }

                result.chunks_written += 1;
                result.bytes_written += data.len() as u64;
            }

            pos += len;
            self.observer.on_save_progress(pos, size);
        }

        if !written.is_empty() {
            channel.sync()?;
            for (start, last) in written {
                result.edits_applied += self.overlay.take_range(start, last)?.len();
            }
        }

        result.edits_remaining = self.overlay.len();
        if result.edits_remaining > 0 {
            log::warn!(
                "{} pending edits lie past the end of {} and were not saved",
                result.edits_remaining,
                channel.basename()
            );
        }
        result.duration = timer.elapsed();
        timer.note(|| {
            format!(
                "{} written, {} skipped, {} edits",
                result.chunks_written, result.chunks_skipped, result.edits_applied
            )
        });

        self.observer.on_saved(&result);
        Ok(result)
    }

    /// Searches the file, with pending edits applied, for `query`.
    ///
    /// The returned iterator reads lazily; see [`Matches`].
    pub fn search(&self, query: &SearchQuery) -> Result<Matches<'_>> {
        let channel = self.channel()?;
        Matches::new(self, query.pattern(), channel.max_chunk_size())
    }

    /// Collects every match of `query`.
    pub fn search_all(&self, query: &SearchQuery) -> Result<Vec<(u64, u64)>> {
        let mut timer = Timer::start("search");
        let found = self.search(query)?.collect::<Result<Vec<_>>>()?;
        timer.note(|| format!("{} matches", found.len()));
        Ok(found)
    }

    /// Decodes the bytes at `offset` as each numeric type.
    pub fn inspect(&self, offset: u64, endian: Endian) -> Result<OffsetValues> {
        let width = INSPECT_WIDTH.min(self.channel()?.max_chunk_size());
        let bytes = self.read(offset, width)?;
        Ok(OffsetValues::decode(offset, &bytes, endian))
    }

    /// Returns up to `count` bytes of the loaded window starting at
    /// `buffer_offset`, or `None` if the window is stale.
    pub fn line(&self, buffer_offset: usize, count: usize) -> Option<Line> {
        let offset = self.file_offset(buffer_offset)?;
        let data = self.window.as_slice();
        let start = buffer_offset.min(data.len());
        let end = start.saturating_add(count).min(data.len());
        Some(Line::new(offset, &data[start..end]))
    }
}
