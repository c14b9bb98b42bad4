//! File handle with positional, size-capped I/O.
//!
//! A [`FileChannel`] owns the single handle a [`View`](crate::View) uses for
//! both loading and saving. Reads and writes take an explicit file offset and
//! never move a shared cursor, so a load issued between two save chunks reads
//! the right bytes.

use std::cell::{Cell, OnceCell};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::IoOperation;
use crate::timing::Timer;
use crate::{Error, Result};

/// An open, read-write file with memoized metadata.
#[derive(Debug)]
pub struct FileChannel {
    file: File,
    path: PathBuf,
    max_chunk_size: usize,
    size: Cell<Option<u64>>,
    basename: OnceCell<String>,
    #[cfg(test)]
    fail_on: Cell<Option<IoOperation>>,
}

impl FileChannel {
    /// Opens an existing file for reading and writing.
    ///
    /// The file is never created.
    pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;
        log::debug!("Opened {} for editing", path.display());

        Ok(Self {
            file,
            path,
            max_chunk_size: config.max_chunk_size,
            size: Cell::new(None),
            basename: OnceCell::new(),
            #[cfg(test)]
            fail_on: Cell::new(None),
        })
    }

    /// Returns the path the channel was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the per-call transfer cap.
    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Returns the file size in bytes.
    ///
    /// The first call stats the file; later calls return the remembered value
    /// until [`invalidate_size`](Self::invalidate_size).
    pub fn size(&self) -> Result<u64> {
        if let Some(size) = self.size.get() {
            return Ok(size);
        }
        let size = self
            .file
            .metadata()
            .map_err(|e| Error::positional(IoOperation::Stat, 0, 0, e))?
            .len();
        self.size.set(Some(size));
        Ok(size)
    }

    /// Forgets the remembered size so the next [`size`](Self::size) stats
    /// the file again.
    pub fn invalidate_size(&self) {
        self.size.set(None);
    }

    /// Returns the file name without its directory, for display.
    pub fn basename(&self) -> &str {
        self.basename.get_or_init(|| {
            self.path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }

    /// Reads up to `len` bytes starting at `pos`.
    ///
    /// The result is shorter than `len` when the range crosses the end of the
    /// file, and empty when `pos` is at or past it. Missing bytes are never
    /// padded.
    pub fn read_range(&self, pos: u64, len: usize) -> Result<Vec<u8>> {
        self.check_len(len)?;
        let mut timer = Timer::start("read_range");

        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            match read_at(&self.file, &mut buf[filled..], pos + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::positional(IoOperation::Read, pos, len, e)),
            }
        }
        buf.truncate(filled);

        timer.note(|| format!("{} of {} bytes at {:#x}", filled, len, pos));
        Ok(buf)
    }

    /// Writes all of `data` at `pos`.
    pub fn write_at(&self, pos: u64, data: &[u8]) -> Result<()> {
        self.check_len(data.len())?;
        self.injected(IoOperation::Write)
            .and_then(|()| write_all_at(&self.file, data, pos))
            .map_err(|e| Error::positional(IoOperation::Write, pos, data.len(), e))?;
        log::trace!("Wrote {} bytes at {:#x}", data.len(), pos);
        Ok(())
    }

    /// Flushes file contents to disk.
    pub fn sync(&self) -> Result<()> {
        self.injected(IoOperation::Sync)
            .and_then(|()| self.file.sync_data())
            .map_err(|e| Error::positional(IoOperation::Sync, 0, 0, e))
    }

    /// Makes every later `op` on this channel fail until cleared with `None`.
    #[cfg(test)]
    pub(crate) fn fail_on(&self, op: Option<IoOperation>) {
        self.fail_on.set(op);
    }

    #[cfg(test)]
    fn injected(&self, op: IoOperation) -> io::Result<()> {
        if self.fail_on.get() == Some(op) {
            return Err(io::Error::other(format!("injected {} failure", op)));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn injected(&self, _: IoOperation) -> io::Result<()> {
        Ok(())
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len > self.max_chunk_size {
            return Err(Error::RangeTooLarge {
                requested: len,
                max: self.max_chunk_size,
            });
        }
        Ok(())
    }
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], pos: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::read_at(file, buf, pos)
}

#[cfg(unix)]
fn write_all_at(file: &File, data: &[u8], pos: u64) -> io::Result<()> {
    std::os::unix::fs::FileExt::write_all_at(file, data, pos)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], pos: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_read(file, buf, pos)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut data: &[u8], mut pos: u64) -> io::Result<()> {
    while !data.is_empty() {
        match std::os::windows::fs::FileExt::seek_write(file, data, pos) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
            Ok(n) => {
                data = &data[n..];
                pos += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
