//! Sparse edit overlays.
//!
//! An overlay maps file offsets to pending byte values that have not been
//! written to disk yet. Absence of an offset means "use the file's byte",
//! which is distinct from an override of `0`. The most recent store for an
//! offset always wins.
//!
//! Two strategies implement the [`EditOverlay`] trait:
//!
//! - [`LogOverlay`]: an append-only log, compacted by
//!   [`optimize`](EditOverlay::optimize).
//! - [`MapOverlay`]: an ordered map with no duplicates by construction.
//!
//! Callers pick one through [`OverlayKind`](crate::config::OverlayKind) and
//! never need to know which one they hold.
//!
//! # Example
//!
//! ```rust
//! use hexlay::overlay::{EditOverlay, Lookup, MapOverlay, Values};
//! use hexlay::config::RangeOrder;
//!
//! let mut overlay = MapOverlay::new(RangeOrder::Lenient);
//! overlay.store_offset(101, 0xFF)?;
//! overlay.store_offset_range(200, 203, Values::Fill(0x00))?;
//!
//! let mut buf = [0xAA; 4];
//! assert_eq!(overlay.write_buffer(100, &mut buf, false)?, 1);
//! assert_eq!(buf, [0xAA, 0xFF, 0xAA, 0xAA]);
//! assert_eq!(overlay.get_offset(202, false)?, Lookup::Present(0));
//! assert_eq!(overlay.get_offset(204, false)?, Lookup::NotPresent);
//! # Ok::<(), hexlay::Error>(())
//! ```

mod log;
mod map;

use std::collections::BTreeMap;

use crate::config::RangeOrder;
use crate::timing::Timer;
use crate::{Error, Result};

pub use self::log::LogOverlay;
pub use self::map::MapOverlay;

/// Result of looking up a single offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The offset has a pending override.
    Present(u8),
    /// No override exists; the file's byte applies.
    NotPresent,
}

impl Lookup {
    /// Returns the override, if any.
    pub fn value(self) -> Option<u8> {
        match self {
            Lookup::Present(v) => Some(v),
            Lookup::NotPresent => None,
        }
    }

    /// Returns true if an override exists.
    pub fn is_present(self) -> bool {
        matches!(self, Lookup::Present(_))
    }
}

impl From<Option<u8>> for Lookup {
    fn from(value: Option<u8>) -> Self {
        match value {
            Some(v) => Lookup::Present(v),
            None => Lookup::NotPresent,
        }
    }
}

/// Values supplied to a range or multi-offset store.
#[derive(Debug, Clone, Copy)]
pub enum Values<'a> {
    /// One value broadcast to every offset.
    Fill(u8),
    /// Values by position: index 0 belongs to the first offset of the range
    /// (or the first entry of the offset list).
    Sequence(&'a [u8]),
    /// Values keyed by absolute file offset.
    ByOffset(&'a BTreeMap<u64, u8>),
}

impl Values<'_> {
    /// Returns the value for the `index`-th target, located at `offset`.
    pub fn value_for(&self, index: u64, offset: u64) -> Option<u8> {
        match self {
            Values::Fill(v) => Some(*v),
            Values::Sequence(values) => usize::try_from(index)
                .ok()
                .and_then(|i| values.get(i).copied()),
            Values::ByOffset(values) => values.get(&offset).copied(),
        }
    }
}

impl From<u8> for Values<'_> {
    fn from(value: u8) -> Self {
        Values::Fill(value)
    }
}

impl<'a> From<&'a [u8]> for Values<'a> {
    fn from(values: &'a [u8]) -> Self {
        Values::Sequence(values)
    }
}

impl<'a> From<&'a BTreeMap<u64, u8>> for Values<'a> {
    fn from(values: &'a BTreeMap<u64, u8>) -> Self {
        Values::ByOffset(values)
    }
}

/// A store of pending byte overrides keyed by file offset.
///
/// Implementors provide the single-offset primitives ([`peek`](Self::peek),
/// [`take`](Self::take), [`store_offset`](Self::store_offset)) and the range
/// predicates. Range, bulk and buffer operations are provided on top and may
/// be overridden for efficiency; overrides must behave identically.
///
/// Every method returns [`Result`] so a disk- or database-backed strategy can
/// report storage failures. The in-memory strategies never fail except on
/// invalid ranges.
pub trait EditOverlay {
    /// Short strategy name, for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// How inverted ranges are treated.
    fn range_order(&self) -> RangeOrder;

    /// Stores `value` at `offset`, replacing any earlier override.
    fn store_offset(&mut self, offset: u64, value: u8) -> Result<()>;

    /// Looks up `offset` without removing it.
    fn peek(&self, offset: u64) -> Result<Lookup>;

    /// Looks up `offset` and removes its override.
    fn take(&mut self, offset: u64) -> Result<Lookup>;

    /// Returns true if at least one override is pending.
    fn has_edits(&self) -> Result<bool>;

    /// Returns true if an override is pending anywhere in `[start, end]`.
    ///
    /// Bounds are expected in order.
    fn has_edits_in_range(&self, start: u64, end: u64) -> Result<bool>;

    /// Number of stored entries.
    ///
    /// For log-structured strategies this counts superseded entries until
    /// the next [`optimize`](Self::optimize).
    fn len(&self) -> usize;

    /// Returns true if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops superseded entries without changing any observable value.
    ///
    /// Idempotent. Strategies without duplicates keep the default no-op.
    fn optimize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Returns the override at `offset`, removing it when `drain` is true.
    fn get_offset(&mut self, offset: u64, drain: bool) -> Result<Lookup> {
        if drain {
            self.take(offset)
        } else {
            self.peek(offset)
        }
    }

    /// Stores `values` over the inclusive range `[start, end]`.
    ///
    /// Inverted bounds are swapped or rejected according to
    /// [`range_order`](Self::range_order). Offsets for which a per-offset
    /// source has no value are skipped with a warning.
    fn store_offset_range(&mut self, start: u64, end: u64, values: Values<'_>) -> Result<()> {
        let (start, end) = self.range_order().normalize(start, end)?;

        if start == end {
            return match values.value_for(0, start) {
                Some(value) => self.store_offset(start, value),
                None => {
                    ::log::warn!("No value supplied for offset {:#x}, skipping", start);
                    Ok(())
                }
            };
        }

        let mut timer = Timer::start("store_offset_range");
        timer.note(|| format!("{:#x}..={:#x} on {}", start, end, self.name()));
        self.store_range_ordered(start, end, values)
    }

    /// Stores `values` over `[start, end]` with bounds already in order.
    ///
    /// Stores one offset at a time through
    /// [`store_offset`](Self::store_offset). Strategies that can coalesce
    /// runs override this.
    fn store_range_ordered(&mut self, start: u64, end: u64, values: Values<'_>) -> Result<()> {
        for offset in start..=end {
            match values.value_for(offset - start, offset) {
                Some(value) => self.store_offset(offset, value)?,
                None => ::log::warn!("No value supplied for offset {:#x}, skipping", offset),
            }
        }
        Ok(())
    }

    /// Stores values at an explicit, possibly non-contiguous list of offsets.
    ///
    /// A [`Values::Sequence`] is aligned with the list.
    fn store_offsets(&mut self, offsets: &[u64], values: Values<'_>) -> Result<()> {
        for (index, &offset) in offsets.iter().enumerate() {
            match values.value_for(index as u64, offset) {
                Some(value) => self.store_offset(offset, value)?,
                None => ::log::warn!("No value supplied for offset {:#x}, skipping", offset),
            }
        }
        Ok(())
    }

    /// Returns the overrides present in `[start, end]` as a sparse map.
    ///
    /// Offsets without an override are absent from the map. With `drain`
    /// the returned overrides are removed.
    fn get_offset_range(
        &mut self,
        start: u64,
        end: u64,
        drain: bool,
    ) -> Result<BTreeMap<u64, u8>> {
        let (start, end) = self.range_order().normalize(start, end)?;
        let mut timer = Timer::start("get_offset_range");
        timer.note(|| format!("{:#x}..={:#x} drain={}", start, end, drain));

        if drain {
            self.take_range(start, end)
        } else {
            self.peek_range(start, end)
        }
    }

    /// Non-draining range lookup with bounds already in order.
    fn peek_range(&self, start: u64, end: u64) -> Result<BTreeMap<u64, u8>> {
        let mut values = BTreeMap::new();
        for offset in start..=end {
            if let Lookup::Present(v) = self.peek(offset)? {
                values.insert(offset, v);
            }
        }
        Ok(values)
    }

    /// Draining range lookup with bounds already in order.
    fn take_range(&mut self, start: u64, end: u64) -> Result<BTreeMap<u64, u8>> {
        let mut values = BTreeMap::new();
        for offset in start..=end {
            if let Lookup::Present(v) = self.take(offset)? {
                values.insert(offset, v);
            }
        }
        Ok(values)
    }

    /// Looks up each offset of the list.
    ///
    /// The result is dense and aligned with `offsets`, with
    /// [`Lookup::NotPresent`] for offsets without an override.
    fn get_offsets(&mut self, offsets: &[u64], drain: bool) -> Result<Vec<Lookup>> {
        offsets
            .iter()
            .map(|&offset| self.get_offset(offset, drain))
            .collect()
    }

    /// Overwrites each byte of `buf` that has a pending override.
    ///
    /// `buf[i]` corresponds to file offset `offset_start + i`. Returns the
    /// number of bytes replaced. With `drain` the applied overrides are
    /// removed.
    fn write_buffer(&mut self, offset_start: u64, buf: &mut [u8], drain: bool) -> Result<usize> {
        if !drain {
            return self.overlay_buffer(offset_start, buf);
        }
        let Some(end) = buffer_end(offset_start, buf.len())? else {
            return Ok(0);
        };
        if !self.has_edits()? {
            return Ok(0);
        }
        let values = self.take_range(offset_start, end)?;
        Ok(apply(offset_start, buf, &values))
    }

    /// Non-draining form of [`write_buffer`](Self::write_buffer).
    fn overlay_buffer(&self, offset_start: u64, buf: &mut [u8]) -> Result<usize> {
        let Some(end) = buffer_end(offset_start, buf.len())? else {
            return Ok(0);
        };
        if !self.has_edits()? {
            return Ok(0);
        }
        let values = self.peek_range(offset_start, end)?;
        Ok(apply(offset_start, buf, &values))
    }
}

/// Inclusive file offset of the last byte of a buffer, or `None` if empty.
fn buffer_end(offset_start: u64, len: usize) -> Result<Option<u64>> {
    if len == 0 {
        return Ok(None);
    }
    offset_start
        .checked_add(len as u64 - 1)
        .map(Some)
        .ok_or_else(|| Error::invalid_offset(offset_start, "buffer end overflows u64"))
}

fn apply(offset_start: u64, buf: &mut [u8], values: &BTreeMap<u64, u8>) -> usize {
    for (&offset, &value) in values {
        buf[(offset - offset_start) as usize] = value;
    }
    values.len()
}
