//! Append-only log overlay.

use std::collections::{BTreeMap, HashSet};

use super::{EditOverlay, Lookup, Values};
use crate::config::RangeOrder;
use crate::timing::Timer;
use crate::{Error, Result};

/// Largest number of entries the log can ever allocate.
const MAX_ENTRIES: usize = isize::MAX as usize / std::mem::size_of::<(u64, u8)>();

/// Overlay that appends every store to a log of `(offset, value)` pairs.
///
/// Stores are O(1). Lookups scan from the newest entry so the last write
/// wins. Repeated edits of the same offset accumulate until
/// [`optimize`](EditOverlay::optimize) drops the superseded entries.
#[derive(Debug, Clone, Default)]
pub struct LogOverlay {
    entries: Vec<(u64, u8)>,
    range_order: RangeOrder,
}

impl LogOverlay {
    /// Creates an empty log.
    pub fn new(range_order: RangeOrder) -> Self {
        Self {
            entries: Vec::new(),
            range_order,
        }
    }

    /// Returns the raw entries, oldest first.
    pub fn entries(&self) -> &[(u64, u8)] {
        &self.entries
    }

    fn latest(&self, offset: u64) -> Option<u8> {
        self.entries
            .iter()
            .rev()
            .find(|(o, _)| *o == offset)
            .map(|&(_, v)| v)
    }

    /// Newest value per offset in `[start, end]`.
    fn collect_range(&self, start: u64, end: u64) -> BTreeMap<u64, u8> {
        let mut values = BTreeMap::new();
        for &(offset, value) in self.entries.iter().rev() {
            if (start..=end).contains(&offset) {
                values.entry(offset).or_insert(value);
            }
        }
        values
    }
}

impl EditOverlay for LogOverlay {
    fn name(&self) -> &'static str {
        "log"
    }

    fn range_order(&self) -> RangeOrder {
        self.range_order
    }

    fn store_offset(&mut self, offset: u64, value: u8) -> Result<()> {
        self.entries.push((offset, value));
        Ok(())
    }

    fn peek(&self, offset: u64) -> Result<Lookup> {
        Ok(self.latest(offset).into())
    }

    fn take(&mut self, offset: u64) -> Result<Lookup> {
        let found = self.latest(offset);
        if found.is_some() {
            // Older entries must go too or they would resurface.
            self.entries.retain(|(o, _)| *o != offset);
        }
        Ok(found.into())
    }

    fn has_edits(&self) -> Result<bool> {
        Ok(!self.entries.is_empty())
    }

    fn has_edits_in_range(&self, start: u64, end: u64) -> Result<bool> {
        Ok(self
            .entries
            .iter()
            .any(|(offset, _)| (start..=end).contains(offset)))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn optimize(&mut self) -> Result<()> {
        let mut timer = Timer::start("optimize");
        let before = self.entries.len();

        let mut seen = HashSet::with_capacity(before);
        let mut kept: Vec<(u64, u8)> = self
            .entries
            .iter()
            .rev()
            .filter(|(offset, _)| seen.insert(*offset))
            .copied()
            .collect();
        kept.reverse();
        self.entries = kept;

        log::debug!(
            "Optimized edit log from {} to {} entries",
            before,
            self.entries.len()
        );
        timer.note(|| format!("{} -> {} entries", before, self.entries.len()));
        Ok(())
    }

    fn store_range_ordered(&mut self, start: u64, end: u64, values: Values<'_>) -> Result<()> {
        if let Values::Fill(value) = values {
            let count = (end - start).saturating_add(1);
            let requested = usize::try_from(count).unwrap_or(usize::MAX);
            self.entries
                .try_reserve(requested)
                .map_err(|_| Error::RangeTooLarge {
                    requested,
                    max: MAX_ENTRIES,
                })?;
            self.entries.extend((start..=end).map(|offset| (offset, value)));
            return Ok(());
        }
        for offset in start..=end {
            match values.value_for(offset - start, offset) {
                Some(value) => self.entries.push((offset, value)),
                None => log::warn!("No value supplied for offset {:#x}, skipping", offset),
            }
        }
        Ok(())
    }

    fn peek_range(&self, start: u64, end: u64) -> Result<BTreeMap<u64, u8>> {
        Ok(self.collect_range(start, end))
    }

    fn take_range(&mut self, start: u64, end: u64) -> Result<BTreeMap<u64, u8>> {
        let values = self.collect_range(start, end);
        if !values.is_empty() {
            self.entries
                .retain(|(offset, _)| !(start..=end).contains(offset));
        }
        Ok(values)
    }
}
