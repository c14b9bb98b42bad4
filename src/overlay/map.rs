//! Ordered-map overlay.

use std::collections::BTreeMap;

use super::{EditOverlay, Lookup, Values};
use crate::config::RangeOrder;
use crate::Result;

/// Overlay keyed by offset in an ordered map.
///
/// Holds at most one entry per offset, so [`optimize`](EditOverlay::optimize)
/// has nothing to do. Range queries and drains visit only the stored keys
/// inside the range.
#[derive(Debug, Clone, Default)]
pub struct MapOverlay {
    entries: BTreeMap<u64, u8>,
    range_order: RangeOrder,
}

impl MapOverlay {
    /// Creates an empty map.
    pub fn new(range_order: RangeOrder) -> Self {
        Self {
            entries: BTreeMap::new(),
            range_order,
        }
    }

    /// Iterates over pending overrides in offset order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u8)> + '_ {
        self.entries.iter().map(|(&o, &v)| (o, v))
    }
}

impl EditOverlay for MapOverlay {
    fn name(&self) -> &'static str {
        "map"
    }

    fn range_order(&self) -> RangeOrder {
        self.range_order
    }

    fn store_offset(&mut self, offset: u64, value: u8) -> Result<()> {
        self.entries.insert(offset, value);
        Ok(())
    }

    fn peek(&self, offset: u64) -> Result<Lookup> {
        Ok(self.entries.get(&offset).copied().into())
    }

    fn take(&mut self, offset: u64) -> Result<Lookup> {
        Ok(self.entries.remove(&offset).into())
    }

    fn has_edits(&self) -> Result<bool> {
        Ok(!self.entries.is_empty())
    }

    fn has_edits_in_range(&self, start: u64, end: u64) -> Result<bool> {
        Ok(self.entries.range(start..=end).next().is_some())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn store_range_ordered(&mut self, start: u64, end: u64, values: Values<'_>) -> Result<()> {
        if let Values::ByOffset(source) = values {
            // Only offsets the source actually holds can be stored.
            let provided = source.range(start..=end).count() as u64;
            let span = (end - start).saturating_add(1);
            if provided < span {
                log::warn!(
                    "No value supplied for {} offsets in {:#x}..={:#x}, skipping",
                    span - provided,
                    start,
                    end
                );
            }
            self.entries
                .extend(source.range(start..=end).map(|(&o, &v)| (o, v)));
            return Ok(());
        }
        for offset in start..=end {
            match values.value_for(offset - start, offset) {
                Some(value) => {
                    self.entries.insert(offset, value);
                }
                None => log::warn!("No value supplied for offset {:#x}, skipping", offset),
            }
        }
        Ok(())
    }

    fn peek_range(&self, start: u64, end: u64) -> Result<BTreeMap<u64, u8>> {
        Ok(self
            .entries
            .range(start..=end)
            .map(|(&o, &v)| (o, v))
            .collect())
    }

    fn take_range(&mut self, start: u64, end: u64) -> Result<BTreeMap<u64, u8>> {
        // Split off [start, end] and stitch the tail back on.
        let mut taken = self.entries.split_off(&start);
        if let Some(after) = end.checked_add(1) {
            let mut tail = taken.split_off(&after);
            self.entries.append(&mut tail);
        }
        Ok(taken)
    }
}
