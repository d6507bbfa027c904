//! Ordered segment sequence for a single price level.
//!
//! Order ids within a level strictly increase along scan order (segment
//! index, then slot offset) because ids are assigned monotonically and new
//! orders only ever land in the final segment. That ordering is what makes
//! the in-level binary search during cancellation possible. The first
//! `tombstone_offset` segments (tracked by the price index, not here) hold
//! only fully-consumed orders and are never read again.

use super::segment::{SLOTS_PER_SEGMENT, Segment, Slot};
use crate::types::OrderId;

/// Price-level storage: an appendable list of packed segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Level {
    segments: Vec<Segment>,
}

impl Level {
    /// A fresh level holding one order.
    pub fn new(id: OrderId, quantity: u64) -> Self {
        Level {
            segments: vec![Segment::new(id, quantity)],
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, index: usize) -> &Segment {
        &self.segments[index]
    }

    /// Capacity accounting per the level-occupancy rule: active segments
    /// times the slot width, minus trailing empty slots in the last segment.
    /// Holes left by cancellations in earlier segments still count.
    pub fn orders_from(&self, offset: u32) -> usize {
        let active = self.segments.len().saturating_sub(offset as usize);
        if active == 0 {
            return 0;
        }
        let trailing_empty = SLOTS_PER_SEGMENT
            - self
                .segments
                .last()
                .map(Segment::occupied_slots)
                .unwrap_or(0);
        active * SLOTS_PER_SEGMENT - trailing_empty
    }

    /// A level is full when it carries the configured maximum and the final
    /// segment has no free slot. An insert against a full level steps to the
    /// next tick instead.
    pub fn is_full(&self, offset: u32, max_orders: u32) -> bool {
        let active = self.segments.len().saturating_sub(offset as usize);
        if active == 0 {
            return false;
        }
        let last = &self.segments[self.segments.len() - 1];
        if last.slot(SLOTS_PER_SEGMENT - 1).is_empty() {
            return false;
        }
        active * SLOTS_PER_SEGMENT >= max_orders as usize
    }

    /// Append an order: first free slot of the final segment, or a new
    /// segment. Only the final segment ever receives new orders, preserving
    /// the monotone-id scan order.
    pub fn append(&mut self, id: OrderId, quantity: u64) {
        if let Some(last) = self.segments.last_mut()
            && let Some(free) = last.first_free_slot()
        {
            last.set_slot(free, id, quantity);
            return;
        }
        self.segments.push(Segment::new(id, quantity));
    }

    /// Binary-search the active segments for an order id. All ids in segment
    /// `i` precede all ids in segment `i + 1`, so the search narrows to one
    /// segment, then scans its four slots.
    pub fn locate(&self, offset: u32, id: OrderId) -> Option<(usize, usize)> {
        let start = offset as usize;
        if start >= self.segments.len() {
            return None;
        }
        let mut low = start;
        let mut high = self.segments.len();
        while low < high {
            let mid = low + (high - low) / 2;
            if self.segments[mid].slot(0).id <= id {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        if low == start {
            return None;
        }
        let segment_index = low - 1;
        let segment = &self.segments[segment_index];
        for slot_index in 0..SLOTS_PER_SEGMENT {
            let slot = segment.slot(slot_index);
            if slot.is_empty() {
                break;
            }
            if slot.id == id {
                return Some((segment_index, slot_index));
            }
        }
        None
    }

    /// Remove one located order, maintaining dense-left packing. When the
    /// order was the only occupant of its segment the whole segment goes,
    /// with later segments shifting down; otherwise the remaining slots of
    /// that segment shift left by one.
    ///
    /// Returns the removed quantity.
    pub fn remove(&mut self, segment_index: usize, slot_index: usize) -> u64 {
        let segment = self.segments[segment_index];
        let quantity = segment.slot(slot_index).quantity;

        let only_occupant = slot_index == 0 && segment.slot(1).is_empty();
        if only_occupant {
            self.segments.remove(segment_index);
        } else {
            let mut rewritten = segment;
            for index in slot_index..SLOTS_PER_SEGMENT - 1 {
                let next = segment.slot(index + 1);
                rewritten.set_slot(index, next.id, next.quantity);
            }
            rewritten.clear_slot(SLOTS_PER_SEGMENT - 1);
            self.segments[segment_index] = rewritten;
        }
        quantity
    }

    /// Consume orders in scan order until `residual` is exhausted or the
    /// level runs dry. `on_fill` observes every fill: the filled portion and
    /// whether the maker order was fully consumed.
    ///
    /// Returns the number of leading active segments that are now fully
    /// consumed; the caller advances the level's tombstone offset by that
    /// amount, or retires the level when every active segment was consumed.
    pub fn consume(
        &mut self,
        offset: u32,
        residual: &mut u64,
        on_fill: &mut impl FnMut(Slot, bool),
    ) -> u32 {
        let mut consumed_segments = 0u32;
        for segment_index in offset as usize..self.segments.len() {
            let before = self.segments[segment_index];
            let mut rewritten = before;
            let mut consumed_in_segment = 0usize;
            for slot_index in 0..SLOTS_PER_SEGMENT {
                let slot = rewritten.slot(slot_index);
                if slot.is_empty() || *residual == 0 {
                    break;
                }
                if *residual >= slot.quantity {
                    *residual -= slot.quantity;
                    on_fill(slot, true);
                    rewritten.clear_slot(slot_index);
                    consumed_in_segment += 1;
                    if slot_index == SLOTS_PER_SEGMENT - 1
                        || rewritten.slot(slot_index + 1).is_empty()
                    {
                        consumed_segments += 1;
                    }
                } else {
                    let taken = *residual;
                    rewritten.set_slot(slot_index, slot.id, slot.quantity - taken);
                    on_fill(
                        Slot {
                            id: slot.id,
                            quantity: taken,
                        },
                        false,
                    );
                    *residual = 0;
                }
            }
            // A consumed prefix that did not empty the segment leaves a hole
            // at the front; shift the survivors left to restore dense
            // packing.
            if consumed_in_segment > 0 && consumed_in_segment < before.occupied_slots() {
                rewritten = rewritten.shifted_left(consumed_in_segment);
            }
            self.segments[segment_index] = rewritten;
            if *residual == 0 {
                break;
            }
        }
        consumed_segments
    }

    /// Count how many fills `consume` would record, without mutating.
    /// Decrements `residual` the same way the real scan does.
    pub fn count_consumable(&self, offset: u32, residual: &mut u64) -> usize {
        let mut fills = 0usize;
        for segment in &self.segments[(offset as usize).min(self.segments.len())..] {
            for slot_index in 0..SLOTS_PER_SEGMENT {
                let slot = segment.slot(slot_index);
                if slot.is_empty() || *residual == 0 {
                    break;
                }
                fills += 1;
                *residual = residual.saturating_sub(slot.quantity);
            }
            if *residual == 0 {
                break;
            }
        }
        fills
    }

    /// Concrete orders in the active range, in time order.
    pub fn iter_from(&self, offset: u32) -> impl Iterator<Item = Slot> + '_ {
        self.segments[(offset as usize).min(self.segments.len())..]
            .iter()
            .flat_map(|segment| (0..SLOTS_PER_SEGMENT).map(|index| segment.slot(index)))
            .filter(|slot| !slot.is_empty())
    }

    /// Total resting quantity in the active range.
    pub fn total_quantity_from(&self, offset: u32) -> u64 {
        self.iter_from(offset).map(|slot| slot.quantity).sum()
    }
}
