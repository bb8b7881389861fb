//! Per-page slot mapping: slot name (`n1`..`n{capacity}`) to value-or-absent.

use std::collections::BTreeMap;

use crate::layout::paginator::PageDescriptor;

/// Prefix shared by every slot bookmark name.
pub const SLOT_PREFIX: &str = "n";

/// Slot index encoded in a bookmark name, if it follows the `n{index}` scheme.
pub fn slot_index(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(SLOT_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Values keyed by slot index for one template copy.
///
/// Every slot in `1..=capacity` is declared; slots outside the page range map to `None`
/// so a render clears them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMapping {
    capacity: u32,
    values: BTreeMap<u32, String>,
}

impl SlotMapping {
    /// A mapping with every slot absent.
    #[cfg(test)]
    pub fn empty(capacity: u32) -> Self {
        Self {
            capacity,
            values: BTreeMap::new(),
        }
    }

    /// Slot `i` maps to `values[i - start_slot]` inside the page range, absent elsewhere.
    pub fn for_page(page: &PageDescriptor, capacity: u32) -> Self {
        let values = (page.start_slot..=page.end_slot.min(capacity))
            .filter_map(|slot| page.value_at(slot).map(|v| (slot, v.to_string())))
            .collect();
        Self { capacity, values }
    }

    #[cfg(test)]
    pub fn with_value(mut self, slot: u32, value: impl Into<String>) -> Self {
        if (1..=self.capacity).contains(&slot) {
            self.values.insert(slot, value.into());
        }
        self
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Whether `index` is one of the declared slots `1..=capacity`.
    pub fn declares(&self, index: u32) -> bool {
        (1..=self.capacity).contains(&index)
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.values.get(&index).map(String::as_str)
    }

    /// Number of slots that carry a value.
    #[cfg(test)]
    pub fn filled(&self) -> usize {
        self.values.len()
    }
}
