//! Paginator — maps an ordered value list onto fixed-capacity template copies.
//!
//! # Rules
//! - Only the first page honours the chosen start slot; every later page starts at slot 1.
//! - Every page except the last is filled up to slot `capacity`.
//! - Page numbers run from 1 in generation order.
//! - Concatenating `values` over the output reproduces the input exactly.

use serde::Serialize;
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Which values go on one template copy, and at which slots.
///
/// Invariant: `values.len() == end_slot - start_slot + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDescriptor {
    pub page_number: u32,
    pub start_slot: u32,
    pub end_slot: u32,
    pub values: Vec<String>,
}

impl PageDescriptor {
    fn new(page_number: u32, start_slot: u32, values: Vec<String>) -> Self {
        let end_slot = start_slot + values.len() as u32 - 1;
        Self {
            page_number,
            start_slot,
            end_slot,
            values,
        }
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Value placed at `slot`, if the slot lies inside this page's range.
    pub fn value_at(&self, slot: u32) -> Option<&str> {
        if slot < self.start_slot || slot > self.end_slot {
            return None;
        }
        self.values
            .get((slot - self.start_slot) as usize)
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("capacity must be a positive number of slots")]
    ZeroCapacity,

    #[error("start slot {start_slot} is outside 1..={capacity}")]
    StartSlotOutOfRange { start_slot: u32, capacity: u32 },
}

// ────────────────────────────────────────────────────────────────────────────
// Core function
// ────────────────────────────────────────────────────────────────────────────

/// Splits `values` into page descriptors.
///
/// An empty list yields no pages. A `start_slot` outside `1..=capacity` is
/// rejected rather than clamped.
pub fn paginate(
    values: &[String],
    capacity: u32,
    start_slot: u32,
) -> Result<Vec<PageDescriptor>, PaginationError> {
    if capacity == 0 {
        return Err(PaginationError::ZeroCapacity);
    }
    if start_slot < 1 || start_slot > capacity {
        return Err(PaginationError::StartSlotOutOfRange {
            start_slot,
            capacity,
        });
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let available = (capacity - start_slot + 1) as usize;
    let (first, rest) = values.split_at(available.min(values.len()));

    let mut pages = vec![PageDescriptor::new(1, start_slot, first.to_vec())];

    // Additional pages always start at slot 1; the last one holds the remainder.
    for chunk in rest.chunks(capacity as usize) {
        let page_number = pages.len() as u32 + 1;
        pages.push(PageDescriptor::new(page_number, 1, chunk.to_vec()));
    }

    Ok(pages)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
