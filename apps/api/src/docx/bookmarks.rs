//! Bookmark region index — the two-pass scan behind placeholder lookup.
//!
//! Pass 1 records every `<w:bookmarkStart .../>` with its identifier and name.
//! Pass 2 pairs each start with the first `<w:bookmarkEnd .../>` after it that
//! carries the same identifier. Pairing is by identifier, never by position, so
//! reordered or repeated markers still resolve to the right span.

#[cfg(test)]
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::layout::mapping::slot_index;

static START_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:bookmarkStart\b[^>]*?/>").expect("valid start marker regex"));
static END_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:bookmarkEnd\b[^>]*?/>").expect("valid end marker regex"));
static ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bw:id="(\d+)""#).expect("valid id regex"));
static NAME_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bw:name="([^"]*)""#).expect("valid name regex"));
#[cfg(test)]
static TEXT_NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").expect("valid text node regex")
});

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// One placeholder region: a start marker, its interior and the matching end marker.
///
/// Spans are byte offsets into the scanned body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: u64,
    pub name: String,
    pub start: Range<usize>,
    pub end: Range<usize>,
}

impl Region {
    pub fn interior(&self) -> Range<usize> {
        self.start.end..self.end.start
    }

    pub fn outer(&self) -> Range<usize> {
        self.start.start..self.end.end
    }

    /// Slot index if the name follows the `n{index}` scheme.
    pub fn slot(&self) -> Option<u32> {
        slot_index(&self.name)
    }

    /// Concatenated, unescaped text of every `<w:t>` inside the region.
    #[cfg(test)]
    pub fn text(&self, body: &str) -> String {
        TEXT_NODE
            .captures_iter(&body[self.interior()])
            .filter_map(|c| c.get(1))
            .map(|m| {
                quick_xml::escape::unescape(m.as_str())
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| m.as_str().to_string())
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct StartMarker {
    id: u64,
    name: String,
    span: Range<usize>,
}

/// All resolvable bookmark regions of one document body, in document order.
#[derive(Debug, Clone, Default)]
pub struct BookmarkIndex {
    regions: Vec<Region>,
    start_markers: usize,
    unmatched: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Scan
// ────────────────────────────────────────────────────────────────────────────

impl BookmarkIndex {
    pub fn scan(body: &str) -> Self {
        // Pass 1: start markers by identifier and name.
        let starts: Vec<StartMarker> = START_MARKER
            .find_iter(body)
            .filter_map(|m| {
                let tag = m.as_str();
                Some(StartMarker {
                    id: attr_id(tag)?,
                    name: NAME_ATTR.captures(tag)?.get(1)?.as_str().to_string(),
                    span: m.range(),
                })
            })
            .collect();
        let start_markers = START_MARKER.find_iter(body).count();

        // Pass 2: end markers grouped by identifier, each list in document order.
        let mut ends: HashMap<u64, Vec<Range<usize>>> = HashMap::new();
        for m in END_MARKER.find_iter(body) {
            if let Some(id) = attr_id(m.as_str()) {
                ends.entry(id).or_default().push(m.range());
            }
        }

        let mut regions = Vec::with_capacity(starts.len());
        let mut unmatched = Vec::new();
        for start in starts {
            let end = ends.get(&start.id).and_then(|spans| {
                let first_after = spans.partition_point(|s| s.start < start.span.end);
                spans.get(first_after).cloned()
            });
            match end {
                Some(end) => regions.push(Region {
                    id: start.id,
                    name: start.name,
                    start: start.span,
                    end,
                }),
                None => unmatched.push(start.name),
            }
        }

        Self {
            regions,
            start_markers,
            unmatched,
        }
    }

    #[cfg(test)]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Number of `<w:bookmarkStart>` tags, paired or not.
    pub fn start_marker_count(&self) -> usize {
        self.start_markers
    }

    /// Names of start markers that have no end marker after them.
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    /// Regions following the slot naming scheme, with their slot index.
    pub fn slot_regions(&self) -> impl Iterator<Item = (u32, &Region)> {
        self.regions
            .iter()
            .filter_map(|region| region.slot().map(|slot| (slot, region)))
    }

    /// Identifier carried by each slot's region. The first region wins for a repeated name.
    pub fn slot_identifiers(&self) -> HashMap<u32, u64> {
        let mut ids = HashMap::new();
        for (slot, region) in self.slot_regions() {
            ids.entry(slot).or_insert(region.id);
        }
        ids
    }

    /// Declared slots in `1..=capacity` with no region in this body.
    pub fn missing_slots(&self, capacity: u32) -> Vec<u32> {
        let present = self.slot_identifiers();
        (1..=capacity).filter(|slot| !present.contains_key(slot)).collect()
    }
}

/// Rendered text of every slot region, keyed by slot index.
#[cfg(test)]
pub fn read_slot_values(body: &str) -> BTreeMap<u32, String> {
    let index = BookmarkIndex::scan(body);
    let mut values = BTreeMap::new();
    for (slot, region) in index.slot_regions() {
        values.entry(slot).or_insert_with(|| region.text(body));
    }
    values
}

fn attr_id(tag: &str) -> Option<u64> {
    ID_ATTR.captures(tag)?.get(1)?.as_str().parse().ok()
}
