//! Placeholder substitution — rewrites slot regions of a document body.
//!
//! The new body is assembled from ordered segments (untouched text and rewritten
//! regions) instead of splicing the old string in place. Markers are copied
//! verbatim, so region identifiers and slot names never change here.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::docx::bookmarks::{BookmarkIndex, Region};
use crate::layout::mapping::SlotMapping;

static RUN_PROPERTIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:rPr>.*?</w:rPr>").expect("valid rPr regex"));

/// Run formatting used when a region carries none of its own: 14pt text.
pub const DEFAULT_RUN_PROPERTIES: &str = r#"<w:rPr><w:sz w:val="28"/><w:szCs w:val="28"/></w:rPr>"#;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Formatting descriptor (`<w:rPr>` element) for regions without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFormatting(String);

impl RunFormatting {
    pub fn new(properties: impl Into<String>) -> Self {
        Self(properties.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunFormatting {
    fn default() -> Self {
        Self::new(DEFAULT_RUN_PROPERTIES)
    }
}

/// How a slot finds its region in the body being rewritten.
#[derive(Debug, Clone, Copy)]
pub enum RegionSelector<'a> {
    /// Every region named after a declared slot.
    ByName,
    /// Only the region whose identifier matches the expected one for its slot.
    /// Used on renumbered copies where the same names occur once per page.
    ByIdentifier(&'a HashMap<u32, u64>),
}

impl RegionSelector<'_> {
    fn accepts(&self, slot: u32, region: &Region) -> bool {
        match self {
            RegionSelector::ByName => true,
            RegionSelector::ByIdentifier(ids) => ids.get(&slot) == Some(&region.id),
        }
    }
}

/// What a substitution pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubstitutionReport {
    /// Regions that now hold a value.
    pub filled: usize,
    /// Regions emptied because their slot has no value on this page.
    pub cleared: usize,
    /// Declared slots with no region in the body. Skipped, not an error.
    pub missing: Vec<u32>,
    /// Missing slots that had a value, i.e. values that were not rendered.
    pub dropped: Vec<u32>,
    /// Regions skipped because they overlap an earlier rewritten region.
    pub overlapping: usize,
}

#[derive(Debug, Clone)]
pub struct Substituted {
    pub body: String,
    pub report: SubstitutionReport,
}

enum Segment<'a> {
    Unchanged(&'a str),
    Region {
        start_marker: &'a str,
        run: Option<String>,
        end_marker: &'a str,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Core function
// ────────────────────────────────────────────────────────────────────────────

/// Rewrites every declared slot region of `body` from `mapping`.
///
/// A slot with a value becomes `start marker + one run + end marker`, the run
/// reusing the first `<w:rPr>` found in the old interior (or `formatting`).
/// A slot without a value becomes the two markers with nothing between them.
/// Regions named outside `1..=capacity`, and anything that is not a region,
/// pass through untouched.
pub fn substitute(
    body: &str,
    mapping: &SlotMapping,
    selector: RegionSelector<'_>,
    formatting: &RunFormatting,
) -> Substituted {
    let index = BookmarkIndex::scan(body);
    let mut report = SubstitutionReport::default();

    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut seen = vec![false; mapping.capacity() as usize + 1];

    for (slot, region) in index.slot_regions() {
        if !mapping.declares(slot) || !selector.accepts(slot, region) {
            continue;
        }
        let outer = region.outer();
        if outer.start < cursor {
            report.overlapping += 1;
            continue;
        }
        seen[slot as usize] = true;

        segments.push(Segment::Unchanged(&body[cursor..outer.start]));
        let run = mapping
            .get(slot)
            .map(|value| render_run(value, run_properties(&body[region.interior()], formatting)));
        match run {
            Some(_) => report.filled += 1,
            None => report.cleared += 1,
        }
        segments.push(Segment::Region {
            start_marker: &body[region.start.clone()],
            run,
            end_marker: &body[region.end.clone()],
        });
        cursor = outer.end;
    }
    segments.push(Segment::Unchanged(&body[cursor..]));

    for slot in 1..=mapping.capacity() {
        if !seen[slot as usize] {
            report.missing.push(slot);
            if mapping.get(slot).is_some() {
                report.dropped.push(slot);
            }
        }
    }

    Substituted {
        body: assemble(&segments),
        report,
    }
}

/// First formatting descriptor inside a region interior, or the configured default.
fn run_properties<'a>(interior: &'a str, formatting: &'a RunFormatting) -> &'a str {
    RUN_PROPERTIES
        .find(interior)
        .map(|m| m.as_str())
        .unwrap_or_else(|| formatting.as_str())
}

fn render_run(value: &str, properties: &str) -> String {
    let space = if value.trim() != value {
        r#" xml:space="preserve""#
    } else {
        ""
    };
    let text: Cow<'_, str> = quick_xml::escape::escape(value);
    format!("<w:r>{properties}<w:t{space}>{text}</w:t></w:r>")
}

fn assemble(segments: &[Segment<'_>]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Unchanged(text) => out.push_str(text),
            Segment::Region {
                start_marker,
                run,
                end_marker,
            } => {
                out.push_str(start_marker);
                if let Some(run) = run {
                    out.push_str(run);
                }
                out.push_str(end_marker);
            }
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
