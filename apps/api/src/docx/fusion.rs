//! Fusion renumbering — one document, one copy of the sticker table per page.
//!
//! Page `k` gets a copy of the table with every `w:id` shifted by
//! `offset(k, stride)`. Slot names stay the same in every copy, so a page finds
//! its regions by taking the identifiers of the original table and applying
//! the same offset.

use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::docx::bookmarks::BookmarkIndex;
use crate::docx::template::TemplateError;

/// Separator inserted before every copy after the first. Zero spacing so it
/// does not eat into the usable height of the next table.
pub const PAGE_BREAK: &str = concat!(
    r#"<w:p><w:pPr><w:spacing w:before="0" w:after="0" w:line="0" w:lineRule="exact"/></w:pPr>"#,
    r#"<w:r><w:br w:type="page"/></w:r></w:p>"#,
);

static ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bw:id="(\d+)""#).expect("valid id regex"));
static TABLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)w:tbl(?:\s[^>]*)?>").expect("valid table regex"));

/// Identifier shift applied to page `page_index`. Page 0 keeps its identifiers.
///
/// Copy `j` occupies `[min + j * stride, min + (j + 1) * stride)` where `min` is
/// the smallest template identifier, so no two pages share an identifier as long
/// as the template's identifiers span fewer than `stride` values.
pub fn offset(page_index: usize, stride: u64) -> u64 {
    page_index as u64 * stride
}

/// Identifier stride for a template body.
///
/// The number of bookmark start markers, raised to the width of the identifier
/// range (`max - min + 1`) when the template numbers its identifiers sparsely.
pub fn identifier_stride(body: &str) -> u64 {
    let start_markers = BookmarkIndex::scan(body).start_marker_count() as u64;
    let ids = ID_ATTR
        .captures_iter(body)
        .filter_map(|c| c[1].parse::<u64>().ok());
    let range = ids.fold(None, |range: Option<(u64, u64)>, id| match range {
        Some((min, max)) => Some((min.min(id), max.max(id))),
        None => Some((id, id)),
    });
    match range {
        Some((min, max)) => start_markers.max(max - min + 1),
        None => start_markers,
    }
}

/// Shifts every `w:id` in `block` by `offset`.
pub fn renumber(block: &str, offset: u64) -> Cow<'_, str> {
    if offset == 0 {
        return Cow::Borrowed(block);
    }
    ID_ATTR.replace_all(block, |caps: &Captures<'_>| {
        match caps[1].parse::<u64>().ok().and_then(|id| id.checked_add(offset)) {
            Some(id) => format!(r#"w:id="{id}""#),
            None => caps[0].to_string(),
        }
    })
}

/// Byte range of the first top-level `<w:tbl>` element, nested tables included.
pub fn locate_block(body: &str) -> Result<Range<usize>, TemplateError> {
    let mut depth = 0usize;
    let mut start = None;
    for tag in TABLE_TAG.captures_iter(body) {
        let Some(whole) = tag.get(0) else { continue };
        let closing = !tag[1].is_empty();
        if !closing {
            if depth == 0 {
                start = Some(whole.start());
            }
            depth += 1;
        } else if depth > 0 {
            depth -= 1;
            if depth == 0 {
                if let Some(start) = start {
                    return Ok(start..whole.end());
                }
            }
        }
    }
    Err(TemplateError::BlockNotFound)
}

// ────────────────────────────────────────────────────────────────────────────
// Plan
// ────────────────────────────────────────────────────────────────────────────

/// Everything needed to lay several pages into one body.
#[derive(Debug, Clone)]
pub struct FusionPlan<'a> {
    body: &'a str,
    block: Range<usize>,
    stride: u64,
    slot_ids: HashMap<u32, u64>,
}

impl<'a> FusionPlan<'a> {
    /// Fails when the template has no table to repeat.
    pub fn new(body: &'a str) -> Result<Self, TemplateError> {
        let block = locate_block(body)?;
        let slot_ids = BookmarkIndex::scan(&body[block.clone()]).slot_identifiers();
        Ok(Self {
            body,
            block,
            stride: identifier_stride(body),
            slot_ids,
        })
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn block(&self) -> &'a str {
        &self.body[self.block.clone()]
    }

    /// Renumbered copy of the table for `page_index`.
    pub fn page_copy(&self, page_index: usize) -> Cow<'a, str> {
        renumber(self.block(), offset(page_index, self.stride))
    }

    /// Slot identifiers as they appear in the copy for `page_index`.
    pub fn page_slot_ids(&self, page_index: usize) -> HashMap<u32, u64> {
        let shift = offset(page_index, self.stride);
        self.slot_ids
            .iter()
            .map(|(&slot, &id)| (slot, id + shift))
            .collect()
    }

    /// Body with the table replaced by the given page blocks in order.
    ///
    /// Text before and after the table is kept; copies follow each other
    /// directly, each after the first preceded by [`PAGE_BREAK`].
    pub fn assemble<I>(&self, pages: I) -> String
    where
        I: IntoIterator<Item = String>,
    {
        let mut out = String::with_capacity(self.body.len() * 2);
        out.push_str(&self.body[..self.block.start]);
        for (k, page) in pages.into_iter().enumerate() {
            if k > 0 {
                out.push_str(PAGE_BREAK);
            }
            out.push_str(&page);
        }
        out.push_str(&self.body[self.block.end..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::test_support::document_xml;
    use std::collections::HashSet;

    fn bookmark_ids(body: &str) -> Vec<u64> {
        static START_ID: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r#"<w:bookmarkStart w:id="(\d+)""#).unwrap());
        START_ID
            .captures_iter(body)
            .map(|c| c[1].parse().unwrap())
            .collect()
    }

    #[test]
    fn test_offset_is_page_index_times_stride() {
        assert_eq!(offset(0, 389), 0);
        assert_eq!(offset(1, 389), 389);
        assert_eq!(offset(3, 389), 1167);
    }

    #[test]
    fn test_stride_counts_start_markers() {
        // 10 slot bookmarks plus _GoBack, identifiers 0..=10.
        assert_eq!(identifier_stride(&document_xml(10, &[])), 11);
    }

    #[test]
    fn test_stride_covers_sparse_identifiers() {
        let body = concat!(
            r#"<w:bookmarkStart w:id="0" w:name="n1"/><w:bookmarkEnd w:id="0"/>"#,
            r#"<w:bookmarkStart w:id="40" w:name="n2"/><w:bookmarkEnd w:id="40"/>"#,
        );
        assert_eq!(identifier_stride(body), 41);
    }

    #[test]
    fn test_stride_is_marker_count_for_dense_ids_from_one() {
        let body = concat!(
            r#"<w:bookmarkStart w:id="1" w:name="n1"/><w:bookmarkEnd w:id="1"/>"#,
            r#"<w:bookmarkStart w:id="2" w:name="n2"/><w:bookmarkEnd w:id="2"/>"#,
            r#"<w:bookmarkStart w:id="3" w:name="n3"/><w:bookmarkEnd w:id="3"/>"#,
        );
        assert_eq!(identifier_stride(body), 3);
    }

    #[test]
    fn test_dense_ids_from_one_stay_unique_when_fused() {
        let body = concat!(
            "<w:tbl>",
            r#"<w:bookmarkStart w:id="1" w:name="n1"/><w:bookmarkEnd w:id="1"/>"#,
            r#"<w:bookmarkStart w:id="2" w:name="n2"/><w:bookmarkEnd w:id="2"/>"#,
            r#"<w:bookmarkStart w:id="3" w:name="n3"/><w:bookmarkEnd w:id="3"/>"#,
            "</w:tbl>",
        );
        let plan = FusionPlan::new(body).unwrap();
        let fused = plan.assemble((0..4).map(|k| plan.page_copy(k).into_owned()));
        let ids = bookmark_ids(&fused);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), 12);
        assert_eq!(unique.len(), 12);
    }

    #[test]
    fn test_renumber_shifts_every_identifier() {
        let block = r#"<w:bookmarkStart w:id="3" w:name="n1"/><w:bookmarkEnd w:id="3"/><w:ins w:id="12"/>"#;
        assert_eq!(
            renumber(block, 100),
            r#"<w:bookmarkStart w:id="103" w:name="n1"/><w:bookmarkEnd w:id="103"/><w:ins w:id="112"/>"#
        );
        assert!(matches!(renumber(block, 0), Cow::Borrowed(_)));
    }

    #[test]
    fn test_locate_block_handles_nested_tables() {
        let body = "<w:p/><w:tbl><w:tc><w:tbl></w:tbl></w:tc></w:tbl><w:p/><w:tbl></w:tbl>";
        let range = locate_block(body).unwrap();
        assert_eq!(&body[range], "<w:tbl><w:tc><w:tbl></w:tbl></w:tc></w:tbl>");
    }

    #[test]
    fn test_locate_block_ignores_table_properties() {
        let body = "<w:tbl><w:tblPr/><w:tblGrid/></w:tbl>";
        assert_eq!(locate_block(body).unwrap(), 0..body.len());
    }

    #[test]
    fn test_missing_block_is_fatal() {
        let err = FusionPlan::new("<w:body><w:p/></w:body>").unwrap_err();
        assert!(matches!(err, TemplateError::BlockNotFound));
    }

    #[test]
    fn test_fused_identifiers_are_unique() {
        let body = document_xml(25, &[]);
        let plan = FusionPlan::new(&body).unwrap();
        for page_count in 2..=6 {
            let fused = plan.assemble((0..page_count).map(|k| plan.page_copy(k).into_owned()));
            let ids = bookmark_ids(&fused);
            let unique: HashSet<_> = ids.iter().collect();
            assert_eq!(ids.len(), unique.len(), "page_count={page_count}");
            assert_eq!(fused.matches(PAGE_BREAK).count(), page_count - 1);
        }
    }

    #[test]
    fn test_page_slot_ids_follow_renumbered_copy() {
        let body = document_xml(5, &[]);
        let plan = FusionPlan::new(&body).unwrap();
        let copy = plan.page_copy(2);
        let found = BookmarkIndex::scan(&copy).slot_identifiers();
        assert_eq!(found, plan.page_slot_ids(2));
    }

    #[test]
    fn test_assemble_keeps_text_around_block() {
        let body = "<w:body><w:p>head</w:p><w:tbl>T</w:tbl><w:p/><w:sectPr/></w:body>";
        let plan = FusionPlan::new(body).unwrap();
        let out = plan.assemble(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(
            out,
            format!("<w:body><w:p>head</w:p>A{PAGE_BREAK}B<w:p/><w:sectPr/></w:body>")
        );
    }
}
