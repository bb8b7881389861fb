//! Template archive — loading, and rewriting the document part per render.
//!
//! The original archive bytes are never modified. Every render opens a fresh
//! reader over them, copies all other parts verbatim and writes a new
//! `word/document.xml`.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::docx::bookmarks::BookmarkIndex;
use crate::docx::fusion::{identifier_stride, FusionPlan};
use crate::docx::substitution::{
    substitute, RegionSelector, RunFormatting, SubstitutionReport,
};
use crate::layout::mapping::SlotMapping;
use crate::layout::paginator::PageDescriptor;

/// Internal path of the document body inside the archive.
pub const DOCUMENT_PART: &str = "word/document.xml";

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template is not a readable archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("template archive has no `{0}` part")]
    MissingDocumentPart(&'static str),

    #[error("template I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not find the sticker table in the template document")]
    BlockNotFound,

    #[error("nothing to render: no pages")]
    NoPages,
}

/// What the loaded template offers, reported at load time and over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub capacity: u32,
    pub slot_regions: usize,
    pub identifier_count: u64,
    pub missing_slots: Vec<u32>,
}

/// One rendered template copy, tagged with its page number.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page_number: u32,
    pub bytes: Vec<u8>,
}

/// A loaded, read-only template.
#[derive(Debug, Clone)]
pub struct Template {
    bytes: Bytes,
    body: String,
    capacity: u32,
    formatting: RunFormatting,
    summary: TemplateSummary,
}

// ────────────────────────────────────────────────────────────────────────────
// Loading
// ────────────────────────────────────────────────────────────────────────────

impl Template {
    /// Reads the template archive from disk.
    pub async fn load(
        path: impl AsRef<Path>,
        capacity: u32,
        formatting: RunFormatting,
    ) -> Result<Self, TemplateError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Self::from_bytes(bytes, capacity, formatting)
    }

    pub fn from_bytes(
        bytes: impl Into<Bytes>,
        capacity: u32,
        formatting: RunFormatting,
    ) -> Result<Self, TemplateError> {
        let bytes = bytes.into();
        let mut archive = ZipArchive::new(Cursor::new(bytes.clone()))?;
        let mut body = String::new();
        match archive.by_name(DOCUMENT_PART) {
            Ok(mut part) => {
                part.read_to_string(&mut body)?;
            }
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(TemplateError::MissingDocumentPart(DOCUMENT_PART))
            }
            Err(e) => return Err(e.into()),
        }

        let index = BookmarkIndex::scan(&body);
        let summary = TemplateSummary {
            capacity,
            slot_regions: index
                .slot_regions()
                .filter(|(slot, _)| (1..=capacity).contains(slot))
                .count(),
            identifier_count: identifier_stride(&body),
            missing_slots: index.missing_slots(capacity),
        };
        if !index.unmatched().is_empty() {
            warn!(
                "Template has {} bookmark start markers without an end marker",
                index.unmatched().len()
            );
        }

        Ok(Self {
            bytes,
            body,
            capacity,
            formatting,
            summary,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[cfg(test)]
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn summary(&self) -> &TemplateSummary {
        &self.summary
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

impl Template {
    /// One independent archive per page, in page order.
    pub fn render_separate(
        &self,
        pages: &[PageDescriptor],
    ) -> Result<Vec<RenderedPage>, TemplateError> {
        pages
            .iter()
            .map(|page| -> Result<RenderedPage, TemplateError> {
                let mapping = SlotMapping::for_page(page, self.capacity);
                let out = substitute(&self.body, &mapping, RegionSelector::ByName, &self.formatting);
                log_report(page.page_number, &out.report);
                Ok(RenderedPage {
                    page_number: page.page_number,
                    bytes: self.write_archive(&out.body)?,
                })
            })
            .collect()
    }

    /// A single archive holding one renumbered table copy per page.
    ///
    /// With one page this is exactly the separate render of that page.
    pub fn render_fused(&self, pages: &[PageDescriptor]) -> Result<Vec<u8>, TemplateError> {
        if pages.len() < 2 {
            return self
                .render_separate(pages)?
                .into_iter()
                .next()
                .map(|page| page.bytes)
                .ok_or(TemplateError::NoPages);
        }

        let plan = FusionPlan::new(&self.body)?;
        debug!(
            "Fusing {} pages with identifier stride {}",
            pages.len(),
            plan.stride()
        );

        let blocks: Vec<String> = pages
            .iter()
            .enumerate()
            .map(|(k, page)| {
                let copy = plan.page_copy(k);
                let ids = plan.page_slot_ids(k);
                let mapping = SlotMapping::for_page(page, self.capacity);
                let out = substitute(
                    &copy,
                    &mapping,
                    RegionSelector::ByIdentifier(&ids),
                    &self.formatting,
                );
                log_report(page.page_number, &out.report);
                out.body
            })
            .collect();

        self.write_archive(&plan.assemble(blocks))
    }

    /// Copies the pristine archive with `body` as its document part.
    fn write_archive(&self, body: &str) -> Result<Vec<u8>, TemplateError> {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.clone()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let part = archive.by_index_raw(i)?;
            if part.name() == DOCUMENT_PART {
                drop(part);
                writer.start_file(DOCUMENT_PART, options)?;
                writer.write_all(body.as_bytes())?;
            } else {
                writer.raw_copy_file(part)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

fn log_report(page_number: u32, report: &SubstitutionReport) {
    debug!(
        "Page {page_number}: {} filled, {} cleared",
        report.filled, report.cleared
    );
    if !report.dropped.is_empty() {
        warn!(
            "Page {page_number}: {} values not rendered, no placeholder for slots {:?}",
            report.dropped.len(),
            report.dropped
        );
    }
    if report.overlapping > 0 {
        warn!(
            "Page {page_number}: skipped {} overlapping placeholder regions",
            report.overlapping
        );
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
