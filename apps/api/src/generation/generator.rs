//! Sticker sheet generation — orchestrates one run.
//!
//! Flow: validate → paginate → render (separate or fused) → name outputs.
//!
//! A run is atomic: any failure is returned before an output exists, and a
//! successful run returns every requested archive.

use serde::Deserialize;
use tracing::info;

use crate::docx::Template;
use crate::errors::AppError;
use crate::generation::naming::OutputNaming;
use crate::layout::paginator::{paginate, PageDescriptor};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Caller choices for one run.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GenerateOptions {
    #[serde(default = "first_slot")]
    pub start_slot: u32,
    /// Fuse all pages into one document. Ignored for a single page.
    #[serde(default)]
    pub fuse: bool,
}

fn first_slot() -> u32 {
    1
}

/// Limits and naming taken from configuration.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub naming: OutputNaming,
    pub max_pages: usize,
}

/// A rendered archive and the name it is delivered under.
#[derive(Debug, Clone)]
pub struct NamedArchive {
    pub name: String,
    pub bytes: Vec<u8>,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Splits the values over pages. Rejects runs that cannot produce output.
pub fn plan_pages(
    values: &[String],
    capacity: u32,
    start_slot: u32,
    max_pages: usize,
) -> Result<Vec<PageDescriptor>, AppError> {
    if values.is_empty() {
        return Err(AppError::Validation(
            "No sticker numbers given. Enter at least one value.".to_string(),
        ));
    }

    let pages = paginate(values, capacity, start_slot)?;
    if pages.len() > max_pages {
        return Err(AppError::Validation(format!(
            "{} values need {} pages, the limit is {max_pages}",
            values.len(),
            pages.len()
        )));
    }
    Ok(pages)
}

/// Runs one generation and returns the named archives in page order.
///
/// Fused mode with several pages yields one archive; otherwise one per page.
pub fn generate(
    template: &Template,
    values: &[String],
    options: GenerateOptions,
    settings: &GenerationSettings,
) -> Result<Vec<NamedArchive>, AppError> {
    let pages = plan_pages(values, template.capacity(), options.start_slot, settings.max_pages)?;
    let fused = options.fuse && pages.len() > 1;
    info!(
        "Generating {} values over {} pages from slot {} ({})",
        values.len(),
        pages.len(),
        options.start_slot,
        if fused { "fused" } else { "separate" }
    );

    if fused {
        let bytes = template.render_fused(&pages)?;
        return Ok(vec![NamedArchive {
            name: settings.naming.fused(pages.len()),
            bytes,
        }]);
    }

    let single = pages.len() == 1;
    let archives = template
        .render_separate(&pages)?
        .into_iter()
        .map(|page| NamedArchive {
            name: if single {
                settings.naming.single()
            } else {
                settings.naming.page(page.page_number)
            },
            bytes: page.bytes,
        })
        .collect();
    Ok(archives)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
