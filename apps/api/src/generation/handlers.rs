//! Axum route handlers for the Sticker API.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::docx::TemplateSummary;
use crate::errors::AppError;
use crate::generation::bundle::{into_download, Download};
use crate::generation::generator::{generate, plan_pages, GenerateOptions};
use crate::ingest::{tokenize_cells, tokenize_text};
use crate::layout::PageDescriptor;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Sticker values as pasted text (one per line) or as the first column of a sheet.
#[derive(Debug, Default, Deserialize)]
pub struct StickerInput {
    #[serde(default)]
    pub text: Option<String>,
    /// Cell values of column A, one per row. Takes precedence over `text`.
    #[serde(default)]
    pub cells: Option<Vec<Value>>,
}

impl StickerInput {
    pub fn values(&self) -> Vec<String> {
        match (&self.cells, &self.text) {
            (Some(cells), _) => tokenize_cells(cells),
            (None, Some(text)) => tokenize_text(text),
            (None, None) => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StickerRequest {
    #[serde(flatten)]
    pub input: StickerInput,
    #[serde(flatten)]
    pub options: GenerateOptions,
}

#[derive(Debug, Serialize)]
pub struct PreviewPage {
    pub page_number: u32,
    pub start_slot: u32,
    pub end_slot: u32,
    pub count: usize,
    pub first: String,
    pub last: String,
}

impl From<&PageDescriptor> for PreviewPage {
    fn from(page: &PageDescriptor) -> Self {
        Self {
            page_number: page.page_number,
            start_slot: page.start_slot,
            end_slot: page.end_slot,
            count: page.count(),
            first: page.values.first().cloned().unwrap_or_default(),
            last: page.values.last().cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub total_values: usize,
    pub pages: Vec<PreviewPage>,
    /// Whether a generate call with the same body fuses its pages.
    pub fused: bool,
    /// Number of documents a generate call with the same body produces.
    pub output_files: usize,
}

#[derive(Debug, Serialize)]
pub struct TemplateStatus {
    pub loaded: bool,
    #[serde(flatten)]
    pub summary: Option<TemplateSummary>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/template
pub async fn handle_template_status(State(state): State<AppState>) -> Json<TemplateStatus> {
    let summary = state.template().ok().map(|t| t.summary().clone());
    Json(TemplateStatus {
        loaded: summary.is_some(),
        summary,
    })
}

/// POST /api/v1/stickers/preview
///
/// Shows how the values split over pages without touching the template.
/// An empty value list is not an error here; it previews zero pages.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(request): Json<StickerRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let values = request.input.values();
    let pages = if values.is_empty() {
        Vec::new()
    } else {
        plan_pages(
            &values,
            state.config.slot_capacity,
            request.options.start_slot,
            state.config.max_pages,
        )?
    };

    let fused = request.options.fuse && pages.len() > 1;
    Ok(Json(PreviewResponse {
        total_values: values.len(),
        output_files: if fused { 1 } else { pages.len() },
        fused,
        pages: pages.iter().map(PreviewPage::from).collect(),
    }))
}

/// POST /api/v1/stickers/generate
///
/// Renders the sheet(s) and returns them as one download: the `.docx` itself
/// for a single document, or a zip bundle of every page document.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<StickerRequest>,
) -> Result<Response, AppError> {
    let template = state.template()?;
    let values = request.input.values();
    let options = request.options;
    let settings = state.config.generation_settings();

    // CPU-bound rendering — spawn_blocking to avoid blocking the async executor.
    let download = tokio::task::spawn_blocking(move || -> Result<Download, AppError> {
        let archives = generate(&template, &values, options, &settings)?;
        Ok(into_download(archives, &settings.naming)?)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in generation: {e}")))??;

    info!(
        "Delivering {} ({} bytes)",
        download.filename,
        download.bytes.len()
    );

    let headers = [
        (header::CONTENT_TYPE, download.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.filename),
        ),
    ];
    Ok((headers, download.bytes).into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
