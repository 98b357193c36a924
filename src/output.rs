//! Conversion results.

use crate::config::ConversionMode;
use crate::deck::SlideDeck;
use crate::pipeline::strategy::RenderStrategy;
use crate::remote::DiagnosticReport;
use serde::{Deserialize, Serialize};

/// Everything a finished conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Encoded deck: the writer's output locally, the worker's file remotely.
    #[serde(skip)]
    pub deck: Vec<u8>,
    /// Suggested download name, e.g. `report.json` or `report.pptx`.
    pub file_name: String,
    /// The slide description (local conversions only).
    #[serde(skip)]
    pub slides: Option<SlideDeck>,
    /// One entry per converted page (local conversions only).
    pub pages: Vec<PageSummary>,
    pub stats: ConversionStats,
    /// Worker diagnostics (remote conversions with a readable report only).
    pub report: Option<DiagnosticReport>,
    pub remote_job_id: Option<String>,
    /// One-line human summary.
    pub message: String,
}

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub page_number: usize,
    pub text_runs: usize,
    pub raster_captured: bool,
    pub strategy: RenderStrategy,
    pub clamped_boxes: usize,
}

/// Counters and timings of a conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub mode: ConversionMode,
    /// Pages in the document.
    pub total_pages: usize,
    /// Slides produced.
    pub converted_pages: usize,
    pub text_boxes: usize,
    pub image_count: usize,
    /// Raw items dropped by the normaliser.
    pub skipped_text_runs: usize,
    /// Runs absorbed into a neighbour by the merge pass.
    pub merged_text_runs: usize,
    /// Pages for which a raster was rendered.
    pub raster_pages: usize,
    /// Text boxes clamped into slide bounds.
    pub clamped_boxes: usize,
    pub total_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub generate_duration_ms: u64,
}

/// Document-level information read without converting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    /// First page size in points.
    pub first_page_width: Option<f64>,
    pub first_page_height: Option<f64>,
}
