//! Conversion entry points.
//!
//! ## Why a session?
//!
//! Every conversion runs inside a [`ConversionSession`]. The session is what
//! enforces "one remote job at a time", carries the cancellation token that
//! [`ConversionSession::reset`] trips, and accumulates totals across runs.
//! The free functions [`convert`], [`convert_to_file`] and [`convert_sync`]
//! create a throwaway session for one-shot use.
//!
//! ## Local pipeline
//!
//! ```text
//! spawn_blocking(capture) ──mpsc──▶ reflow (spawn_blocking per page, buffered)
//!                                     ──▶ build_slide per page ──▶ DeckWriter
//! ```
//!
//! Capture and reflow overlap: page N is reflowed while page N+1 is still
//! being read from the PDF.

use crate::config::ConversionConfig;
use crate::deck::SlideDeck;
use crate::document::PageDocument;
use crate::error::Pdf2DeckError;
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PageSummary};
use crate::pipeline::assemble::build_slide;
use crate::pipeline::extract::{reflow_pages, ExtractionCounts, ExtractionStats};
use crate::pipeline::input::{self, PdfInput};
use crate::pipeline::source::{self, capture_document, CaptureEvent, DocumentSource, PageSink};
use crate::progress::{percent, ProgressTracker};
use crate::remote::orchestrator::run_job;
use crate::remote::{HttpJobClient, JobBackend};
use crate::session::ConversionSession;
use futures::stream::StreamExt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// Extension of decks produced by the remote worker.
pub const REMOTE_DECK_EXTENSION: &str = "pptx";

/// Job id reported by [`Pdf2DeckError::Cancelled`] for local conversions.
pub const LOCAL_JOB_ID: &str = "local";

impl ConversionSession {
    /// Convert a local PDF into a slide deck.
    ///
    /// [`crate::ConversionMode::RemoteHighPrecision`] hands the file to the
    /// worker configured in `config.remote`; every other mode runs the local
    /// reflow pipeline.
    ///
    /// # Errors
    /// Input validation errors, pdfium failures, remote failures, and
    /// [`Pdf2DeckError::SessionBusy`] / [`Pdf2DeckError::JobAlreadyActive`]
    /// when the session is already converting.
    pub async fn convert(
        &self,
        input_str: impl AsRef<str>,
        config: &ConversionConfig,
    ) -> Result<ConversionOutput, Pdf2DeckError> {
        let input_str = input_str.as_ref();
        info!("Starting conversion: {} ({})", input_str, config.options.mode);
        let resolved = input::resolve_input(input_str)?;

        if config.options.mode.is_remote() {
            let backend = HttpJobClient::new(&config.remote)?;
            return self.convert_remote(&backend, &resolved, config).await;
        }

        let path = resolved.path().to_path_buf();
        let password = config.password.clone();
        let selection = config.pages.clone();
        let options = config.options;
        let deck_name = resolved.deck_file_name(config.deck_writer.file_extension());
        self.convert_with(
            move |sink| source::capture_pdf_blocking(&path, password.as_deref(), &selection, &options, sink),
            deck_name,
            config,
        )
        .await
    }

    /// Run the local pipeline over any [`DocumentSource`].
    ///
    /// `deck_stem` names the output (`<stem>.<writer extension>`). The mode
    /// in `config` is used for raster and strategy decisions even when it is
    /// the remote mode; no worker is contacted.
    pub async fn convert_source<S>(
        &self,
        source: S,
        deck_stem: &str,
        config: &ConversionConfig,
    ) -> Result<ConversionOutput, Pdf2DeckError>
    where
        S: DocumentSource + Send + 'static,
    {
        let selection = config.pages.clone();
        let options = config.options;
        let deck_name = format!(
            "{}.{}",
            input::deck_stem(deck_stem),
            config.deck_writer.file_extension()
        );
        self.convert_with(
            move |sink| capture_document(&source, &selection, &options, sink),
            deck_name,
            config,
        )
        .await
    }

    /// Convert `input` through an external worker.
    ///
    /// Submission is refused with [`Pdf2DeckError::JobAlreadyActive`] while
    /// another job of this session is still being tracked.
    pub async fn convert_remote<B: JobBackend>(
        &self,
        backend: &B,
        input: &PdfInput,
        config: &ConversionConfig,
    ) -> Result<ConversionOutput, Pdf2DeckError> {
        let guard = self.begin()?;
        let total_start = Instant::now();
        let tracker = ProgressTracker::new(config.progress_callback.clone());
        let mode = config.options.mode;

        let pdf = input.read_bytes().await?;
        debug!("Read {} bytes from {}", pdf.len(), input.path().display());

        let outcome = run_job(backend, &config.remote, &guard, &input.file_name(), pdf, &tracker).await?;
        guard.record_remote();

        let report = outcome.report;
        let stats = ConversionStats {
            mode,
            total_pages: report.as_ref().map_or(0, |r| r.total_pages),
            converted_pages: report.as_ref().map_or(0, |r| r.total_pages),
            text_boxes: report.as_ref().map_or(0, |r| r.text_count),
            image_count: report.as_ref().map_or(0, |r| r.image_count),
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            ..ConversionStats::default()
        };
        info!(
            job_id = %outcome.job.id,
            "Remote conversion complete in {}ms: {}",
            stats.total_duration_ms, outcome.message
        );
        tracker
            .callback()
            .on_conversion_complete(stats.total_pages, &outcome.message);

        Ok(ConversionOutput {
            deck: outcome.deck,
            file_name: input.deck_file_name(REMOTE_DECK_EXTENSION),
            slides: None,
            pages: Vec::new(),
            stats,
            report,
            remote_job_id: Some(outcome.job.id),
            message: outcome.message,
        })
    }

    async fn convert_with<F>(
        &self,
        capture: F,
        deck_name: String,
        config: &ConversionConfig,
    ) -> Result<ConversionOutput, Pdf2DeckError>
    where
        F: FnOnce(&PageSink) -> Result<(), Pdf2DeckError> + Send + 'static,
    {
        let guard = self.begin()?;
        let total_start = Instant::now();
        let options = config.options;
        let tracker = ProgressTracker::new(config.progress_callback.clone());
        let stats = Arc::new(ExtractionStats::default());

        // ── Step 1: Open the document on a blocking thread ───────────────
        let (sink, rx) = PageSink::channel(config.concurrency);
        let capture_task = tokio::task::spawn_blocking(move || capture(&sink));
        let mut events = ReceiverStream::new(rx);

        let (total_pages, selected) = match events.next().await {
            Some(CaptureEvent::Opened { total_pages, selected }) => (total_pages, selected),
            Some(CaptureEvent::Page(_)) => {
                return Err(Pdf2DeckError::Internal("page captured before the document was opened".into()))
            }
            None => {
                // The capture thread gave up before opening; surface its error.
                finish_capture(capture_task).await?;
                return Err(Pdf2DeckError::Internal("document source closed without opening".into()));
            }
        };
        tracker.callback().on_conversion_start(selected, options.mode);
        tracker.extract(0, format!("Reading {selected} of {total_pages} pages"));

        // ── Step 2: Reflow pages as they arrive ──────────────────────────
        let extract_start = Instant::now();
        let pages = events.filter_map(|event| async move {
            match event {
                CaptureEvent::Page(raw) => Some(raw),
                CaptureEvent::Opened { .. } => None,
            }
        });
        let mut reflowed = std::pin::pin!(reflow_pages(pages, Arc::clone(&stats), config.concurrency));

        let mut documents: Vec<PageDocument> = Vec::with_capacity(selected);
        while let Some(page) = reflowed.next().await {
            if guard.cancel_token().is_cancelled() {
                return Err(Pdf2DeckError::Cancelled {
                    job_id: LOCAL_JOB_ID.to_string(),
                });
            }
            let page = page?;
            tracker
                .callback()
                .on_page_extracted(page.page_number, selected, page.text_runs.len());
            documents.push(page);
            tracker.extract(
                percent(documents.len(), selected),
                format!("Extracted page {}/{}", documents.len(), selected),
            );
        }
        finish_capture(capture_task).await?;
        tracker.extract(100, "Extraction complete");
        let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

        // ── Step 3: Build one slide per page ─────────────────────────────
        let generate_start = Instant::now();
        let mut deck = SlideDeck::new(options.slide_layout);
        let mut summaries = Vec::with_capacity(documents.len());
        let mut clamped_boxes = 0;
        for (i, page) in documents.iter().enumerate() {
            let assembled = build_slide(page, &options);
            clamped_boxes += assembled.clamped_boxes;
            summaries.push(PageSummary {
                page_number: page.page_number,
                text_runs: page.text_runs.len(),
                raster_captured: page.raster.is_some(),
                strategy: assembled.strategy,
                clamped_boxes: assembled.clamped_boxes,
            });
            deck.push_slide(assembled.slide);
            tracker.callback().on_slide_generated(page.page_number, selected);
            tracker.generate(
                percent(i + 1, documents.len()),
                format!("Generated slide {}/{}", i + 1, documents.len()),
            );
        }

        // ── Step 4: Encode the deck ──────────────────────────────────────
        let bytes = config.deck_writer.write(&deck)?;
        // A reset during generation discards the result.
        if guard.cancel_token().is_cancelled() {
            return Err(Pdf2DeckError::Cancelled {
                job_id: LOCAL_JOB_ID.to_string(),
            });
        }
        tracker.generate(100, "Deck ready");
        let generate_duration_ms = generate_start.elapsed().as_millis() as u64;

        // ── Step 5: Stats ────────────────────────────────────────────────
        let counts = stats.snapshot();
        let stats = ConversionStats {
            mode: options.mode,
            total_pages,
            converted_pages: deck.slides.len(),
            text_boxes: deck.text_box_count(),
            image_count: deck.image_count(),
            skipped_text_runs: counts.skipped_text_runs,
            merged_text_runs: counts.merged_text_runs,
            raster_pages: counts.raster_pages,
            clamped_boxes,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            extract_duration_ms,
            generate_duration_ms,
        };
        if options.debug {
            log_debug_summary(&stats, counts);
        }
        guard.record_local(counts);

        let message = local_message(&stats);
        info!("{} in {}ms", message, stats.total_duration_ms);
        tracker.callback().on_conversion_complete(selected, &message);

        Ok(ConversionOutput {
            deck: bytes,
            file_name: deck_name,
            slides: Some(deck),
            pages: summaries,
            stats,
            report: None,
            remote_job_id: None,
            message,
        })
    }
}

/// Convert a PDF file to a slide deck using a one-shot session.
///
/// # Arguments
/// * `input_str`: local path to a PDF
/// * `config`: conversion configuration
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2DeckError> {
    ConversionSession::new().convert(input_str, config).await
}

/// Convert a PDF and write the deck directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2DeckError> {
    let output = convert(input_str, config).await?;
    write_deck(output_path.as_ref(), &output.deck).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2DeckError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2DeckError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Convert PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed when the
/// call returns. The deck is named `converted.<ext>`.
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2DeckError> {
    let mut tmp = tempfile::Builder::new()
        .prefix(input::FALLBACK_DECK_STEM)
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| Pdf2DeckError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2DeckError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    let mut output = convert(&path, config).await?;
    let extension = match output.file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_string(),
        None => config.deck_writer.file_extension().to_string(),
    };
    output.file_name = format!("{}.{}", input::FALLBACK_DECK_STEM, extension);
    Ok(output)
}

/// Read PDF metadata without converting.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, Pdf2DeckError> {
    inspect_with_password(input_str, None).await
}

/// [`inspect`] for encrypted documents.
pub async fn inspect_with_password(
    input_str: impl AsRef<str>,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2DeckError> {
    let resolved = input::resolve_input(input_str.as_ref())?;
    source::extract_metadata(resolved.path(), password).await
}

/// Write deck bytes atomically: temp file next to `path`, then rename.
pub async fn write_deck(path: &Path, bytes: &[u8]) -> Result<(), Pdf2DeckError> {
    let write_failed = |source| Pdf2DeckError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Wait for the capture thread and surface its error, if any.
async fn finish_capture(task: JoinHandle<Result<(), Pdf2DeckError>>) -> Result<(), Pdf2DeckError> {
    task.await
        .map_err(|e| Pdf2DeckError::Internal(format!("Capture task panicked: {e}")))?
}

fn local_message(stats: &ConversionStats) -> String {
    format!(
        "Converted {} pages into {} slides ({} text boxes, {} page images)",
        stats.converted_pages, stats.converted_pages, stats.text_boxes, stats.image_count
    )
}

fn log_debug_summary(stats: &ConversionStats, counts: ExtractionCounts) {
    info!(
        mode = %stats.mode,
        pages = stats.converted_pages,
        text_boxes = stats.text_boxes,
        images = stats.image_count,
        runs = counts.text_runs,
        skipped = counts.skipped_text_runs,
        merged = counts.merged_text_runs,
        raster_pages = counts.raster_pages,
        "conversion summary"
    );
    if stats.clamped_boxes > 0 {
        warn!(
            "{} text boxes did not fit their slide and were clamped",
            stats.clamped_boxes
        );
    }
}
