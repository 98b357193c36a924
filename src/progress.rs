//! Progress reporting for conversions.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events while a deck is built. The library never draws anything itself;
//! the CLI turns these events into an `indicatif` bar.
//!
//! ## Weighted progress
//!
//! A local conversion has two phases of very different cost: extraction
//! (parsing, rasterising, reflowing every page) and slide generation.
//! [`ProgressUpdate::overall`] blends them 65 / 35 so the bar advances at a
//! roughly even pace. Remote jobs report the worker's own percentage for
//! both phases, which makes the blend a pass-through.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2deck::{ConversionConfig, ConversionProgressCallback, ProgressUpdate};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_progress(&self, update: &ProgressUpdate) {
//!         eprintln!("{:>3}% {}", update.overall(), update.phase);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::config::ConversionMode;
use crate::remote::JobStatus;
use std::sync::{Arc, Mutex, PoisonError};

/// Share of the overall bar given to the extraction phase.
pub const EXTRACT_WEIGHT: f64 = 0.65;
/// Share of the overall bar given to the slide-generation phase.
pub const GENERATE_WEIGHT: f64 = 0.35;

/// Blend two phase percentages into one overall percentage.
///
/// Inputs are clamped to `[0, 100]` before weighting.
pub fn blend_progress(extract: u8, generate: u8) -> u8 {
    let extract = f64::from(extract.min(100));
    let generate = f64::from(generate.min(100));
    (extract * EXTRACT_WEIGHT + generate * GENERATE_WEIGHT).round() as u8
}

/// `done / total` as a whole percentage; an empty job counts as complete.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) as f64 / total as f64) * 100.0).round() as u8
}

/// A snapshot of conversion progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Extraction phase, 0–100.
    pub extract: u8,
    /// Slide-generation phase, 0–100.
    pub generate: u8,
    /// Human-readable description of the current step.
    pub phase: String,
}

impl ProgressUpdate {
    pub fn overall(&self) -> u8 {
        blend_progress(self.extract, self.generate)
    }
}

/// Called by the conversion pipeline as it advances.
///
/// Implementations must be `Send + Sync`; pages are reflowed on blocking
/// worker threads. All methods have default no-op implementations so
/// callers only override what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any page is processed.
    fn on_conversion_start(&self, total_pages: usize, mode: ConversionMode) {
        let _ = (total_pages, mode);
    }

    /// Called whenever either phase advances.
    fn on_progress(&self, update: &ProgressUpdate) {
        let _ = update;
    }

    /// Called after a page was captured and reflowed, in page order.
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, text_runs: usize) {
        let _ = (page_num, total_pages, text_runs);
    }

    /// Called after the slide for a page was assembled.
    fn on_slide_generated(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called on every poll of a remote job.
    fn on_remote_status(&self, job_id: &str, status: JobStatus, progress: u8, stage: Option<&str>) {
        let _ = (job_id, status, progress, stage);
    }

    /// Called once when the deck is ready.
    fn on_conversion_complete(&self, total_pages: usize, message: &str) {
        let _ = (total_pages, message);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

// ── Tracker ──────────────────────────────────────────────────────────────

/// Keeps the two phase percentages and forwards monotonic updates to the
/// configured callback.
pub(crate) struct ProgressTracker {
    callback: ProgressCallback,
    state: Mutex<(u8, u8)>,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback: callback.unwrap_or_else(|| Arc::new(NoopProgressCallback)),
            state: Mutex::new((0, 0)),
        }
    }

    pub(crate) fn callback(&self) -> &dyn ConversionProgressCallback {
        self.callback.as_ref()
    }

    pub(crate) fn extract(&self, value: u8, phase: impl Into<String>) {
        self.update(Some(value), None, phase.into());
    }

    pub(crate) fn generate(&self, value: u8, phase: impl Into<String>) {
        self.update(None, Some(value), phase.into());
    }

    /// Set both phases at once (remote jobs report a single percentage).
    pub(crate) fn both(&self, value: u8, phase: impl Into<String>) {
        self.update(Some(value), Some(value), phase.into());
    }

    fn update(&self, extract: Option<u8>, generate: Option<u8>, phase: String) {
        let (e, g) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(v) = extract {
                state.0 = state.0.max(v.min(100));
            }
            if let Some(v) = generate {
                state.1 = state.1.max(v.min(100));
            }
            *state
        };
        self.callback.on_progress(&ProgressUpdate {
            extract: e,
            generate: g,
            phase,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn blend_weights_phases() {
        assert_eq!(blend_progress(0, 0), 0);
        assert_eq!(blend_progress(100, 0), 65);
        assert_eq!(blend_progress(100, 100), 100);
        assert_eq!(blend_progress(50, 50), 50);
        // 0.65 * 33 + 0.35 * 0 = 21.45
        assert_eq!(blend_progress(33, 0), 21);
    }

    #[test]
    fn blend_clamps_inputs() {
        assert_eq!(blend_progress(250, 250), 100);
    }

    #[test]
    fn percent_of_pages() {
        assert_eq!(percent(0, 4), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(9, 3), 100);
        assert_eq!(percent(0, 0), 100);
    }

    struct Recorder {
        overall: Mutex<Vec<u8>>,
        calls: AtomicUsize,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_progress(&self, update: &ProgressUpdate) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.overall.lock().unwrap().push(update.overall());
        }
    }

    #[test]
    fn tracker_never_goes_backwards() {
        let recorder = Arc::new(Recorder {
            overall: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        });
        let tracker = ProgressTracker::new(Some(recorder.clone()));

        tracker.extract(50, "extracting");
        tracker.extract(20, "late event");
        tracker.extract(100, "extracted");
        tracker.generate(100, "generated");

        assert_eq!(recorder.calls.load(Ordering::SeqCst), 4);
        assert_eq!(*recorder.overall.lock().unwrap(), vec![33, 33, 65, 100]);
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start(5, ConversionMode::Fidelity);
        cb.on_page_extracted(1, 5, 12);
        cb.on_slide_generated(1, 5);
        cb.on_remote_status("job", JobStatus::Running, 40, Some("vectorising"));
        cb.on_conversion_complete(5, "done");
    }
}
