//! Error types for the edgequake-pdf2deck library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2DeckError`]: **Fatal**: the current conversion attempt cannot
//!   proceed (unreadable input, worker unreachable, job failed or timed out).
//!   Returned as `Err(Pdf2DeckError)` from the `convert*` functions and from
//!   [`crate::session::ConversionSession`]. The session is always left reset.
//!
//! * [`ExtractionSkipped`]: **Non-fatal**: one raw text item could not
//!   become a [`crate::document::TextRun`]. It is tallied in
//!   [`crate::output::ConversionStats::skipped_text_runs`] and never aborts a
//!   page.
//!
//! Layout clamping is not an error at all; it is counted as
//! `clamped_boxes` in the stats.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2deck library.
#[derive(Debug, Error)]
pub enum Pdf2DeckError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input is unusable before any parsing happens (empty path, a
    /// directory, an empty file).
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// A requested page does not exist in the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// The document backend failed to rasterise or read a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install pdfium for your platform, then either:\n\
  • place libpdfium next to the executable or in a system library path, or\n\
  • set PDFIUM_LIB_PATH=/path/to/libpdfium (file or containing directory).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Remote worker errors ──────────────────────────────────────────────
    /// The external worker could not be reached at all.
    #[error(
        "Cannot reach the conversion worker at '{url}' while trying to {operation}: {detail}\n\
Verify the worker is running and reachable, then try again."
    )]
    RemoteUnreachable {
        operation: String,
        url: String,
        detail: String,
    },

    /// The worker answered the submission with an error.
    #[error("Conversion worker rejected the job: {detail}")]
    RemoteSubmissionRejected { detail: String },

    /// The worker reported the job as failed, or its results could not be
    /// retrieved.
    #[error("Remote job '{job_id}' failed: {}", detail.as_deref().unwrap_or("no detail reported by the worker"))]
    RemoteJobFailed {
        job_id: String,
        detail: Option<String>,
    },

    /// The job did not reach a terminal state before the polling ceiling.
    #[error("Remote job '{job_id}' timed out after {elapsed_secs}s without finishing")]
    RemoteTimeout { job_id: String, elapsed_secs: u64 },

    /// A submission was attempted while the session already tracks a job.
    #[error("A remote job ('{job_id}') is already active in this session; reset the session first")]
    JobAlreadyActive { job_id: String },

    /// A job status update tried to move backwards or leave a terminal state.
    #[error("Invalid job status transition for '{job_id}': {from} → {to}")]
    InvalidJobTransition {
        job_id: String,
        from: String,
        to: String,
    },

    /// The session was reset while the conversion was running.
    ///
    /// `job_id` is the remote job id, or `local` for a local conversion.
    #[error("Conversion '{job_id}' was cancelled by a session reset")]
    Cancelled { job_id: String },

    /// The session is already running a conversion.
    #[error("This session is already converting a document")]
    SessionBusy,

    // ── Output errors ─────────────────────────────────────────────────────
    /// The slide description could not be serialised into deck bytes.
    #[error("Failed to serialise the slide deck: {0}")]
    SerializationFailure(String),

    /// Could not create or write the output deck file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a raw text item was dropped by the normaliser.
///
/// Never propagated; each occurrence increments the skipped counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionSkipped {
    /// The item carried no text at all.
    #[error("text item has no text")]
    MissingText,

    /// The text collapsed to nothing after whitespace normalisation.
    #[error("text item is empty after whitespace collapse")]
    EmptyText,

    /// The item's transform is missing or has fewer than six entries.
    #[error("text item has a malformed transform")]
    MalformedTransform,

    /// The projected position is NaN or infinite.
    #[error("text item position is not finite")]
    NonFinitePosition,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Pdf2DeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_mentions_reachability() {
        let e = Pdf2DeckError::RemoteUnreachable {
            operation: "submit the job".into(),
            url: "http://127.0.0.1:8000/api/v1/jobs".into(),
            detail: "connection refused".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("127.0.0.1:8000"), "got: {msg}");
        assert!(msg.contains("reachable"), "got: {msg}");
    }

    #[test]
    fn job_failed_with_detail() {
        let e = Pdf2DeckError::RemoteJobFailed {
            job_id: "abc".into(),
            detail: Some("vector pass crashed".into()),
        };
        assert!(e.to_string().contains("vector pass crashed"));
    }

    #[test]
    fn job_failed_without_detail() {
        let e = Pdf2DeckError::RemoteJobFailed {
            job_id: "abc".into(),
            detail: None,
        };
        assert!(e.to_string().contains("no detail"));
    }

    #[test]
    fn timeout_display() {
        let e = Pdf2DeckError::RemoteTimeout {
            job_id: "j-1".into(),
            elapsed_secs: 1201,
        };
        assert!(e.to_string().contains("1201s"));
        assert!(e.to_string().contains("j-1"));
    }

    #[test]
    fn skipped_reasons_display() {
        assert!(ExtractionSkipped::EmptyText.to_string().contains("empty"));
        assert!(ExtractionSkipped::MalformedTransform
            .to_string()
            .contains("transform"));
    }
}
