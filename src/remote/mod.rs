//! Remote high-precision conversion.
//!
//! In `remote_high_precision` mode the whole document goes to an external
//! worker over HTTP. This module owns the job model and its state machine:
//!
//! ```text
//! idle ──submit──▶ submitted ──▶ running ──▶ done
//!                      │            │    └──▶ failed
//!                      └────────────┴───────▶ timed_out
//! ```
//!
//! Transitions only move forward and a terminal state is never left. The
//! worker is reached through the [`JobBackend`] trait; [`HttpJobClient`] is
//! the reqwest implementation and tests plug in scripted fakes.

pub mod backend;
pub mod http;
pub mod orchestrator;

pub use backend::{JobBackend, JobSnapshot};
pub use http::HttpJobClient;
pub use orchestrator::{report_message, RemoteOutcome};

use crate::error::Pdf2DeckError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Submitted,
    Running,
    Done,
    Failed,
    TimedOut,
}

impl JobStatus {
    /// Map the worker's status vocabulary. Unknown values count as running.
    pub fn from_worker(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "queued" | "submitted" | "pending" => JobStatus::Submitted,
            "running" | "processing" => JobStatus::Running,
            "done" | "completed" | "succeeded" => JobStatus::Done,
            "failed" | "error" => JobStatus::Failed,
            other => {
                tracing::warn!(status = other, "unknown worker status, treating as running");
                JobStatus::Running
            }
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed | JobStatus::TimedOut)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Submitted => 0,
            JobStatus::Running => 1,
            JobStatus::Done | JobStatus::Failed | JobStatus::TimedOut => 2,
        }
    }

    /// `true` when moving from `self` to `next` keeps the lifecycle monotonic.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        !self.is_terminal() && next.rank() >= self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Submitted => "submitted",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
            JobStatus::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The worker's summary of a finished job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticReport {
    pub total_pages: usize,
    pub text_count: usize,
    pub image_count: usize,
    pub vector_icons_ok: usize,
    pub vector_icons_fallback: usize,
    pub warnings: Vec<String>,
}

/// A job tracked by a session.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteJob {
    pub id: String,
    pub status: JobStatus,
    /// Worker-reported progress, 0–100.
    pub progress: u8,
    pub stage: Option<String>,
    pub report: Option<DiagnosticReport>,
}

impl RemoteJob {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Submitted,
            progress: 0,
            stage: None,
            report: None,
        }
    }

    /// Move to `next`, rejecting backwards moves and exits from terminal states.
    pub fn advance(&mut self, next: JobStatus) -> Result<(), Pdf2DeckError> {
        if !self.status.can_advance_to(next) {
            return Err(Pdf2DeckError::InvalidJobTransition {
                job_id: self.id.clone(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Clamp a worker progress value into `0..=100`.
pub fn clamp_progress(progress: Option<f64>) -> u8 {
    crate::geometry::clamp(progress.unwrap_or(0.0), 0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_vocabulary() {
        assert_eq!(JobStatus::from_worker("queued"), JobStatus::Submitted);
        assert_eq!(JobStatus::from_worker("RUNNING"), JobStatus::Running);
        assert_eq!(JobStatus::from_worker("done"), JobStatus::Done);
        assert_eq!(JobStatus::from_worker("failed"), JobStatus::Failed);
        assert_eq!(JobStatus::from_worker("warming-up"), JobStatus::Running);
    }

    #[test]
    fn transitions_are_monotonic() {
        let mut job = RemoteJob::new("j");
        job.advance(JobStatus::Submitted).unwrap();
        job.advance(JobStatus::Running).unwrap();
        job.advance(JobStatus::Running).unwrap();
        assert!(job.advance(JobStatus::Submitted).is_err());
        job.advance(JobStatus::Done).unwrap();
        for next in [JobStatus::Running, JobStatus::Done, JobStatus::Failed, JobStatus::TimedOut] {
            assert!(matches!(
                job.advance(next),
                Err(Pdf2DeckError::InvalidJobTransition { .. })
            ));
        }
        assert_eq!(job.status, JobStatus::Done);
    }

    #[test]
    fn submitted_may_finish_without_running() {
        let mut job = RemoteJob::new("fast");
        job.advance(JobStatus::Failed).unwrap();
        assert!(job.status.is_terminal());
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(clamp_progress(None), 0);
        assert_eq!(clamp_progress(Some(-5.0)), 0);
        assert_eq!(clamp_progress(Some(42.6)), 43);
        assert_eq!(clamp_progress(Some(250.0)), 100);
        assert_eq!(clamp_progress(Some(f64::NAN)), 0);
    }

    #[test]
    fn report_tolerates_missing_fields() {
        let r: DiagnosticReport = serde_json::from_str(r#"{"text_count": 4, "icons": []}"#).unwrap();
        assert_eq!(r.text_count, 4);
        assert_eq!(r.vector_icons_fallback, 0);
        assert!(r.warnings.is_empty());
    }
}
