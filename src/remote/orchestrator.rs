//! Submit → poll → fetch for one remote job.
//!
//! Polling is a fixed-delay loop. Before every tick the loop checks the
//! session's cancellation token and the elapsed time; the sleep between
//! ticks is also interrupted by cancellation, so a reset stops the loop
//! promptly. An HTTP request already in flight is allowed to finish.

use super::{clamp_progress, DiagnosticReport, JobBackend, JobStatus, RemoteJob};
use crate::config::RemoteSettings;
use crate::error::Pdf2DeckError;
use crate::progress::ProgressTracker;
use crate::session::SessionGuard;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Result of a finished remote job.
#[derive(Debug, Clone)]
pub struct RemoteOutcome {
    /// The job in its terminal state.
    pub job: RemoteJob,
    /// Deck bytes produced by the worker.
    pub deck: Vec<u8>,
    /// `None` when the report was missing or unreadable.
    pub report: Option<DiagnosticReport>,
    pub message: String,
    pub elapsed: Duration,
}

/// Human-readable summary of a finished job.
pub fn report_message(report: Option<&DiagnosticReport>) -> String {
    let Some(r) = report else {
        return "High-precision conversion finished.".to_string();
    };
    let mut message = format!(
        "High-precision conversion finished: {} text boxes, {} images, {} vector icons, {} raster fallbacks",
        r.text_count, r.image_count, r.vector_icons_ok, r.vector_icons_fallback
    );
    if !r.warnings.is_empty() {
        message.push_str(&format!(" ({} warnings)", r.warnings.len()));
    }
    message
}

/// Run one job to completion inside the session held by `session`.
pub(crate) async fn run_job<B: JobBackend>(
    backend: &B,
    settings: &RemoteSettings,
    session: &SessionGuard<'_>,
    file_name: &str,
    pdf: Vec<u8>,
    progress: &ProgressTracker,
) -> Result<RemoteOutcome, Pdf2DeckError> {
    let started = Instant::now();
    let cancel = session.cancel_token();
    progress.both(0, "Submitting to high-precision worker");

    let job_id = backend.submit(file_name, pdf, &settings.params).await?;
    session.track_job(RemoteJob::new(job_id.clone()))?;
    info!(job_id = %job_id, "remote job submitted");
    // The ceiling bounds polling only; upload time is not counted.
    let polling_started = Instant::now();

    loop {
        if cancel.is_cancelled() {
            info!(job_id = %job_id, "polling stopped: session was reset");
            return Err(Pdf2DeckError::Cancelled { job_id });
        }
        let elapsed = polling_started.elapsed();
        if elapsed > settings.timeout {
            session.update_job(&job_id, |job| job.advance(JobStatus::TimedOut))?;
            warn!(job_id = %job_id, ?elapsed, "remote job timed out");
            return Err(Pdf2DeckError::RemoteTimeout {
                job_id,
                elapsed_secs: elapsed.as_secs(),
            });
        }

        let snapshot = backend.status(&job_id).await?;
        let status = JobStatus::from_worker(&snapshot.status);
        let pct = clamp_progress(snapshot.progress);
        session.update_job(&job_id, |job| {
            job.advance(status)?;
            job.progress = pct;
            job.stage = snapshot.stage.clone();
            Ok(())
        })?;
        debug!(job_id = %job_id, %status, progress = pct, stage = ?snapshot.stage, "polled remote job");

        progress
            .callback()
            .on_remote_status(&job_id, status, pct, snapshot.stage.as_deref());
        let phase = match &snapshot.stage {
            Some(stage) => format!("High-precision worker: {stage}"),
            None => format!("High-precision worker: {status}"),
        };
        progress.both(pct, phase);

        match status {
            JobStatus::Done => break,
            JobStatus::Failed => {
                return Err(Pdf2DeckError::RemoteJobFailed {
                    job_id,
                    detail: snapshot.error.filter(|e| !e.trim().is_empty()),
                })
            }
            _ => {}
        }

        tokio::select! {
            _ = tokio::time::sleep(settings.poll_interval) => {}
            _ = cancel.cancelled() => {}
        }
    }

    let deck = backend.download(&job_id).await?;
    let report = match backend.report(&job_id).await {
        Ok(report) => Some(report),
        Err(e) => {
            warn!(job_id = %job_id, "diagnostic report unavailable: {e}");
            None
        }
    };
    let job = session.update_job(&job_id, |job| {
        job.progress = 100;
        job.report = report.clone();
        Ok(job.clone())
    })?;

    if settings.params.debug {
        if let Some(r) = &report {
            info!(
                job_id = %job_id,
                pages = r.total_pages,
                text = r.text_count,
                images = r.image_count,
                icons_ok = r.vector_icons_ok,
                icons_fallback = r.vector_icons_fallback,
                "remote job report"
            );
            for warning in &r.warnings {
                warn!(job_id = %job_id, "worker warning: {warning}");
            }
        }
    }

    Ok(RemoteOutcome {
        job,
        deck,
        message: report_message(report.as_ref()),
        report,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_without_report_is_generic() {
        assert_eq!(report_message(None), "High-precision conversion finished.");
    }

    #[test]
    fn message_lists_counts() {
        let report = DiagnosticReport {
            text_count: 12,
            image_count: 3,
            vector_icons_ok: 5,
            vector_icons_fallback: 1,
            warnings: vec!["icon 7 rasterised".into()],
            ..DiagnosticReport::default()
        };
        let msg = report_message(Some(&report));
        assert!(msg.contains("12 text boxes"));
        assert!(msg.contains("3 images"));
        assert!(msg.contains("5 vector icons"));
        assert!(msg.contains("1 raster fallbacks"));
        assert!(msg.contains("1 warnings"));
    }
}
