//! Conversion sessions.
//!
//! A [`ConversionSession`] is the explicit context threaded through a
//! conversion. It owns at most one active [`RemoteJob`], a cancellation
//! token, and counters accumulated across every conversion it ran.
//!
//! One conversion runs per session at a time. Starting another while the
//! first is in flight fails with [`Pdf2DeckError::SessionBusy`], or with
//! [`Pdf2DeckError::JobAlreadyActive`] when a remote job is being tracked.
//! [`ConversionSession::reset`] cancels whatever is running (remote polling
//! stops at its next tick) and clears all state.

use crate::error::Pdf2DeckError;
use crate::pipeline::extract::ExtractionCounts;
use crate::remote::RemoteJob;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::info;

/// A cloneable cancellation flag that can also be awaited.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`CancelToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Counters accumulated over the life of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionTotals {
    pub conversions: usize,
    pub remote_jobs: usize,
    pub skipped_text_runs: usize,
    pub merged_text_runs: usize,
    pub raster_pages: usize,
}

#[derive(Debug, Default)]
struct SessionState {
    busy: bool,
    generation: u64,
    active_job: Option<RemoteJob>,
    cancel: CancelToken,
    totals: SessionTotals,
}

/// Explicit conversion context. See the module docs.
#[derive(Debug, Default)]
pub struct ConversionSession {
    state: Mutex<SessionState>,
}

impl ConversionSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The remote job currently tracked, if any.
    pub fn active_job(&self) -> Option<RemoteJob> {
        self.lock().active_job.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    pub fn totals(&self) -> SessionTotals {
        self.lock().totals
    }

    /// Cancel any running conversion and clear all session state.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.cancel.cancel();
        if let Some(job) = &state.active_job {
            info!(job_id = %job.id, "session reset: abandoning remote job");
        }
        *state = SessionState {
            generation: state.generation.wrapping_add(1),
            ..SessionState::default()
        };
    }

    /// Claim the session for one conversion.
    pub(crate) fn begin(&self) -> Result<SessionGuard<'_>, Pdf2DeckError> {
        let mut state = self.lock();
        if let Some(job) = &state.active_job {
            return Err(Pdf2DeckError::JobAlreadyActive { job_id: job.id.clone() });
        }
        if state.busy {
            return Err(Pdf2DeckError::SessionBusy);
        }
        state.busy = true;
        Ok(SessionGuard {
            session: self,
            generation: state.generation,
            cancel: state.cancel.clone(),
        })
    }
}

/// Proof that the holder owns the session's current conversion.
///
/// Dropping the guard releases the session and forgets the active job,
/// unless the session was reset in the meantime.
pub(crate) struct SessionGuard<'a> {
    session: &'a ConversionSession,
    generation: u64,
    cancel: CancelToken,
}

impl SessionGuard<'_> {
    pub(crate) fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn current(&self) -> Result<MutexGuard<'_, SessionState>, Pdf2DeckError> {
        let state = self.session.lock();
        if state.generation != self.generation {
            return Err(Pdf2DeckError::Cancelled {
                job_id: state.active_job.as_ref().map(|j| j.id.clone()).unwrap_or_default(),
            });
        }
        Ok(state)
    }

    /// Start tracking a freshly submitted job.
    pub(crate) fn track_job(&self, job: RemoteJob) -> Result<(), Pdf2DeckError> {
        let mut state = self.current().map_err(|_| Pdf2DeckError::Cancelled { job_id: job.id.clone() })?;
        if let Some(active) = &state.active_job {
            return Err(Pdf2DeckError::JobAlreadyActive {
                job_id: active.id.clone(),
            });
        }
        state.active_job = Some(job);
        state.totals.remote_jobs += 1;
        Ok(())
    }

    /// Mutate the tracked job.
    pub(crate) fn update_job<T>(
        &self,
        job_id: &str,
        f: impl FnOnce(&mut RemoteJob) -> Result<T, Pdf2DeckError>,
    ) -> Result<T, Pdf2DeckError> {
        let cancelled = || Pdf2DeckError::Cancelled {
            job_id: job_id.to_string(),
        };
        let mut state = self.current().map_err(|_| cancelled())?;
        match state.active_job.as_mut() {
            Some(job) if job.id == job_id => f(job),
            _ => Err(cancelled()),
        }
    }

    /// Fold one local conversion's counters into the session totals.
    pub(crate) fn record_local(&self, counts: ExtractionCounts) {
        if let Ok(mut state) = self.current() {
            state.totals.conversions += 1;
            state.totals.skipped_text_runs += counts.skipped_text_runs;
            state.totals.merged_text_runs += counts.merged_text_runs;
            state.totals.raster_pages += counts.raster_pages;
        }
    }

    pub(crate) fn record_remote(&self) {
        if let Ok(mut state) = self.current() {
            state.totals.conversions += 1;
        }
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.session.lock();
        if state.generation == self.generation {
            state.busy = false;
            state.active_job = None;
        }
    }
}
