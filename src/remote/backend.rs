//! The worker capability used by the orchestrator.

use super::DiagnosticReport;
use crate::config::RemoteParams;
use crate::error::Pdf2DeckError;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// One status poll as reported by the worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSnapshot {
    pub job_id: Option<String>,
    /// Raw worker status (`queued`, `running`, `done`, `failed`).
    pub status: String,
    pub progress: Option<f64>,
    pub stage: Option<String>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub metrics: Option<serde_json::Value>,
}

/// Submit, poll and fetch results from an external conversion worker.
///
/// Implementations report transport failures as
/// [`Pdf2DeckError::RemoteUnreachable`]. None of the operations retry.
pub trait JobBackend: Send + Sync {
    /// Upload the PDF with the tuning parameters; returns the job id.
    fn submit(
        &self,
        file_name: &str,
        pdf: Vec<u8>,
        params: &RemoteParams,
    ) -> impl Future<Output = Result<String, Pdf2DeckError>> + Send;

    fn status(&self, job_id: &str) -> impl Future<Output = Result<JobSnapshot, Pdf2DeckError>> + Send;

    /// Fetch the finished deck.
    fn download(&self, job_id: &str) -> impl Future<Output = Result<Vec<u8>, Pdf2DeckError>> + Send;

    /// Fetch the diagnostic report of a finished job.
    fn report(&self, job_id: &str) -> impl Future<Output = Result<DiagnosticReport, Pdf2DeckError>> + Send;
}
