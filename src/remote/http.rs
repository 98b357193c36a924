//! reqwest implementation of [`JobBackend`].
//!
//! Endpoints, relative to the configured API root:
//!
//! | Call | Request |
//! |------|---------|
//! | submit | `POST /jobs` (multipart: `file`, `options`) |
//! | status | `GET /jobs/{id}` |
//! | download | `GET /jobs/{id}/download` |
//! | report | `GET /jobs/{id}/report` |
//! | health | `GET /health` |

use super::{DiagnosticReport, JobBackend, JobSnapshot};
use crate::config::{RemoteParams, RemoteSettings};
use crate::error::Pdf2DeckError;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

/// HTTP client for the conversion worker.
#[derive(Debug, Clone)]
pub struct HttpJobClient {
    client: Client,
    base: Url,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    job_id: Option<String>,
}

impl HttpJobClient {
    pub fn new(settings: &RemoteSettings) -> Result<Self, Pdf2DeckError> {
        let base = Url::parse(settings.base_url.trim_end_matches('/')).map_err(|e| {
            Pdf2DeckError::InvalidConfig(format!("Remote base URL '{}': {e}", settings.base_url))
        })?;
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| Pdf2DeckError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { client, base })
    }

    /// `base` + path segments, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, Pdf2DeckError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Pdf2DeckError::InvalidConfig(format!("Remote base URL '{}' cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Ask the worker whether it is up.
    pub async fn health(&self) -> Result<(), Pdf2DeckError> {
        let url = self.endpoint(&["health"])?;
        let response = self.get(&url, "check worker health").await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Pdf2DeckError::RemoteUnreachable {
                operation: "check worker health".into(),
                url: url.to_string(),
                detail: error_detail(response).await,
            })
        }
    }

    async fn get(&self, url: &Url, operation: &str) -> Result<Response, Pdf2DeckError> {
        debug!(%url, operation, "GET");
        self.client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| unreachable(operation, url, &e))
    }

    /// GET that treats any non-success status as a job failure.
    async fn get_ok(&self, job_id: &str, url: &Url, operation: &str) -> Result<Response, Pdf2DeckError> {
        let response = self.get(url, operation).await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(Pdf2DeckError::RemoteJobFailed {
            job_id: job_id.to_string(),
            detail: Some(format!("could not {operation}: {}", error_detail(response).await)),
        })
    }
}

impl JobBackend for HttpJobClient {
    async fn submit(&self, file_name: &str, pdf: Vec<u8>, params: &RemoteParams) -> Result<String, Pdf2DeckError> {
        let url = self.endpoint(&["jobs"])?;
        let options = serde_json::to_string(params)
            .map_err(|e| Pdf2DeckError::Internal(format!("serialising job options: {e}")))?;
        let size = pdf.len();
        let file = Part::bytes(pdf)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| Pdf2DeckError::Internal(format!("building upload: {e}")))?;
        let form = Form::new().part("file", file).text("options", options);

        info!(%url, file_name, bytes = size, "submitting remote job");
        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| unreachable("submit the job", &url, &e))?;

        if !response.status().is_success() {
            return Err(Pdf2DeckError::RemoteSubmissionRejected {
                detail: error_detail(response).await,
            });
        }
        let body: SubmitResponse = response.json().await.map_err(|e| Pdf2DeckError::RemoteSubmissionRejected {
            detail: format!("unreadable submission response: {e}"),
        })?;
        body.job_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Pdf2DeckError::RemoteSubmissionRejected {
                detail: "worker response did not include a job id".into(),
            })
    }

    async fn status(&self, job_id: &str) -> Result<JobSnapshot, Pdf2DeckError> {
        let url = self.endpoint(&["jobs", job_id])?;
        let response = self.get_ok(job_id, &url, "query job status").await?;
        response.json().await.map_err(|e| Pdf2DeckError::RemoteJobFailed {
            job_id: job_id.to_string(),
            detail: Some(format!("unreadable status response: {e}")),
        })
    }

    async fn download(&self, job_id: &str) -> Result<Vec<u8>, Pdf2DeckError> {
        let url = self.endpoint(&["jobs", job_id, "download"])?;
        let response = self.get_ok(job_id, &url, "download the result").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| unreachable("download the result", &url, &e))?;
        Ok(bytes.to_vec())
    }

    async fn report(&self, job_id: &str) -> Result<DiagnosticReport, Pdf2DeckError> {
        let url = self.endpoint(&["jobs", job_id, "report"])?;
        let response = self.get_ok(job_id, &url, "fetch the report").await?;
        response.json().await.map_err(|e| Pdf2DeckError::RemoteJobFailed {
            job_id: job_id.to_string(),
            detail: Some(format!("unreadable report: {e}")),
        })
    }
}

fn unreachable(operation: &str, url: &Url, e: &reqwest::Error) -> Pdf2DeckError {
    Pdf2DeckError::RemoteUnreachable {
        operation: operation.to_string(),
        url: url.to_string(),
        detail: e.to_string(),
    }
}

async fn error_detail(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    parse_error_detail(status, &body)
}

/// Pull a readable message out of an error body.
///
/// A JSON `detail` string wins; otherwise the JSON `detail` value or the
/// whole JSON payload; a non-JSON body yields `HTTP <status>`.
pub fn parse_error_detail(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(payload) => match payload.get("detail") {
            Some(serde_json::Value::String(detail)) => detail.clone(),
            Some(detail) if !detail.is_null() => detail.to_string(),
            _ => payload.to_string(),
        },
        Err(_) => format!("HTTP {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpJobClient {
        HttpJobClient::new(&RemoteSettings {
            base_url: base.into(),
            ..RemoteSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoints_are_joined_and_encoded() {
        let c = client("http://127.0.0.1:8000/api/v1/");
        assert_eq!(
            c.endpoint(&["jobs"]).unwrap().as_str(),
            "http://127.0.0.1:8000/api/v1/jobs"
        );
        assert_eq!(
            c.endpoint(&["jobs", "a b/c", "download"]).unwrap().as_str(),
            "http://127.0.0.1:8000/api/v1/jobs/a%20b%2Fc/download"
        );
    }

    #[test]
    fn error_detail_prefers_detail_string() {
        assert_eq!(
            parse_error_detail(StatusCode::BAD_REQUEST, r#"{"detail":"Only PDF files are supported"}"#),
            "Only PDF files are supported"
        );
        assert_eq!(
            parse_error_detail(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail":[{"loc":["file"]}]}"#),
            r#"[{"loc":["file"]}]"#
        );
        assert_eq!(
            parse_error_detail(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":"boom"}"#),
            r#"{"message":"boom"}"#
        );
        assert_eq!(
            parse_error_detail(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            "HTTP 502"
        );
    }

    #[tokio::test]
    async fn submit_to_closed_port_is_unreachable() {
        // Port 9 (discard) is almost never open on test hosts.
        let c = client("http://127.0.0.1:9/api/v1");
        let err = c
            .submit("a.pdf", b"%PDF-1.4".to_vec(), &RemoteParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2DeckError::RemoteUnreachable { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn health_of_closed_port_is_unreachable() {
        let err = client("http://127.0.0.1:9").health().await.unwrap_err();
        match err {
            Pdf2DeckError::RemoteUnreachable { operation, url, .. } => {
                assert_eq!(operation, "check worker health");
                assert_eq!(url, "http://127.0.0.1:9/health");
            }
            other => panic!("expected RemoteUnreachable, got {other:?}"),
        }
    }
}
