//! The network seam: every call a tool makes goes through [`AnalysisBackend`].
//!
//! [`HttpBackend`] is the production implementation on top of reqwest. Tests
//! and alternative transports implement the trait directly. The backend only
//! moves bytes: it returns whatever status and body the server produced, and
//! [`crate::pipeline::decode`] decides what they mean.

use crate::config::{PipelineConfig, ServiceUrls};
use crate::error::InsightsError;
use crate::pipeline::validate::UploadedFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Which backend host a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Api,
    Functions,
    PdfRenderer,
}

/// Request payload.
#[derive(Clone)]
pub enum RequestBody {
    /// `multipart/form-data` with a single `file` part.
    File(UploadedFile),
    Json(serde_json::Value),
    /// `text/plain` body.
    Text(String),
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::File(file) => f.debug_tuple("File").field(file).finish(),
            RequestBody::Json(v) => f.debug_tuple("Json").field(v).finish(),
            RequestBody::Text(t) => write!(f, "Text({} bytes)", t.len()),
        }
    }
}

/// One POST to a backend.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub service: Service,
    /// Path below the service's base URL, starting with `/`.
    pub path: String,
    pub body: RequestBody,
    /// Attach the edge-function bearer token.
    pub authorized: bool,
}

impl BackendRequest {
    pub fn new(service: Service, path: impl Into<String>, body: RequestBody) -> Self {
        Self {
            service,
            path: path.into(),
            body,
            authorized: false,
        }
    }

    pub fn authorized(mut self) -> Self {
        self.authorized = true;
        self
    }
}

/// Raw status and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl BackendResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests to the SimpleInsights backends.
///
/// Exactly one attempt per call; there is no retry policy anywhere in the
/// pipeline.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Returns `Err` only when no response was received at all.
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, InsightsError>;
}

/// reqwest-based backend.
pub struct HttpBackend {
    client: reqwest::Client,
    urls: ServiceUrls,
    functions_key: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &PipelineConfig) -> Result<Self, InsightsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| InsightsError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            urls: config.urls.clone(),
            functions_key: config.functions_key.clone(),
        })
    }

    pub fn url_for(&self, service: Service, path: &str) -> String {
        let base = match service {
            Service::Api => &self.urls.api,
            Service::Functions => &self.urls.functions,
            Service::PdfRenderer => &self.urls.pdf_renderer,
        };
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, InsightsError> {
        let url = self.url_for(request.service, &request.path);
        let network = |e: reqwest::Error| InsightsError::Network {
            endpoint: request.path.clone(),
            reason: e.to_string(),
        };

        let mut builder = self.client.post(&url);
        if request.authorized {
            if let Some(ref key) = self.functions_key {
                builder = builder.bearer_auth(key).header("apikey", key);
            }
        }

        builder = match &request.body {
            RequestBody::File(file) => {
                let part = Part::bytes(file.bytes.clone())
                    .file_name(file.name.clone())
                    .mime_str(&file.mime)
                    .map_err(network)?;
                builder.multipart(Form::new().part("file", part))
            }
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Text(text) => builder
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .body(text.clone()),
        };

        debug!("POST {}", url);
        let response = builder.send().await.map_err(network)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(network)?;
        debug!("{} → HTTP {} ({} bytes)", request.path, status, body.len());

        Ok(BackendResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_without_double_slash() {
        let config = PipelineConfig::builder()
            .api_url("http://localhost:9000/")
            .functions_url("http://localhost:9001")
            .build()
            .unwrap();
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(
            backend.url_for(Service::Api, "/upload-temp-file"),
            "http://localhost:9000/upload-temp-file"
        );
        assert_eq!(
            backend.url_for(Service::Functions, "/functions/v1/process-medical-report"),
            "http://localhost:9001/functions/v1/process-medical-report"
        );
    }

    #[test]
    fn response_helpers() {
        let ok = BackendResponse::new(204, Vec::new());
        assert!(ok.is_success());
        let bad = BackendResponse::new(500, "boom");
        assert!(!bad.is_success());
        assert_eq!(bad.text(), "boom");
    }

    #[test]
    fn text_body_debug_hides_content() {
        let body = RequestBody::Text("<html>secret</html>".into());
        assert!(!format!("{body:?}").contains("secret"));
    }
}
