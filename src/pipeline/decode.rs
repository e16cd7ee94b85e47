//! Response decoding: the only place backend bodies are interpreted.
//!
//! The upload and analysis endpoints signal some failures in the body of an
//! HTTP 200 rather than through the status code. Those conventions are
//! turned into typed outcomes here, so the session never compares strings.

use crate::config::InBandHeuristic;
use crate::error::InsightsError;
use crate::pipeline::backend::BackendResponse;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Opaque handle for a server-side temp file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileReference(String);

impl FileReference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of `/upload-temp-file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Ok(FileReference),
    /// Body was `max_tokens`.
    TooLarge,
    /// Body was `error`, or empty.
    UploadFailed,
}

/// Decode an upload response. Non-2xx statuses are transport errors.
pub fn decode_upload(endpoint: &str, response: &BackendResponse) -> Result<UploadOutcome, InsightsError> {
    if !response.is_success() {
        return Err(InsightsError::Http {
            endpoint: endpoint.to_string(),
            status: response.status,
            body: response.text(),
        });
    }

    let text = response.text();
    let token = text.trim();
    Ok(match token {
        "max_tokens" => UploadOutcome::TooLarge,
        "error" | "" => UploadOutcome::UploadFailed,
        reference => UploadOutcome::Ok(FileReference::new(reference)),
    })
}

/// How an analysis endpoint wraps its HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisFormat {
    /// Body is the HTML. Only an empty body is a failure.
    PlainText,
    /// Body is the HTML, or an error text screened by [`InBandHeuristic`].
    PlainTextInBand,
    /// JSON `{"html": …}` or `{"error": …}`.
    JsonHtml,
    /// JSON `{"analysis": …}` or `{"error": …}`.
    JsonAnalysis,
}

/// HTML extracted from a successful analysis response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisBody {
    pub html: String,
}

#[derive(Deserialize)]
struct JsonEnvelope {
    html: Option<String>,
    analysis: Option<String>,
    error: Option<String>,
}

/// Decode an analysis response according to `format`.
pub fn decode_analysis(
    endpoint: &str,
    response: &BackendResponse,
    format: AnalysisFormat,
    heuristic: InBandHeuristic,
) -> Result<AnalysisBody, InsightsError> {
    let in_band = |detail: &str| InsightsError::InBand {
        endpoint: endpoint.to_string(),
        detail: detail.to_string(),
    };

    match response.status {
        429 => return Err(InsightsError::RateLimited),
        402 => return Err(InsightsError::CreditsExhausted),
        _ if !response.is_success() => {
            return Err(InsightsError::Http {
                endpoint: endpoint.to_string(),
                status: response.status,
                body: response.text(),
            })
        }
        _ => {}
    }

    let text = response.text();
    match format {
        AnalysisFormat::PlainText => {
            if text.trim().is_empty() {
                return Err(in_band("empty response"));
            }
            Ok(AnalysisBody { html: text })
        }
        AnalysisFormat::PlainTextInBand => {
            if text.trim().is_empty() {
                return Err(in_band("empty response"));
            }
            if heuristic == InBandHeuristic::Legacy && looks_like_error(&text) {
                warn!(
                    "{}: HTTP {} body rejected by in-band error heuristic",
                    endpoint, response.status
                );
                return Err(in_band(&text));
            }
            Ok(AnalysisBody { html: text })
        }
        AnalysisFormat::JsonHtml | AnalysisFormat::JsonAnalysis => {
            let envelope: JsonEnvelope = serde_json::from_str(&text)
                .map_err(|e| in_band(&format!("malformed JSON: {e}")))?;
            if let Some(err) = envelope.error {
                return Err(in_band(&err));
            }
            let html = if format == AnalysisFormat::JsonHtml {
                envelope.html
            } else {
                envelope.analysis
            };
            match html {
                Some(h) if !h.trim().is_empty() => Ok(AnalysisBody { html: h }),
                _ => Err(in_band("response carried no content")),
            }
        }
    }
}

fn looks_like_error(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("error") || lower.contains("unavailable")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> BackendResponse {
        BackendResponse::new(200, body)
    }

    #[test]
    fn upload_sentinels() {
        assert_eq!(
            decode_upload("/upload-temp-file", &ok("max_tokens")).unwrap(),
            UploadOutcome::TooLarge
        );
        assert_eq!(
            decode_upload("/upload-temp-file", &ok("error")).unwrap(),
            UploadOutcome::UploadFailed
        );
        assert_eq!(
            decode_upload("/upload-temp-file", &ok("  \n")).unwrap(),
            UploadOutcome::UploadFailed
        );
    }

    #[test]
    fn upload_reference_is_trimmed() {
        assert_eq!(
            decode_upload("/upload-temp-file", &ok("tmp/abc123\n")).unwrap(),
            UploadOutcome::Ok(FileReference::new("tmp/abc123"))
        );
    }

    #[test]
    fn upload_non_2xx_is_transport_error() {
        let err = decode_upload("/upload-temp-file", &BackendResponse::new(500, "boom")).unwrap_err();
        assert!(matches!(err, InsightsError::Http { status: 500, .. }));
    }

    #[test]
    fn legacy_heuristic_rejects_error_like_text() {
        for body in ["", "Error: model overloaded", "Service UNAVAILABLE"] {
            let err = decode_analysis(
                "/upload-translate01",
                &ok(body),
                AnalysisFormat::PlainTextInBand,
                InBandHeuristic::Legacy,
            )
            .unwrap_err();
            assert!(matches!(err, InsightsError::InBand { .. }), "body {body:?}");
        }
    }

    #[test]
    fn empty_only_heuristic_keeps_legitimate_content() {
        let body = "<p>The generator was unavailable during the outage.</p>";
        let out = decode_analysis(
            "/upload-translate01",
            &ok(body),
            AnalysisFormat::PlainTextInBand,
            InBandHeuristic::EmptyOnly,
        )
        .unwrap();
        assert_eq!(out.html, body);
    }

    #[test]
    fn plain_text_ignores_heuristic() {
        let body = "<h2>Error handling clause</h2>";
        let out = decode_analysis(
            "/upload-legal01",
            &ok(body),
            AnalysisFormat::PlainText,
            InBandHeuristic::Legacy,
        )
        .unwrap();
        assert_eq!(out.html, body);
    }

    #[test]
    fn edge_function_status_codes() {
        let rate = decode_analysis(
            "process-medical-report",
            &BackendResponse::new(429, "{}"),
            AnalysisFormat::JsonHtml,
            InBandHeuristic::Legacy,
        );
        assert!(matches!(rate, Err(InsightsError::RateLimited)));
        let credits = decode_analysis(
            "process-medical-report",
            &BackendResponse::new(402, "{}"),
            AnalysisFormat::JsonHtml,
            InBandHeuristic::Legacy,
        );
        assert!(matches!(credits, Err(InsightsError::CreditsExhausted)));
    }

    #[test]
    fn json_envelopes() {
        let html = decode_analysis(
            "process-medical-report",
            &ok(r#"{"html":"<h1>Summary</h1>"}"#),
            AnalysisFormat::JsonHtml,
            InBandHeuristic::Legacy,
        )
        .unwrap();
        assert_eq!(html.html, "<h1>Summary</h1>");

        let analysis = decode_analysis(
            "analyze-orthodontic-image",
            &ok(r#"{"analysis":"<p>Class II</p>"}"#),
            AnalysisFormat::JsonAnalysis,
            InBandHeuristic::Legacy,
        )
        .unwrap();
        assert_eq!(analysis.html, "<p>Class II</p>");

        let err = decode_analysis(
            "analyze-orthodontic-image",
            &ok(r#"{"error":"no images"}"#),
            AnalysisFormat::JsonAnalysis,
            InBandHeuristic::Legacy,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no images"));

        assert!(decode_analysis(
            "process-medical-report",
            &ok("<html>not json</html>"),
            AnalysisFormat::JsonHtml,
            InBandHeuristic::Legacy,
        )
        .is_err());
    }
}
