//! Per-tool pipeline configuration.
//!
//! Every tool runs the same state machine in
//! [`crate::pipeline::session::ToolSession`]; what differs is captured here:
//! which validator applies, how the file reaches the backend, which endpoint
//! analyses it, how the answer is wrapped, how fast the progress bar moves and
//! what the demo path returns.

use crate::config::{ResultKind, ToolKind};
use crate::pipeline::backend::Service;
use crate::pipeline::decode::AnalysisFormat;
use crate::progress::ProgressCurve;
use crate::render::sanitize::SanitizePolicy;
use std::time::Duration;

/// Path of the shared temp-file upload endpoint.
pub const UPLOAD_TEMP_FILE: &str = "/upload-temp-file";

/// Path of the legal risk-analysis endpoint.
pub const LEGAL_RISK: &str = "/upload-legal-risk";

/// Path of the PDF rendering endpoint.
pub const GENERATE_PDF: &str = "/generate-pdf";

/// Edge-function path for `name`.
pub fn function_path(name: &str) -> String {
    format!("/functions/v1/{name}")
}

/// How the selected file reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    /// Upload to temp storage first; analysis receives the file reference.
    TempFile,
    /// No separate upload; the analysis request carries the file itself.
    Inline,
}

/// What the analysis request body contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPayload {
    /// JSON `{fileReference}`.
    Reference,
    /// JSON `{fileReference, documentType}`.
    ReferenceWithDocumentType,
    /// Multipart `file`.
    File,
    /// JSON `{images, sessionId}` with base64 images.
    Images,
}

/// The analysis call of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisStep {
    pub service: Service,
    pub path: String,
    pub payload: AnalysisPayload,
    pub format: AnalysisFormat,
    /// Send the edge-function bearer token.
    pub authorized: bool,
}

/// Static description of one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolProfile {
    pub tool: ToolKind,
    pub upload: UploadStep,
    pub analysis: AnalysisStep,
    /// Party-scoped second analysis (legal only).
    pub risk_path: Option<&'static str>,
    pub tick: Duration,
    pub curve: ProgressCurve,
    pub demo_delay: Duration,
    /// Persist the file reference in the state store.
    pub persist_reference: bool,
    /// Upper bound on files per selection.
    pub max_files: usize,
    /// Headings/paragraphs dropped from results when they match exactly.
    pub placeholders: &'static [&'static str],
    pub sanitize: SanitizePolicy,
    pub result_kind: ResultKind,
}

impl ToolProfile {
    pub fn for_tool(tool: ToolKind) -> Self {
        let api = |path: &str, payload: AnalysisPayload, format: AnalysisFormat| AnalysisStep {
            service: Service::Api,
            path: path.to_string(),
            payload,
            format,
            authorized: false,
        };
        let function = |name: &str, payload: AnalysisPayload, format: AnalysisFormat| AnalysisStep {
            service: Service::Functions,
            path: function_path(name),
            payload,
            format,
            authorized: true,
        };

        match tool {
            ToolKind::Legal => Self {
                tool,
                upload: UploadStep::TempFile,
                analysis: api("/upload-legal01", AnalysisPayload::Reference, AnalysisFormat::PlainText),
                risk_path: Some(LEGAL_RISK),
                tick: Duration::from_millis(600),
                curve: ProgressCurve::Linear { step: 1 },
                demo_delay: Duration::from_millis(3000),
                persist_reference: true,
                max_files: 1,
                placeholders: &[],
                sanitize: SanitizePolicy::Standard,
                result_kind: ResultKind::Plain,
            },
            ToolKind::Medical => Self {
                tool,
                upload: UploadStep::TempFile,
                analysis: api("/upload-medical01", AnalysisPayload::Reference, AnalysisFormat::PlainText),
                risk_path: None,
                tick: Duration::from_millis(1000),
                curve: ProgressCurve::Linear { step: 1 },
                demo_delay: Duration::from_millis(2000),
                persist_reference: false,
                max_files: 1,
                placeholders: &[],
                sanitize: SanitizePolicy::Standard,
                result_kind: ResultKind::Medical,
            },
            ToolKind::Translation => Self {
                tool,
                upload: UploadStep::TempFile,
                analysis: api(
                    "/upload-translate01",
                    AnalysisPayload::ReferenceWithDocumentType,
                    AnalysisFormat::PlainTextInBand,
                ),
                risk_path: None,
                tick: Duration::from_millis(1200),
                curve: ProgressCurve::Decelerating { ceiling: 95 },
                demo_delay: Duration::from_millis(5000),
                persist_reference: false,
                max_files: 1,
                placeholders: &["Translation of PDF", "Translated Document"],
                sanitize: SanitizePolicy::Standard,
                result_kind: ResultKind::Translation,
            },
            ToolKind::MedicalReport => Self {
                tool,
                upload: UploadStep::Inline,
                analysis: function("process-medical-report", AnalysisPayload::File, AnalysisFormat::JsonHtml),
                risk_path: None,
                tick: Duration::from_millis(800),
                curve: ProgressCurve::Decelerating { ceiling: 95 },
                demo_delay: Duration::from_millis(1500),
                persist_reference: false,
                max_files: 1,
                placeholders: &[],
                sanitize: SanitizePolicy::Strict,
                result_kind: ResultKind::Medical,
            },
            ToolKind::Orthodontic => Self {
                tool,
                upload: UploadStep::Inline,
                analysis: function(
                    "analyze-orthodontic-image",
                    AnalysisPayload::Images,
                    AnalysisFormat::JsonAnalysis,
                ),
                risk_path: None,
                tick: Duration::from_millis(700),
                curve: ProgressCurve::Decelerating { ceiling: 95 },
                demo_delay: Duration::from_millis(2500),
                persist_reference: false,
                max_files: 10,
                placeholders: &[],
                sanitize: SanitizePolicy::Strict,
                result_kind: ResultKind::Orthodontic,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_legal_has_risk_step() {
        for tool in ToolKind::ALL {
            let p = ToolProfile::for_tool(tool);
            assert_eq!(p.risk_path.is_some(), tool == ToolKind::Legal, "{tool}");
        }
    }

    #[test]
    fn ticks_stay_in_site_range() {
        for tool in ToolKind::ALL {
            let ms = ToolProfile::for_tool(tool).tick.as_millis();
            assert!((600..=1200).contains(&ms), "{tool}: {ms}ms");
        }
    }

    #[test]
    fn demo_delays_stay_in_site_range() {
        for tool in ToolKind::ALL {
            let ms = ToolProfile::for_tool(tool).demo_delay.as_millis();
            assert!((1500..=5000).contains(&ms), "{tool}: {ms}ms");
        }
    }

    #[test]
    fn edge_functions_are_authorized() {
        let p = ToolProfile::for_tool(ToolKind::MedicalReport);
        assert_eq!(p.analysis.service, Service::Functions);
        assert_eq!(p.analysis.path, "/functions/v1/process-medical-report");
        assert!(p.analysis.authorized);
        assert!(!ToolProfile::for_tool(ToolKind::Legal).analysis.authorized);
    }
}
