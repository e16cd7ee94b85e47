//! # simpleinsights
//!
//! Client library for the SimpleInsights.ai document tools: a legal-contract
//! assistant, two medical-report assistants, a translation assistant and an
//! orthodontic radiograph analyser.
//!
//! ## Why this crate?
//!
//! Every tool follows the same workflow: validate a file, upload it, have a
//! remote model analyse it, show the returned HTML, optionally export it to
//! PDF. Rather than repeating that workflow per tool, the crate runs one
//! state machine ([`ToolSession`]) configured per tool by a
//! [`pipeline::profile::ToolProfile`].
//!
//! ## Pipeline Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Validate  MIME allow-list, 8-byte signature, size limit
//!  ├─ 2. Upload    /upload-temp-file → file reference (or inline)
//!  ├─ 3. Analyse   tool endpoint → HTML, in-band errors decoded
//!  ├─ 4. Render    allow-list sanitiser, placeholder filter, tabs
//!  └─ 5. Export    server-rendered or local (printpdf) PDF
//! ```
//!
//! A cosmetic [`ProgressSimulator`] ticks while steps 2–3 run. Front-ends
//! observe everything through a [`PipelineObserver`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use simpleinsights::{
//!     HttpBackend, NoopObserver, PipelineConfig, ToolKind, ToolSession, UploadedFile,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default();
//!     let backend = Arc::new(HttpBackend::new(&config)?);
//!     let mut session = ToolSession::new(ToolKind::Legal, config, backend, Arc::new(NoopObserver))?;
//!
//!     let bytes = std::fs::read("contract.pdf")?;
//!     let file = UploadedFile::new("contract.pdf", "application/pdf", bytes);
//!     session.select_file(file).await?;
//!     session.run_risk_analysis("Tenant").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `insights` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! simpleinsights = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod observer;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{InBandHeuristic, PipelineConfig, PipelineConfigBuilder, ResultKind, ServiceUrls, ToolKind};
pub use error::{ErrorCategory, InsightsError, ValidationError};
pub use export::{export_name, ExportJob, ExportMode};
pub use observer::{
    NoopObserver, Notice, NoticeLevel, PipelineObserver, ScrollRequest, ScrollTarget, SharedObserver,
};
pub use pipeline::backend::{AnalysisBackend, BackendRequest, BackendResponse, HttpBackend, RequestBody, Service};
pub use pipeline::decode::{decode_analysis, decode_upload, AnalysisBody, FileReference, UploadOutcome};
pub use pipeline::session::{PipelineState, ProcessingState, ToolSession};
pub use pipeline::validate::{FileSignature, FileValidator, UploadedFile};
pub use progress::{ProgressCurve, ProgressSimulator};
pub use render::{sanitize, strip_placeholders, AnalysisResult, ResultTab, ResultView, SanitizePolicy};
pub use storage::StateStore;
