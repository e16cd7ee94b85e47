//! The upload → process → display state machine shared by every tool.
//!
//! A [`ToolSession`] is one tool instance: one progress timer, one pair of
//! result slots, one file reference. Its async methods take `&mut self`, so a
//! session can never run two requests at once; the `is_loading` flag
//! additionally rejects re-entry with [`InsightsError::Busy`].
//!
//! ```text
//! Idle ─select_files─▶ Uploading ─reference─▶ Processing ─html─▶ Succeeded
//!  ▲                      │                        │
//!  └──── sentinel ────────┘                        └─ error ──▶ Failed
//! ```
//!
//! Every exit path stops the progress timer, including a request future
//! dropped mid-flight: that also clears `is_loading`, leaving the state
//! where it was until the next call.

use crate::config::{PipelineConfig, ResultKind, ToolKind};
use crate::error::{InsightsError, ValidationError};
use crate::export::{self, local, server, ExportJob, ExportMode};
use crate::observer::{Notice, NoticeLevel, ScrollRequest, ScrollTarget, SharedObserver};
use crate::pipeline::backend::{AnalysisBackend, BackendRequest, RequestBody, Service};
use crate::pipeline::decode::{decode_analysis, decode_upload, AnalysisFormat, FileReference, UploadOutcome};
use crate::pipeline::demo;
use crate::pipeline::encode::{encode_image, EncodedImage, MAX_EDGE_PX};
use crate::pipeline::profile::{AnalysisPayload, ToolProfile, UploadStep, UPLOAD_TEMP_FILE};
use crate::pipeline::validate::{FileValidator, UploadedFile};
use crate::progress::{ProgressSimulator, StopOnDrop};
use crate::render::view::{ResultTab, ResultView};
use crate::storage::{StateStore, FILE_REFERENCE_KEY};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub use crate::render::view::AnalysisResult;

/// Translation `documentType` when none is chosen.
pub const DEFAULT_DOCUMENT_TYPE: &str = "general";

/// Position of a session in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineState {
    #[default]
    Idle,
    Uploading,
    Processing,
    Succeeded,
    Failed,
}

/// Snapshot of the in-flight work indicators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    pub is_loading: bool,
    /// 0–100.
    pub progress: u8,
    /// User-facing text of the last failure.
    pub error_message: Option<String>,
}

/// Tells the observer the export button is usable again, even when the
/// export future is dropped before finishing.
struct ExportGuard {
    observer: SharedObserver,
    tool: ToolKind,
}

impl ExportGuard {
    fn new(observer: SharedObserver, tool: ToolKind) -> Self {
        observer.on_export_state(tool, true);
        Self { observer, tool }
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.observer.on_export_state(self.tool, false);
    }
}

/// Held for the duration of a request; releases the loading flag and the
/// progress timer if the request future is dropped.
#[must_use]
struct InFlight {
    loading: Arc<AtomicBool>,
    _progress: StopOnDrop,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.loading.store(false, Ordering::SeqCst);
    }
}

/// One tool instance.
pub struct ToolSession {
    profile: ToolProfile,
    config: PipelineConfig,
    backend: Arc<dyn AnalysisBackend>,
    observer: SharedObserver,
    store: Arc<StateStore>,
    validator: FileValidator,
    progress: ProgressSimulator,
    state: PipelineState,
    is_loading: Arc<AtomicBool>,
    error_message: Option<String>,
    file_reference: Option<FileReference>,
    view: ResultView,
    party: String,
    document_type: String,
    gallery: Vec<EncodedImage>,
}

impl ToolSession {
    /// Create a session whose persisted state lives in `config.state_dir`,
    /// or in memory when no directory is configured.
    pub fn new(
        tool: ToolKind,
        config: PipelineConfig,
        backend: Arc<dyn AnalysisBackend>,
        observer: SharedObserver,
    ) -> Result<Self, InsightsError> {
        let store = match config.state_dir {
            Some(ref dir) => StateStore::open(dir)?,
            None => StateStore::in_memory(),
        };
        Ok(Self::with_store(tool, config, backend, observer, Arc::new(store)))
    }

    /// Create a session sharing `store` with other sessions.
    pub fn with_store(
        tool: ToolKind,
        config: PipelineConfig,
        backend: Arc<dyn AnalysisBackend>,
        observer: SharedObserver,
        store: Arc<StateStore>,
    ) -> Self {
        let profile = ToolProfile::for_tool(tool);
        let tick = config
            .tick_ms
            .map(Duration::from_millis)
            .unwrap_or(profile.tick);
        let progress = ProgressSimulator::new(tool, tick, profile.curve, Arc::clone(&observer));
        let validator = FileValidator::for_tool(tool, config.max_file_bytes);
        let view = ResultView::new(
            profile.risk_path.is_some(),
            profile.sanitize,
            profile.placeholders,
        );

        let file_reference = if profile.persist_reference {
            store.get(FILE_REFERENCE_KEY).map(FileReference::new)
        } else {
            None
        };
        if let Some(ref r) = file_reference {
            debug!("{tool}: restored file reference {r}");
        }

        Self {
            profile,
            config,
            backend,
            observer,
            store,
            validator,
            progress,
            state: PipelineState::Idle,
            is_loading: Arc::new(AtomicBool::new(false)),
            error_message: None,
            file_reference,
            view,
            party: String::new(),
            document_type: DEFAULT_DOCUMENT_TYPE.to_string(),
            gallery: Vec::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn tool(&self) -> ToolKind {
        self.profile.tool
    }

    pub fn profile(&self) -> &ToolProfile {
        &self.profile
    }

    pub fn validator(&self) -> &FileValidator {
        &self.validator
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn loading(&self) -> bool {
        self.is_loading.load(Ordering::SeqCst)
    }

    pub fn processing(&self) -> ProcessingState {
        ProcessingState {
            is_loading: self.loading(),
            progress: self.progress.progress(),
            error_message: self.error_message.clone(),
        }
    }

    pub fn results(&self) -> &ResultView {
        &self.view
    }

    pub fn file_reference(&self) -> Option<&FileReference> {
        self.file_reference.as_ref()
    }

    pub fn party(&self) -> &str {
        &self.party
    }

    pub fn set_party(&mut self, party: impl Into<String>) {
        self.party = party.into();
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    pub fn set_document_type(&mut self, document_type: impl Into<String>) {
        self.document_type = document_type.into();
    }

    /// Images sent with the last orthodontic analysis.
    pub fn gallery(&self) -> &[EncodedImage] {
        &self.gallery
    }

    /// Switch result tabs; returns the scroll offset to restore.
    pub fn select_tab(&mut self, tab: ResultTab, current_scroll: f64) -> f64 {
        self.view.select_tab(tab, current_scroll)
    }

    /// Display a result produced earlier, e.g. one read back from disk for a
    /// later export. No request is made.
    pub fn restore_result(&mut self, result: AnalysisResult) -> Result<(), InsightsError> {
        if self.loading() {
            return Err(InsightsError::Busy);
        }
        let tab = if result.kind == ResultKind::Risk {
            ResultTab::RiskAnalysis
        } else {
            ResultTab::PlainEnglish
        };
        self.view.set(result);
        self.view.activate(tab);
        self.set_state(PipelineState::Succeeded);
        Ok(())
    }

    /// Back to a fresh `Idle` session.
    pub fn reset(&mut self) {
        self.progress.reset();
        self.view.clear();
        self.gallery.clear();
        self.is_loading.store(false, Ordering::SeqCst);
        self.error_message = None;
        self.set_state(PipelineState::Idle);
    }

    // ── Main pipeline ─────────────────────────────────────────────────────

    pub async fn select_file(&mut self, file: UploadedFile) -> Result<AnalysisResult, InsightsError> {
        self.select_files(vec![file]).await
    }

    /// Validate `files`, then upload and analyse them.
    ///
    /// Rejected files raise a notice and leave the session untouched.
    pub async fn select_files(&mut self, files: Vec<UploadedFile>) -> Result<AnalysisResult, InsightsError> {
        if self.loading() {
            return Err(InsightsError::Busy);
        }
        if files.is_empty() {
            return Err(self.reject(InsightsError::NoFiles));
        }
        if files.len() > self.profile.max_files {
            let err = ValidationError::TooManyFiles {
                count: files.len(),
                limit: self.profile.max_files,
            };
            return Err(self.reject(err.into()));
        }
        for file in &files {
            if let Err(e) = self.validator.validate(file) {
                return Err(self.reject(e.into()));
            }
        }

        info!(
            "{}: processing {}",
            self.tool(),
            files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ")
        );
        let _in_flight = self.begin(true, PipelineState::Uploading);

        let outcome = if self.config.demo {
            self.demo_primary().await
        } else {
            self.run_live(files).await
        };
        self.finish(outcome).await
    }

    /// Party-scoped risk analysis of the current document (legal tool).
    pub async fn run_risk_analysis(&mut self, party: &str) -> Result<AnalysisResult, InsightsError> {
        if self.loading() {
            return Err(InsightsError::Busy);
        }
        let Some(path) = self.profile.risk_path else {
            return Err(InsightsError::InvalidConfig(format!(
                "{} has no risk analysis",
                self.tool()
            )));
        };
        let party = party.trim();
        if party.is_empty() {
            return Err(self.reject(InsightsError::MissingParty));
        }
        let Some(reference) = self.file_reference.clone() else {
            return Err(self.reject(InsightsError::MissingFileReference));
        };

        info!("{}: risk analysis for party '{}'", self.tool(), party);
        self.party = party.to_string();
        self.view.clear_risk();
        let _in_flight = self.begin(false, PipelineState::Processing);

        let outcome = if self.config.demo {
            self.demo_result(ResultKind::Risk).await
        } else {
            let body = json!({ "fileReference": reference.as_str(), "party": party });
            self.analyse(
                BackendRequest::new(self.profile.analysis.service, path, RequestBody::Json(body)),
                AnalysisFormat::PlainText,
                ResultKind::Risk,
            )
            .await
        };
        self.finish(outcome).await
    }

    /// Run the demo path without a file. `ResultKind::Risk` runs the legal
    /// risk demo with the party pre-filled; any other kind the tool's
    /// primary demo.
    pub async fn run_demo(&mut self, kind: ResultKind) -> Result<AnalysisResult, InsightsError> {
        if self.loading() {
            return Err(InsightsError::Busy);
        }
        if kind == ResultKind::Risk {
            if self.profile.risk_path.is_none() {
                return Err(InsightsError::InvalidConfig(format!(
                    "{} has no risk analysis",
                    self.tool()
                )));
            }
            self.party = demo::DEMO_PARTY.to_string();
            self.view.clear_risk();
            let _in_flight = self.begin(false, PipelineState::Processing);
            let outcome = self.demo_result(ResultKind::Risk).await;
            return self.finish(outcome).await;
        }

        let _in_flight = self.begin(true, PipelineState::Uploading);
        let outcome = self.demo_primary().await;
        self.finish(outcome).await
    }

    // ── Export ────────────────────────────────────────────────────────────

    /// Export the active result to a PDF in `out_dir`.
    ///
    /// Fails immediately, without any network call, when there is no result.
    /// A failed export leaves the displayed result untouched.
    pub async fn export(&mut self, mode: ExportMode, out_dir: &Path) -> Result<PathBuf, InsightsError> {
        let Some(html) = self.view.rendered_active() else {
            return Err(self.reject(InsightsError::NothingToExport));
        };

        let mut job = ExportJob::new(self.tool(), mode);
        let guard = ExportGuard::new(Arc::clone(&self.observer), self.tool());
        info!("{}: exporting {} ({:?})", self.tool(), job.file_name, mode);

        let result = self.render_export(&job, html, out_dir).await;
        job.in_progress = false;
        drop(guard);

        match result {
            Ok(path) => {
                self.notify(Notice::success("PDF ready", format!("Saved {}", job.file_name)));
                Ok(path)
            }
            Err(e) => {
                error!("{}: export failed: {}", self.tool(), e);
                self.notify(Notice::error("Export failed", e.user_message()));
                Err(e)
            }
        }
    }

    async fn render_export(
        &self,
        job: &ExportJob,
        html: String,
        out_dir: &Path,
    ) -> Result<PathBuf, InsightsError> {
        let title = self.tool().title();
        let bytes = match job.mode {
            ExportMode::Server => {
                let document = server::build_document(title, &html, &self.gallery);
                server::render(self.backend.as_ref(), document).await?
            }
            ExportMode::Local => tokio::task::spawn_blocking(move || local::render(title, &html))
                .await
                .map_err(|e| InsightsError::Internal(format!("PDF task panicked: {e}")))??,
        };

        let path = job.output_path(out_dir);
        export::write_atomic(&path, &bytes)?;
        Ok(path)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error | NoticeLevel::Warning => {
                warn!("{}: {}: {}", self.tool(), notice.title, notice.message)
            }
            _ => debug!("{}: {}: {}", self.tool(), notice.title, notice.message),
        }
        self.observer.on_notice(self.tool(), &notice);
    }

    /// Raise a notice for a locally rejected request and hand the error back.
    fn reject(&self, err: InsightsError) -> InsightsError {
        let title = match err {
            InsightsError::Validation(_) | InsightsError::NoFiles => "Invalid file",
            InsightsError::MissingParty => "Party required",
            InsightsError::MissingFileReference => "No document",
            InsightsError::NothingToExport => "Nothing to export",
            _ => "Request rejected",
        };
        self.notify(Notice::error(title, err.user_message()));
        err
    }

    fn set_state(&mut self, state: PipelineState) {
        if self.state != state {
            debug!("{}: {:?} → {:?}", self.tool(), self.state, state);
            self.state = state;
            self.observer.on_state_change(self.tool(), state);
        }
    }

    fn scroll(&self, target: ScrollTarget) {
        self.observer.on_scroll(
            self.tool(),
            &ScrollRequest {
                target,
                offset_px: self.config.scroll_offset_px,
                smooth: true,
            },
        );
    }

    /// Enter a loading state. `fresh` discards everything derived from the
    /// previous document.
    fn begin(&mut self, fresh: bool, state: PipelineState) -> InFlight {
        if fresh {
            self.view.clear();
            self.gallery.clear();
            if self.file_reference.take().is_some() && self.profile.persist_reference {
                if let Err(e) = self.store.remove(FILE_REFERENCE_KEY) {
                    warn!("{}: could not clear stored file reference: {}", self.tool(), e);
                }
            }
        }
        self.error_message = None;
        self.is_loading.store(true, Ordering::SeqCst);
        self.progress.start();
        self.set_state(state);
        self.scroll(ScrollTarget::Progress);
        InFlight {
            loading: Arc::clone(&self.is_loading),
            _progress: self.progress.stop_on_drop(),
        }
    }

    async fn finish(
        &mut self,
        outcome: Result<AnalysisResult, InsightsError>,
    ) -> Result<AnalysisResult, InsightsError> {
        match outcome {
            Ok(result) => {
                self.progress.complete();
                tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
                self.is_loading.store(false, Ordering::SeqCst);
                self.view.set(result.clone());
                if result.kind == ResultKind::Risk {
                    self.view.activate(ResultTab::RiskAnalysis);
                }
                self.set_state(PipelineState::Succeeded);
                self.scroll(ScrollTarget::Result);
                info!("{}: analysis complete ({} bytes)", self.tool(), result.html.len());
                self.notify(Notice::success("Analysis complete", "Your document has been processed."));
                Ok(result)
            }
            Err(e @ (InsightsError::FileTooLarge | InsightsError::UploadRejected)) => {
                self.progress.reset();
                self.is_loading.store(false, Ordering::SeqCst);
                self.set_state(PipelineState::Idle);
                self.notify(Notice::error("Upload failed", e.user_message()));
                Err(e)
            }
            Err(e) => {
                self.progress.stop();
                self.is_loading.store(false, Ordering::SeqCst);
                self.error_message = Some(e.user_message());
                self.set_state(PipelineState::Failed);
                error!("{}: {}", self.tool(), e);
                let title = match e {
                    InsightsError::RateLimited => "Rate limit exceeded",
                    InsightsError::CreditsExhausted => "Credits exhausted",
                    _ => "Processing failed",
                };
                self.notify(Notice::error(title, e.user_message()));
                Err(e)
            }
        }
    }

    async fn demo_result(&self, kind: ResultKind) -> Result<AnalysisResult, InsightsError> {
        let delay = self
            .config
            .demo_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(self.profile.demo_delay);
        debug!("{}: demo result in {}ms", self.tool(), delay.as_millis());
        tokio::time::sleep(delay).await;
        Ok(AnalysisResult::new(kind, demo::content(self.tool(), kind)))
    }

    async fn demo_primary(&mut self) -> Result<AnalysisResult, InsightsError> {
        self.set_state(PipelineState::Processing);
        if self.profile.upload == UploadStep::TempFile {
            self.file_reference = Some(FileReference::new("demo"));
        }
        self.demo_result(self.profile.result_kind).await
    }

    async fn run_live(&mut self, files: Vec<UploadedFile>) -> Result<AnalysisResult, InsightsError> {
        let step = self.profile.analysis.clone();

        let body = match step.payload {
            AnalysisPayload::Reference | AnalysisPayload::ReferenceWithDocumentType => {
                let reference = self.upload(&files[0]).await?;
                self.set_state(PipelineState::Processing);
                let body = if step.payload == AnalysisPayload::Reference {
                    json!({ "fileReference": reference.as_str() })
                } else {
                    json!({
                        "fileReference": reference.as_str(),
                        "documentType": self.document_type,
                    })
                };
                RequestBody::Json(body)
            }
            AnalysisPayload::File => {
                self.set_state(PipelineState::Processing);
                RequestBody::File(files[0].clone())
            }
            AnalysisPayload::Images => {
                self.set_state(PipelineState::Processing);
                let images = encode_all(files).await?;
                let session_id = self.store.session_id()?;
                let body = json!({
                    "images": images.iter().map(|i| i.data.as_str()).collect::<Vec<_>>(),
                    "sessionId": session_id,
                });
                self.gallery = images;
                RequestBody::Json(body)
            }
        };

        let mut request = BackendRequest::new(step.service, step.path.clone(), body);
        if step.authorized {
            request = request.authorized();
        }
        self.analyse(request, step.format, self.profile.result_kind).await
    }

    async fn upload(&mut self, file: &UploadedFile) -> Result<FileReference, InsightsError> {
        info!("{}: uploading {} ({} bytes)", self.tool(), file.name, file.size());
        let request = BackendRequest::new(
            Service::Api,
            UPLOAD_TEMP_FILE,
            RequestBody::File(file.clone()),
        );
        let response = self.backend.send(request).await?;

        match decode_upload(UPLOAD_TEMP_FILE, &response)? {
            UploadOutcome::Ok(reference) => {
                info!("{}: file reference received", self.tool());
                if self.profile.persist_reference {
                    if let Err(e) = self.store.set(FILE_REFERENCE_KEY, reference.as_str()) {
                        warn!("{}: could not persist file reference: {}", self.tool(), e);
                    }
                }
                self.file_reference = Some(reference.clone());
                Ok(reference)
            }
            UploadOutcome::TooLarge => Err(InsightsError::FileTooLarge),
            UploadOutcome::UploadFailed => Err(InsightsError::UploadRejected),
        }
    }

    async fn analyse(
        &self,
        request: BackendRequest,
        format: AnalysisFormat,
        kind: ResultKind,
    ) -> Result<AnalysisResult, InsightsError> {
        let endpoint = request.path.clone();
        debug!("{}: POST {}", self.tool(), endpoint);
        let response = self.backend.send(request).await?;
        let body = decode_analysis(&endpoint, &response, format, self.config.heuristic)?;
        Ok(AnalysisResult::new(kind, body.html))
    }
}

/// Downscale and encode radiographs off the async runtime.
async fn encode_all(files: Vec<UploadedFile>) -> Result<Vec<EncodedImage>, InsightsError> {
    tokio::task::spawn_blocking(move || {
        files
            .iter()
            .map(|f| encode_image(f, MAX_EDGE_PX))
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .map_err(|e| InsightsError::Internal(format!("image task panicked: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use crate::pipeline::backend::BackendResponse;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl AnalysisBackend for Unreachable {
        async fn send(&self, request: BackendRequest) -> Result<BackendResponse, InsightsError> {
            panic!("unexpected request to {}", request.path);
        }
    }

    struct Stalled;

    #[async_trait]
    impl AnalysisBackend for Stalled {
        async fn send(&self, _request: BackendRequest) -> Result<BackendResponse, InsightsError> {
            std::future::pending().await
        }
    }

    fn session(tool: ToolKind) -> ToolSession {
        let config = PipelineConfig::builder()
            .demo(true)
            .demo_delay_ms(10)
            .settle_delay_ms(0)
            .build()
            .unwrap();
        ToolSession::new(tool, config, Arc::new(Unreachable), Arc::new(NoopObserver)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn demo_primary_runs_without_network() {
        let mut s = session(ToolKind::Medical);
        let file = UploadedFile::new("report.pdf", "application/pdf", b"%PDF-1.7".to_vec());
        let result = s.select_file(file).await.unwrap();
        assert_eq!(result.kind, ResultKind::Medical);
        assert_eq!(s.state(), PipelineState::Succeeded);
        assert_eq!(s.processing().progress, 100);
        assert!(!s.processing().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_request_releases_timer_and_loading_flag() {
        let config = PipelineConfig::builder().tick_ms(50).build().unwrap();
        let mut s =
            ToolSession::new(ToolKind::Medical, config, Arc::new(Stalled), Arc::new(NoopObserver)).unwrap();
        let file = UploadedFile::new("report.pdf", "application/pdf", b"%PDF-1.7".to_vec());

        let waited = tokio::time::timeout(Duration::from_millis(500), s.select_file(file.clone())).await;
        assert!(waited.is_err());
        assert!(!s.processing().is_loading);

        let frozen = s.processing().progress;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!s.progress.is_running());
        assert_eq!(s.processing().progress, frozen);

        // a new request is accepted rather than refused as Busy
        let again = tokio::time::timeout(Duration::from_millis(100), s.select_file(file)).await;
        assert!(again.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_file_changes_nothing() {
        let mut s = session(ToolKind::Legal);
        let fake = UploadedFile::new("contract.pdf", "application/pdf", b"MZ\x90".to_vec());
        let err = s.select_file(fake).await.unwrap_err();
        assert!(matches!(err, InsightsError::Validation(_)));
        assert_eq!(s.state(), PipelineState::Idle);
        assert_eq!(s.processing(), ProcessingState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn too_many_images_rejected() {
        let mut s = session(ToolKind::Legal);
        let pdf = UploadedFile::new("a.pdf", "application/pdf", b"%PDF-1.7".to_vec());
        let err = s.select_files(vec![pdf.clone(), pdf]).await.unwrap_err();
        assert!(matches!(
            err,
            InsightsError::Validation(ValidationError::TooManyFiles { count: 2, limit: 1 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn risk_demo_is_legal_only() {
        let mut s = session(ToolKind::Translation);
        assert!(matches!(
            s.run_demo(ResultKind::Risk).await,
            Err(InsightsError::InvalidConfig(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn restored_result_is_exportable() {
        let mut s = session(ToolKind::Legal);
        s.restore_result(AnalysisResult::new(ResultKind::Risk, "<p>risk</p>"))
            .unwrap();
        assert_eq!(s.state(), PipelineState::Succeeded);
        assert_eq!(s.results().active(), ResultTab::RiskAnalysis);

        let dir = tempfile::tempdir().unwrap();
        let path = s.export(ExportMode::Local, dir.path()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_returns_to_idle() {
        let mut s = session(ToolKind::Legal);
        s.run_demo(ResultKind::Plain).await.unwrap();
        s.reset();
        assert_eq!(s.state(), PipelineState::Idle);
        assert!(s.results().is_empty());
        assert_eq!(s.processing().progress, 0);
    }
}
