//! Configuration types for tool sessions and exports.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. One config is shared by every tool session
//! in a process; tool-specific behaviour (endpoints, validators, demo content)
//! lives in [`crate::pipeline::profile::ToolProfile`].

use crate::error::InsightsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Base URLs of the three backends the tools talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUrls {
    /// Upload and analysis API (`/upload-temp-file`, `/upload-legal01`, …).
    pub api: String,
    /// Edge-function host; functions live under `/functions/v1/<name>`.
    pub functions: String,
    /// PDF rendering backend exposing `/generate-pdf`.
    pub pdf_renderer: String,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            api: "https://api.simpleinsights.ai".into(),
            functions: "https://functions.simpleinsights.ai".into(),
            pdf_renderer: "https://pdf.simpleinsights.ai".into(),
        }
    }
}

/// How analysis bodies returned with HTTP 2xx are screened for failure.
///
/// `Legacy` mirrors the existing backend contract: an empty body, or one
/// containing `error` / `unavailable` (any case), is a failure. It also
/// rejects legitimate documents that merely mention those words, which is
/// why `EmptyOnly` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InBandHeuristic {
    #[default]
    Legacy,
    EmptyOnly,
}

/// Configuration shared by every tool session.
///
/// # Example
/// ```rust
/// use simpleinsights::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .api_url("http://localhost:8787")
///     .max_file_bytes(5 * 1024 * 1024)
///     .demo(true)
///     .build()
///     .unwrap();
/// assert!(config.demo);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    pub urls: ServiceUrls,

    /// Bearer token for edge functions.
    pub functions_key: Option<String>,

    /// Upload size limit in bytes. Default: 10 MiB.
    pub max_file_bytes: u64,

    /// Progress tick override in milliseconds. `None` uses the tool's own rate.
    pub tick_ms: Option<u64>,

    /// Pause between forcing progress to 100 and clearing the loading flag. Default: 500.
    pub settle_delay_ms: u64,

    /// Serve canned results instead of calling the backends.
    pub demo: bool,

    /// Demo delay override in milliseconds. `None` uses the tool's own delay.
    pub demo_delay_ms: Option<u64>,

    /// HTTP request timeout in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Vertical offset applied when scrolling results into view. Default: 80.
    pub scroll_offset_px: u32,

    pub heuristic: InBandHeuristic,

    /// Directory for the persisted key/value state. `None` keeps it in memory.
    pub state_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            urls: ServiceUrls::default(),
            functions_key: None,
            max_file_bytes: 10 * 1024 * 1024,
            tick_ms: None,
            settle_delay_ms: 500,
            demo: false,
            demo_delay_ms: None,
            request_timeout_secs: 120,
            scroll_offset_px: 80,
            heuristic: InBandHeuristic::default(),
            state_dir: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("urls", &self.urls)
            .field("functions_key", &self.functions_key.as_ref().map(|_| "<redacted>"))
            .field("max_file_bytes", &self.max_file_bytes)
            .field("tick_ms", &self.tick_ms)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("demo", &self.demo)
            .field("demo_delay_ms", &self.demo_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("heuristic", &self.heuristic)
            .field("state_dir", &self.state_dir)
            .finish()
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.urls.api = url.into();
        self
    }

    pub fn functions_url(mut self, url: impl Into<String>) -> Self {
        self.config.urls.functions = url.into();
        self
    }

    pub fn pdf_renderer_url(mut self, url: impl Into<String>) -> Self {
        self.config.urls.pdf_renderer = url.into();
        self
    }

    pub fn functions_key(mut self, key: impl Into<String>) -> Self {
        self.config.functions_key = Some(key.into());
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.config.max_file_bytes = bytes;
        self
    }

    pub fn tick_ms(mut self, ms: u64) -> Self {
        self.config.tick_ms = Some(ms);
        self
    }

    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.settle_delay_ms = ms;
        self
    }

    pub fn demo(mut self, v: bool) -> Self {
        self.config.demo = v;
        self
    }

    pub fn demo_delay_ms(mut self, ms: u64) -> Self {
        self.config.demo_delay_ms = Some(ms);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn scroll_offset_px(mut self, px: u32) -> Self {
        self.config.scroll_offset_px = px;
        self
    }

    pub fn heuristic(mut self, h: InBandHeuristic) -> Self {
        self.config.heuristic = h;
        self
    }

    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.state_dir = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, InsightsError> {
        let c = &self.config;
        for (name, url) in [
            ("api", &c.urls.api),
            ("functions", &c.urls.functions),
            ("pdf_renderer", &c.urls.pdf_renderer),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(InsightsError::InvalidConfig(format!(
                    "{name} URL must be http(s), got '{url}'"
                )));
            }
        }
        if c.max_file_bytes == 0 {
            return Err(InsightsError::InvalidConfig(
                "max_file_bytes must be > 0".into(),
            ));
        }
        if c.tick_ms == Some(0) {
            return Err(InsightsError::InvalidConfig("tick_ms must be > 0".into()));
        }
        if c.request_timeout_secs == 0 {
            return Err(InsightsError::InvalidConfig(
                "request_timeout_secs must be > 0".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The document tools offered by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    /// Contract assistant: plain-English summary plus party-scoped risk analysis.
    Legal,
    /// Medical report assistant via the upload API.
    Medical,
    /// Document translation assistant.
    Translation,
    /// Medical report assistant via the `process-medical-report` edge function.
    MedicalReport,
    /// Orthodontic radiograph analyser.
    Orthodontic,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Legal,
        ToolKind::Medical,
        ToolKind::Translation,
        ToolKind::MedicalReport,
        ToolKind::Orthodontic,
    ];

    /// Short identifier used in file names and logs.
    pub fn slug(self) -> &'static str {
        match self {
            ToolKind::Legal => "legal",
            ToolKind::Medical => "medical",
            ToolKind::Translation => "translation",
            ToolKind::MedicalReport => "medical-report",
            ToolKind::Orthodontic => "orthodontic",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ToolKind::Legal => "Legal Document Analysis",
            ToolKind::Medical => "Medical Report Analysis",
            ToolKind::Translation => "Document Translation",
            ToolKind::MedicalReport => "Medical Report Summary",
            ToolKind::Orthodontic => "Orthodontic Radiograph Analysis",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// What an [`crate::pipeline::session::AnalysisResult`] contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Plain,
    Risk,
    Translation,
    Medical,
    Orthodontic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site_limits() {
        let c = PipelineConfig::default();
        assert_eq!(c.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(c.settle_delay_ms, 500);
        assert_eq!(c.heuristic, InBandHeuristic::Legacy);
        assert!(!c.demo);
    }

    #[test]
    fn builder_rejects_non_http_urls() {
        let err = PipelineConfig::builder()
            .api_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("api URL"), "got: {err}");
    }

    #[test]
    fn builder_rejects_zero_tick() {
        assert!(PipelineConfig::builder().tick_ms(0).build().is_err());
    }

    #[test]
    fn debug_redacts_functions_key() {
        let c = PipelineConfig::builder()
            .functions_key("secret-token")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-token"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn tool_slugs_are_unique() {
        let mut slugs: Vec<_> = ToolKind::ALL.iter().map(|t| t.slug()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), ToolKind::ALL.len());
    }
}
