//! PDF export of analysis results.
//!
//! Two independent renderers exist:
//!
//! * [`server`] wraps the rendered HTML in a standalone document and has the
//!   PDF backend print it.
//! * [`local`] walks the HTML itself and paints headings, lists, paragraphs
//!   and tables with printpdf. No network involved.
//!
//! Both name their output after the tool and the current date, and both are
//! driven through [`crate::pipeline::session::ToolSession::export`], which
//! owns the "export in progress" flag.

pub mod local;
pub mod server;

use crate::config::ToolKind;
use crate::error::InsightsError;
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Which renderer produces the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// POST the HTML to the PDF rendering backend.
    #[default]
    Server,
    /// Render with printpdf in-process.
    Local,
}

/// File name for an export of `tool` made at `at`.
///
/// Server exports are dated (`legal-analysis-2024-05-01.pdf`); local exports
/// carry a full timestamp (`legal-report-20240501-142233.pdf`).
pub fn export_name<Tz: TimeZone>(tool: ToolKind, mode: ExportMode, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match mode {
        ExportMode::Server => format!("{}-analysis-{}.pdf", tool.slug(), at.format("%Y-%m-%d")),
        ExportMode::Local => format!("{}-report-{}.pdf", tool.slug(), at.format("%Y%m%d-%H%M%S")),
    }
}

/// One PDF generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportJob {
    pub tool: ToolKind,
    pub mode: ExportMode,
    pub file_name: String,
    pub in_progress: bool,
}

impl ExportJob {
    pub fn new(tool: ToolKind, mode: ExportMode) -> Self {
        Self {
            tool,
            mode,
            file_name: export_name(tool, mode, &Local::now()),
            in_progress: true,
        }
    }

    pub fn output_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.file_name)
    }
}

/// Write `bytes` to `path` via a temp file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), InsightsError> {
    let write_err = |e: std::io::Error| InsightsError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn names_follow_tool_and_date() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 14, 22, 33).unwrap();
        assert_eq!(
            export_name(ToolKind::Legal, ExportMode::Server, &at),
            "legal-analysis-2024-05-01.pdf"
        );
        assert_eq!(
            export_name(ToolKind::Orthodontic, ExportMode::Local, &at),
            "orthodontic-report-20240501-142233.pdf"
        );
    }

    #[test]
    fn new_job_is_in_progress() {
        let job = ExportJob::new(ToolKind::Medical, ExportMode::Local);
        assert!(job.in_progress);
        assert!(job.file_name.starts_with("medical-report-"));
    }

    #[test]
    fn write_atomic_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.pdf");
        write_atomic(&path, b"%PDF-1.3").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.3");
    }
}
