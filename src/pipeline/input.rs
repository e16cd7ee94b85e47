//! Input resolution: turn a user-supplied path or URL into an [`UploadedFile`].
//!
//! The declared MIME type is inferred from the file name, just as a browser
//! derives it for a file picker. Whether the bytes really match that type is
//! left to [`crate::pipeline::validate::FileValidator`].

use crate::error::InsightsError;
use crate::pipeline::validate::UploadedFile;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// MIME type a browser would declare for `name`.
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("txt") => "text/plain",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

/// Load a local file or download a URL into memory.
pub async fn load_file(input: &str, timeout_secs: u64) -> Result<UploadedFile, InsightsError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        load_local(Path::new(input)).await
    }
}

/// Load several inputs, failing on the first that cannot be read.
pub async fn load_files(
    inputs: &[String],
    timeout_secs: u64,
) -> Result<Vec<UploadedFile>, InsightsError> {
    futures::future::try_join_all(inputs.iter().map(|i| load_file(i, timeout_secs))).await
}

async fn load_local(path: &Path) -> Result<UploadedFile, InsightsError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => InsightsError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => InsightsError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    debug!("Loaded local file {} ({} bytes)", path.display(), bytes.len());
    Ok(UploadedFile::new(name.clone(), mime_for_name(&name), bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedFile, InsightsError> {
    info!("Downloading document from: {}", url);

    let failed = |reason: String| InsightsError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {timeout_secs}s"))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let name = filename_from_url(url);
    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(UploadedFile::new(name.clone(), mime_for_name(&name), bytes.to_vec()))
}

/// Last path segment of `url` when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

/// Directory next to `path`, used when no output directory is given.
pub fn parent_dir(path: &str) -> PathBuf {
    if is_url(path) {
        return PathBuf::from(".");
    }
    Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for_name("contract.PDF"), "application/pdf");
        assert_eq!(mime_for_name("xray.jpeg"), "image/jpeg");
        assert_eq!(mime_for_name("scan.png"), "image/png");
        assert_eq!(mime_for_name("noext"), "application/octet-stream");
    }

    #[test]
    fn filename_from_url_path() {
        assert_eq!(filename_from_url("https://x.io/files/lease.pdf?dl=1"), "lease.pdf");
        assert_eq!(filename_from_url("https://x.io/files/"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn load_local_reads_bytes_and_infers_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.pdf");
        std::fs::write(&path, b"%PDF-1.4 body").unwrap();

        let file = load_file(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(file.name, "contract.pdf");
        assert_eq!(file.mime, "application/pdf");
        assert_eq!(file.bytes, b"%PDF-1.4 body");
    }

    #[tokio::test]
    async fn load_local_missing_file() {
        let err = load_file("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, InsightsError::FileNotFound { .. }));
    }

    #[test]
    fn parent_dir_defaults_to_cwd() {
        assert_eq!(parent_dir("contract.pdf"), PathBuf::from("."));
        assert_eq!(parent_dir("docs/contract.pdf"), PathBuf::from("docs"));
        assert_eq!(parent_dir("https://x.io/a.pdf"), PathBuf::from("."));
    }
}
