//! Error types for the simpleinsights library.
//!
//! Two distinct error types reflect two distinct moments of failure:
//!
//! * [`ValidationError`]: the file was rejected locally before any network
//!   call (wrong type, spoofed signature, too large). Cheap, `Clone`, and
//!   serialisable so front-ends can show it verbatim.
//!
//! * [`InsightsError`]: everything a tool session or exporter can return.
//!   Its variants group into the categories reported by
//!   [`InsightsError::category`]: validation, transport, in-band backend
//!   failures, export failures and local problems.
//!
//! Every error is recoverable: a session that returns one is back in an idle
//! or failed state and the user may simply try again.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A file rejected by a [`crate::pipeline::validate::FileValidator`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// Declared MIME type / extension is not accepted by this tool.
    #[error("'{name}' has unsupported type '{mime}'; accepted: {accepted}")]
    UnsupportedType {
        name: String,
        mime: String,
        accepted: String,
    },

    /// Declared type looks right but the leading bytes disagree.
    #[error("'{name}' does not look like a {expected} file (first bytes {magic:02X?})")]
    SignatureMismatch {
        name: String,
        expected: String,
        magic: Vec<u8>,
    },

    /// File exceeds the tool's size limit.
    #[error("'{name}' is {size} bytes; the limit is {limit} bytes")]
    TooLarge { name: String, size: u64, limit: u64 },

    /// Zero-byte file.
    #[error("'{name}' is empty")]
    Empty { name: String },

    /// More files than the tool accepts at once.
    #[error("{count} files selected; this tool accepts at most {limit}")]
    TooManyFiles { count: usize, limit: usize },
}

/// Coarse error classes, used to pick the user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    Validation,
    Transport,
    InBand,
    Export,
    Local,
}

/// All errors returned by the simpleinsights library.
#[derive(Debug, Error)]
pub enum InsightsError {
    // ── Validation errors ─────────────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Risk analysis needs the name of the contracting party.
    #[error("Enter the name of the party to analyse the contract for")]
    MissingParty,

    /// Risk analysis needs a file reference from a previous upload.
    #[error("No uploaded document is available; analyse a contract first")]
    MissingFileReference,

    /// A request is already in flight for this tool.
    #[error("A document is already being processed")]
    Busy,

    /// Export requested before any result exists.
    #[error("There is no analysis result to export")]
    NothingToExport,

    /// No files were passed to a tool that needs at least one.
    #[error("No files selected")]
    NoFiles,

    // ── Transport errors ──────────────────────────────────────────────────
    /// Non-2xx HTTP status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response.
    #[error("Request to {endpoint} failed: {reason}")]
    Network { endpoint: String, reason: String },

    // ── In-band backend errors ────────────────────────────────────────────
    /// Upload endpoint answered `max_tokens`.
    #[error("The document is too large to be processed")]
    FileTooLarge,

    /// Upload endpoint answered `error`.
    #[error("The upload was rejected by the server")]
    UploadRejected,

    /// HTTP 2xx but the body signals failure.
    #[error("{endpoint} reported a failure: {detail}")]
    InBand { endpoint: String, detail: String },

    /// HTTP 429 from an edge function.
    #[error("Rate limit exceeded, please try again later")]
    RateLimited,

    /// HTTP 402 from an edge function.
    #[error("AI credits exhausted, please add credits to continue")]
    CreditsExhausted,

    // ── Export errors ─────────────────────────────────────────────────────
    #[error("PDF generation failed: {0}")]
    Export(String),

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Local errors ──────────────────────────────────────────────────────
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl InsightsError {
    pub fn category(&self) -> ErrorCategory {
        use InsightsError::*;
        match self {
            Validation(_) | MissingParty | MissingFileReference | Busy | NothingToExport
            | NoFiles => ErrorCategory::Validation,
            Http { .. } | Network { .. } => ErrorCategory::Transport,
            FileTooLarge | UploadRejected | InBand { .. } | RateLimited | CreditsExhausted => {
                ErrorCategory::InBand
            }
            Export(_) | OutputWriteFailed { .. } => ErrorCategory::Export,
            FileNotFound { .. } | PermissionDenied { .. } | DownloadFailed { .. }
            | InvalidConfig(_) | Internal(_) => ErrorCategory::Local,
        }
    }

    /// Message safe to show an end user.
    ///
    /// Transport and generic in-band failures collapse to a "try again"
    /// message; the raw detail is only logged.
    pub fn user_message(&self) -> String {
        use InsightsError::*;
        match self {
            Http { .. } | Network { .. } | InBand { .. } | Internal(_) => {
                "Something went wrong while processing your document. Please try again.".into()
            }
            Export(_) => "Could not generate the PDF. Please try again.".into(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_hide_detail_from_users() {
        let e = InsightsError::Http {
            endpoint: "/upload-legal01".into(),
            status: 502,
            body: "upstream stack trace".into(),
        };
        assert_eq!(e.category(), ErrorCategory::Transport);
        assert!(!e.user_message().contains("stack trace"));
        assert!(e.to_string().contains("502"));
    }

    #[test]
    fn validation_errors_are_shown_verbatim() {
        let e: InsightsError = ValidationError::TooLarge {
            name: "big.pdf".into(),
            size: 11,
            limit: 10,
        }
        .into();
        assert_eq!(e.category(), ErrorCategory::Validation);
        assert!(e.user_message().contains("big.pdf"));
    }

    #[test]
    fn sentinel_uploads_are_in_band() {
        assert_eq!(InsightsError::FileTooLarge.category(), ErrorCategory::InBand);
        assert_eq!(InsightsError::UploadRejected.category(), ErrorCategory::InBand);
        assert_eq!(InsightsError::RateLimited.category(), ErrorCategory::InBand);
    }

    #[test]
    fn signature_mismatch_display() {
        let e = ValidationError::SignatureMismatch {
            name: "fake.pdf".into(),
            expected: "PDF".into(),
            magic: vec![0x4D, 0x5A],
        };
        let msg = e.to_string();
        assert!(msg.contains("fake.pdf"), "got: {msg}");
        assert!(msg.contains("4D"), "got: {msg}");
    }
}
