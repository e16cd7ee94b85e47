//! Observer trait for session events.
//!
//! Inject an [`Arc<dyn PipelineObserver>`] into a
//! [`crate::pipeline::session::ToolSession`] to receive state transitions,
//! progress ticks, user notices ("toasts") and scroll requests as the
//! pipeline runs. Front-ends forward these to whatever they draw with; the
//! CLI drives an indicatif bar from them.
//!
//! # Example
//!
//! ```rust
//! use simpleinsights::{Notice, PipelineObserver, ToolKind};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Toasts(Mutex<Vec<String>>);
//!
//! impl PipelineObserver for Toasts {
//!     fn on_notice(&self, _tool: ToolKind, notice: &Notice) {
//!         self.0.lock().unwrap().push(notice.title.clone());
//!     }
//! }
//!
//! let observer: Arc<dyn PipelineObserver> = Arc::new(Toasts::default());
//! ```

use crate::config::ToolKind;
use crate::pipeline::session::PipelineState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A short message for the user, the equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, message)
    }
}

/// Which region of the page should be brought into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollTarget {
    Progress,
    Result,
}

/// Request to scroll a region into view, smoothly, leaving `offset_px`
/// above it for fixed headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollRequest {
    pub target: ScrollTarget,
    pub offset_px: u32,
    pub smooth: bool,
}

/// Receives events from a tool session.
///
/// All methods default to no-ops. Progress ticks arrive from a tokio task,
/// so implementations must be `Send + Sync`.
pub trait PipelineObserver: Send + Sync {
    fn on_state_change(&self, tool: ToolKind, state: PipelineState) {
        let _ = (tool, state);
    }

    /// Displayed progress percentage, 0–100.
    fn on_progress(&self, tool: ToolKind, percent: u8) {
        let _ = (tool, percent);
    }

    fn on_notice(&self, tool: ToolKind, notice: &Notice) {
        let _ = (tool, notice);
    }

    fn on_scroll(&self, tool: ToolKind, request: &ScrollRequest) {
        let _ = (tool, request);
    }

    /// Export button disabled (`true`) or enabled again (`false`).
    fn on_export_state(&self, tool: ToolKind, exporting: bool) {
        let _ = (tool, exporting);
    }
}

/// Default observer when none is configured.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

pub type SharedObserver = Arc<dyn PipelineObserver>;
