//! Tabbed result slots of one tool.

use crate::config::ResultKind;
use crate::render::filter::{clean_html, strip_placeholders};
use crate::render::sanitize::{sanitize, SanitizePolicy};
use serde::{Deserialize, Serialize};

/// HTML returned by an analysis backend, stored as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub kind: ResultKind,
    pub html: String,
}

impl AnalysisResult {
    pub fn new(kind: ResultKind, html: impl Into<String>) -> Self {
        Self {
            kind,
            html: html.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultTab {
    PlainEnglish,
    RiskAnalysis,
}

impl ResultTab {
    pub fn label(self) -> &'static str {
        match self {
            ResultTab::PlainEnglish => "Plain English",
            ResultTab::RiskAnalysis => "Risk Analysis",
        }
    }
}

/// Holds the primary and risk results side by side and renders them on
/// demand. Stored HTML is never displayed unsanitised.
#[derive(Debug, Clone)]
pub struct ResultView {
    tabbed: bool,
    policy: SanitizePolicy,
    placeholders: &'static [&'static str],
    primary: Option<AnalysisResult>,
    risk: Option<AnalysisResult>,
    active: ResultTab,
    saved_scroll: f64,
}

impl ResultView {
    /// `tabbed` exposes the risk tab (legal tool).
    pub fn new(tabbed: bool, policy: SanitizePolicy, placeholders: &'static [&'static str]) -> Self {
        Self {
            tabbed,
            policy,
            placeholders,
            primary: None,
            risk: None,
            active: ResultTab::PlainEnglish,
            saved_scroll: 0.0,
        }
    }

    pub fn tabs(&self) -> Vec<ResultTab> {
        if self.tabbed {
            vec![ResultTab::PlainEnglish, ResultTab::RiskAnalysis]
        } else {
            vec![ResultTab::PlainEnglish]
        }
    }

    pub fn active(&self) -> ResultTab {
        self.active
    }

    /// Store `result` in the slot matching its kind.
    pub fn set(&mut self, result: AnalysisResult) {
        if result.kind == ResultKind::Risk {
            self.risk = Some(result);
        } else {
            self.primary = Some(result);
        }
    }

    pub fn clear(&mut self) {
        self.primary = None;
        self.risk = None;
        self.active = ResultTab::PlainEnglish;
    }

    pub fn clear_risk(&mut self) {
        self.risk = None;
    }

    pub fn result(&self, tab: ResultTab) -> Option<&AnalysisResult> {
        match tab {
            ResultTab::PlainEnglish => self.primary.as_ref(),
            ResultTab::RiskAnalysis => self.risk.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.risk.is_none()
    }

    /// Switch tabs. `current_scroll` is the viewport offset before the
    /// switch; the returned offset is where the viewport must be put back
    /// once the new tab's content has been laid out.
    pub fn select_tab(&mut self, tab: ResultTab, current_scroll: f64) -> f64 {
        self.saved_scroll = current_scroll;
        self.activate(tab);
        self.saved_scroll
    }

    /// Make `tab` active if this view has it.
    pub fn activate(&mut self, tab: ResultTab) {
        if self.tabs().contains(&tab) {
            self.active = tab;
        }
    }

    /// Sanitised, filtered HTML of `tab`.
    pub fn rendered(&self, tab: ResultTab) -> Option<String> {
        self.result(tab).map(|r| {
            let html = sanitize(&clean_html(&r.html), self.policy);
            strip_placeholders(&html, self.placeholders)
        })
    }

    /// Rendered HTML of the active tab, falling back to the primary result.
    pub fn rendered_active(&self) -> Option<String> {
        self.rendered(self.active)
            .or_else(|| self.rendered(ResultTab::PlainEnglish))
    }
}
