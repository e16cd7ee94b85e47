//! Result rendering: sanitising, filtering and the tabbed result view.

pub mod filter;
pub mod sanitize;
pub mod view;

pub use filter::{clean_html, strip_placeholders};
pub use sanitize::{sanitize, SanitizePolicy};
pub use view::{AnalysisResult, ResultTab, ResultView};
