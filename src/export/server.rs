//! Server-rendered export: standalone HTML document → `/generate-pdf`.

use crate::error::InsightsError;
use crate::pipeline::backend::{AnalysisBackend, BackendRequest, RequestBody, Service};
use crate::pipeline::encode::EncodedImage;
use crate::pipeline::profile::GENERATE_PDF;
use scraper::{Html, Selector};
use tracing::{debug, warn};

const STYLES: &str = r#"
  body { font-family: "Helvetica Neue", Arial, sans-serif; color: #1f2937; line-height: 1.55; margin: 0; padding: 32px 40px; font-size: 12pt; }
  h1 { font-size: 22pt; margin: 0 0 16px; color: #111827; }
  h2 { font-size: 16pt; margin: 24px 0 10px; color: #111827; page-break-after: avoid; }
  h3 { font-size: 13pt; margin: 18px 0 8px; page-break-after: avoid; }
  h4, h5, h6 { font-size: 12pt; margin: 14px 0 6px; page-break-after: avoid; }
  p { margin: 0 0 10px; }
  ul, ol { margin: 0 0 12px; padding-left: 22px; }
  li { margin-bottom: 4px; }
  table { width: 100%; border-collapse: collapse; margin: 12px 0 18px; page-break-inside: avoid; }
  th, td { border: 1px solid #d1d5db; padding: 6px 8px; text-align: left; vertical-align: top; font-size: 10.5pt; }
  th { background: #f3f4f6; font-weight: 600; }
  tr { page-break-inside: avoid; }
  .meta { color: #6b7280; font-size: 9pt; margin-bottom: 24px; }
  .gallery { display: flex; flex-wrap: wrap; gap: 12px; margin-top: 28px; page-break-before: always; }
  .gallery figure { margin: 0; page-break-inside: avoid; }
  .gallery img { width: 100%; border: 1px solid #e5e7eb; }
  .gallery figcaption { font-size: 9pt; color: #4b5563; text-align: center; margin-top: 4px; }
  .full { width: 100%; }
  .half { width: calc(50% - 6px); }
  .third { width: calc(33.333% - 8px); }
"#;

/// Width class of a gallery figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureWidth {
    Full,
    Half,
    Third,
}

impl FigureWidth {
    fn class(self) -> &'static str {
        match self {
            FigureWidth::Full => "full",
            FigureWidth::Half => "half",
            FigureWidth::Third => "third",
        }
    }
}

/// Caption and layout for a radiograph, guessed from its file name.
pub fn caption_for(name: &str) -> (String, FigureWidth) {
    let lower = name.to_lowercase();
    if lower.contains("ceph") || lower.contains("lateral") {
        ("Lateral Cephalogram".into(), FigureWidth::Half)
    } else if lower.contains("pano") || lower.contains("opg") {
        ("Panoramic Radiograph".into(), FigureWidth::Full)
    } else if lower.contains("intraoral") || lower.contains("photo") {
        ("Intraoral Photograph".into(), FigureWidth::Third)
    } else {
        let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
        (stem.to_string(), FigureWidth::Third)
    }
}

/// Wrap rendered `html` in a full document with print styles and an
/// optional image gallery.
pub fn build_document(title: &str, html: &str, gallery: &[EncodedImage]) -> String {
    let generated = chrono::Local::now().format("%d %B %Y");
    let mut doc = String::with_capacity(html.len() + STYLES.len() + 512);

    doc.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    doc.push_str(&format!("<title>{}</title>\n", escape(title)));
    doc.push_str("<style>");
    doc.push_str(STYLES);
    doc.push_str("</style>\n</head>\n<body>\n");
    doc.push_str(&format!("<h1>{}</h1>\n", escape(title)));
    doc.push_str(&format!(
        "<div class=\"meta\">Generated by SimpleInsights.ai on {generated}</div>\n"
    ));
    doc.push_str("<main>\n");
    doc.push_str(html);
    doc.push_str("\n</main>\n");

    if !gallery.is_empty() {
        doc.push_str("<section class=\"gallery\">\n");
        for image in gallery {
            let (caption, width) = caption_for(&image.name);
            doc.push_str(&format!(
                "<figure class=\"{}\"><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>\n",
                width.class(),
                image.data_url(),
                escape(&image.name),
                escape(&caption),
            ));
        }
        doc.push_str("</section>\n");
    }

    doc.push_str("</body>\n</html>\n");
    doc
}

/// The result fragment inside a document made by [`build_document`].
/// Input without a `<main>` element is returned unchanged.
pub fn document_body(document: &str) -> String {
    let Ok(main) = Selector::parse("main") else {
        return document.to_string();
    };
    let parsed = Html::parse_document(document);
    match parsed.select(&main).next() {
        Some(element) => element.inner_html().trim().to_string(),
        None => document.to_string(),
    }
}

/// Have the PDF backend print `document`. Returns the PDF bytes.
pub async fn render(backend: &dyn AnalysisBackend, document: String) -> Result<Vec<u8>, InsightsError> {
    debug!("Sending {} bytes of HTML to {}", document.len(), GENERATE_PDF);
    let request = BackendRequest::new(Service::PdfRenderer, GENERATE_PDF, RequestBody::Text(document));
    let response = backend.send(request).await?;

    if !response.is_success() {
        let body = response.text();
        warn!("{} returned HTTP {}: {}", GENERATE_PDF, response.status, body);
        return Err(InsightsError::Export(format!("HTTP {}: {}", response.status, body)));
    }
    if response.body.is_empty() {
        return Err(InsightsError::Export("renderer returned an empty document".into()));
    }
    Ok(response.body)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
