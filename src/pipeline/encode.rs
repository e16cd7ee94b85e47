//! Image encoding: radiographs → base64 for the orthodontic edge function.
//!
//! Phone photos of X-ray films routinely exceed 4000 px. The analyser gains
//! nothing from that resolution, so images whose long edge exceeds
//! [`MAX_EDGE_PX`] are downscaled and re-encoded as JPEG; smaller images are
//! sent as-is. The same encoded images feed the gallery of a server-rendered
//! PDF export.

use crate::error::InsightsError;
use crate::pipeline::validate::UploadedFile;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::FilterType;
use image::GenericImageView;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// Longest edge sent to the analyser, in pixels.
pub const MAX_EDGE_PX: u32 = 2000;

/// An image ready to embed in a JSON body or an HTML document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// Original file name, used for gallery captions.
    pub name: String,
    pub mime: String,
    /// Base64 without a data-URI prefix.
    pub data: String,
}

impl EncodedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.data)
    }
}

/// Decode, downscale if needed, and base64-encode an uploaded image.
pub fn encode_image(file: &UploadedFile, max_edge: u32) -> Result<EncodedImage, InsightsError> {
    let img = image::load_from_memory(&file.bytes).map_err(|e| {
        InsightsError::Internal(format!("cannot decode image '{}': {e}", file.name))
    })?;
    let (w, h) = img.dimensions();

    if w.max(h) <= max_edge {
        debug!("{}: {}x{} sent unchanged", file.name, w, h);
        return Ok(EncodedImage {
            name: file.name.clone(),
            mime: file.mime.clone(),
            data: STANDARD.encode(&file.bytes),
        });
    }

    let resized = img.resize(max_edge, max_edge, FilterType::Triangle);
    let mut buf = Vec::new();
    resized
        .to_rgb8()
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .map_err(|e| InsightsError::Internal(format!("cannot re-encode '{}': {e}", file.name)))?;

    debug!(
        "{}: {}x{} → {}x{}, {} bytes",
        file.name,
        w,
        h,
        resized.width(),
        resized.height(),
        buf.len()
    );

    Ok(EncodedImage {
        name: file.name.clone(),
        mime: "image/jpeg".into(),
        data: STANDARD.encode(&buf),
    })
}
