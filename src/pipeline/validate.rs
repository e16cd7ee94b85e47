//! Local file checks run before anything is uploaded.
//!
//! A file passes when its declared type is on the tool's allow-list, it is
//! within the size limit, and (for types with a known signature) its first
//! bytes really are a PDF, JPEG or PNG. The signature check is what stops a
//! renamed executable from being sent off as `contract.pdf`.

use crate::config::ToolKind;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Number of leading bytes inspected for a signature.
pub const HEADER_LEN: usize = 8;

/// A user-selected document held in memory.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    /// Declared MIME type.
    pub mime: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-case extension of `name`, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn header(&self) -> &[u8] {
        &self.bytes[..self.bytes.len().min(HEADER_LEN)]
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// File formats recognised by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileSignature {
    Pdf,
    Jpeg,
    Png,
}

impl FileSignature {
    pub fn magic(self) -> &'static [u8] {
        match self {
            FileSignature::Pdf => b"%PDF",
            FileSignature::Jpeg => &[0xFF, 0xD8, 0xFF],
            FileSignature::Png => &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileSignature::Pdf => "PDF",
            FileSignature::Jpeg => "JPEG",
            FileSignature::Png => "PNG",
        }
    }

    pub fn detect(header: &[u8]) -> Option<Self> {
        [FileSignature::Pdf, FileSignature::Jpeg, FileSignature::Png]
            .into_iter()
            .find(|s| header.starts_with(s.magic()))
    }

    /// Signature a file declaring `mime` must carry, if the type has one.
    pub fn for_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Some(FileSignature::Pdf),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(FileSignature::Jpeg),
            "image/png" => Some(FileSignature::Png),
            _ => None,
        }
    }

    pub fn for_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(FileSignature::Pdf),
            "jpg" | "jpeg" => Some(FileSignature::Jpeg),
            "png" => Some(FileSignature::Png),
            _ => None,
        }
    }
}

/// Allow-list, size and signature rules for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileValidator {
    mimes: Vec<String>,
    extensions: Vec<String>,
    check_signature: bool,
    max_bytes: u64,
}

impl FileValidator {
    /// Exactly `application/pdf`, signature checked.
    pub fn pdf_only(max_bytes: u64) -> Self {
        Self {
            mimes: vec!["application/pdf".into()],
            extensions: Vec::new(),
            check_signature: true,
            max_bytes,
        }
    }

    /// JPEG or PNG radiographs, signature checked.
    pub fn images(max_bytes: u64) -> Self {
        Self {
            mimes: vec!["image/jpeg".into(), "image/jpg".into(), "image/png".into()],
            extensions: Vec::new(),
            check_signature: true,
            max_bytes,
        }
    }

    /// Any file whose extension is listed. Extensions with a known signature
    /// are still signature checked.
    pub fn extensions(exts: &[&str], max_bytes: u64) -> Self {
        Self {
            mimes: Vec::new(),
            extensions: exts
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            check_signature: true,
            max_bytes,
        }
    }

    pub fn for_tool(tool: ToolKind, max_bytes: u64) -> Self {
        match tool {
            ToolKind::Legal | ToolKind::Medical | ToolKind::MedicalReport => {
                Self::pdf_only(max_bytes)
            }
            ToolKind::Translation => Self::extensions(
                &["pdf", "doc", "docx", "txt", "jpg", "jpeg", "png"],
                max_bytes,
            ),
            ToolKind::Orthodontic => Self::images(max_bytes),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn accepted(&self) -> String {
        if self.mimes.is_empty() {
            self.extensions
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            self.mimes.join(", ")
        }
    }

    /// Check `file` against this validator. Pure: no I/O, no logging.
    pub fn validate(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        if file.bytes.is_empty() {
            return Err(ValidationError::Empty {
                name: file.name.clone(),
            });
        }

        if file.size() > self.max_bytes {
            return Err(ValidationError::TooLarge {
                name: file.name.clone(),
                size: file.size(),
                limit: self.max_bytes,
            });
        }

        let mime = file.mime.trim().to_ascii_lowercase();
        let ext = file.extension();
        let by_mime = self.mimes.iter().any(|m| *m == mime);
        let by_ext = ext
            .as_deref()
            .is_some_and(|e| self.extensions.iter().any(|x| x == e));
        if !(by_mime || by_ext) {
            return Err(ValidationError::UnsupportedType {
                name: file.name.clone(),
                mime: file.mime.clone(),
                accepted: self.accepted(),
            });
        }

        if self.check_signature {
            let expected = if by_mime {
                FileSignature::for_mime(&mime)
            } else {
                ext.as_deref().and_then(FileSignature::for_extension)
            };
            if let Some(expected) = expected {
                let header = file.header();
                if FileSignature::detect(header) != Some(expected) {
                    return Err(ValidationError::SignatureMismatch {
                        name: file.name.clone(),
                        expected: expected.label().into(),
                        magic: header.to_vec(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn pdf(name: &str, size: usize) -> UploadedFile {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.resize(size.max(bytes.len()), b' ');
        UploadedFile::new(name, "application/pdf", bytes)
    }

    #[test]
    fn accepts_real_pdf() {
        let v = FileValidator::pdf_only(10 * MB);
        assert!(v.validate(&pdf("contract.pdf", 500 * 1024)).is_ok());
    }

    #[test]
    fn rejects_spoofed_pdf() {
        let v = FileValidator::pdf_only(10 * MB);
        let fake = UploadedFile::new("contract.pdf", "application/pdf", b"MZ\x90\x00\x03\x00".to_vec());
        assert!(matches!(
            v.validate(&fake),
            Err(ValidationError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn rejects_png_renamed_to_jpeg() {
        let v = FileValidator::images(10 * MB);
        let png_bytes = FileSignature::Png.magic().to_vec();
        let f = UploadedFile::new("xray.jpg", "image/jpeg", png_bytes);
        assert!(matches!(
            v.validate(&f),
            Err(ValidationError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn oversized_is_rejected_regardless_of_content() {
        let v = FileValidator::pdf_only(MB);
        let err = v.validate(&pdf("big.pdf", (MB + 1) as usize)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));

        let junk = UploadedFile::new("big.exe", "application/x-msdownload", vec![0; (MB + 1) as usize]);
        assert!(matches!(
            v.validate(&junk),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn rejects_wrong_mime() {
        let v = FileValidator::pdf_only(10 * MB);
        let f = UploadedFile::new("notes.txt", "text/plain", b"hello".to_vec());
        assert!(matches!(
            v.validate(&f),
            Err(ValidationError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn rejects_empty() {
        let v = FileValidator::pdf_only(10 * MB);
        let f = UploadedFile::new("empty.pdf", "application/pdf", Vec::new());
        assert!(matches!(v.validate(&f), Err(ValidationError::Empty { .. })));
    }

    #[test]
    fn extension_list_accepts_unsigned_types() {
        let v = FileValidator::for_tool(ToolKind::Translation, 10 * MB);
        let docx = UploadedFile::new(
            "letter.DOCX",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            b"PK\x03\x04rest".to_vec(),
        );
        assert!(v.validate(&docx).is_ok());
    }

    #[test]
    fn extension_list_still_checks_known_signatures() {
        let v = FileValidator::for_tool(ToolKind::Translation, 10 * MB);
        let fake = UploadedFile::new("scan.pdf", "application/octet-stream", b"GIF89a".to_vec());
        assert!(matches!(
            v.validate(&fake),
            Err(ValidationError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn detect_signatures() {
        assert_eq!(FileSignature::detect(b"%PDF-1.4"), Some(FileSignature::Pdf));
        assert_eq!(
            FileSignature::detect(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(FileSignature::Jpeg)
        );
        assert_eq!(FileSignature::detect(b"GIF89a"), None);
        assert_eq!(FileSignature::detect(b""), None);
    }

    #[test]
    fn header_is_at_most_eight_bytes() {
        let f = pdf("a.pdf", 100);
        assert_eq!(f.header().len(), HEADER_LEN);
        let tiny = UploadedFile::new("t.pdf", "application/pdf", b"%P".to_vec());
        assert_eq!(tiny.header(), b"%P");
    }
}
