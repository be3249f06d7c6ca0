//! MIME routing and upload validation for offer files.

use serde::{Deserialize, Serialize};

/// MIME types accepted for upload. Matched by substring, so parameters
/// such as `; charset=utf-8` are tolerated.
const ACCEPTED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "audio/mpeg",
    "audio/wav",
    "audio/mp4",
    "text/plain",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Video,
    Audio,
    Pdf,
    Document,
    Text,
    Other,
}

impl FileCategory {
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("video/") {
            FileCategory::Video
        } else if mime.starts_with("audio/") {
            FileCategory::Audio
        } else if mime == "application/pdf" {
            FileCategory::Pdf
        } else if mime.starts_with("text/plain") {
            FileCategory::Text
        } else if mime.contains("word") || mime.contains("document") {
            FileCategory::Document
        } else {
            FileCategory::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Pdf => "pdf",
            FileCategory::Document => "document",
            FileCategory::Text => "text",
            FileCategory::Other => "other",
        }
    }

    /// Audio and video both go through transcription.
    pub fn is_media(&self) -> bool {
        matches!(self, FileCategory::Video | FileCategory::Audio)
    }
}

pub fn is_valid_file_type(mime: &str) -> bool {
    let mime = mime.to_ascii_lowercase();
    ACCEPTED_MIME_TYPES.iter().any(|t| mime.contains(t))
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

/// Extension for a stored object: from the file name, else from the MIME type.
pub fn file_extension(file_name: &str, mime: &str) -> String {
    if let Some((_, ext)) = file_name.rsplit_once('.') {
        if !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return ext.to_ascii_lowercase();
        }
    }
    mime_guess::get_mime_extensions_str(mime)
        .and_then(|exts| exts.first())
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_by_mime() {
        assert_eq!(FileCategory::from_mime("video/mp4"), FileCategory::Video);
        assert_eq!(FileCategory::from_mime("audio/mpeg"), FileCategory::Audio);
        assert_eq!(FileCategory::from_mime("application/pdf"), FileCategory::Pdf);
        assert_eq!(FileCategory::from_mime("application/msword"), FileCategory::Document);
        assert_eq!(
            FileCategory::from_mime(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            FileCategory::Document
        );
        assert_eq!(FileCategory::from_mime("text/plain; charset=utf-8"), FileCategory::Text);
        assert_eq!(FileCategory::from_mime("image/png"), FileCategory::Other);
    }

    #[test]
    fn validates_accepted_types() {
        assert!(is_valid_file_type("application/pdf"));
        assert!(is_valid_file_type("video/quicktime"));
        assert!(is_valid_file_type("text/plain;charset=UTF-8"));
        assert!(!is_valid_file_type("image/jpeg"));
        assert!(!is_valid_file_type("application/zip"));
        assert!(!is_valid_file_type(""));
    }

    #[test]
    fn formats_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1 MB");
        assert_eq!(format_file_size(1_288_490_189), "1.2 GB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }

    #[test]
    fn extension_prefers_file_name() {
        assert_eq!(file_extension("Deck.PDF", "application/pdf"), "pdf");
        assert_eq!(file_extension("deck", "application/pdf"), "pdf");
        assert_eq!(file_extension("weird.", "application/x-unknown-thing"), "bin");
    }
}
