//! Local file checks and MIME type detection for uploads.

use std::path::Path;

/// MIME type used when nothing better can be determined.
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// Map a file extension to a MIME type, case-insensitively.
pub fn mime_type_from_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => return None,
    };
    Some(mime)
}

/// Detect the MIME type of a file.
///
/// Magic bytes first, then the extension, then `application/octet-stream`.
pub fn detect_mime_type(path: &Path) -> String {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => return kind.mime_type().to_string(),
        Ok(None) => {}
        Err(e) => tracing::debug!("Could not sniff {}: {}", path.display(), e),
    }

    if let Some(mime) = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_type_from_extension)
    {
        return mime.to_string();
    }

    tracing::warn!(
        "Could not determine mime type for {}. Defaulting to {}.",
        path.display(),
        MIME_OCTET_STREAM
    );
    MIME_OCTET_STREAM.to_string()
}

/// File name used as the upload's display name.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
