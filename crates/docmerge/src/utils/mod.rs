//! Utilities for file naming, sizes and content types.

use chrono::Utc;
use std::path::Path;
use uuid::Uuid;

/// Format a byte count as a human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}

/// Output file name: `{prefix}_{unix_millis}_{8 hex}.{extension}`.
///
/// The random suffix keeps names distinct when two merges land in the same
/// millisecond.
pub fn unique_file_name(prefix: &str, extension: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let simple = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{millis}_{}.{extension}", &simple[..8])
}

/// Name for an uploaded file: `{unix_millis}_{8 hex}.{extension}`.
pub fn upload_file_name(extension: &str) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{}_{}.{extension}", Utc::now().timestamp_millis(), &simple[..8])
}

/// Lowercase extension of `path`, if any.
pub fn extension_of(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// MIME type served for a stored file.
pub fn content_type_for(path: impl AsRef<Path>) -> &'static str {
    match extension_of(path).as_deref() {
        Some("pdf") => "application/pdf",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}
