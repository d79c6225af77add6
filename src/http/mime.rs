//! Content type lookup by file extension

use std::path::Path;

/// Served when the extension is missing or not in the table
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("jpg", "image/jpeg"),
    ("svg", "text/xml"),
];

/// Text after the last `.` of the final path component, if non-empty
pub fn extension(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Content type registered for `path`'s extension
pub fn lookup(path: &Path) -> Option<&'static str> {
    let ext = extension(path)?;
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
}

/// Content type for `path`, falling back to [`DEFAULT_CONTENT_TYPE`]
pub fn content_type(path: &Path) -> &'static str {
    lookup(path).unwrap_or(DEFAULT_CONTENT_TYPE)
}
