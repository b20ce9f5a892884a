//! Artifact file naming

/// Base name used when the supplied one has no usable characters
pub const DEFAULT_BASE_NAME: &str = "resume";
/// Appended to every sanitized base name
pub const ARTIFACT_SUFFIX: &str = "_resume.pdf";
/// MIME type of the saved artifact
pub const PDF_MIME: &str = "application/pdf";

/// Reduce a display name to a lowercase `[a-z0-9_]` identifier.
///
/// Non-alphanumeric characters become `_`, runs of `_` collapse, and leading
/// or trailing `_` are dropped. Names with nothing left fall back to
/// [`DEFAULT_BASE_NAME`].
pub fn sanitize_base_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
        } else if !sanitized.is_empty() && !sanitized.ends_with('_') {
            sanitized.push('_');
        }
    }

    let trimmed = sanitized.trim_end_matches('_');
    if trimmed.is_empty() {
        DEFAULT_BASE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// File name of the exported PDF for a display name
pub fn artifact_file_name(name: &str) -> String {
    format!("{}{}", sanitize_base_name(name), ARTIFACT_SUFFIX)
}
