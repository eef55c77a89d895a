//! Filename derivation for persisted articles.

use crate::constants::{DOCUMENT_EXTENSION, DOCUMENT_PREFIX, MAX_TITLE_CHARS};

const UNTITLED: &str = "untitled";

/// Strips characters that are invalid on common filesystems.
///
/// Removes `\ / : * ? " < > |` and control characters, trims the result, and
/// truncates it to [`MAX_TITLE_CHARS`] characters.
pub(crate) fn sanitize_title(title: &str) -> String {
    let stripped: String = title
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .collect();
    stripped
        .trim()
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Derives `xuexi_article_<title>.md` from an article title.
///
/// Titles that sanitize to nothing become `untitled`. Two titles that
/// sanitize identically share a filename, and the later write wins.
#[must_use]
pub fn derive_filename(title: &str) -> String {
    let sanitized = sanitize_title(title);
    let stem = if sanitized.is_empty() {
        UNTITLED
    } else {
        sanitized.as_str()
    };
    format!("{DOCUMENT_PREFIX}_{stem}.{DOCUMENT_EXTENSION}")
}
