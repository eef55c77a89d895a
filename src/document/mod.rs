//! Rendering and persisting article documents.
//!
//! Each successful fetch becomes one Markdown file under its topic folder:
//!
//! ```text
//! # <title>
//!
//! <paragraph 1>
//!
//! <paragraph 2>
//!
//! ---
//!
//! Source: <url>
//! Generated: 2024-03-01 12:00:00
//! ```

mod filename;

pub use filename::derive_filename;
pub(crate) use filename::sanitize_title;

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::detail::StructuredContent;

/// Footer timestamp format.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors produced while persisting a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Directory creation or file write failed.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Path that could not be written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Destination for extracted articles.
pub trait DocumentSink: Send + Sync {
    /// Persists `content` under `folder` and returns the written path.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the document cannot be persisted.
    fn write(&self, content: &StructuredContent, folder: &Path) -> Result<PathBuf, DocumentError>;
}

/// Renders `content` as a Markdown document stamped with `generated_at`.
#[must_use]
pub fn render_document(content: &StructuredContent, generated_at: NaiveDateTime) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", content.title());
    for paragraph in content.paragraphs() {
        let _ = write!(out, "\n{paragraph}\n");
    }
    let _ = write!(
        out,
        "\n---\n\nSource: {}\nGenerated: {}\n",
        content.source_url(),
        generated_at.format(TIMESTAMP_FORMAT)
    );
    out
}

/// Writes Markdown documents to the local filesystem.
///
/// Existing files with the same derived name are overwritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentWriter;

impl DocumentWriter {
    /// Creates a writer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentSink for DocumentWriter {
    #[instrument(skip(self, content), fields(title = %content.title()))]
    fn write(&self, content: &StructuredContent, folder: &Path) -> Result<PathBuf, DocumentError> {
        fs::create_dir_all(folder).map_err(|source| DocumentError::Io {
            path: folder.to_path_buf(),
            source,
        })?;

        let path = folder.join(derive_filename(content.title()));
        let document = render_document(content, Local::now().naive_local());
        fs::write(&path, document).map_err(|source| DocumentError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "document written");
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn content<S: AsRef<str>>(title: &str, paragraphs: &[S]) -> StructuredContent {
        StructuredContent::new(title, paragraphs, "https://example.com/a").unwrap()
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_render_document_layout() {
        let first = "a".repeat(30);
        let second = "b".repeat(30);
        let rendered = render_document(&content("Title", &[&first, &second]), timestamp());
        assert_eq!(
            rendered,
            format!(
                "# Title\n\n{first}\n\n{second}\n\n---\n\nSource: https://example.com/a\nGenerated: 2024-03-01 09:05:07\n"
            )
        );
    }

    #[test]
    fn test_render_document_is_deterministic() {
        let c = content("T", &[&"x".repeat(60)]);
        assert_eq!(render_document(&c, timestamp()), render_document(&c, timestamp()));
    }

    #[test]
    fn test_write_creates_missing_folder() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("nested").join("topic");

        let path = DocumentWriter::new()
            .write(&content("标题", &[&"字".repeat(60)]), &folder)
            .unwrap();

        assert_eq!(path, folder.join("xuexi_article_标题.md"));
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# 标题\n"));
        assert!(written.contains("Source: https://example.com/a"));
    }

    #[test]
    fn test_write_overwrites_colliding_title() {
        let temp = TempDir::new().unwrap();
        let writer = DocumentWriter::new();
        let first = writer
            .write(&content("a:b", &[&"1".repeat(60)]), temp.path())
            .unwrap();
        let second = writer
            .write(&content("ab", &[&"2".repeat(60)]), temp.path())
            .unwrap();

        assert_eq!(first, second);
        let written = fs::read_to_string(&second).unwrap();
        assert!(written.contains(&"2".repeat(60)));
        assert!(!written.contains(&"1".repeat(60)));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_into_file_path_is_io_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let result = DocumentWriter::new().write(&content("T", &[&"x".repeat(60)]), &blocker);
        assert!(matches!(result, Err(DocumentError::Io { .. })));
    }
}
