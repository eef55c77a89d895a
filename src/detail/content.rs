//! Validated article content and the per-item fetch outcome.

use std::fmt;

use thiserror::Error;

use super::retry::FailureType;
use crate::constants::MIN_CONTENT_CHARS;

/// Reasons extracted text is rejected as an article.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// The content region held no non-empty paragraph.
    #[error("no non-empty paragraphs")]
    NoParagraphs,

    /// The paragraphs together are shorter than [`MIN_CONTENT_CHARS`].
    #[error("content too short: {chars} characters (minimum {MIN_CONTENT_CHARS})")]
    TooShort {
        /// Characters across all paragraphs.
        chars: usize,
    },
}

/// Title, paragraphs, and source of one article.
///
/// Only [`StructuredContent::new`] constructs this type, so every value
/// holds at least one paragraph and at least [`MIN_CONTENT_CHARS`]
/// characters of paragraph text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredContent {
    title: String,
    paragraphs: Vec<String>,
    source_url: String,
}

impl StructuredContent {
    /// Validates and builds article content.
    ///
    /// Paragraphs are trimmed and empty ones dropped before validation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationFailure::NoParagraphs`] if nothing remains and
    /// [`ValidationFailure::TooShort`] if the text is under the minimum.
    pub fn new<I, S>(
        title: impl Into<String>,
        paragraphs: I,
        source_url: impl Into<String>,
    ) -> Result<Self, ValidationFailure>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paragraphs: Vec<String> = paragraphs
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if paragraphs.is_empty() {
            return Err(ValidationFailure::NoParagraphs);
        }
        let chars: usize = paragraphs.iter().map(|p| p.chars().count()).sum();
        if chars < MIN_CONTENT_CHARS {
            return Err(ValidationFailure::TooShort { chars });
        }

        Ok(Self {
            title: title.into().trim().to_string(),
            paragraphs,
            source_url: source_url.into(),
        })
    }

    /// Article title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Non-empty paragraphs in document order.
    #[must_use]
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Paragraphs joined by line breaks.
    #[must_use]
    pub fn body(&self) -> String {
        self.paragraphs.join("\n")
    }

    /// Detail page the content was extracted from.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }
}

/// Reasons a page never reached the extraction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientFailure {
    /// Every attempt timed out.
    RetriesExhausted {
        /// Navigation attempts made.
        attempts: u32,
    },
    /// No rendering session could be opened.
    SessionUnavailable,
    /// The rendered page could not be read back.
    SnapshotFailed,
    /// The run was cancelled while the page was in flight.
    Cancelled,
}

impl fmt::Display for TransientFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetriesExhausted { attempts } => {
                write!(f, "timed out on all {attempts} attempts")
            }
            Self::SessionUnavailable => f.write_str("no browser session available"),
            Self::SnapshotFailed => f.write_str("rendered page could not be read"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Expected page regions that were absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralFailure {
    /// The title region is missing.
    MissingTitle,
    /// The content region is missing.
    MissingContent,
}

impl fmt::Display for StructuralFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTitle => f.write_str("title region not found"),
            Self::MissingContent => f.write_str("content region not found"),
        }
    }
}

/// Result of fetching one item; produced exactly once per reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Content extracted and validated.
    Success(StructuredContent),
    /// Timing failure, already retried as far as the policy allows.
    TransientFailure(TransientFailure),
    /// Page schema mismatch; never retried.
    StructuralFailure(StructuralFailure),
    /// Content present but rejected; never retried.
    ValidationFailure(ValidationFailure),
}

impl FetchOutcome {
    /// Returns true for [`FetchOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure classification, `None` on success.
    #[must_use]
    pub fn failure_type(&self) -> Option<FailureType> {
        match self {
            Self::Success(_) => None,
            Self::TransientFailure(_) => Some(FailureType::Transient),
            Self::StructuralFailure(_) => Some(FailureType::Structural),
            Self::ValidationFailure(_) => Some(FailureType::Validation),
        }
    }
}
