//! Region extraction from a rendered detail page snapshot.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use super::content::{StructuralFailure, StructuredContent, ValidationFailure};
use crate::settings::PageMarkers;

/// Why a snapshot did not yield article content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// A required region is missing.
    #[error("{0}")]
    Structural(StructuralFailure),

    /// Regions exist but the text is not an article.
    #[error("{0}")]
    Validation(#[from] ValidationFailure),
}

/// Region selectors compiled once per fetcher.
#[derive(Debug, Clone)]
pub struct CompiledMarkers {
    title: Selector,
    content: Selector,
    paragraph: Selector,
}

/// A selector string that failed to compile.
#[derive(Debug, Clone, Error)]
#[error("invalid selector {selector:?}: {reason}")]
pub struct SelectorError {
    /// Offending selector.
    pub selector: String,
    /// Parser-provided description.
    pub reason: String,
}

fn compile(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

impl CompiledMarkers {
    /// Compiles the region selectors of `markers`.
    ///
    /// Wait markers are handed to the rendering engine as strings; they are
    /// compiled here as well so a typo fails at startup.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for the first selector that does not parse.
    pub fn compile(markers: &PageMarkers) -> Result<Self, SelectorError> {
        for marker in &markers.wait_markers {
            compile(marker)?;
        }
        Ok(Self {
            title: compile(&markers.title)?,
            content: compile(&markers.content)?,
            paragraph: compile(&markers.paragraph)?,
        })
    }

    /// Title region text of `html`, for diagnostics.
    #[must_use]
    pub fn title_text(&self, html: &str) -> Option<String> {
        Html::parse_document(html)
            .select(&self.title)
            .next()
            .map(element_text)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extracts title and paragraphs from `html`.
///
/// The title region is checked before the content region, so a page
/// missing both reports [`StructuralFailure::MissingTitle`].
///
/// # Errors
///
/// Returns [`ExtractError::Structural`] when a region is absent and
/// [`ExtractError::Validation`] when the paragraphs are empty or too short.
pub fn extract_content(
    html: &str,
    source_url: &str,
    markers: &CompiledMarkers,
) -> Result<StructuredContent, ExtractError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&markers.title)
        .next()
        .map(element_text)
        .ok_or(ExtractError::Structural(StructuralFailure::MissingTitle))?;

    let content = document
        .select(&markers.content)
        .next()
        .ok_or(ExtractError::Structural(StructuralFailure::MissingContent))?;

    let paragraphs: Vec<String> = content.select(&markers.paragraph).map(element_text).collect();

    Ok(StructuredContent::new(title, paragraphs, source_url)?)
}
