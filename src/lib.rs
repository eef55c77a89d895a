//! Article Harvester Library
//!
//! This library discovers the articles published under a topic, renders each
//! article's detail page, extracts its title and paragraphs, and persists the
//! result as one document per article. Items of a topic are processed
//! concurrently under a bounded worker budget; topics run one after another.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`topics`] - Topic directory loading, filtering, and `id,folder` pairs
//! - [`browser`] - Rendering engines (headless Chromium, static HTTP) behind one trait
//! - [`listing`] - Topic list endpoint rendering and item reference extraction
//! - [`detail`] - Detail page fetching with the attempt state machine
//! - [`document`] - Filename derivation and document persistence
//! - [`pool`] - Bounded worker pool with progress reporting
//! - [`orchestrator`] - Sequential per-topic driver

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod browser;
pub mod constants;
pub mod detail;
pub mod document;
pub mod listing;
pub mod orchestrator;
pub mod pool;
pub mod settings;
pub mod topics;
mod user_agent;

// Re-export commonly used types
pub use browser::{Browser, BrowserError, BrowserSession, ChromiumBrowser, HttpBrowser, SessionGuard};
pub use detail::{
    DetailFetcher, ExtractError, FailureType, FetchOutcome, RetryDecision, RetryPolicy,
    SelectorError, StructuralFailure, StructuredContent, TransientFailure, ValidationFailure,
};
pub use document::{DocumentError, DocumentSink, DocumentWriter, derive_filename, render_document};
pub use listing::{ItemReference, ListError, ListFetcher, parse_item_references};
pub use orchestrator::{Orchestrator, RunSummary, TopicReporter};
pub use pool::{
    ContentFetcher, PoolError, PoolStats, ProgressCounter, ProgressReporter, WorkerPool,
};
pub use settings::{CrawlSettings, PageMarkers};
pub use topics::{
    Topic, TopicError, filter_topics, load_topic_directory, parse_topic_pair,
    write_topic_directory,
};
