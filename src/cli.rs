//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use article_harvester::constants::{DEFAULT_WORKERS, MAX_WORKERS};
use clap::{ArgGroup, Parser, ValueEnum};

/// Harvest articles from topic channels into Markdown documents.
///
/// Select one channel with `--topic ID,FOLDER` or every channel whose name
/// contains a keyword with `--filter KEYWORD`.
#[derive(Parser, Debug)]
#[command(name = "article-harvester")]
#[command(author, version, about)]
#[command(group(ArgGroup::new("selection").required(true).args(["topic", "filter"])))]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Concurrent article fetches; blank or invalid values fall back to 4, values above 100 are capped
    #[arg(short = 'w', long, value_name = "N", allow_hyphen_values = true)]
    pub workers: Option<String>,

    /// Crawl a single channel given as `id,folder`
    #[arg(short = 't', long, value_name = "ID,FOLDER")]
    pub topic: Option<String>,

    /// Crawl every directory channel whose name contains KEYWORD (case-sensitive)
    #[arg(short = 'f', long, value_name = "KEYWORD")]
    pub filter: Option<String>,

    /// Topic directory JSON used by --filter
    #[arg(short = 'd', long, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Root directory under which each topic folder is created
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Rendering engine
    #[arg(short = 'e', long, value_enum)]
    pub engine: Option<EngineKind>,

    /// Chrome/Chromium executable for the chromium engine
    #[arg(long, value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Disable the per-topic progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Write the filtered topics as `{id: folder}` JSON to PATH before crawling
    #[arg(long, value_name = "PATH", requires = "filter")]
    pub export_topics: Option<PathBuf>,
}

/// Available rendering engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// Headless Chromium; renders script-injected content.
    #[default]
    Chromium,
    /// Plain HTTP GET; for static pages and hosts without Chromium.
    Http,
}

impl EngineKind {
    /// Returns the stable string label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Http => "http",
        }
    }

    /// Parses a config label.
    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "chromium" => Some(Self::Chromium),
            "http" => Some(Self::Http),
            _ => None,
        }
    }
}

/// Interprets a raw worker count.
///
/// Blank, unparsable, zero, and negative values fall back to
/// [`DEFAULT_WORKERS`]; values above [`MAX_WORKERS`] are capped.
pub fn parse_worker_count(raw: &str) -> usize {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => usize::try_from(value).map_or(MAX_WORKERS, |v| v.min(MAX_WORKERS)),
        _ => DEFAULT_WORKERS,
    }
}
