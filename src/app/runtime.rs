//! Run composition: resolve topics, launch an engine, crawl, report.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use article_harvester::constants::{DEFAULT_TOPIC_DIRECTORY, DEFAULT_WORKERS};
use article_harvester::{
    Browser, ChromiumBrowser, CrawlSettings, DetailFetcher, DocumentWriter, HttpBrowser,
    ListFetcher, Orchestrator, RunSummary, Topic, WorkerPool, filter_topics, load_topic_directory,
    parse_topic_pair, write_topic_directory,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::config::{FileConfig, load_default_file_config};
use crate::app::{report, terminal};
use crate::cli::{Args, EngineKind, parse_worker_count};

/// The launched rendering engine, kept concrete so it can be shut down.
enum Engine {
    Chromium(ChromiumBrowser),
    Http(HttpBrowser),
}

impl Engine {
    async fn launch(
        kind: EngineKind,
        settings: &CrawlSettings,
        chrome_path: Option<PathBuf>,
    ) -> Result<Self> {
        match kind {
            EngineKind::Chromium => {
                let browser = ChromiumBrowser::launch(&settings.user_agent, chrome_path)
                    .await
                    .context("Failed to launch headless Chromium (try --chrome-path or --engine http)")?;
                Ok(Self::Chromium(browser))
            }
            EngineKind::Http => Ok(Self::Http(HttpBrowser::new(settings.user_agent.clone()))),
        }
    }

    fn browser(&self) -> Arc<dyn Browser> {
        match self {
            Self::Chromium(browser) => Arc::new(browser.clone()),
            Self::Http(browser) => Arc::new(browser.clone()),
        }
    }

    async fn shutdown(&self) {
        if let Self::Chromium(browser) = self {
            browser.shutdown().await;
        }
    }
}

/// Turns `--topic` or `--filter` into the topics to crawl.
///
/// Never touches the network.
pub(crate) fn resolve_topics(args: &Args, config: &FileConfig) -> Result<Vec<Topic>> {
    if let Some(pair) = &args.topic {
        let topic = parse_topic_pair(pair)?;
        return Ok(vec![topic]);
    }
    let Some(keyword) = args.filter.as_deref() else {
        bail!("Either --topic or --filter is required");
    };

    let path = args
        .directory
        .clone()
        .or_else(|| config.directory.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TOPIC_DIRECTORY));
    let directory = load_topic_directory(&path)
        .with_context(|| format!("Failed to load topic directory '{}'", path.display()))?;
    let topics = filter_topics(&directory, keyword)?;
    info!(keyword, count = topics.len(), "topics matched");

    if let Some(export) = &args.export_topics {
        write_topic_directory(&topics, export)?;
        info!(path = %export.display(), "topic list exported");
    }
    Ok(topics)
}

/// Worker count from the flag, else the config file, else the default.
pub(crate) fn resolve_workers(args: &Args, config: &FileConfig) -> usize {
    args.workers
        .as_deref()
        .map(parse_worker_count)
        .or(config.workers)
        .unwrap_or(DEFAULT_WORKERS)
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing in-flight articles");
            cancel.cancel();
        }
    });
}

pub(crate) async fn run(args: Args) -> Result<()> {
    let loaded = load_default_file_config()?;
    let config = loaded.config;

    let default_level = terminal::default_log_level(args.quiet, args.verbose, config.verbosity);
    terminal::init_tracing(
        default_level,
        terminal::no_color_env_requested() || terminal::is_dumb_terminal(),
    );
    debug!(?args, "CLI arguments parsed");
    if loaded.loaded_from_file
        && let Some(path) = &loaded.path
    {
        debug!(path = %path.display(), "config file loaded");
    }

    let topics = resolve_topics(&args, &config)?;
    let workers = resolve_workers(&args, &config);
    let mut settings = CrawlSettings::default();
    config.apply_to(&mut settings);
    let output_root = args
        .output_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let engine_kind = args.engine.or(config.engine).unwrap_or_default();
    let show_progress = terminal::should_show_progress(
        io::stderr().is_terminal(),
        args.quiet,
        args.no_progress,
        terminal::is_dumb_terminal(),
    );

    info!(
        topics = topics.len(),
        workers,
        engine = engine_kind.as_str(),
        output = %output_root.display(),
        "article harvester starting"
    );

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let engine = Engine::launch(engine_kind, &settings, args.chrome_path.clone()).await?;
    let browser = engine.browser();

    let outcome = async {
        let detail = DetailFetcher::new(Arc::clone(&browser), &settings)?
            .with_cancellation(cancel.clone());
        let pool = WorkerPool::new(Arc::new(detail), Arc::new(DocumentWriter::new()), workers)?
            .with_cancellation(cancel.clone());
        let list_fetcher = ListFetcher::new(
            browser,
            settings.list_url_template.clone(),
            settings.navigation_timeout,
        );
        let orchestrator = Orchestrator::new(list_fetcher, pool, output_root, settings.topic_pause)
            .with_progress(show_progress)
            .with_cancellation(cancel.clone())
            .with_topic_reporter(Arc::new(|summary: &RunSummary| {
                println!("{}", report::render_topic_line(summary));
            }));
        Ok::<_, anyhow::Error>(orchestrator.run(&topics).await?)
    }
    .await;
    engine.shutdown().await;
    let summaries = outcome?;

    println!("{}", report::render_total(&summaries));
    if cancel.is_cancelled() {
        warn!("run interrupted before all topics were processed");
    }
    Ok(())
}
