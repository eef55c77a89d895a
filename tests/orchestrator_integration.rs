//! End-to-end library tests: topics through listing, the pool, and documents.

use std::fs;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use article_harvester::{
    DetailFetcher, DocumentWriter, ListFetcher, Orchestrator, PageMarkers, RetryPolicy,
    RunSummary, Topic, WorkerPool,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

mod support;
use support::{ScriptedBrowser, list_body, valid_article};

fn orchestrator(
    browser: &Arc<ScriptedBrowser>,
    output: &TempDir,
    pause: Duration,
    cancel: CancellationToken,
) -> Orchestrator {
    let fetcher = DetailFetcher::with_markers(
        browser.clone(),
        RetryPolicy::new(3, Duration::ZERO),
        &PageMarkers::default(),
        Duration::from_millis(200),
        Duration::from_millis(200),
    )
    .unwrap()
    .with_cancellation(cancel.clone());
    let pool = WorkerPool::new(Arc::new(fetcher), Arc::new(DocumentWriter::new()), 2)
        .unwrap()
        .with_cancellation(cancel.clone());
    let list = ListFetcher::new(
        browser.clone(),
        "http://fake/lgdata/{id}.json",
        Duration::from_millis(200),
    );
    Orchestrator::new(list, pool, output.path(), pause).with_cancellation(cancel)
}

fn two_topic_browser() -> ScriptedBrowser {
    ScriptedBrowser::new()
        .page(
            "http://fake/lgdata/news.json",
            list_body(&["http://fake/a/1", "http://fake/a/2", "http://fake/a/3"]),
        )
        .page("http://fake/a/1", valid_article("第一篇"))
        .page("http://fake/a/2", valid_article("第二篇"))
        .page("http://fake/a/3", "<html><body>gone</body></html>")
        .page("http://fake/lgdata/empty.json", list_body(&[]))
        .page(
            "http://fake/lgdata/theory.json",
            list_body(&["http://fake/b/1"]),
        )
        .page("http://fake/b/1", valid_article("理论文章"))
}

#[tokio::test]
async fn test_run_processes_topics_in_order_with_summaries() {
    let browser = Arc::new(two_topic_browser());
    let output = TempDir::new().unwrap();
    let topics = vec![
        Topic::new("news", "要闻"),
        Topic::new("empty", "空频道"),
        Topic::new("theory", "理论"),
    ];

    let summaries = orchestrator(&browser, &output, Duration::ZERO, CancellationToken::new())
        .run(&topics)
        .await
        .unwrap();

    assert_eq!(
        summaries,
        vec![
            RunSummary {
                topic: topics[0].clone(),
                total_items: 3,
                success_count: 2,
                interrupted: false
            },
            RunSummary {
                topic: topics[1].clone(),
                total_items: 0,
                success_count: 0,
                interrupted: false
            },
            RunSummary {
                topic: topics[2].clone(),
                total_items: 1,
                success_count: 1,
                interrupted: false
            },
        ]
    );

    let news = output.path().join("要闻");
    assert!(news.join("xuexi_article_第一篇.md").exists());
    assert!(news.join("xuexi_article_第二篇.md").exists());
    assert_eq!(fs::read_dir(&news).unwrap().count(), 2);
    assert!(!output.path().join("空频道").exists());

    let theory = fs::read_to_string(output.path().join("理论").join("xuexi_article_理论文章.md"))
        .unwrap();
    assert!(theory.starts_with("# 理论文章\n"));
    assert!(theory.contains("Source: http://fake/b/1"));
}

#[tokio::test]
async fn test_topic_reporter_fires_as_each_topic_completes() {
    let browser = Arc::new(two_topic_browser());
    let output = TempDir::new().unwrap();
    let topics = vec![
        Topic::new("news", "要闻"),
        Topic::new("empty", "空频道"),
        Topic::new("theory", "理论"),
    ];

    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);
    let watched = Arc::clone(&browser);
    let summaries = orchestrator(&browser, &output, Duration::ZERO, CancellationToken::new())
        .with_topic_reporter(Arc::new(move |summary: &RunSummary| {
            let theory_listed = watched.navigations("http://fake/lgdata/theory.json");
            sink.lock()
                .unwrap()
                .push((summary.clone(), theory_listed));
        }))
        .run(&topics)
        .await
        .unwrap();

    let reported = reported.lock().unwrap().clone();
    let in_order: Vec<RunSummary> = reported.iter().map(|(s, _)| s.clone()).collect();
    assert_eq!(in_order, summaries);
    // The first two topics are reported before the third is even listed.
    let theory_listed: Vec<usize> = reported.iter().map(|(_, n)| *n).collect();
    assert_eq!(theory_listed, vec![0, 0, 1]);
}

#[tokio::test]
async fn test_pause_separates_topics_but_not_after_last() {
    let browser = Arc::new(two_topic_browser());
    let output = TempDir::new().unwrap();
    let topics = vec![Topic::new("theory", "一"), Topic::new("theory", "二")];

    let started = Instant::now();
    let summaries = orchestrator(
        &browser,
        &output,
        Duration::from_millis(300),
        CancellationToken::new(),
    )
    .run(&topics)
    .await
    .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(summaries.len(), 2);
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_millis(600), "{elapsed:?}");
}

#[tokio::test]
async fn test_cancelled_run_processes_no_topics() {
    let browser = Arc::new(two_topic_browser());
    let output = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summaries = orchestrator(&browser, &output, Duration::ZERO, cancel)
        .run(&[Topic::new("news", "要闻")])
        .await
        .unwrap();

    assert!(summaries.is_empty());
    assert_eq!(browser.total_navigations(), 0);
}

#[tokio::test]
async fn test_cancellation_during_pause_skips_remaining_topics() {
    let browser = Arc::new(two_topic_browser());
    let output = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let runner = orchestrator(&browser, &output, Duration::from_secs(30), cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let summaries = runner
        .run(&[Topic::new("theory", "一"), Topic::new("news", "二")])
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].success_count, 1);
    assert_eq!(browser.navigations("http://fake/lgdata/news.json"), 0);
}
