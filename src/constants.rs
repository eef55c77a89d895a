//! Built-in defaults for crawl tuning, page markers, and document naming.

use std::time::Duration;

/// Default number of concurrently processed items per topic.
pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound on the worker count accepted from the operator.
pub const MAX_WORKERS: usize = 100;

/// Navigation attempts per detail page (initial attempt included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between detail page attempts after a timeout.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Courtesy pause between two processed topics.
pub const DEFAULT_TOPIC_PAUSE: Duration = Duration::from_secs(2);

/// Page navigation timeout (15 seconds).
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for each structural marker to appear (10 seconds).
pub const DEFAULT_MARKER_TIMEOUT: Duration = Duration::from_secs(10);

/// List endpoint template; `{id}` is replaced by the topic id.
pub const DEFAULT_LIST_URL_TEMPLATE: &str = "https://www.xuexi.cn/lgdata/{id}.json";

/// Placeholder substituted in [`DEFAULT_LIST_URL_TEMPLATE`].
pub const TOPIC_ID_PLACEHOLDER: &str = "{id}";

/// Markers that must be present before a detail page counts as rendered.
pub const DEFAULT_WAIT_MARKERS: [&str; 2] = ["div[class*=title]", "div[class*=content]"];

/// Title region of a detail page.
pub const DEFAULT_TITLE_SELECTOR: &str = "div.render-detail-title";

/// Content region of a detail page.
pub const DEFAULT_CONTENT_SELECTOR: &str = "div.render-detail-content";

/// Paragraph elements inside the content region.
pub const DEFAULT_PARAGRAPH_SELECTOR: &str = "p";

/// Minimum characters across all paragraphs for a page to count as an article.
pub const MIN_CONTENT_CHARS: usize = 50;

/// Maximum characters of the sanitized title kept in a filename.
pub const MAX_TITLE_CHARS: usize = 80;

/// Fixed prefix of every document filename.
pub const DOCUMENT_PREFIX: &str = "xuexi_article";

/// Fixed extension of every document filename.
pub const DOCUMENT_EXTENSION: &str = "md";

/// Default location of the topic directory file.
pub const DEFAULT_TOPIC_DIRECTORY: &str = "resource/topic_directory.json";
