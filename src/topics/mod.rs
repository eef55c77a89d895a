//! Topic resolution: turning operator input into `{id, output folder}` pairs.
//!
//! Topics come either from an explicit `id,folder` pair or from a topic
//! directory file filtered by a keyword on the channel name. Resolution is
//! pure apart from reading (and optionally writing back) the directory file,
//! and always finishes before any rendering engine is started.

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::document::sanitize_title;

/// A content channel to crawl and the folder its documents land in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    /// Channel id substituted into the list endpoint.
    pub id: String,
    /// Output folder name (the channel name for directory topics).
    ///
    /// Resolved topics carry a single sanitized path component.
    pub folder: String,
}

impl Topic {
    /// Creates a topic.
    pub fn new(id: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            folder: folder.into(),
        }
    }
}

/// Errors produced while resolving topics.
#[derive(Debug, Error)]
pub enum TopicError {
    /// The keyword matched no channel in the directory.
    #[error("no topics matched {keyword:?}")]
    NoTopicsFound {
        /// The filter keyword.
        keyword: String,
    },

    /// An explicit pair was not of the form `id,folder`.
    #[error("malformed topic pair {input:?}: expected exactly `id,folder`")]
    MalformedPair {
        /// The rejected input.
        input: String,
    },

    /// The directory file could not be read or written.
    #[error("I/O error on topic directory {path}: {source}")]
    Io {
        /// Directory file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The directory file is not the expected JSON mapping.
    #[error("invalid topic directory {path}: {source}")]
    Json {
        /// Directory file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// One directory entry. Fields beyond these two are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelEntry {
    /// Channel id used by the list endpoint.
    pub channel_id: String,
    /// Human-readable channel name.
    pub channel_name: String,
}

/// Topic directory keyed by an arbitrary entry id.
pub type TopicDirectory = HashMap<String, ChannelEntry>;

/// Reduces a folder name to one path component under the output root.
///
/// Separators and reserved characters are stripped. Names left empty or
/// made only of dots are refused.
fn sanitize_folder(name: &str) -> Option<String> {
    let folder = sanitize_title(name);
    (!folder.chars().all(|c| c == '.')).then_some(folder)
}

/// Parses an explicit `id,folder` pair.
///
/// Both parts are trimmed and must be non-empty; any other number of
/// comma-separated parts is rejected. The folder is sanitized into a single
/// path component and must still be non-empty afterwards.
///
/// # Errors
///
/// Returns [`TopicError::MalformedPair`] for anything else.
pub fn parse_topic_pair(input: &str) -> Result<Topic, TopicError> {
    let malformed = || TopicError::MalformedPair {
        input: input.to_string(),
    };
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    let [id, folder] = parts.as_slice() else {
        return Err(malformed());
    };
    if id.is_empty() {
        return Err(malformed());
    }
    let folder = sanitize_folder(folder).ok_or_else(malformed)?;
    Ok(Topic::new(*id, folder))
}

/// Loads a topic directory from a JSON file.
///
/// # Errors
///
/// Returns [`TopicError::Io`] if the file cannot be read and
/// [`TopicError::Json`] if it is not a mapping of channel entries.
#[instrument]
pub fn load_topic_directory(path: &Path) -> Result<TopicDirectory, TopicError> {
    let raw = fs::read_to_string(path).map_err(|source| TopicError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let directory: TopicDirectory =
        serde_json::from_str(&raw).map_err(|source| TopicError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(entries = directory.len(), "topic directory loaded");
    Ok(directory)
}

/// Keeps the channels whose name contains `keyword` (case-sensitive).
///
/// The result maps `channel_id` to the sanitized `channel_name` and is
/// sorted by folder name (ties broken by id). When several matching entries
/// share a `channel_id`, the smallest folder name wins, so the result does
/// not depend on directory iteration order. Names that sanitize to nothing
/// are skipped.
///
/// # Errors
///
/// Returns [`TopicError::NoTopicsFound`] when nothing matches.
pub fn filter_topics(directory: &TopicDirectory, keyword: &str) -> Result<Vec<Topic>, TopicError> {
    let mut by_id: HashMap<&str, String> = HashMap::new();
    for entry in directory.values() {
        if !entry.channel_name.contains(keyword) {
            continue;
        }
        let Some(folder) = sanitize_folder(&entry.channel_name) else {
            warn!(channel = %entry.channel_id, name = %entry.channel_name, "unusable channel name");
            continue;
        };
        by_id
            .entry(entry.channel_id.as_str())
            .and_modify(|kept| {
                if folder < *kept {
                    kept.clone_from(&folder);
                }
            })
            .or_insert(folder);
    }

    if by_id.is_empty() {
        return Err(TopicError::NoTopicsFound {
            keyword: keyword.to_string(),
        });
    }

    let mut topics: Vec<Topic> = by_id
        .into_iter()
        .map(|(id, name)| Topic::new(id, name))
        .collect();
    sort_by_folder(&mut topics);
    Ok(topics)
}

fn sort_by_folder(topics: &mut [Topic]) {
    topics.sort_by(|a, b| a.folder.cmp(&b.folder).then_with(|| a.id.cmp(&b.id)));
}

/// Serializes topics as a `{id: folder}` object in slice order.
struct OrderedTopics<'a>(&'a [Topic]);

impl Serialize for OrderedTopics<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for topic in self.0 {
            map.serialize_entry(&topic.id, &topic.folder)?;
        }
        map.end()
    }
}

/// Writes resolved topics as a `{id: folder}` JSON object sorted by folder
/// name, indented with four spaces.
///
/// # Errors
///
/// Returns [`TopicError::Io`] if the file cannot be written.
#[instrument(skip(topics), fields(count = topics.len()))]
pub fn write_topic_directory(topics: &[Topic], path: &Path) -> Result<(), TopicError> {
    let io_err = |source| TopicError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut sorted = topics.to_vec();
    sort_by_folder(&mut sorted);

    let file = fs::File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    OrderedTopics(&sorted)
        .serialize(&mut serializer)
        .map_err(|source| TopicError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn directory() -> TopicDirectory {
        serde_json::from_str(
            r#"{
                "a": {"channel_id": "101", "channel_name": "重要活动视频专辑", "extra": 1},
                "b": {"channel_id": "102", "channel_name": "学习理论"},
                "c": {"channel_id": "103", "channel_name": "重要讲话"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_topic_pair_accepts_id_and_folder() {
        let topic = parse_topic_pair("1234abcd, 时政要闻 ").unwrap();
        assert_eq!(topic, Topic::new("1234abcd", "时政要闻"));
    }

    #[test]
    fn test_parse_topic_pair_rejects_wrong_part_counts() {
        for input in ["", "only-id", "a,b,c", ",folder", "id,", " , "] {
            assert!(
                matches!(parse_topic_pair(input), Err(TopicError::MalformedPair { .. })),
                "input {input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_filter_topics_is_case_sensitive_substring_sorted_by_folder() {
        let topics = filter_topics(&directory(), "重要").unwrap();
        assert_eq!(topics.len(), 2);
        let mut expected = vec![
            Topic::new("101", "重要活动视频专辑"),
            Topic::new("103", "重要讲话"),
        ];
        expected.sort_by(|a, b| a.folder.cmp(&b.folder));
        assert_eq!(topics, expected);
    }

    #[test]
    fn test_parse_topic_pair_confines_folder_to_one_component() {
        assert_eq!(parse_topic_pair("id,/abs").unwrap(), Topic::new("id", "abs"));
        assert_eq!(parse_topic_pair("a,x/y").unwrap(), Topic::new("a", "xy"));
        assert_eq!(parse_topic_pair(r"a,..\up").unwrap(), Topic::new("a", "..up"));
        for input in ["a,/", "a,..", "a,../", "a,.", r"a,\"] {
            assert!(
                matches!(parse_topic_pair(input), Err(TopicError::MalformedPair { .. })),
                "input {input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_filter_topics_duplicate_channel_id_keeps_smallest_name() {
        let dir: TopicDirectory = serde_json::from_str(
            r#"{
                "x": {"channel_id": "7", "channel_name": "要闻 B"},
                "y": {"channel_id": "7", "channel_name": "要闻 A"},
                "z": {"channel_id": "7", "channel_name": "要闻 C"}
            }"#,
        )
        .unwrap();
        for _ in 0..16 {
            assert_eq!(
                filter_topics(&dir, "要闻").unwrap(),
                vec![Topic::new("7", "要闻 A")]
            );
        }
    }

    #[test]
    fn test_filter_topics_sanitizes_channel_names() {
        let dir: TopicDirectory = serde_json::from_str(
            r#"{
                "x": {"channel_id": "1", "channel_name": "/etc/要闻"},
                "y": {"channel_id": "2", "channel_name": "要闻/.."},
                "z": {"channel_id": "3", "channel_name": "要闻"}
            }"#,
        )
        .unwrap();
        assert_eq!(
            filter_topics(&dir, "要闻").unwrap(),
            vec![
                Topic::new("1", "etc要闻"),
                Topic::new("3", "要闻"),
                Topic::new("2", "要闻.."),
            ]
        );
    }

    #[test]
    fn test_filter_topics_no_match_is_no_topics_found() {
        let result = filter_topics(&directory(), "不存在");
        assert!(matches!(result, Err(TopicError::NoTopicsFound { .. })));
    }

    #[test]
    fn test_filter_topics_ascii_case_matters() {
        let dir: TopicDirectory = serde_json::from_str(
            r#"{"x": {"channel_id": "1", "channel_name": "News Daily"}}"#,
        )
        .unwrap();
        assert!(filter_topics(&dir, "news").is_err());
        assert_eq!(filter_topics(&dir, "News").unwrap().len(), 1);
    }

    #[test]
    fn test_load_topic_directory_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dir.json");
        fs::write(
            &path,
            r#"{"k": {"channel_id": "9", "channel_name": "Nine", "unused": true}}"#,
        )
        .unwrap();

        let dir = load_topic_directory(&path).unwrap();
        assert_eq!(dir["k"].channel_id, "9");
        assert_eq!(dir["k"].channel_name, "Nine");
    }

    #[test]
    fn test_load_topic_directory_missing_file_is_io_error() {
        let result = load_topic_directory(Path::new("/nonexistent/topics.json"));
        assert!(matches!(result, Err(TopicError::Io { .. })));
    }

    #[test]
    fn test_load_topic_directory_invalid_json_is_json_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dir.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            load_topic_directory(&path),
            Err(TopicError::Json { .. })
        ));
    }

    #[test]
    fn test_write_topic_directory_orders_by_folder_with_four_space_indent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.json");
        let topics = vec![Topic::new("2", "beta"), Topic::new("1", "alpha")];

        write_topic_directory(&topics, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n    \"1\": \"alpha\",\n    \"2\": \"beta\"\n}");
    }

    #[test]
    fn test_write_topic_directory_keeps_non_ascii_unescaped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.json");
        write_topic_directory(&[Topic::new("7", "学习理论")], &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("学习理论"), "{written}");
    }
}
