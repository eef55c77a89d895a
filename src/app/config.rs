//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use article_harvester::CrawlSettings;
use article_harvester::constants::{MAX_WORKERS, TOPIC_ID_PLACEHOLDER};

use crate::cli::EngineKind;

const APP_DIR: &str = "article-harvester";

/// TOML-style file configuration for harvester defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default worker count (1..=100).
    pub workers: Option<usize>,
    /// Default output root.
    pub output_dir: Option<PathBuf>,
    /// Default topic directory file.
    pub directory: Option<PathBuf>,
    /// Default rendering engine.
    pub engine: Option<EngineKind>,
    /// Sleep between detail page attempts in milliseconds.
    pub retry_backoff_ms: Option<u64>,
    /// Sleep between topics in milliseconds.
    pub topic_pause_ms: Option<u64>,
    /// Page navigation timeout in seconds.
    pub navigation_timeout_secs: Option<u64>,
    /// Per-marker wait timeout in seconds.
    pub marker_timeout_secs: Option<u64>,
    /// List endpoint template containing `{id}`.
    pub list_url_template: Option<String>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(workers) = self.workers
            && !(1..=MAX_WORKERS).contains(&workers)
        {
            bail!("Invalid config value for `workers`: {workers}. Expected range: 1..={MAX_WORKERS}");
        }
        validate_range("retry_backoff_ms", self.retry_backoff_ms, 0, 60_000)?;
        validate_range("topic_pause_ms", self.topic_pause_ms, 0, 600_000)?;
        validate_range("navigation_timeout_secs", self.navigation_timeout_secs, 1, 3600)?;
        validate_range("marker_timeout_secs", self.marker_timeout_secs, 1, 3600)?;
        if let Some(template) = &self.list_url_template
            && !template.contains(TOPIC_ID_PLACEHOLDER)
        {
            bail!(
                "Invalid config value for `list_url_template`: '{template}' must contain {TOPIC_ID_PLACEHOLDER}"
            );
        }
        Ok(())
    }

    /// Applies the timing and endpoint overrides onto `settings`.
    pub fn apply_to(&self, settings: &mut CrawlSettings) {
        if let Some(ms) = self.retry_backoff_ms {
            settings.retry_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = self.topic_pause_ms {
            settings.topic_pause = Duration::from_millis(ms);
        }
        if let Some(secs) = self.navigation_timeout_secs {
            settings.navigation_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.marker_timeout_secs {
            settings.marker_timeout = Duration::from_secs(secs);
        }
        if let Some(template) = &self.list_url_template {
            settings.list_url_template.clone_from(template);
        }
    }
}

fn validate_range(field: &str, value: Option<u64>, min: u64, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Tracing level used when neither the environment nor flags decide.
    #[must_use]
    pub fn log_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config, or defaults when no file exists.
    pub config: FileConfig,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/article-harvester/config.toml`
/// 2. `$HOME/.config/article-harvester/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref().filter(|p| p.exists()) else {
        return Ok(LoadedConfig {
            path,
            config: FileConfig::default(),
            loaded_from_file: false,
        });
    };

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config,
        loaded_from_file: true,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "workers" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                cfg.workers = Some(usize::try_from(parsed).with_context(invalid)?);
            }
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "directory" => {
                cfg.directory = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "engine" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                let Some(engine) = EngineKind::from_label(&parsed) else {
                    bail!(
                        "Invalid `engine` value '{parsed}' on line {line_no}: expected one of: chromium, http"
                    );
                };
                cfg.engine = Some(engine);
            }
            "retry_backoff_ms" => {
                cfg.retry_backoff_ms = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "topic_pause_ms" => {
                cfg.topic_pause_ms = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "navigation_timeout_secs" => {
                cfg.navigation_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "marker_timeout_secs" => {
                cfg.marker_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "list_url_template" => {
                cfg.list_url_template = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}
