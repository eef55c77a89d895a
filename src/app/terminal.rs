use crate::app::config::VerbositySetting;

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

/// Level used when `RUST_LOG` is unset.
///
/// Priority: quiet flag > verbose count > config verbosity > info.
pub(crate) fn default_log_level(
    quiet: bool,
    verbose: u8,
    config: Option<VerbositySetting>,
) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => config.map_or("info", VerbositySetting::log_level),
        1 => "debug",
        _ => "trace",
    }
}

pub(crate) fn should_show_progress(
    stderr_is_terminal: bool,
    quiet: bool,
    no_progress: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !no_progress && !dumb_terminal
}

pub(crate) fn init_tracing(default_level: &str, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}
