//! User-Agent string presented by the rendering engines.
//!
//! The list and detail endpoints serve desktop markup only, so both engines
//! identify as a desktop Chrome build with the tool name appended.

/// Desktop Chrome identification shared by both engines.
const DESKTOP_CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Default User-Agent for page rendering (desktop Chrome plus tool token).
#[must_use]
pub(crate) fn default_browser_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{DESKTOP_CHROME_UA} article-harvester/{version}")
}
