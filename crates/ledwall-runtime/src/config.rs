#![forbid(unsafe_code)]

//! Editor configuration.
//!
//! Precedence, lowest to highest: [`EditorConfig::default`], environment
//! variables ([`EditorConfig::from_env`]), then explicit overrides from
//! the caller (command-line flags, `with_*` builders).
//!
//! | Variable | Meaning | Example |
//! |----------|---------|---------|
//! | `LEDWALL_BASE_URL` | Back-end base URL | `http://wall.local:5000` |
//! | `LEDWALL_VIEWPORT` | Canvas budget, `WxH` | `1280x720` |
//! | `LEDWALL_TIMEOUT_MS` | Request timeout | `5000` |
//! | `LEDWALL_COMMAND_FILE` | Renderer command file | `/tmp/led-cmd` |
//!
//! Unparseable values are logged and ignored.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use ledwall_core::geometry::Viewport;
use tracing::warn;

use crate::sync::SyncConfig;

pub const ENV_BASE_URL: &str = "LEDWALL_BASE_URL";
pub const ENV_VIEWPORT: &str = "LEDWALL_VIEWPORT";
pub const ENV_TIMEOUT_MS: &str = "LEDWALL_TIMEOUT_MS";
pub const ENV_COMMAND_FILE: &str = "LEDWALL_COMMAND_FILE";

/// Everything the editor needs to start.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorConfig {
    /// Screen area the wall proxy must fit in.
    pub viewport: Viewport,
    /// Back-end endpoints.
    pub sync: SyncConfig,
    /// Renderer command file; `None` disables the command stream.
    pub command_file: Option<PathBuf>,
}

impl EditorConfig {
    /// Defaults overlaid with `LEDWALL_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL) {
            config.sync = config.sync.with_base_url(url);
        }
        if let Some(val) = lookup(ENV_VIEWPORT) {
            match parse_viewport(&val) {
                Some(viewport) => config.viewport = viewport,
                None => warn!(variable = ENV_VIEWPORT, value = %val, "ignoring invalid viewport"),
            }
        }
        if let Some(val) = lookup(ENV_TIMEOUT_MS) {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.sync.timeout = Duration::from_millis(ms),
                _ => warn!(variable = ENV_TIMEOUT_MS, value = %val, "ignoring invalid timeout"),
            }
        }
        if let Some(path) = lookup(ENV_COMMAND_FILE).filter(|p| !p.is_empty()) {
            config.command_file = Some(PathBuf::from(path));
        }
        config
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    #[must_use]
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    #[must_use]
    pub fn with_command_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.command_file = Some(path.into());
        self
    }
}

/// Parse `WxH` (also accepts `W×H` and `W,H`).
#[must_use]
pub fn parse_viewport(text: &str) -> Option<Viewport> {
    let (w, h) = text
        .split_once(['x', 'X', '×', ','])
        .map(|(w, h)| (w.trim(), h.trim()))?;
    let viewport = Viewport::new(w.parse().ok()?, h.parse().ok()?);
    viewport.is_valid().then_some(viewport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = EditorConfig::from_lookup(|_| None);
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.viewport, Viewport::new(1280.0, 720.0));
        assert!(config.command_file.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = EditorConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://wall.local:8080/"),
            (ENV_VIEWPORT, "800x600"),
            (ENV_TIMEOUT_MS, "250"),
            (ENV_COMMAND_FILE, "/run/led-cmd"),
        ]));
        assert_eq!(config.sync.base_url, "http://wall.local:8080");
        assert_eq!(config.viewport, Viewport::new(800.0, 600.0));
        assert_eq!(config.sync.timeout, Duration::from_millis(250));
        assert_eq!(config.command_file, Some(PathBuf::from("/run/led-cmd")));
    }

    #[test]
    fn invalid_values_are_ignored() {
        let config = EditorConfig::from_lookup(lookup(&[
            (ENV_VIEWPORT, "wide"),
            (ENV_TIMEOUT_MS, "0"),
            (ENV_COMMAND_FILE, ""),
        ]));
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn viewport_parsing() {
        assert_eq!(parse_viewport("1920x1080"), Some(Viewport::new(1920.0, 1080.0)));
        assert_eq!(parse_viewport("640 X 480"), Some(Viewport::new(640.0, 480.0)));
        assert_eq!(parse_viewport("10.5,20"), Some(Viewport::new(10.5, 20.0)));
        assert_eq!(parse_viewport("0x10"), None);
        assert_eq!(parse_viewport("100"), None);
    }
}
