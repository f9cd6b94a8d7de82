//! Application configuration.
//!
//! Loaded once at startup, either from `STUDIO_*` environment variables or
//! from the JSON blob the server injects into the builder page, and then
//! split into the settings each library crate takes.

use anyhow::{Context as _, Result};
use core::str::FromStr;
use core::time::Duration;
use css_engine::{CompilerOptions, SelectorStrategy};
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use studio_bus::HandshakeConfig;
use studio_sync::SyncConfig;
use url::Url;

/// Runtime configuration of the studio.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudioConfig {
    /// Patch submission endpoint.
    pub sync_url: Option<Url>,
    pub flush_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// Failed flushes before a project is reported as failed.
    pub max_retries: u32,
    pub handshake_poll_ms: u64,
    pub selector_strategy: SelectorStrategy,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            sync_url: None,
            flush_interval_ms: 1000,
            request_timeout_ms: 10_000,
            max_retries: 5,
            handshake_poll_ms: 100,
            selector_strategy: SelectorStrategy::DataAttribute,
        }
    }
}

impl StudioConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads:
    /// - `STUDIO_SYNC_URL`: patch submission endpoint
    /// - `STUDIO_FLUSH_INTERVAL_MS` (default: 1000)
    /// - `STUDIO_REQUEST_TIMEOUT_MS` (default: 10000)
    /// - `STUDIO_MAX_RETRIES` (default: 5)
    /// - `STUDIO_HANDSHAKE_POLL_MS` (default: 100)
    /// - `STUDIO_SELECTOR`: `data-attribute` or `class`
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    /// Returns an error if `STUDIO_SYNC_URL` is not a valid URL.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// [`StudioConfig::from_env`] over an arbitrary variable source.
    ///
    /// # Errors
    /// Returns an error if `STUDIO_SYNC_URL` is not a valid URL.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let sync_url = lookup("STUDIO_SYNC_URL")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| Url::parse(raw.trim()).with_context(|| format!("invalid STUDIO_SYNC_URL `{raw}`")))
            .transpose()?;
        let selector_strategy = match lookup("STUDIO_SELECTOR").as_deref().map(str::trim) {
            None | Some("" | "data-attribute") => SelectorStrategy::DataAttribute,
            Some("class") => SelectorStrategy::Class,
            Some(other) => {
                warn!("unknown STUDIO_SELECTOR `{other}`, using data attributes");
                SelectorStrategy::DataAttribute
            }
        };
        Ok(Self {
            sync_url,
            flush_interval_ms: number(&lookup, "STUDIO_FLUSH_INTERVAL_MS")
                .unwrap_or(defaults.flush_interval_ms),
            request_timeout_ms: number(&lookup, "STUDIO_REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout_ms),
            max_retries: number(&lookup, "STUDIO_MAX_RETRIES").unwrap_or(defaults.max_retries),
            handshake_poll_ms: number(&lookup, "STUDIO_HANDSHAKE_POLL_MS")
                .unwrap_or(defaults.handshake_poll_ms),
            selector_strategy,
        })
    }

    /// Parse the JSON configuration blob; missing keys take their defaults.
    ///
    /// # Errors
    /// Returns an error if the blob is not valid JSON of the right shape.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid studio configuration")
    }

    /// Settings of the sync queue; durations are at least one millisecond.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            flush_interval: Duration::from_millis(self.flush_interval_ms.max(1)),
            request_timeout: Duration::from_millis(self.request_timeout_ms.max(1)),
            max_retries: self.max_retries,
        }
    }

    /// Canvas handshake polling, without a deadline.
    pub fn handshake_config(&self) -> HandshakeConfig {
        HandshakeConfig {
            poll_interval: Duration::from_millis(self.handshake_poll_ms.max(1)),
            deadline: None,
        }
    }

    pub const fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions {
            selector: self.selector_strategy,
        }
    }
}

fn number<N: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<N> {
    let raw = lookup(key)?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        warn!("ignoring unparseable {key} `{raw}`");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = StudioConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StudioConfig::default());
        assert_eq!(config.sync_config(), SyncConfig::default());
        assert_eq!(config.handshake_config(), HandshakeConfig::default());
    }

    #[test]
    fn environment_overrides_and_clamps() {
        let config = StudioConfig::from_lookup(lookup(&[
            ("STUDIO_SYNC_URL", "https://example.com/rest/patch"),
            ("STUDIO_FLUSH_INTERVAL_MS", "0"),
            ("STUDIO_REQUEST_TIMEOUT_MS", "2500"),
            ("STUDIO_MAX_RETRIES", "many"),
            ("STUDIO_SELECTOR", "class"),
        ]))
        .unwrap();
        assert_eq!(
            config.sync_url.as_ref().map(Url::as_str),
            Some("https://example.com/rest/patch")
        );
        let sync = config.sync_config();
        assert_eq!(sync.flush_interval, Duration::from_millis(1));
        assert_eq!(sync.request_timeout, Duration::from_millis(2500));
        assert_eq!(sync.max_retries, 5);
        assert_eq!(config.compiler_options().selector, SelectorStrategy::Class);
    }

    #[test]
    fn bad_sync_url_is_an_error() {
        assert!(StudioConfig::from_lookup(lookup(&[("STUDIO_SYNC_URL", "not a url")])).is_err());
    }

    #[test]
    fn json_blob_uses_camel_case_keys() {
        let config = StudioConfig::from_json(
            r#"{ "syncUrl": "http://localhost:3000/patch", "maxRetries": 2, "selectorStrategy": "class" }"#,
        )
        .unwrap();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.selector_strategy, SelectorStrategy::Class);
        assert_eq!(config.flush_interval_ms, 1000);
        assert!(StudioConfig::from_json("{ \"maxRetries\": \"two\" }").is_err());
    }
}
