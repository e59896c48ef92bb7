//! Loader configuration.
//!
//! Built programmatically through [`Default`] or read from `PAGE_*` environment
//! variables with [`LoaderConfig::from_env`].

use core::time::Duration;
use std::env;

use url::Url;

pub const DEFAULT_WIDGET_ENDPOINT: &str = "https://api-gwu2ii6e6a-uc.a.run.app/turnstile";
pub const DEFAULT_WIDGET_SITE_KEY: &str = "0x4AAAAAABgxJ_tKXTLSNDoO";

/// Settings for the deferred verification widget.
#[derive(Clone, Debug)]
pub struct WidgetConfig {
    pub enabled: bool,
    /// Where submissions are POSTed.
    pub endpoint: String,
    pub site_key: String,
    pub poll_interval_ms: u64,
    /// Readiness checks before giving up; `None` polls forever.
    pub poll_limit: Option<u32>,
}

impl WidgetConfig {
    #[inline]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Read `PAGE_WIDGET*` variables, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let enabled = env::var("PAGE_WIDGET").ok().as_deref() != Some("0");
        let endpoint = env::var("PAGE_WIDGET_ENDPOINT")
            .ok()
            .filter(|val| Url::parse(val).is_ok())
            .unwrap_or(defaults.endpoint);
        let site_key = env::var("PAGE_WIDGET_SITE_KEY").unwrap_or(defaults.site_key);
        let poll_interval_ms = env::var("PAGE_WIDGET_POLL_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.poll_interval_ms)
            .max(1);
        let poll_limit = match env::var("PAGE_WIDGET_POLL_LIMIT")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
        {
            Some(0) => None,
            Some(limit) => Some(limit),
            None => defaults.poll_limit,
        };
        Self {
            enabled,
            endpoint,
            site_key,
            poll_interval_ms,
            poll_limit,
        }
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_WIDGET_ENDPOINT.to_owned(),
            site_key: DEFAULT_WIDGET_SITE_KEY.to_owned(),
            poll_interval_ms: 100,
            poll_limit: Some(600),
        }
    }
}

/// Minimum wait before the delayed phase task, in milliseconds.
pub const MIN_DELAYED_MS: u64 = 3000;

#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Prefix for styles, blocks, icons and scripts.
    pub code_base_path: String,
    /// Written to `<html lang>`.
    pub language: String,
    /// Viewport width at or above which fonts load during the eager phase.
    pub desktop_breakpoint: u32,
    /// Wait before the delayed task. [`Self::from_env`] never goes below
    /// [`MIN_DELAYED_MS`]; hosts and tests building the struct directly may.
    pub delayed_ms: u64,
    /// Emit phase timings as a JSON log line.
    pub telemetry_enabled: bool,
    pub widget: WidgetConfig,
}

impl LoaderConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PAGE_CODE_BASE_PATH` (default empty)
    /// - `PAGE_LANGUAGE` (default `en`)
    /// - `PAGE_DESKTOP_BREAKPOINT` (default 900)
    /// - `PAGE_DELAYED_MS` (default 3000, never below 3000)
    /// - `PAGE_TELEMETRY`: set to "1" to emit timings
    /// - `PAGE_WIDGET*`: see [`WidgetConfig::from_env`]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let code_base_path = env::var("PAGE_CODE_BASE_PATH")
            .map(|val| val.trim_end_matches('/').to_owned())
            .unwrap_or(defaults.code_base_path);
        let language = env::var("PAGE_LANGUAGE")
            .ok()
            .filter(|val| !val.is_empty())
            .unwrap_or(defaults.language);
        let desktop_breakpoint = env::var("PAGE_DESKTOP_BREAKPOINT")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(defaults.desktop_breakpoint);
        let delayed_ms = env::var("PAGE_DELAYED_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .map_or(defaults.delayed_ms, |val| val.max(MIN_DELAYED_MS));
        let telemetry_enabled = env::var("PAGE_TELEMETRY").ok().as_deref() == Some("1");
        Self {
            code_base_path,
            language,
            desktop_breakpoint,
            delayed_ms,
            telemetry_enabled,
            widget: WidgetConfig::from_env(),
        }
    }

    #[inline]
    pub const fn delayed_after(&self) -> Duration {
        Duration::from_millis(self.delayed_ms)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            code_base_path: String::new(),
            language: "en".to_owned(),
            desktop_breakpoint: 900,
            delayed_ms: MIN_DELAYED_MS,
            telemetry_enabled: false,
            widget: WidgetConfig::default(),
        }
    }
}
