// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use netlens_app::{StalePolicy, ViewKind};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const APP_NAME: &str = "netlens";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:55000";
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub navigation: Navigation,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: Backend::default(),
            ui: Ui::default(),
            navigation: Navigation::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub default_view: Option<String>,
    pub show_profile_browser: Option<bool>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            default_view: Some(ViewKind::Timeline.as_str().to_owned()),
            show_profile_browser: Some(true),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Navigation {
    pub stale_responses: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("NETLENS_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set NETLENS_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and place values under [backend], [ui], [navigation], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(timeout) = &self.backend.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "backend.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(base_url) = &self.backend.base_url
            && base_url.trim().is_empty()
        {
            bail!("backend.base_url in {} must not be empty", path.display());
        }

        if let Some(view) = &self.ui.default_view
            && ViewKind::parse(view).is_none()
        {
            let known = ViewKind::ALL
                .iter()
                .map(|view| view.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            bail!(
                "ui.default_view {:?} in {} is not a view; use one of: {}",
                view,
                path.display(),
                known
            );
        }

        if let Some(policy) = &self.navigation.stale_responses
            && StalePolicy::parse(policy).is_none()
        {
            bail!(
                "navigation.stale_responses {:?} in {} must be \"discard\" or \"last-arrival-wins\"",
                policy,
                path.display()
            );
        }

        if let Some(level) = &self.log.level
            && tracing::Level::from_str(level).is_err()
        {
            bail!(
                "log.level {:?} in {} must be one of: error, warn, info, debug, trace",
                level,
                path.display()
            );
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.backend
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim()
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.backend.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn default_view(&self) -> ViewKind {
        self.ui
            .default_view
            .as_deref()
            .and_then(ViewKind::parse)
            .unwrap_or(ViewKind::Timeline)
    }

    pub fn show_profile_browser(&self) -> bool {
        self.ui.show_profile_browser.unwrap_or(true)
    }

    pub fn stale_policy(&self) -> StalePolicy {
        self.navigation
            .stale_responses
            .as_deref()
            .and_then(StalePolicy::parse)
            .unwrap_or_default()
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log
            .level
            .as_deref()
            .and_then(|level| tracing::Level::from_str(level).ok())
            .unwrap_or(tracing::Level::INFO)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => default_log_path(),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# netlens config\n# Place this file at: {}\n\nversion = 1\n\n[backend]\n# Address of the analysis web server\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[ui]\n# One of: timeline, timeline_flows, alerts, intuples, outtuples, evidence\ndefault_view = \"timeline\"\nshow_profile_browser = true\n\n[navigation]\n# \"discard\" ignores responses that were superseded by a newer request.\n# \"last-arrival-wins\" applies whichever response arrives last.\nstale_responses = \"discard\"\n\n[log]\nlevel = \"{}\"\n# Optional. Default is platform state dir (for example ~/.local/state/netlens/netlens.log)\n# path = \"/absolute/path/to/netlens.log\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn default_log_path() -> Result<PathBuf> {
    let root = dirs::state_dir()
        .or_else(dirs::cache_dir)
        .ok_or_else(|| anyhow!("cannot resolve log directory; set [log].path in the config"))?;
    Ok(root.join(APP_NAME).join("netlens.log"))
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("timeout duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
