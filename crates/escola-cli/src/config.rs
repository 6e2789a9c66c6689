// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use escola_api::Session;
use escola_app::{ListSettings, Resource};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "escola";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_API_TIMEOUT: &str = "15s";
const DEFAULT_SEARCH_DEBOUNCE: &str = "400ms";
const TOKEN_ENV: &str = "ESCOLA_API_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub list: List,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            list: List::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct List {
    pub items_per_page: Option<i64>,
    pub max_pages_to_show: Option<i64>,
    pub search_debounce: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub start_tab: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub file: Option<String>,
    pub json: Option<bool>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("ESCOLA_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set ESCOLA_CONFIG_PATH to the config file")
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
                    "config file {} has no version. Add `version = 1` and put values under [api], [list], [ui], and [log]",
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
        if let Some(base_url) = &self.api.base_url {
            let trimmed = base_url.trim();
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                bail!(
                    "api.base_url in {} must start with http:// or https://, got {:?}",
                    path.display(),
                    base_url
                );
            }
        }

        if let Some(timeout) = &self.api.timeout {
            positive_duration(path, "api.timeout", timeout)?;
        }

        if let Some(debounce) = &self.list.search_debounce {
            positive_duration(path, "list.search_debounce", debounce)?;
        }

        for (key, value) in [
            ("list.items_per_page", self.list.items_per_page),
            ("list.max_pages_to_show", self.list.max_pages_to_show),
        ] {
            if let Some(value) = value
                && value <= 0
            {
                bail!(
                    "{} in {} must be positive, got {}",
                    key,
                    path.display(),
                    value
                );
            }
        }

        if let Some(tab) = &self.ui.start_tab
            && Resource::parse(tab).is_none()
        {
            let known = Resource::ALL
                .iter()
                .map(|resource| resource.path())
                .collect::<Vec<_>>()
                .join(", ");
            bail!(
                "ui.start_tab in {} must be one of {}, got {:?}",
                path.display(),
                known,
                tab
            );
        }

        Ok(())
    }

    pub fn api_base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim()
            .trim_end_matches('/')
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_API_TIMEOUT))
    }

    /// The configured token wins; `ESCOLA_API_TOKEN` fills in when the file
    /// has none.
    pub fn session(&self) -> Session {
        match &self.api.token {
            Some(token) if !token.trim().is_empty() => Session::with_token(token),
            _ => env::var(TOKEN_ENV)
                .map(|token| Session::with_token(&token))
                .unwrap_or_else(|_| Session::anonymous()),
        }
    }

    pub fn list_settings(&self) -> Result<ListSettings> {
        let defaults = ListSettings::default();
        Ok(ListSettings {
            items_per_page: positive_usize(self.list.items_per_page, defaults.items_per_page),
            max_pages_to_show: positive_usize(
                self.list.max_pages_to_show,
                defaults.max_pages_to_show,
            ),
            search_debounce: parse_duration(
                self.list
                    .search_debounce
                    .as_deref()
                    .unwrap_or(DEFAULT_SEARCH_DEBOUNCE),
            )?,
        })
    }

    pub fn start_tab(&self) -> Resource {
        self.ui
            .start_tab
            .as_deref()
            .and_then(Resource::parse)
            .unwrap_or(Resource::Students)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let root = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| anyhow!("cannot resolve a log directory; set [log].file"))?;
        Ok(root.join(APP_NAME).join("escola.log"))
    }

    pub fn log_json(&self) -> bool {
        self.log.json.unwrap_or(false)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# escola config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\ntimeout = \"{}\"\n# Optional. {} is used when unset.\n# token = \"...\"\n\n[list]\nitems_per_page = {}\nmax_pages_to_show = {}\nsearch_debounce = \"{}\"\n\n[ui]\n# students, teachers, classes, enrollments, or payments\nstart_tab = \"students\"\n\n[log]\n# Optional. Default is the platform state dir (for example ~/.local/state/escola/escola.log)\n# file = \"/absolute/path/to/escola.log\"\njson = false\n",
            path.display(),
            DEFAULT_API_BASE_URL,
            DEFAULT_API_TIMEOUT,
            TOKEN_ENV,
            escola_app::DEFAULT_ITEMS_PER_PAGE,
            escola_app::DEFAULT_MAX_PAGES_TO_SHOW,
            DEFAULT_SEARCH_DEBOUNCE,
        )
    }
}

fn positive_usize(value: Option<i64>, default: usize) -> usize {
    value
        .and_then(|value| usize::try_from(value).ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn positive_duration(path: &Path, key: &str, raw: &str) -> Result<()> {
    let parsed = parse_duration(raw)?;
    if parsed <= Duration::ZERO {
        bail!(
            "{} in {} must be positive, got {}",
            key,
            path.display(),
            raw
        );
    }
    Ok(())
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 400ms or 15s)")
}
