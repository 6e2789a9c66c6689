// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "ESCOLA_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Sends logs to `path`; the terminal is owned by the list view.
pub fn init(path: &Path, json: bool) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {} -- set [log].file to move it", path.display()))?;

    let filter = env_filter(std::env::var(LOG_ENV).ok().as_deref())?;
    let layer = fmt::layer().with_writer(Mutex::new(file)).with_ansi(false);
    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
    };
    installed.map_err(|error| anyhow!("install log subscriber: {error}"))
}

fn env_filter(raw: Option<&str>) -> Result<EnvFilter> {
    let directive = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVE);
    EnvFilter::try_new(directive).with_context(|| format!("invalid {LOG_ENV} filter {directive:?}"))
}
