// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

pub const LOG_ENV: &str = "VITRINE_LOG";

/// Installs the global subscriber. Output goes to a file because the
/// terminal belongs to the UI. Returns the log path.
pub fn init(config: &Config) -> Result<PathBuf> {
    let path = config.log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| {
            format!(
                "open log file {}; set [log].file to a writable path",
                path.display()
            )
        })?;

    let from_env = env::var(LOG_ENV).ok();
    let directives = filter_directives(from_env.as_deref(), config.log_level());
    let filter = EnvFilter::try_new(directives)
        .with_context(|| format!("parse log filter {directives:?} (from {LOG_ENV} or [log].level)"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    Ok(path)
}

/// `VITRINE_LOG` wins over the configured level when it is set and not blank.
fn filter_directives<'a>(from_env: Option<&'a str>, level: &'a str) -> &'a str {
    match from_env.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives,
        _ => level,
    }
}

#[cfg(test)]
mod tests {
    use super::filter_directives;

    #[test]
    fn env_directives_override_the_configured_level() {
        assert_eq!(
            filter_directives(Some("vitrine_client=debug"), "info"),
            "vitrine_client=debug"
        );
        assert_eq!(filter_directives(Some("  "), "warn"), "warn");
        assert_eq!(filter_directives(None, "error"), "error");
    }
}
