use reqwest::Url;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schedule::Schedule;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Malformed config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "Notice")]
    pub notice: Notice,
    #[serde(alias = "Log")]
    pub log: LogConfig,
}

/// Account credentials and which checks to run.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Notice {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Password")]
    pub password: String,
    #[serde(alias = "IPv4")]
    pub ipv4: bool,
    #[serde(alias = "IPv6")]
    pub ipv6: bool,
    /// Empty means run once and exit.
    #[serde(alias = "Cron")]
    pub cron: String,
}

impl Default for Notice {
    fn default() -> Self {
        Notice {
            id: String::new(),
            password: String::new(),
            ipv4: true,
            ipv6: true,
            cron: String::new(),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct LogConfig {
    #[serde(alias = "Slack")]
    pub slack: SlackConfig,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct SlackConfig {
    #[serde(alias = "Enable")]
    pub enable: bool,
    #[serde(alias = "HookURL", alias = "hookurl")]
    pub hook_url: String,
}

impl Config {
    /// The parsed schedule, or `None` in run-once mode.
    pub fn schedule(&self) -> Result<Option<Schedule>, ConfigError> {
        let expr = self.notice.cron.trim();
        if expr.is_empty() {
            return Ok(None);
        }
        Schedule::parse(expr)
            .map(Some)
            .map_err(|error| ConfigError::Invalid(format!("cron expression '{expr}': {error}")))
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&contents)?;
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config.schedule()?;

    let slack = &config.log.slack;
    if slack.enable {
        if slack.hook_url.is_empty() {
            return Err(ConfigError::Invalid(
                "slack is enabled but no hook_url is set".to_string(),
            ));
        }
        let valid = Url::parse(&slack.hook_url)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false);
        if !valid {
            return Err(ConfigError::Invalid(format!(
                "slack hook_url must be an http(s) URL, got '{}'",
                slack.hook_url
            )));
        }
    }
    Ok(())
}
