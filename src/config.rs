//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or an explicit path, else the file named by `BURSTBOT_CONFIG`), then applies
//! `BURSTBOT_LOG_LEVEL` and `BURSTBOT_TYPING_DELAY_MS` env overrides.
//! Anything the file leaves out falls back to the built-in cloudburst
//! assistant.

use std::{
    env,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde::Deserialize;

use crate::assistant::rules::RuleTable;
use crate::assistant::session::{self, SessionSettings};
use crate::error::AppError;
use crate::logger;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Display name of the assistant, shown in the console header.
    pub name: String,
    pub log_level: String,
    pub session: SessionSettings,
    /// Shared by every session mounted from this config.
    pub rules: Arc<RuleTable>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            session: SessionSettings::default(),
            rules: Arc::new(RuleTable::cloudburst()),
        }
    }
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    assistant: RawAssistant,
    /// `[[rules]]` array; match order is file order.
    #[serde(default)]
    rules: Option<Vec<RawRule>>,
}

#[derive(Deserialize)]
struct RawAssistant {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_typing_delay_ms")]
    typing_delay_ms: u64,
    #[serde(default)]
    greeting: Option<String>,
    #[serde(default)]
    suggested_prompts: Option<Vec<String>>,
    #[serde(default)]
    default_responses: Option<Vec<String>>,
}

impl Default for RawAssistant {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            typing_delay_ms: default_typing_delay_ms(),
            greeting: None,
            suggested_prompts: None,
            default_responses: None,
        }
    }
}

#[derive(Deserialize)]
struct RawRule {
    keyword: String,
    response: String,
}

fn default_name() -> String { "Cloudburst Detection Assistant".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_typing_delay_ms() -> u64 { session::DEFAULT_TYPING_DELAY.as_millis() as u64 }

/// Load config from `path`, `BURSTBOT_CONFIG` or `config/default.toml` (first
/// one set wins), then apply env-var overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let path = path
        .map(PathBuf::from)
        .or_else(|| env::var("BURSTBOT_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let log_level_override = env::var("BURSTBOT_LOG_LEVEL").ok();
    let delay_override = env::var("BURSTBOT_TYPING_DELAY_MS").ok();
    load_from(&path, log_level_override.as_deref(), delay_override.as_deref())
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    log_level_override: Option<&str>,
    typing_delay_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse(&raw, log_level_override, typing_delay_override)
        .map_err(|e| match e {
            AppError::Config(msg) => AppError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
}

fn parse(
    raw: &str,
    log_level_override: Option<&str>,
    typing_delay_override: Option<&str>,
) -> Result<Config, AppError> {
    let parsed: RawConfig = toml::from_str(raw)
        .map_err(|e| AppError::Config(format!("parse error: {e}")))?;
    let a = parsed.assistant;

    let log_level = log_level_override.unwrap_or(&a.log_level).to_string();
    logger::parse_level(&log_level)?;

    let typing_delay_ms = match typing_delay_override {
        Some(v) => v.trim().parse::<u64>().map_err(|e| {
            AppError::Config(format!("invalid typing delay override '{v}': {e}"))
        })?,
        None => a.typing_delay_ms,
    };

    let greeting = a.greeting.unwrap_or_else(|| session::DEFAULT_GREETING.to_string());
    if greeting.trim().is_empty() {
        return Err(AppError::Config("assistant.greeting must not be blank".into()));
    }

    let suggested_prompts = a.suggested_prompts.unwrap_or_else(|| {
        session::DEFAULT_SUGGESTED_PROMPTS.iter().map(|p| (*p).to_string()).collect()
    });
    if suggested_prompts.iter().any(|p| p.trim().is_empty()) {
        return Err(AppError::Config("assistant.suggested_prompts contains a blank entry".into()));
    }

    let builtin = RuleTable::cloudburst();
    let defaults = a.default_responses.unwrap_or_else(|| builtin.defaults().to_vec());
    let rules = match parsed.rules {
        Some(rules) => RuleTable::new(rules.into_iter().map(|r| (r.keyword, r.response)), defaults)?,
        None => RuleTable::new(
            builtin.rules().iter().map(|r| (r.keyword(), r.response().to_string())),
            defaults,
        )?,
    };

    Ok(Config {
        name: a.name,
        log_level,
        session: SessionSettings {
            greeting,
            suggested_prompts,
            typing_delay: Duration::from_millis(typing_delay_ms),
        },
        rules: Arc::new(rules),
    })
}
