//! Engine configuration.
//!
//! The engine is configured per thread: [`install`] replaces the active
//! [`EngineConfig`] and [`current`] reads it. Configuration governs how
//! unhandled rejections escalate and the write semantics of contexts created
//! with `SharedData::new`.
//!
//! [`ConfigLoader`] assembles a configuration with precedence:
//! 1. Defaults (lowest)
//! 2. Config file
//! 3. Environment variables (`PROMISSORY_*` by default)
//! 4. Programmatic overrides (highest)
//!
//! The file format is `key = value` lines grouped in `[section]`s:
//!
//! ```text
//! [unhandled]
//! policy = log
//!
//! [shared]
//! scenario = merge
//! kind = defined
//! keys = user, trace
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::shared::{Scenario, StoreKind};

/// Default prefix for environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "PROMISSORY_";

/// What happens to a failure that reaches `done` without a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnhandledPolicy {
    /// Log at error level, then raise an `UnhandledRejection` panic.
    #[default]
    Panic,
    /// Log at error level only.
    Log,
}

impl std::str::FromStr for UnhandledPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "panic" | "raise" => Ok(Self::Panic),
            "log" => Ok(Self::Log),
            other => Err(format!("unknown unhandled-rejection policy: {other}")),
        }
    }
}

/// Per-thread engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Escalation policy for unhandled rejections.
    pub unhandled_rejection: UnhandledPolicy,
    /// Scenario of contexts created with `SharedData::new`.
    pub shared_scenario: Scenario,
    /// Key policy of contexts created with `SharedData::new`.
    pub shared_kind: StoreKind,
    /// Declared keys when `shared_kind` is defined-only.
    pub shared_keys: Vec<String>,
}

impl EngineConfig {
    /// Validates cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shared_kind == StoreKind::DefinedOnly && self.shared_keys.is_empty() {
            return Err(ConfigError::NoDeclaredKeys);
        }
        if self.shared_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Parse("shared keys must not be blank".into()));
        }
        Ok(())
    }
}

thread_local! {
    static CURRENT: RefCell<EngineConfig> = RefCell::new(EngineConfig::default());
}

/// Installs `config` for the current thread, returning the previous one.
pub fn install(config: EngineConfig) -> EngineConfig {
    CURRENT.with(|current| std::mem::replace(&mut *current.borrow_mut(), config))
}

/// Returns the configuration active on the current thread.
#[must_use]
pub fn current() -> EngineConfig {
    CURRENT.with(|current| current.borrow().clone())
}

/// Builder that loads an [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file_path: Option<PathBuf>,
    env_prefix: Option<String>,
    overrides: BTreeMap<String, String>,
}

impl ConfigLoader {
    /// Creates a loader reading `PROMISSORY_*` environment variables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            file_path: None,
            env_prefix: Some(DEFAULT_ENV_PREFIX.to_string()),
            overrides: BTreeMap::new(),
        }
    }

    /// Sets a file path for config loading.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Sets the environment variable prefix.
    #[must_use]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Disables environment overrides.
    #[must_use]
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Adds a programmatic override (highest precedence).
    ///
    /// Keys use the environment spelling without prefix, e.g.
    /// `SHARED_SCENARIO`.
    #[must_use]
    pub fn override_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> Result<EngineConfig, ConfigError> {
        let mut config = match &self.file_path {
            Some(path) => load_from_file(path)?,
            None => EngineConfig::default(),
        };

        if let Some(prefix) = &self.env_prefix {
            apply_env_overrides(&mut config, prefix)?;
        }
        apply_overrides(&mut config, &self.overrides)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error while reading configuration.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Parse error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Defined-only contexts need at least one declared key.
    #[error("shared kind `defined` requires at least one declared key")]
    NoDeclaredKeys,
    /// Unknown override key.
    #[error("invalid override: {0}")]
    InvalidOverride(String),
}

fn load_from_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents, EngineConfig::default())
}

fn apply_env_overrides(config: &mut EngineConfig, prefix: &str) -> Result<(), ConfigError> {
    let mut overrides = BTreeMap::new();
    for (key, value) in std::env::vars() {
        if let Some(stripped) = key.strip_prefix(prefix) {
            overrides.insert(stripped.to_string(), value);
        }
    }
    apply_overrides(config, &overrides)
}

fn apply_overrides(
    config: &mut EngineConfig,
    overrides: &BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    for (key, value) in overrides {
        apply_override(config, key, value)?;
    }
    Ok(())
}

fn apply_override(config: &mut EngineConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "UNHANDLED_POLICY" => config.unhandled_rejection = parse_policy(value, key)?,
        "SHARED_SCENARIO" => config.shared_scenario = parse_scenario(value, key)?,
        "SHARED_KIND" => config.shared_kind = parse_kind(value, key)?,
        "SHARED_KEYS" => config.shared_keys = parse_list(value),
        _ => return Err(ConfigError::InvalidOverride(key.to_string())),
    }
    Ok(())
}

fn parse_config(contents: &str, base: EngineConfig) -> Result<EngineConfig, ConfigError> {
    let mut config = base;
    let mut section = String::new();

    for (line_idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].trim().to_lowercase();
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| ConfigError::Parse(format!("line {}: {}", line_idx + 1, line)))?;
        let key = key.trim();
        let value = value.trim().trim_matches('"');

        match (section.as_str(), key) {
            ("unhandled", "policy") => config.unhandled_rejection = parse_policy(value, key)?,
            ("shared", "scenario") => config.shared_scenario = parse_scenario(value, key)?,
            ("shared", "kind") => config.shared_kind = parse_kind(value, key)?,
            ("shared", "keys") => config.shared_keys = parse_list(value),
            ("", _) => {
                return Err(ConfigError::Parse(format!(
                    "missing section for key: {key}"
                )))
            }
            _ => return Err(ConfigError::Parse(format!("unknown key: {section}.{key}"))),
        }
    }

    Ok(config)
}

fn parse_policy(value: &str, key: &str) -> Result<UnhandledPolicy, ConfigError> {
    value
        .parse()
        .map_err(|err| ConfigError::Parse(format!("invalid value for {key}: {err}")))
}

fn parse_scenario(value: &str, key: &str) -> Result<Scenario, ConfigError> {
    value
        .parse()
        .map_err(|err| ConfigError::Parse(format!("invalid value for {key}: {err}")))
}

fn parse_kind(value: &str, key: &str) -> Result<StoreKind, ConfigError> {
    value
        .parse()
        .map_err(|err| ConfigError::Parse(format!("invalid value for {key}: {err}")))
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
