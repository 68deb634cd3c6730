//! Configuration loading and the static command table.
//!
//! The command table is data, not code: each `[[commands]]` entry names an
//! invocation token, the handler id it binds to, and per-argument validation
//! rules. Entries are compiled once at startup into [`CommandTable`]; an
//! invalid pattern or a missing bot token is a fatal startup condition, not
//! a runtime error.

use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Track started when play is issued with an empty queue and no arguments.
const DEFAULT_TRACK: &str = "https://www.youtube.com/watch?v=rEq1Z0bjdwc";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("bot token is not set")]
    MissingToken,

    #[error("invalid argument pattern for command {command:?}: {source}")]
    BadPattern {
        command: String,
        #[source]
        source: regex::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot identity and playback settings.
    pub bot: BotConfig,
    /// Dispatch failure policy.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Timeouts for provider suspension points and teardown.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    /// Command descriptor entries.
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        if config.bot.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(config)
    }
}

/// Bot identity and playback settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Platform authentication token. Must be non-empty.
    pub token: String,
    /// Command prefix character (default `!`).
    #[serde(default = "default_prefix")]
    pub prefix: char,
    /// Track used by play with an empty queue and no arguments.
    #[serde(default = "default_track")]
    pub default_track: String,
}

/// Dispatch failure policy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchConfig {
    /// When true, unknown commands and failed validation produce a short
    /// reply instead of failing silently. Off by default for compatibility
    /// with the silent fail-closed behavior.
    #[serde(default)]
    pub reply_on_error: bool,
}

/// Timeouts for provider suspension points and teardown, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    /// Joining a voice channel.
    #[serde(default = "default_timeout_secs")]
    pub join_secs: u64,
    /// Opening and starting a stream source.
    #[serde(default = "default_timeout_secs")]
    pub open_secs: u64,
    /// Waiting for module teardown hooks on terminate.
    #[serde(default = "default_timeout_secs")]
    pub teardown_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            join_secs: default_timeout_secs(),
            open_secs: default_timeout_secs(),
            teardown_secs: default_timeout_secs(),
        }
    }
}

impl TimeoutsConfig {
    pub fn join(&self) -> Duration {
        Duration::from_secs(self.join_secs)
    }

    pub fn open(&self) -> Duration {
        Duration::from_secs(self.open_secs)
    }

    pub fn teardown(&self) -> Duration {
        Duration::from_secs(self.teardown_secs)
    }
}

fn default_prefix() -> char {
    '!'
}

fn default_track() -> String {
    DEFAULT_TRACK.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// One `[[commands]]` entry as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandEntry {
    /// Invocation token (matched case-insensitively after the prefix).
    pub name: String,
    /// Handler id this command binds to.
    pub handler: String,
    /// Human-readable description shown by help.
    #[serde(default)]
    pub description: String,
    /// Minimum number of arguments required.
    #[serde(default)]
    pub required_args: usize,
    /// Positional argument validation rules.
    #[serde(default, rename = "args")]
    pub args: Vec<ArgRuleEntry>,
}

/// One positional argument rule as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ArgRuleEntry {
    /// Regex the argument must match.
    pub pattern: String,
    /// When false, the argument is lowercased before matching (and the
    /// handler receives the lowercased form).
    #[serde(default)]
    pub case_sensitive: bool,
}

/// A compiled positional argument rule.
#[derive(Debug)]
pub struct ArgRule {
    pub pattern: Regex,
    pub case_sensitive: bool,
}

/// Static, immutable definition of one command.
#[derive(Debug)]
pub struct CommandDescriptor {
    /// Invocation token, stored lowercase.
    pub name: String,
    /// Handler id used to bind a registered handler.
    pub handler_id: String,
    pub description: String,
    pub required_args: usize,
    pub arg_rules: Vec<ArgRule>,
}

/// The command descriptor table, compiled once at startup and never mutated.
#[derive(Debug, Default)]
pub struct CommandTable {
    descriptors: Vec<CommandDescriptor>,
}

impl CommandTable {
    /// Compile the configured entries, validating every argument pattern.
    pub fn compile(entries: &[CommandEntry]) -> Result<Self, ConfigError> {
        let mut descriptors = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut arg_rules = Vec::with_capacity(entry.args.len());
            for rule in &entry.args {
                let pattern =
                    Regex::new(&rule.pattern).map_err(|source| ConfigError::BadPattern {
                        command: entry.name.clone(),
                        source,
                    })?;
                arg_rules.push(ArgRule {
                    pattern,
                    case_sensitive: rule.case_sensitive,
                });
            }
            descriptors.push(CommandDescriptor {
                name: entry.name.to_lowercase(),
                handler_id: entry.handler.clone(),
                description: entry.description.clone(),
                required_args: entry.required_args,
                arg_rules,
            });
        }
        Ok(Self { descriptors })
    }

    /// Look up a descriptor by invocation token (case-insensitive).
    pub fn by_name(&self, name: &str) -> Option<&CommandDescriptor> {
        let lower = name.to_lowercase();
        self.descriptors.iter().find(|d| d.name == lower)
    }

    /// Whether any descriptor references the given handler id.
    pub fn references(&self, handler_id: &str) -> bool {
        self.descriptors.iter().any(|d| d.handler_id == handler_id)
    }

    /// Descriptors in declaration order (help listing).
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
