//! Application-level configuration loading, including the game rules and the admin token.

use std::{collections::HashSet, env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::state::game::{Alphabet, Symbol};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "EMOJI_RECALL_CONFIG_PATH";
/// Environment variable that overrides the configured admin token.
const ADMIN_TOKEN_ENV: &str = "EMOJI_RECALL_ADMIN_TOKEN";

const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_REVEAL_SECONDS: u64 = 5;
const DEFAULT_TIME_BUDGET_SECONDS: u64 = 60;
const DEFAULT_INITIAL_LENGTH: usize = 3;
const DEFAULT_LEADERBOARD_TOP_N: usize = 10;
const DEFAULT_SWEEP_SECONDS: u64 = 5;

/// Gameplay parameters shared by every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRules {
    /// Sessions a player may start during the process lifetime.
    pub max_attempts: u32,
    /// How long a sequence stays on display before input opens.
    pub reveal_duration: Duration,
    /// Wall-clock budget of a whole session.
    pub time_budget: Duration,
    /// Length of the opening sequence of every session.
    pub initial_sequence_length: usize,
    /// Symbols sequences are drawn from.
    pub alphabet: Alphabet,
    /// Default number of leaderboard entries.
    pub leaderboard_top_n: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            reveal_duration: Duration::from_secs(DEFAULT_REVEAL_SECONDS),
            time_budget: Duration::from_secs(DEFAULT_TIME_BUDGET_SECONDS),
            initial_sequence_length: DEFAULT_INITIAL_LENGTH,
            alphabet: Alphabet::default(),
            leaderboard_top_n: DEFAULT_LEADERBOARD_TOP_N,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    rules: GameRules,
    admin_token: Option<String>,
    expiry_sweep_interval: Option<Duration>,
}

/// Reasons a configuration file is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for this schema.
    #[error("invalid config document: {0}")]
    Json(#[from] serde_json::Error),
    /// At least one attempt per player is required.
    #[error("maxAttemptsPerPlayer must be at least 1")]
    NoAttempts,
    /// The symbol list repeats a symbol.
    #[error("symbols must be distinct (duplicate `{0}`)")]
    DuplicateSymbol(String),
    /// Alphabet size does not fit the symbol list.
    #[error("alphabetSize {size} must be between 1 and the {available} configured symbols")]
    AlphabetSize {
        /// Requested alphabet size.
        size: usize,
        /// Symbols available.
        available: usize,
    },
    /// The opening sequence cannot be drawn from the alphabet.
    #[error("initialSequenceLength {length} must be between 1 and alphabetSize {size}")]
    InitialLength {
        /// Requested opening length.
        length: usize,
        /// Alphabet size.
        size: usize,
    },
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        alphabet = config.rules.alphabet.len(),
                        max_attempts = config.rules.max_attempts,
                        "loaded game configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        match env::var(ADMIN_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => config.with_admin_token(Some(token)),
            _ => config,
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let raw = serde_json::from_str::<RawConfig>(contents)?;
        Self::try_from(raw)
    }

    /// Gameplay parameters.
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Token required by administrative requests; `None` disables them.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    /// Period of the background expiry sweep; `None` keeps expiry purely lazy.
    pub fn expiry_sweep_interval(&self) -> Option<Duration> {
        self.expiry_sweep_interval
    }

    /// Replace the game rules.
    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the admin token.
    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token;
        self
    }

    /// Replace the expiry sweep period.
    pub fn with_expiry_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.expiry_sweep_interval = interval;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rules: GameRules::default(),
            admin_token: None,
            expiry_sweep_interval: Some(Duration::from_secs(DEFAULT_SWEEP_SECONDS)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    max_attempts_per_player: u32,
    reveal_duration_seconds: u64,
    session_time_budget_seconds: u64,
    initial_sequence_length: usize,
    /// Defaults to the number of symbols.
    alphabet_size: Option<usize>,
    leaderboard_top_n: usize,
    symbols: Vec<String>,
    expiry_sweep_interval_seconds: u64,
    admin_token: Option<String>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            max_attempts_per_player: DEFAULT_MAX_ATTEMPTS,
            reveal_duration_seconds: DEFAULT_REVEAL_SECONDS,
            session_time_budget_seconds: DEFAULT_TIME_BUDGET_SECONDS,
            initial_sequence_length: DEFAULT_INITIAL_LENGTH,
            alphabet_size: None,
            leaderboard_top_n: DEFAULT_LEADERBOARD_TOP_N,
            symbols: Alphabet::default()
                .symbols()
                .iter()
                .map(|symbol| symbol.to_string())
                .collect(),
            expiry_sweep_interval_seconds: DEFAULT_SWEEP_SECONDS,
            admin_token: None,
        }
    }
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        if value.max_attempts_per_player == 0 {
            return Err(ConfigError::NoAttempts);
        }

        let mut seen = HashSet::new();
        for symbol in &value.symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(ConfigError::DuplicateSymbol(symbol.clone()));
            }
        }

        let available = value.symbols.len();
        let alphabet_size = value.alphabet_size.unwrap_or(available);
        if alphabet_size == 0 || alphabet_size > available {
            return Err(ConfigError::AlphabetSize {
                size: alphabet_size,
                available,
            });
        }

        if value.initial_sequence_length == 0 || value.initial_sequence_length > alphabet_size {
            return Err(ConfigError::InitialLength {
                length: value.initial_sequence_length,
                size: alphabet_size,
            });
        }

        let alphabet = Alphabet::new(
            value
                .symbols
                .into_iter()
                .take(alphabet_size)
                .map(Symbol::new),
        );

        let rules = GameRules {
            max_attempts: value.max_attempts_per_player,
            reveal_duration: Duration::from_secs(value.reveal_duration_seconds),
            time_budget: Duration::from_secs(value.session_time_budget_seconds),
            initial_sequence_length: value.initial_sequence_length,
            alphabet,
            leaderboard_top_n: value.leaderboard_top_n,
        };

        let expiry_sweep_interval = match value.expiry_sweep_interval_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        };

        Ok(Self {
            rules,
            admin_token: value.admin_token.filter(|token| !token.trim().is_empty()),
            expiry_sweep_interval,
        })
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
