//! Runtime configuration, read from the environment (and `.env`).

use crate::puzzle::PuzzleError;
use crate::translate::{TokenError, DEFAULT_TOKEN_URL, DEFAULT_TRANSLATE_URL};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DICTIONARY: &str = "/usr/share/dict/words";
pub const DEFAULT_SPEAKER_COUNT: u32 = 3;

/// Errors that prevent the server from starting
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No credentials configured. Set CROSSCHAT_CREDENTIALS to a service-account JSON file")]
    MissingCredentials,

    #[error("Failed to load credentials from {path}: {reason}")]
    Credentials { path: PathBuf, reason: String },

    #[error("Invalid credentials: {0}")]
    Signing(#[from] TokenError),

    #[error("No reference text configured. Set CROSSCHAT_REFERENCE_TEXT")]
    MissingReferenceText,

    #[error("Failed to read {what} from {path}: {source}")]
    File {
        what: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Puzzle(#[from] PuzzleError),

    #[error("Failed to set up translation client: {0}")]
    Client(String),

    #[error("Speaker count must be at least 1")]
    InvalidSpeakerCount,
}

/// Pacing of the mayor's script
#[derive(Debug, Clone, PartialEq)]
pub struct GameTiming {
    /// Wait after the first client shows up before the intro
    pub start_delay: Duration,
    /// Pause after the intro
    pub intro_pause: Duration,
    /// How long each clue stays open
    pub clue_timeout: Duration,
    /// Pause after "come back later"
    pub retry_pause: Duration,
}

impl Default for GameTiming {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_secs(10),
            intro_pause: Duration::from_secs(2),
            clue_timeout: Duration::from_secs(30),
            retry_pause: Duration::from_secs(3),
        }
    }
}

/// Settings shared by every team's game
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub speaker_count: u32,
    pub timing: GameTiming,
    /// Allow `N:` prefixes to speak as any role
    pub debug: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            speaker_count: DEFAULT_SPEAKER_COUNT,
            timing: GameTiming::default(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_port: u16,
    pub debug: bool,
    pub credentials_path: Option<PathBuf>,
    pub reference_text_path: Option<PathBuf>,
    pub dictionary_path: PathBuf,
    pub puzzle_path: Option<PathBuf>,
    /// Served under /chatdebug in debug mode
    pub debug_dir: PathBuf,
    pub speaker_count: u32,
    pub timing: GameTiming,
    pub translate_url: String,
    pub token_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_port: 2007,
            debug: false,
            credentials_path: None,
            reference_text_path: None,
            dictionary_path: PathBuf::from(DEFAULT_DICTIONARY),
            puzzle_path: None,
            debug_dir: PathBuf::from("."),
            speaker_count: DEFAULT_SPEAKER_COUNT,
            timing: GameTiming::default(),
            translate_url: DEFAULT_TRANSLATE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Trimmed env var, treating empty as unset
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = env_string(key)?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, %value, "Ignoring unparsable environment variable");
            None
        }
    }
}

/// Longest pause or timeout accepted from the environment
pub const MAX_CONFIGURED_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

fn env_secs(key: &str, default: Duration) -> Duration {
    let Some(secs) = env_parse::<f64>(key) else {
        return default;
    };
    if secs.is_finite() && secs > MAX_CONFIGURED_DURATION.as_secs_f64() {
        tracing::warn!(key, secs, "Duration too long, capping");
        return MAX_CONFIGURED_DURATION;
    }
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => duration,
        Err(_) => {
            tracing::warn!(key, secs, "Ignoring invalid duration");
            default
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timing = GameTiming {
            start_delay: env_secs("CROSSCHAT_START_DELAY", defaults.timing.start_delay),
            intro_pause: env_secs("CROSSCHAT_INTRO_PAUSE", defaults.timing.intro_pause),
            clue_timeout: env_secs("CROSSCHAT_CLUE_TIMEOUT", defaults.timing.clue_timeout),
            retry_pause: env_secs("CROSSCHAT_RETRY_PAUSE", defaults.timing.retry_pause),
        };

        let config = Self {
            listen_port: env_parse("CROSSCHAT_LISTEN_PORT").unwrap_or(defaults.listen_port),
            debug: env_string("CROSSCHAT_DEBUG")
                .map(|v| v != "0" && v.to_lowercase() != "false")
                .unwrap_or(false),
            credentials_path: env_string("CROSSCHAT_CREDENTIALS").map(PathBuf::from),
            reference_text_path: env_string("CROSSCHAT_REFERENCE_TEXT").map(PathBuf::from),
            dictionary_path: env_string("CROSSCHAT_DICTIONARY")
                .map(PathBuf::from)
                .unwrap_or(defaults.dictionary_path),
            puzzle_path: env_string("CROSSCHAT_PUZZLE").map(PathBuf::from),
            debug_dir: env_string("CROSSCHAT_DEBUG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.debug_dir),
            speaker_count: env_parse("CROSSCHAT_SPEAKER_COUNT").unwrap_or(defaults.speaker_count),
            timing,
            translate_url: env_string("CROSSCHAT_TRANSLATE_URL").unwrap_or(defaults.translate_url),
            token_url: env_string("CROSSCHAT_TOKEN_URL").unwrap_or(defaults.token_url),
        };

        tracing::info!(
            listen_port = config.listen_port,
            debug = config.debug,
            speaker_count = config.speaker_count,
            "Configuration loaded"
        );
        config
    }

    /// Shared per-team settings
    pub fn game_config(&self) -> Result<GameConfig, ConfigError> {
        if self.speaker_count == 0 {
            return Err(ConfigError::InvalidSpeakerCount);
        }
        Ok(GameConfig {
            speaker_count: self.speaker_count,
            timing: self.timing.clone(),
            debug: self.debug,
        })
    }
}
