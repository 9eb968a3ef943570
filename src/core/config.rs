use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_NEW_PLAYLIST_NAME: &str = "New AI Recommendations";
pub const DEFAULT_HISTORY_PLAYLIST_NAME: &str = "All AI Recommendations";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing env var {0}")]
    Missing(&'static str),
    #[error("Missing an LLM API key. Set OPENAI_API_KEY or OPENROUTER_API_KEY")]
    NoProviderKey,
    #[error("Unknown provider '{0}'. Expected 'openai' or 'openrouter'")]
    UnknownProvider(String),
    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    OpenRouter,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "OpenAI"),
            ProviderKind::OpenRouter => write!(f, "OpenRouter"),
        }
    }
}

/// Everything needed to talk to the selected suggestion backend.
#[derive(Clone, Debug)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_hostname: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

/// Knobs for the recommendation loop.
#[derive(Clone, Debug)]
pub struct LoopSettings {
    /// Number of new songs to collect
    pub target_count: usize,
    /// Upper bound on provider calls for one session
    pub max_attempts: usize,
    /// Max liked songs included in the seed prompt
    pub seed_sample_cap: usize,
    /// Wait after an attempt that produced no suggestions
    pub retry_backoff: Duration,
    /// Wait between attempts that did produce suggestions
    pub attempt_pause: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            target_count: 20,
            max_attempts: 10,
            seed_sample_cap: 200,
            retry_backoff: Duration::from_secs(3),
            attempt_pause: Duration::from_secs(2),
        }
    }
}

/// Delays inserted between catalog calls to stay under the rate limit.
#[derive(Clone, Debug)]
pub struct Pacing {
    pub page_delay: Duration,
    pub search_delay: Duration,
    pub write_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_millis(50),
            search_delay: Duration::from_millis(50),
            write_delay: Duration::from_millis(100),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            page_delay: Duration::ZERO,
            search_delay: Duration::ZERO,
            write_delay: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: String,
    pub token_cache_path: PathBuf,
    pub provider: ProviderSettings,
    pub new_playlist_name: String,
    pub history_playlist_name: String,
    pub loop_settings: LoopSettings,
    pub pacing: Pacing,
}

impl AppConfig {
    /// Reads the config from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values are
    /// treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        // Spotipy's variable names are accepted so an existing .env keeps working
        let require = |key: &'static str, legacy: &str| {
            get(key)
                .or_else(|| get(legacy))
                .ok_or(ConfigError::Missing(key))
        };

        let spotify_client_id = require("SPOTIFY_CLIENT_ID", "SPOTIPY_CLIENT_ID")?;
        let spotify_client_secret = require("SPOTIFY_CLIENT_SECRET", "SPOTIPY_CLIENT_SECRET")?;
        let spotify_redirect_uri = require("SPOTIFY_REDIRECT_URI", "SPOTIPY_REDIRECT_URI")?;

        let openai_api_key = get("OPENAI_API_KEY");
        let openrouter_api_key = get("OPENROUTER_API_KEY");

        let kind = match get("MIXTAPE_PROVIDER") {
            Some(name) => name.parse::<ProviderKind>()?,
            None if openai_api_key.is_some() => ProviderKind::OpenAi,
            None if openrouter_api_key.is_some() => ProviderKind::OpenRouter,
            None => return Err(ConfigError::NoProviderKey),
        };

        let timeout_secs = match get("MIXTAPE_PROVIDER_TIMEOUT_SECS") {
            Some(v) => v.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: "MIXTAPE_PROVIDER_TIMEOUT_SECS",
                value: v.clone(),
            })?,
            None => 60,
        };
        let timeout = Duration::from_secs(timeout_secs);

        let provider = match kind {
            ProviderKind::OpenAi => ProviderSettings {
                kind,
                api_key: openai_api_key.ok_or(ConfigError::Missing("OPENAI_API_KEY"))?,
                api_hostname: get("MIXTAPE_OPENAI_HOST")
                    .unwrap_or_else(|| "https://api.openai.com".to_string()),
                model: get("MIXTAPE_OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
                timeout,
            },
            ProviderKind::OpenRouter => ProviderSettings {
                kind,
                api_key: openrouter_api_key.ok_or(ConfigError::Missing("OPENROUTER_API_KEY"))?,
                api_hostname: get("MIXTAPE_OPENROUTER_HOST")
                    .unwrap_or_else(|| "https://openrouter.ai/api".to_string()),
                model: get("MIXTAPE_OPENROUTER_MODEL")
                    .unwrap_or_else(|| "google/gemini-2.5-flash-preview".to_string()),
                timeout,
            },
        };

        let token_cache_path = PathBuf::from(
            get("MIXTAPE_TOKEN_CACHE").unwrap_or_else(|| ".spotify_cache".to_string()),
        );
        let new_playlist_name =
            get("MIXTAPE_NEW_PLAYLIST").unwrap_or_else(|| DEFAULT_NEW_PLAYLIST_NAME.to_string());
        let history_playlist_name = get("MIXTAPE_HISTORY_PLAYLIST")
            .unwrap_or_else(|| DEFAULT_HISTORY_PLAYLIST_NAME.to_string());

        Ok(Self {
            spotify_client_id,
            spotify_client_secret,
            spotify_redirect_uri,
            token_cache_path,
            provider,
            new_playlist_name,
            history_playlist_name,
            loop_settings: LoopSettings::default(),
            pacing: Pacing::default(),
        })
    }
}
