//! Suggestion providers: send the transcript to an LLM, get back song
//! suggestions plus the raw reply text.
//!
//! Providers never retry and never fail loudly. Every error is logged
//! and turned into an empty `Suggestions`, leaving retry policy to the
//! recommendation loop.

pub mod openai;
pub mod openrouter;
pub mod parse;

pub use openai::OpenAiProvider;
pub use openrouter::OpenRouterProvider;
pub use parse::{ParseOutcome, ResponseShape, parse_suggestions};

use async_trait::async_trait;
use thiserror::Error;

use crate::ai::transcript::Transcript;
use crate::core::{ProviderKind, ProviderSettings, SongRef};
use crate::openai::CompletionError;

/// What a provider call produced. `raw` is the model's reply verbatim
/// and is present whenever the model replied, even if nothing in it
/// could be parsed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Suggestions {
    pub songs: Vec<SongRef>,
    pub raw: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transcript is empty or does not end with a user message")]
    InvalidTranscript,
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("response contained no message content")]
    MissingContent,
}

#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn request(&self, transcript: &Transcript) -> Suggestions;
}

pub type BoxedProvider = Box<dyn SuggestionProvider>;

/// Provider for the backend selected in the config.
pub fn build_provider(settings: &ProviderSettings) -> BoxedProvider {
    match settings.kind {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(settings)),
        ProviderKind::OpenRouter => Box::new(OpenRouterProvider::new(settings)),
    }
}

pub(crate) fn ensure_user_turn(transcript: &Transcript) -> Result<(), ProviderError> {
    if transcript.awaits_reply() {
        Ok(())
    } else {
        Err(ProviderError::InvalidTranscript)
    }
}

/// Parses a reply with the backend's accepted shape. Malformed replies
/// still hand back the raw text so the caller can keep it in history.
pub(crate) fn into_suggestions(provider: &str, raw: String, shape: ResponseShape) -> Suggestions {
    match parse_suggestions(&raw, shape) {
        ParseOutcome::Songs(songs) => {
            println!(
                "Received {} validly structured recommendations from {}.",
                songs.len(),
                provider
            );
            Suggestions {
                songs,
                raw: Some(raw),
            }
        }
        ParseOutcome::Empty => {
            tracing::warn!("{} replied without any usable recommendations", provider);
            Suggestions {
                songs: Vec::new(),
                raw: Some(raw),
            }
        }
        ParseOutcome::Malformed { reason } => {
            tracing::error!("{} response could not be parsed: {}", provider, reason);
            tracing::debug!("{} raw response:\n{}", provider, raw);
            Suggestions {
                songs: Vec::new(),
                raw: Some(raw),
            }
        }
    }
}

pub(crate) fn log_failure(provider: &str, err: &ProviderError) {
    match err {
        ProviderError::Completion(e) if e.is_timeout() => {
            tracing::error!("{} request timed out: {}", provider, e)
        }
        _ => tracing::error!("Error calling {}: {}", provider, err),
    }
}
