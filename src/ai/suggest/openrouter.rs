use std::time::Duration;

use async_trait::async_trait;

use super::{
    ProviderError, ResponseShape, SuggestionProvider, Suggestions, ensure_user_turn,
    into_suggestions, log_failure,
};
use crate::ai::transcript::Transcript;
use crate::core::ProviderSettings;
use crate::openai::{completion, message_content};

/// OpenRouter's OpenAI compatible endpoint. No JSON mode is requested,
/// so the model often wraps its answer in a markdown code fence and
/// picks its own key name for the array.
pub struct OpenRouterProvider {
    api_hostname: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenRouterProvider {
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            api_hostname: settings.api_hostname.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            timeout: settings.timeout,
        }
    }

    async fn try_request(&self, transcript: &Transcript) -> Result<Suggestions, ProviderError> {
        ensure_user_turn(transcript)?;
        println!(
            "\nSending request to {} ({}) with {} messages in history...",
            self.name(),
            self.model,
            transcript.len()
        );

        let resp = completion(
            transcript.messages(),
            None,
            &self.api_hostname,
            &self.api_key,
            &self.model,
            self.timeout,
        )
        .await?;

        let raw = message_content(&resp)
            .ok_or(ProviderError::MissingContent)?
            .to_string();

        Ok(into_suggestions(self.name(), raw, ResponseShape::SingleArray))
    }
}

#[async_trait]
impl SuggestionProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "OpenRouter"
    }

    async fn request(&self, transcript: &Transcript) -> Suggestions {
        match self.try_request(transcript).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                log_failure(self.name(), &e);
                Suggestions::default()
            }
        }
    }
}
