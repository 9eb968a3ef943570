use std::time::Duration;

use async_trait::async_trait;

use super::{
    ProviderError, ResponseShape, SuggestionProvider, Suggestions, ensure_user_turn,
    into_suggestions, log_failure,
};
use crate::ai::transcript::Transcript;
use crate::core::ProviderSettings;
use crate::openai::{ResponseFormat, completion, message_content};

/// OpenAI chat completions in JSON mode. The reply must be an object
/// with a `recommendations` array.
pub struct OpenAiProvider {
    api_hostname: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiProvider {
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
            "\nSending request to {} with {} messages...",
            self.name(),
            transcript.len()
        );

        let resp = completion(
            transcript.messages(),
            Some(ResponseFormat::JsonObject),
            &self.api_hostname,
            &self.api_key,
            &self.model,
            self.timeout,
        )
        .await?;

        let raw = message_content(&resp)
            .ok_or(ProviderError::MissingContent)?
            .to_string();

        Ok(into_suggestions(
            self.name(),
            raw,
            ResponseShape::RecommendationsField,
        ))
    }
}

#[async_trait]
impl SuggestionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "OpenAI"
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
