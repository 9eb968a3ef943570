//! Prompts for the recommendation conversation, rendered with
//! Handlebars. Song names come from the user's library and from model
//! output, so escaping is turned off and nothing else is registered.

use std::fmt;

use anyhow::Result;
use handlebars::{Handlebars, no_escape};
use serde_json::json;

use crate::core::SongRef;

#[derive(Debug)]
pub enum Prompt {
    SeedRequest,
    FollowUp,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const SEED_REQUEST_PROMPT: &str = r#"You are a music recommendation assistant. I will provide you with a list of songs I like.
Based on this list, please recommend {{count}} additional songs that I might enjoy.
It's important that your response is ONLY valid JSON: an object with a "recommendations" array of objects, where each object has a "track" key (song title) and an "artist" key (artist name).
Format example:
{
  "recommendations": [
    {"track": "Bohemian Rhapsody", "artist": "Queen"},
    {"track": "Imagine", "artist": "John Lennon"},
    {"track": "Smells Like Teen Spirit", "artist": "Nirvana"}
  ]
}
Do not include any other text, explanations, or markdown formatting outside of the JSON.

Here are some songs I like:
{{#each liked}}
- "{{track}}" by {{artist}}
{{/each}}

Please provide {{count}} new song recommendations in the specified JSON format."#;

const FOLLOW_UP_PROMPT: &str = r#"Okay, thank you. Now, please provide {{count}} MORE unique song recommendations based on the initial list of songs I like (provided at the start of our conversation).
It is very important that these new recommendations are different from any songs you've already suggested to me in this conversation. For reference, here are the songs you've suggested so far (please avoid these):
{{#each suggested}}
- "{{track}}" by {{artist}}
{{else}}
(None previously suggested in this session)
{{/each}}

Also, ensure these new recommendations are different from the initial list of liked songs I provided.
Your response must be ONLY valid JSON with a "recommendations" array of objects with "track" and "artist" keys, as before."#;

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(no_escape);
    registry
        .register_template_string(&Prompt::SeedRequest.to_string(), SEED_REQUEST_PROMPT)
        .expect("Failed to register template");
    registry
        .register_template_string(&Prompt::FollowUp.to_string(), FOLLOW_UP_PROMPT)
        .expect("Failed to register template");
    registry
}

/// First user message: the liked-song sample and the output contract.
pub fn seed_prompt(count: usize, liked: &[SongRef]) -> Result<String> {
    let rendered = templates().render(
        &Prompt::SeedRequest.to_string(),
        &json!({"count": count, "liked": liked}),
    )?;
    Ok(rendered)
}

/// Every later user message: ask for more and list everything the
/// model has already proposed, spelled the way the model spelled it.
pub fn follow_up_prompt(count: usize, suggested: &[SongRef]) -> Result<String> {
    let rendered = templates().render(
        &Prompt::FollowUp.to_string(),
        &json!({"count": count, "suggested": suggested}),
    )?;
    Ok(rendered)
}
