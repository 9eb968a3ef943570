//! Turns raw model output into song suggestions.
//!
//! Parsing is two-stage: the text is parsed as JSON as-is, and only if
//! that fails are markdown code fences stripped and parsing retried.
//! Each backend declares which JSON shape it accepts.

use serde_json::Value;

use crate::core::SongRef;

/// JSON shapes a backend's output may take.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResponseShape {
    /// `{"recommendations": [...]}` and nothing else
    RecommendationsField,
    /// A bare array, or an object with exactly one field holding an array
    SingleArray,
}

#[derive(Debug, PartialEq)]
pub enum ParseOutcome {
    Songs(Vec<SongRef>),
    Empty,
    Malformed { reason: String },
}

pub fn parse_suggestions(raw: &str, shape: ResponseShape) -> ParseOutcome {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Response was not directly parsable ({}), stripping code fences", e);
            match serde_json::from_str::<Value>(strip_code_fences(raw)) {
                Ok(value) => value,
                Err(e) => {
                    return ParseOutcome::Malformed {
                        reason: format!("invalid JSON after cleanup: {}", e),
                    };
                }
            }
        }
    };

    let entries = match extract_entries(value, shape) {
        Ok(entries) => entries,
        Err(reason) => return ParseOutcome::Malformed { reason },
    };

    let songs: Vec<SongRef> = entries.iter().filter_map(song_from_entry).collect();
    if songs.is_empty() {
        ParseOutcome::Empty
    } else {
        ParseOutcome::Songs(songs)
    }
}

/// Removes a leading ```` ``` ```` / ```` ```json ```` marker and a
/// trailing ```` ``` ````.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut content = raw.trim();
    if let Some(rest) = content.strip_prefix("```json") {
        content = rest;
    } else if let Some(rest) = content.strip_prefix("```") {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }
    content.trim()
}

fn extract_entries(value: Value, shape: ResponseShape) -> Result<Vec<Value>, String> {
    match (shape, value) {
        (ResponseShape::RecommendationsField, Value::Object(mut obj)) => {
            match obj.remove("recommendations") {
                Some(Value::Array(entries)) => Ok(entries),
                Some(_) => Err("\"recommendations\" is not an array".to_string()),
                None => Err("missing \"recommendations\" field".to_string()),
            }
        }
        (ResponseShape::RecommendationsField, _) => {
            Err("expected an object with a \"recommendations\" field".to_string())
        }
        (ResponseShape::SingleArray, Value::Array(entries)) => Ok(entries),
        (ResponseShape::SingleArray, Value::Object(obj)) if obj.len() == 1 => {
            match obj.into_iter().next() {
                Some((_, Value::Array(entries))) => Ok(entries),
                _ => Err("the only field is not an array".to_string()),
            }
        }
        (ResponseShape::SingleArray, _) => {
            Err("expected an array or an object with a single array field".to_string())
        }
    }
}

fn song_from_entry(entry: &Value) -> Option<SongRef> {
    let track = entry.get("track").and_then(as_text);
    let artist = entry.get("artist").and_then(as_text);
    match (track, artist) {
        (Some(track), Some(artist)) => Some(SongRef { track, artist }),
        _ => {
            tracing::warn!("Skipping invalid recommendation format: {}", entry);
            None
        }
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
