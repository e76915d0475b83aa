//! The two LLM engines behind a turn.
//!
//! The director decides what happens (structured JSON, solution-aware); the
//! narrator renders the decided event as a spoken scene (structured JSON,
//! solution-blind). Both are traits so tests can script them.

mod director;
mod narrator;

pub use director::{
    Director, DirectorDecision, EventType, GeneratedItem, GeneratedNpc, LlmDirector,
    NarratorEvent, DIRECTOR_TEMPERATURE, DIRECTOR_TIMEOUT_SECS,
};
pub use narrator::{
    LlmNarrator, Narrator, Scene, ScriptLine, NARRATOR_SPEAKER, NARRATOR_TEMPERATURE,
    NARRATOR_TIMEOUT_SECS,
};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from the decision or rendering engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("API error: {0}")]
    Api(#[from] openai::Error),

    #[error("Engine call timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),
}

/// Parse a model reply as a JSON document of type `T`.
///
/// Models occasionally wrap JSON in a markdown code fence even in JSON mode;
/// strip that before parsing. Anything that does not validate against the
/// schema is an error, never a partial result.
pub(crate) fn parse_json_reply<T: DeserializeOwned>(content: &str) -> Result<T, EngineError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_start_matches('\n'))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim()).map_err(|e| EngineError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Doc {
        value: u32,
    }

    #[test]
    fn test_parse_plain_json() {
        let doc: Doc = parse_json_reply(r#"{"value": 3}"#).unwrap();
        assert_eq!(doc.value, 3);
    }

    #[test]
    fn test_parse_fenced_json() {
        let doc: Doc = parse_json_reply("```json\n{\"value\": 7}\n```").unwrap();
        assert_eq!(doc.value, 7);
    }

    #[test]
    fn test_parse_garbage_is_error() {
        let result: Result<Doc, _> = parse_json_reply("the piano is locked");
        assert!(matches!(result, Err(EngineError::InvalidResponse(_))));
    }
}
