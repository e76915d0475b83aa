//! The rendering engine.
//!
//! Takes the director's solution-blind event and turns it into a short
//! radio-drama scene: an ordered script of spoken lines. The narrator never
//! sees the solution, the memory store, or the world state document.

use super::{parse_json_reply, EngineError};
use crate::engine::NarratorEvent;
use async_trait::async_trait;
use openai::{Message, OpenAi, Request};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const NARRATOR_TIMEOUT_SECS: u64 = 30;
pub const NARRATOR_TEMPERATURE: f32 = 0.8;

const NARRATOR_MAX_TOKENS: usize = 1200;

/// Speaker name reserved for narration lines.
pub const NARRATOR_SPEAKER: &str = "Narrator";

/// One spoken line in a rendered scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptLine {
    /// "Narrator" or a character name.
    pub speaker: String,

    /// Delivery note ("weary", "sharp", ...).
    #[serde(default)]
    pub style: Option<String>,

    pub text: String,

    /// Reserved for synthesized audio. Carried on the wire, never filled.
    #[serde(default)]
    pub audio: Option<String>,
}

impl ScriptLine {
    pub fn narration(text: impl Into<String>) -> Self {
        Self {
            speaker: NARRATOR_SPEAKER.to_string(),
            style: None,
            text: text.into(),
            audio: None,
        }
    }

    pub fn spoken(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            style: None,
            text: text.into(),
            audio: None,
        }
    }

    /// Whether this is a character line rather than narration.
    pub fn is_dialogue(&self) -> bool {
        self.speaker != NARRATOR_SPEAKER
    }
}

/// A rendered scene: the ordered script for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub lines: Vec<ScriptLine>,
}

/// The rendering engine interface.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn render(&self, event: &NarratorEvent) -> Result<Scene, EngineError>;
}

/// LLM-backed narrator.
pub struct LlmNarrator {
    client: OpenAi,
    model: Option<String>,
}

impl LlmNarrator {
    pub fn new(client: OpenAi) -> Self {
        Self {
            client,
            model: None,
        }
    }

    /// Override the model for this engine.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[async_trait]
impl Narrator for LlmNarrator {
    async fn render(&self, event: &NarratorEvent) -> Result<Scene, EngineError> {
        let payload = serde_json::to_string_pretty(event)
            .map_err(|e| EngineError::InvalidResponse(e.to_string()))?;

        let mut request = Request::new(vec![
            Message::system(include_str!("prompts/narrator.txt")),
            Message::user(payload),
        ])
        .with_temperature(NARRATOR_TEMPERATURE)
        .with_max_tokens(NARRATOR_MAX_TOKENS)
        .with_json_response();

        if let Some(ref model) = self.model {
            request = request.with_model(model);
        }

        let response = tokio::time::timeout(
            Duration::from_secs(NARRATOR_TIMEOUT_SECS),
            self.client.complete(request),
        )
        .await
        .map_err(|_| EngineError::Timeout(NARRATOR_TIMEOUT_SECS))??;

        let scene: Scene = parse_json_reply(&response.content)?;
        if scene.lines.is_empty() {
            return Err(EngineError::InvalidResponse(
                "scene contained no lines".to_string(),
            ));
        }
        tracing::debug!(lines = scene.lines.len(), "Narrator rendered scene");
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_parses() {
        let raw = r#"{
            "lines": [
                {"speaker": "Narrator", "style": "low", "text": "The rain lets up."},
                {"speaker": "Sal", "style": "tired", "text": "We're closed, detective."}
            ]
        }"#;
        let scene: Scene = parse_json_reply(raw).unwrap();
        assert_eq!(scene.lines.len(), 2);
        assert!(!scene.lines[0].is_dialogue());
        assert!(scene.lines[1].is_dialogue());
        assert!(scene.lines[0].audio.is_none());
    }

    #[test]
    fn test_scene_rejects_wrong_shape() {
        let result: Result<Scene, _> = parse_json_reply(r#"{"script": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_line_constructors() {
        let narration = ScriptLine::narration("Smoke hangs in the air.");
        assert_eq!(narration.speaker, NARRATOR_SPEAKER);

        let spoken = ScriptLine::spoken("Miriam Kline", "I was restringing the piano.");
        assert!(spoken.is_dialogue());
    }
}
