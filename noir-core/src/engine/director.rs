//! The decision engine.
//!
//! One call per turn. The director sees everything (the secret solution, the
//! physics rules, the memory context, the world state document, recent
//! history) and returns a single structured decision. Its output is validated
//! against the schema here; anything malformed aborts the turn.

use super::{parse_json_reply, EngineError};
use crate::case::CaseFile;
use crate::memory::MemoryContext;
use crate::world::{ConversationEntry, WorldState};
use async_trait::async_trait;
use openai::{Message, OpenAi, Request};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub const DIRECTOR_TIMEOUT_SECS: u64 = 45;
pub const DIRECTOR_TEMPERATURE: f32 = 0.6;

const DIRECTOR_MAX_TOKENS: usize = 2000;

/// What kind of beat the narrator should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    LocationReveal,
    ItemFound,
    ItemInspected,
    ItemTaken,
    NpcDialogue,
    ActionBlocked,
    FlavorMoment,
}

/// The solution-blind event handed from the director to the narrator.
///
/// This is the only thing the narrator ever sees, so nothing in it may leak
/// the solution beyond what the director chose to reveal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarratorEvent {
    pub event_type: EventType,

    /// Factual description of what happened, for the narrator to dramatize.
    pub description: String,

    /// Names of items the players can currently see.
    #[serde(default)]
    pub items_visible: Vec<String>,

    /// Names of NPCs present in the scene.
    #[serde(default)]
    pub npcs_present: Vec<String>,

    /// Speaking NPC, for npc_dialogue events.
    #[serde(default)]
    pub npc_name: Option<String>,

    /// What the NPC says, verbatim or paraphrased by the narrator.
    #[serde(default)]
    pub dialogue: Option<String>,

    /// Emotional register for the speaking NPC.
    #[serde(default)]
    pub npc_emotion: Option<String>,

    /// Why the action failed, for action_blocked events.
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// An item the director invented this turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub portable: bool,
    pub category: String,
}

/// An NPC the director invented this turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedNpc {
    pub id: String,
    pub name: String,
    pub role: String,
    pub personality: String,
    #[serde(default)]
    pub knowledge: Vec<String>,
}

/// The director's complete structured decision for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorDecision {
    pub narrator_event: NarratorEvent,

    #[serde(default)]
    pub generated_items: Vec<GeneratedItem>,

    #[serde(default)]
    pub generated_npcs: Vec<GeneratedNpc>,

    /// Names of things in the scene the players could act on next.
    #[serde(default)]
    pub interactables: Vec<String>,

    /// Set when the action moved the team somewhere.
    #[serde(default)]
    pub new_location: Option<String>,

    /// Key-clue ids discovered this turn.
    #[serde(default)]
    pub clues_discovered: Vec<String>,

    /// Suspect names interviewed this turn.
    #[serde(default)]
    pub suspects_interviewed: Vec<String>,

    /// Item ids explicitly taken into the inventory this turn.
    #[serde(default)]
    pub items_taken: Vec<String>,

    /// New story progress in [0, 1], when the director chose to move it.
    #[serde(default)]
    pub progress_update: Option<f32>,
}

/// The decision engine interface.
#[async_trait]
pub trait Director: Send + Sync {
    async fn decide(
        &self,
        action: &str,
        world: &WorldState,
        context: &MemoryContext,
        case: &CaseFile,
    ) -> Result<DirectorDecision, EngineError>;
}

/// LLM-backed director.
pub struct LlmDirector {
    client: OpenAi,
    model: Option<String>,
}

impl LlmDirector {
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

    fn build_user_payload(
        action: &str,
        world: &WorldState,
        context: &MemoryContext,
        case: &CaseFile,
    ) -> String {
        let history: Vec<serde_json::Value> = world
            .recent_history()
            .iter()
            .map(|entry| match entry {
                ConversationEntry::Player { action } => json!({"player": action}),
                ConversationEntry::Dialogue { speaker, text } => {
                    json!({"speaker": speaker, "text": text})
                }
            })
            .collect();

        let payload = json!({
            "player_action": action,
            "current_location": world.current_location,
            "known_locations": world.known_locations,
            "visited_locations": world.visited_locations,
            "discovered_clues": world.discovered_clues,
            "interviewed_suspects": world.interviewed_suspects,
            "progress": world.progress,
            "recent_history": history,
            "memory": context,
            "case": {
                "solution": case.solution,
                "locations": case.locations,
                "physics": case.physics,
            },
        });

        // Serializing json! output never fails.
        serde_json::to_string_pretty(&payload).unwrap_or_default()
    }
}

#[async_trait]
impl Director for LlmDirector {
    async fn decide(
        &self,
        action: &str,
        world: &WorldState,
        context: &MemoryContext,
        case: &CaseFile,
    ) -> Result<DirectorDecision, EngineError> {
        let payload = Self::build_user_payload(action, world, context, case);

        let mut request = Request::new(vec![
            Message::system(include_str!("prompts/director.txt")),
            Message::user(payload),
        ])
        .with_temperature(DIRECTOR_TEMPERATURE)
        .with_max_tokens(DIRECTOR_MAX_TOKENS)
        .with_json_response();

        if let Some(ref model) = self.model {
            request = request.with_model(model);
        }

        let response = tokio::time::timeout(
            Duration::from_secs(DIRECTOR_TIMEOUT_SECS),
            self.client.complete(request),
        )
        .await
        .map_err(|_| EngineError::Timeout(DIRECTOR_TIMEOUT_SECS))??;

        let decision: DirectorDecision = parse_json_reply(&response.content)?;
        tracing::debug!(
            event = ?decision.narrator_event.event_type,
            new_location = ?decision.new_location,
            "Director decided"
        );
        Ok(decision)
    }
}
