//! Testing utilities.
//!
//! - `MockDirector` / `MockNarrator` return scripted engine output with no
//!   API calls
//! - `TestHarness` bundles a `Game` over the mocks for scenario tests
//! - `#[track_caller]` assertion helpers for game state

use crate::engine::{
    Director, DirectorDecision, EngineError, EventType, Narrator, NarratorEvent, Scene,
    ScriptLine,
};
use crate::case::CaseFile;
use crate::game::{Game, GameConfig, GameError, StartedGame};
use crate::memory::{MemoryContext, WorldMemory};
use crate::turn::TurnOutcome;
use crate::world::WorldState;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A decision wrapping the given event, with everything else empty.
pub fn decision_with_event(event: NarratorEvent) -> DirectorDecision {
    DirectorDecision {
        narrator_event: event,
        generated_items: Vec::new(),
        generated_npcs: Vec::new(),
        interactables: Vec::new(),
        new_location: None,
        clues_discovered: Vec::new(),
        suspects_interviewed: Vec::new(),
        items_taken: Vec::new(),
        progress_update: None,
    }
}

/// A no-consequence flavor decision with the given description.
pub fn flavor_decision(description: impl Into<String>) -> DirectorDecision {
    decision_with_event(NarratorEvent {
        event_type: EventType::FlavorMoment,
        description: description.into(),
        items_visible: Vec::new(),
        npcs_present: Vec::new(),
        npc_name: None,
        dialogue: None,
        npc_emotion: None,
        block_reason: None,
    })
}

/// A one-line narration scene.
pub fn narration_scene(text: impl Into<String>) -> Scene {
    Scene {
        lines: vec![ScriptLine::narration(text)],
    }
}

/// A decision engine that replays scripted decisions in order.
///
/// Clones share the script, so a harness can keep queueing after handing
/// a clone to the game.
#[derive(Clone)]
pub struct MockDirector {
    script: Arc<Mutex<VecDeque<DirectorDecision>>>,
    failing: bool,
}

impl MockDirector {
    pub fn scripted(decisions: Vec<DirectorDecision>) -> Self {
        Self {
            script: Arc::new(Mutex::new(decisions.into())),
            failing: false,
        }
    }

    /// A director whose every call fails, for abort-path tests.
    pub fn failing() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            failing: true,
        }
    }

    pub fn queue(&self, decision: DirectorDecision) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(decision);
        }
    }
}

#[async_trait]
impl Director for MockDirector {
    async fn decide(
        &self,
        _action: &str,
        _world: &WorldState,
        _context: &MemoryContext,
        _case: &CaseFile,
    ) -> Result<DirectorDecision, EngineError> {
        if self.failing {
            return Err(EngineError::InvalidResponse(
                "scripted director failure".to_string(),
            ));
        }
        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        Ok(next.unwrap_or_else(|| flavor_decision("The scene holds its breath.")))
    }
}

/// A rendering engine that replays scripted scenes, falling back to a
/// plain narration of the event description.
#[derive(Clone)]
pub struct MockNarrator {
    script: Arc<Mutex<VecDeque<Scene>>>,
    failing: bool,
}

impl MockNarrator {
    pub fn scripted(scenes: Vec<Scene>) -> Self {
        Self {
            script: Arc::new(Mutex::new(scenes.into())),
            failing: false,
        }
    }

    /// A narrator whose every call fails, for abort-path tests.
    pub fn failing() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            failing: true,
        }
    }

    pub fn queue(&self, scene: Scene) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(scene);
        }
    }
}

#[async_trait]
impl Narrator for MockNarrator {
    async fn render(&self, event: &NarratorEvent) -> Result<Scene, EngineError> {
        if self.failing {
            return Err(EngineError::Timeout(0));
        }
        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        Ok(next.unwrap_or_else(|| narration_scene(event.description.clone())))
    }
}

/// A `Game` over mock engines, for scenario tests.
pub struct TestHarness {
    pub game: Game,
    pub director: MockDirector,
    pub narrator: MockNarrator,
    data_dir: std::path::PathBuf,
}

impl TestHarness {
    /// Build a harness over a throwaway data directory.
    pub async fn new() -> Self {
        let data_dir = std::env::temp_dir().join(format!(
            "noir-harness-{}",
            uuid::Uuid::new_v4().simple()
        ));
        let director = MockDirector::scripted(Vec::new());
        let narrator = MockNarrator::scripted(Vec::new());
        let game = Game::new(
            GameConfig::new(&data_dir),
            Box::new(director.clone()),
            Box::new(narrator.clone()),
        )
        .await
        .expect("harness game boot");

        Self {
            game,
            director,
            narrator,
            data_dir,
        }
    }

    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }

    /// Queue the director's next decision.
    pub fn expect_decision(&mut self, decision: DirectorDecision) -> &mut Self {
        self.director.queue(decision);
        self
    }

    /// Queue a bare flavor decision.
    pub fn expect_flavor(&mut self, description: impl Into<String>) -> &mut Self {
        self.director.queue(flavor_decision(description));
        self
    }

    /// Queue the narrator's next scene.
    pub fn expect_scene(&mut self, scene: Scene) -> &mut Self {
        self.narrator.queue(scene);
        self
    }

    /// Start a game on the default case.
    pub async fn start(&mut self) -> StartedGame {
        self.game.start_game(None).await.expect("start game")
    }

    /// Run a turn, panicking on abort.
    pub async fn act(&mut self, action: &str) -> TurnOutcome {
        match self.game.player_action(action).await {
            Ok(outcome) => outcome,
            Err(e) => panic!("turn aborted for {action:?}: {e}"),
        }
    }

    /// Run a turn that is expected to abort.
    pub async fn act_expecting_error(&mut self, action: &str) -> GameError {
        match self.game.player_action(action).await {
            Ok(_) => panic!("turn unexpectedly committed for {action:?}"),
            Err(e) => e,
        }
    }

    pub fn world(&self) -> &WorldState {
        self.game.world()
    }

    pub fn memory(&self) -> &WorldMemory {
        self.game.memory()
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert a key clue has been discovered.
#[track_caller]
pub fn assert_clue_discovered(harness: &TestHarness, clue_id: &str) {
    assert!(
        harness.world().discovered_clues.iter().any(|c| c == clue_id),
        "Expected clue '{clue_id}' to be discovered, have {:?}",
        harness.world().discovered_clues
    );
}

/// Assert an item id is in the team inventory.
#[track_caller]
pub fn assert_in_inventory(harness: &TestHarness, item_id: &str) {
    assert!(
        harness.memory().in_inventory(item_id),
        "Expected item '{item_id}' in the team inventory"
    );
}

/// Assert an item id is NOT in the team inventory.
#[track_caller]
pub fn assert_not_in_inventory(harness: &TestHarness, item_id: &str) {
    assert!(
        !harness.memory().in_inventory(item_id),
        "Expected item '{item_id}' to NOT be in the team inventory"
    );
}

/// Assert the team's current location.
#[track_caller]
pub fn assert_location(harness: &TestHarness, location: &str) {
    assert_eq!(
        harness.world().current_location,
        location,
        "Expected the team at '{location}'"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_director_replays_then_defaults() {
        let director = MockDirector::scripted(vec![flavor_decision("first")]);
        let case = CaseFile::iris_bell();
        let world = WorldState::for_case(&case);
        let memory = WorldMemory::new();
        let context = memory.relevant_context(&world.current_location);

        let first = director.decide("a", &world, &context, &case).await.unwrap();
        assert_eq!(first.narrator_event.description, "first");

        let second = director.decide("b", &world, &context, &case).await.unwrap();
        assert!(second.narrator_event.description.contains("holds its breath"));
    }

    #[tokio::test]
    async fn test_mock_narrator_defaults_to_event_description() {
        let narrator = MockNarrator::scripted(vec![]);
        let event = flavor_decision("The fan turns slowly.").narrator_event;
        let scene = narrator.render(&event).await.unwrap();
        assert_eq!(scene.lines[0].text, "The fan turns slowly.");
    }

    #[tokio::test]
    async fn test_harness_basic_flow() {
        let mut harness = TestHarness::new().await;
        harness.start().await;
        harness.expect_flavor("Nothing moves but the smoke.");

        let outcome = harness.act("wait and watch").await;
        assert_eq!(outcome.scene.lines.len(), 1);
        assert_location(&harness, "The Silver Gull - main bar");
    }

    #[tokio::test]
    async fn test_harness_queue_shared_after_boxing() {
        let mut harness = TestHarness::new().await;
        harness.start().await;
        // Queued after the game took its boxed clone; must still be seen.
        harness.expect_flavor("late addition");
        let outcome = harness.act("look").await;
        assert_eq!(outcome.decision.narrator_event.description, "late addition");
    }
}
