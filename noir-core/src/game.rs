//! The game facade.
//!
//! One `Game` is one table: lifecycle gate, the two world documents, the
//! authored case, the two engines, and the document store, wired together
//! behind a small API the server can drive. The server wraps it in an async
//! mutex; everything here assumes exclusive access.

use crate::case::{CaseFile, DEFAULT_CASE};
use crate::engine::{Director, Narrator};
use crate::lifecycle::{Lifecycle, LifecycleError, Phase};
use crate::memory::WorldMemory;
use crate::persist::{DocumentStore, PersistError};
use crate::settings::{Settings, SettingsUpdate};
use crate::turn::{run_turn, TurnError, TurnOutcome};
use crate::world::WorldState;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the server layer.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("No game in progress")]
    NotInGame,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Turn(#[from] TurnError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Construction parameters for a [`Game`].
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub data_dir: PathBuf,
    pub case_id: String,
}

impl GameConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            case_id: DEFAULT_CASE.to_string(),
        }
    }

    pub fn with_case(mut self, case_id: impl Into<String>) -> Self {
        self.case_id = case_id.into();
        self
    }
}

/// What a successful start returns, for the broadcast.
#[derive(Debug, Clone)]
pub struct StartedGame {
    pub case_id: String,
    pub title: String,
    pub intro: String,
}

/// One running table.
pub struct Game {
    lifecycle: Lifecycle,
    case: CaseFile,
    world: WorldState,
    memory: WorldMemory,
    store: DocumentStore,
    settings: Settings,
    director: Box<dyn Director>,
    narrator: Box<dyn Narrator>,
}

impl Game {
    /// Boot a game. Always starts in the lobby with both documents reset
    /// to authored defaults; a crashed process never resumes mid-turn.
    pub async fn new(
        config: GameConfig,
        director: Box<dyn Director>,
        narrator: Box<dyn Narrator>,
    ) -> Result<Self, GameError> {
        let case = CaseFile::by_id(&config.case_id);
        let store = DocumentStore::new(&config.data_dir);
        let settings = store.load_settings().await;
        let (world, memory) = store.reset(&case).await?;

        Ok(Self {
            lifecycle: Lifecycle::new(case.id.clone()),
            case,
            world,
            memory,
            store,
            settings,
            director,
            narrator,
        })
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    pub fn in_game(&self) -> bool {
        self.lifecycle.in_game()
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn memory(&self) -> &WorldMemory {
        &self.memory
    }

    pub fn case(&self) -> &CaseFile {
        &self.case
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Apply a settings update and persist it. Engines pick the new models
    /// up via [`Game::set_engines`], which the server calls right after.
    pub async fn update_settings(&mut self, update: SettingsUpdate) -> Result<Settings, GameError> {
        self.settings.apply(update);
        self.store.save_settings(&self.settings).await?;
        Ok(self.settings.clone())
    }

    /// Swap the engines, after a settings change.
    pub fn set_engines(&mut self, director: Box<dyn Director>, narrator: Box<dyn Narrator>) {
        self.director = director;
        self.narrator = narrator;
    }

    /// Start a game on a case. Lobby only; resets both documents.
    pub async fn start_game(&mut self, case_id: Option<&str>) -> Result<StartedGame, GameError> {
        let case = CaseFile::by_id(case_id.unwrap_or(DEFAULT_CASE));
        self.lifecycle.begin(case.id.clone())?;

        let (world, memory) = self.store.reset(&case).await?;
        self.world = world;
        self.memory = memory;
        let started = StartedGame {
            case_id: case.id.clone(),
            title: case.title.clone(),
            intro: case.intro.clone(),
        };
        self.case = case;
        Ok(started)
    }

    /// Back to the lobby without touching the documents.
    pub fn return_to_lobby(&mut self) {
        self.lifecycle.return_to_lobby();
    }

    /// Full reset: documents back to authored defaults, gate to lobby.
    pub async fn reset(&mut self) -> Result<(), GameError> {
        let case = CaseFile::by_id(self.lifecycle.current_case());
        let (world, memory) = self.store.reset(&case).await?;
        self.world = world;
        self.memory = memory;
        self.case = case;
        self.lifecycle.return_to_lobby();
        Ok(())
    }

    /// Run one turn for a player action. In game only.
    pub async fn player_action(&mut self, action: &str) -> Result<TurnOutcome, GameError> {
        if !self.in_game() {
            return Err(GameError::NotInGame);
        }

        let outcome = run_turn(
            action,
            &mut self.world,
            &mut self.memory,
            &self.case,
            self.director.as_ref(),
            self.narrator.as_ref(),
        )
        .await?;

        // The turn is committed in memory either way; a failed save is an
        // availability problem, not a correctness one.
        if let Err(e) = self.store.save_state(&self.world).await {
            tracing::error!(error = %e, "Failed to persist world state");
        }
        if let Err(e) = self.store.save_memory(&self.memory).await {
            tracing::error!(error = %e, "Failed to persist world memory");
        }

        Ok(outcome)
    }

    /// Text report for the `/inventory` command.
    pub fn inventory_report(&self) -> String {
        let mut report = String::from("Team inventory:");
        for (container, ids) in &self.memory.team_inventory {
            report.push_str(&format!("\n  {container}: "));
            if ids.is_empty() {
                report.push_str("(empty)");
            } else {
                let names: Vec<&str> = ids
                    .iter()
                    .filter_map(|id| self.memory.item(id).map(|i| i.name.as_str()))
                    .collect();
                report.push_str(&names.join(", "));
            }
        }
        report
    }

    /// Debug snapshot for the state endpoint. Never includes the solution.
    pub fn state_snapshot(&self) -> serde_json::Value {
        json!({
            "phase": self.lifecycle.phase(),
            "case": self.case.id,
            "current_location": self.world.current_location,
            "visited_locations": self.world.visited_locations,
            "discovered_clues": self.world.discovered_clues,
            "interviewed_suspects": self.world.interviewed_suspects,
            "progress": self.world.progress,
            "turn": self.memory.turn,
            "generated_items": self.memory.generated_items.len(),
            "generated_npcs": self.memory.generated_npcs.len(),
            "inventory": self.memory.team_inventory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{flavor_decision, narration_scene, MockDirector, MockNarrator};

    async fn game(dir: &std::path::Path) -> Game {
        Game::new(
            GameConfig::new(dir),
            Box::new(MockDirector::scripted(vec![])),
            Box::new(MockNarrator::scripted(vec![])),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_boot_forces_lobby_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut g = game(dir.path()).await;
            g.start_game(None).await.unwrap();
            assert!(g.in_game());
        }
        // A new process over the same data dir comes up clean in the lobby.
        let g = game(dir.path()).await;
        assert_eq!(g.phase(), Phase::Lobby);
        assert_eq!(g.world().progress, 0.0);
    }

    #[tokio::test]
    async fn test_action_gated_on_phase() {
        let dir = tempfile::tempdir().unwrap();
        let mut g = game(dir.path()).await;
        let result = g.player_action("search the bar").await;
        assert!(matches!(result, Err(GameError::NotInGame)));
    }

    #[tokio::test]
    async fn test_start_then_action() {
        let dir = tempfile::tempdir().unwrap();
        let mut g = Game::new(
            GameConfig::new(dir.path()),
            Box::new(MockDirector::scripted(vec![flavor_decision("Rain on glass.")])),
            Box::new(MockNarrator::scripted(vec![narration_scene("Rain on glass.")])),
        )
        .await
        .unwrap();

        let started = g.start_game(None).await.unwrap();
        assert_eq!(started.case_id, "iris_bell");
        assert!(!started.intro.is_empty());

        let outcome = g.player_action("look around").await.unwrap();
        assert_eq!(outcome.scene.lines.len(), 1);
        assert_eq!(g.memory().turn, 1);
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut g = game(dir.path()).await;
        g.start_game(None).await.unwrap();
        assert!(matches!(
            g.start_game(None).await,
            Err(GameError::Lifecycle(LifecycleError::AlreadyInGame))
        ));
    }

    #[tokio::test]
    async fn test_lobby_keeps_state_reset_clears_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut g = Game::new(
            GameConfig::new(dir.path()),
            Box::new(MockDirector::scripted(vec![flavor_decision("A door creaks.")])),
            Box::new(MockNarrator::scripted(vec![narration_scene("A door creaks.")])),
        )
        .await
        .unwrap();
        g.start_game(None).await.unwrap();
        g.player_action("listen").await.unwrap();
        assert_eq!(g.memory().turn, 1);

        g.return_to_lobby();
        assert_eq!(g.memory().turn, 1); // untouched

        g.reset().await.unwrap();
        assert_eq!(g.memory().turn, 0);
        assert_eq!(g.phase(), Phase::Lobby);
    }

    #[tokio::test]
    async fn test_inventory_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut g = game(dir.path()).await;
        let report = g.inventory_report();
        assert!(report.contains("bag: (empty)"));

        g.memory.save_item(crate::memory::Item {
            id: "gen_key_001".to_string(),
            name: "Brass Key".to_string(),
            description: "Worn smooth.".to_string(),
            portable: true,
            category: "keys".to_string(),
            original_location: "alley".to_string(),
            current_location: "alley".to_string(),
            inspected: false,
            taken: false,
            is_key_clue: false,
        });
        g.memory.transfer_to_inventory("gen_key_001", "bag");
        assert!(g.inventory_report().contains("bag: Brass Key"));
    }

    #[tokio::test]
    async fn test_snapshot_excludes_solution() {
        let dir = tempfile::tempdir().unwrap();
        let g = game(dir.path()).await;
        let snapshot = g.state_snapshot().to_string();
        assert!(!snapshot.contains("Miriam"));
        assert!(!snapshot.contains("motive"));
    }

    #[tokio::test]
    async fn test_settings_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut g = game(dir.path()).await;
        let updated = g
            .update_settings(crate::settings::SettingsUpdate {
                director_model: Some("gpt-4o".to_string()),
                narrator_model: None,
            })
            .await
            .unwrap();
        assert_eq!(updated.director_model, "gpt-4o");

        let g2 = game(dir.path()).await;
        assert_eq!(g2.settings().director_model, "gpt-4o");
    }
}
