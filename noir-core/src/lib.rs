//! Film noir detective game engine with AI director and narrator.
//!
//! This crate provides:
//! - A two-engine turn pipeline: a solution-aware director decides what
//!   happens, a solution-blind narrator renders it as a radio-drama scene,
//!   and everything commits in one step or not at all
//! - A durable world memory store and world state document
//! - A session roster with reconnect/resume and a lobby/in-game lifecycle
//! - Document persistence and runtime settings
//!
//! # Quick Start
//!
//! ```ignore
//! use noir_core::{Game, GameConfig, LlmDirector, LlmNarrator};
//! use openai::OpenAi;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAi::from_env()?;
//!     let mut game = Game::new(
//!         GameConfig::new("./data"),
//!         Box::new(LlmDirector::new(client.clone())),
//!         Box::new(LlmNarrator::new(client)),
//!     )
//!     .await?;
//!
//!     game.start_game(None).await?;
//!     let outcome = game.player_action("search the piano").await?;
//!     for line in &outcome.scene.lines {
//!         println!("{}: {}", line.speaker, line.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod case;
pub mod engine;
pub mod game;
pub mod lifecycle;
pub mod memory;
pub mod persist;
pub mod protocol;
pub mod roster;
pub mod settings;
pub mod testing;
pub mod turn;
pub mod world;

// Primary public API
pub use case::{CaseFile, DEFAULT_CASE};
pub use engine::{
    Director, DirectorDecision, EngineError, EventType, LlmDirector, LlmNarrator, Narrator,
    NarratorEvent, Scene, ScriptLine, NARRATOR_SPEAKER,
};
pub use game::{Game, GameConfig, GameError, StartedGame};
pub use lifecycle::Phase;
pub use memory::WorldMemory;
pub use protocol::{ChatCommand, ClientMessage, PlayerInfo, ServerMessage};
pub use roster::{ConnectOutcome, Roster};
pub use settings::{Settings, SettingsUpdate};
pub use testing::{MockDirector, MockNarrator, TestHarness};
pub use turn::{TurnError, TurnOutcome};
pub use world::WorldState;
