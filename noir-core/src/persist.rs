//! Document persistence.
//!
//! Both world documents (and the runtime settings) are saved as whole,
//! pretty-printed JSON files under one data directory. Saves are full
//! overwrites after each committed turn. Loads that fail for any reason
//! fall back to authored defaults with a warning; a corrupt file never
//! takes the server down.

use crate::case::CaseFile;
use crate::memory::WorldMemory;
use crate::settings::Settings;
use crate::world::WorldState;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const STATE_FILE: &str = "world_state.json";
const MEMORY_FILE: &str = "world_memory.json";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File-backed store for the game's documents.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    data_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    async fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<(), PersistError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let json = serde_json::to_string_pretty(value)?;
        tokio::fs::write(self.data_dir.join(file), json).await?;
        Ok(())
    }

    /// Read and parse a document, or None when missing or unreadable.
    async fn read_json<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.data_dir.join(file);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable document, using defaults");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt document, using defaults");
                None
            }
        }
    }

    /// Load the world state document, falling back to the authored default.
    pub async fn load_state(&self, case: &CaseFile) -> WorldState {
        match self.read_json(STATE_FILE).await {
            Some(state) => state,
            None => WorldState::for_case(case),
        }
    }

    pub async fn save_state(&self, state: &WorldState) -> Result<(), PersistError> {
        self.write_json(STATE_FILE, state).await
    }

    /// Load the memory store, falling back to a fresh one.
    pub async fn load_memory(&self) -> WorldMemory {
        self.read_json(MEMORY_FILE).await.unwrap_or_default()
    }

    pub async fn save_memory(&self, memory: &WorldMemory) -> Result<(), PersistError> {
        self.write_json(MEMORY_FILE, memory).await
    }

    /// Load settings, writing the defaults file when missing.
    pub async fn load_settings(&self) -> Settings {
        match self.read_json(SETTINGS_FILE).await {
            Some(settings) => settings,
            None => {
                let settings = Settings::default();
                if let Err(e) = self.save_settings(&settings).await {
                    tracing::warn!(error = %e, "Could not write default settings");
                }
                settings
            }
        }
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<(), PersistError> {
        self.write_json(SETTINGS_FILE, settings).await
    }

    /// Rewrite both world documents to authored defaults. Used at boot and
    /// on every game start; the two documents always reset together.
    pub async fn reset(&self, case: &CaseFile) -> Result<(WorldState, WorldMemory), PersistError> {
        let state = WorldState::for_case(case);
        let memory = WorldMemory::new();
        self.save_state(&state).await?;
        self.save_memory(&memory).await?;
        tracing::info!(case = %case.id, "Documents reset to authored defaults");
        Ok((state, memory))
    }
}
