//! The world state document.
//!
//! One mutable record per active game: where the team is, what they have
//! found, who they have talked to, and a capped rolling log of recent
//! conversation. Together with the world memory store this is the entire
//! durable game save; both are reset together when a game starts.

use crate::case::CaseFile;
use serde::{Deserialize, Serialize};

/// Conversation entries retained; the oldest are evicted past this cap.
pub const HISTORY_CAP: usize = 20;

/// Entries of recent history handed to the director.
pub const DIRECTOR_HISTORY_WINDOW: usize = 10;

/// The per-game mutable state document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    /// Where the team currently is.
    pub current_location: String,

    /// Locations the team knows how to reach. The director may only send
    /// players to known locations or sub-locations of the current one.
    pub known_locations: Vec<String>,

    /// Locations visited at least once. Insertion order kept for stable
    /// serialization; semantically a set.
    pub visited_locations: Vec<String>,

    /// Key-clue ids discovered so far. Grows monotonically until reset.
    pub discovered_clues: Vec<String>,

    /// Suspect names interviewed so far.
    pub interviewed_suspects: Vec<String>,

    /// Story progress in [0, 1]. Non-decreasing by convention, not enforced.
    pub progress: f32,

    /// Rolling log of player actions and spoken lines.
    pub conversation_history: Vec<ConversationEntry>,
}

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ConversationEntry {
    /// A player's free-text action.
    Player { action: String },

    /// A spoken line from the rendered scene (narration excluded).
    Dialogue { speaker: String, text: String },
}

impl WorldState {
    /// The authored default document for a case.
    pub fn for_case(case: &CaseFile) -> Self {
        let initially_known: Vec<String> = case
            .locations
            .iter()
            .filter(|l| l.initially_accessible)
            .map(|l| l.id.clone())
            .collect();

        Self {
            current_location: case.starting_location.clone(),
            known_locations: initially_known,
            visited_locations: vec![case.starting_location.clone()],
            discovered_clues: Vec::new(),
            interviewed_suspects: Vec::new(),
            progress: 0.0,
            conversation_history: Vec::new(),
        }
    }

    /// Record a location as visited and known.
    pub fn note_visited(&mut self, location: &str) {
        if !self.visited_locations.iter().any(|l| l == location) {
            self.visited_locations.push(location.to_string());
        }
        if !self.known_locations.iter().any(|l| l == location) {
            self.known_locations.push(location.to_string());
        }
    }

    /// Union newly discovered clue ids into the document.
    pub fn discover_clues<I: IntoIterator<Item = String>>(&mut self, clues: I) {
        for clue in clues {
            if !self.discovered_clues.contains(&clue) {
                self.discovered_clues.push(clue);
            }
        }
    }

    /// Union newly interviewed suspect names into the document.
    pub fn note_interviewed<I: IntoIterator<Item = String>>(&mut self, suspects: I) {
        for suspect in suspects {
            if !self.interviewed_suspects.contains(&suspect) {
                self.interviewed_suspects.push(suspect);
            }
        }
    }

    /// Append an entry, evicting the oldest past [`HISTORY_CAP`].
    pub fn push_history(&mut self, entry: ConversationEntry) {
        self.conversation_history.push(entry);
        while self.conversation_history.len() > HISTORY_CAP {
            self.conversation_history.remove(0);
        }
    }

    /// The most recent entries, for the director's context window.
    pub fn recent_history(&self) -> &[ConversationEntry] {
        let len = self.conversation_history.len();
        &self.conversation_history[len.saturating_sub(DIRECTOR_HISTORY_WINDOW)..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> WorldState {
        WorldState::for_case(&CaseFile::iris_bell())
    }

    #[test]
    fn test_authored_default() {
        let state = state();
        assert_eq!(state.current_location, "The Silver Gull - main bar");
        assert_eq!(state.visited_locations, vec!["The Silver Gull - main bar"]);
        assert!(state.known_locations.contains(&"The Silver Gull - alley".to_string()));
        // Not initially accessible, so not initially known.
        assert!(!state
            .known_locations
            .contains(&"Oak Street boarding house".to_string()));
        assert!(state.discovered_clues.is_empty());
        assert_eq!(state.progress, 0.0);
    }

    #[test]
    fn test_note_visited_is_idempotent() {
        let mut state = state();
        state.note_visited("The Silver Gull - alley");
        state.note_visited("The Silver Gull - alley");
        let count = state
            .visited_locations
            .iter()
            .filter(|l| *l == "The Silver Gull - alley")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_clue_discovery_is_monotonic() {
        let mut state = state();
        state.discover_clues(["c2".to_string()]);
        state.discover_clues(["c2".to_string(), "c1".to_string()]);
        assert_eq!(state.discovered_clues, vec!["c2", "c1"]);
    }

    #[test]
    fn test_history_cap() {
        let mut state = state();
        for i in 0..30 {
            state.push_history(ConversationEntry::Player {
                action: format!("action {i}"),
            });
        }
        assert_eq!(state.conversation_history.len(), HISTORY_CAP);
        // Oldest evicted first.
        assert_eq!(
            state.conversation_history[0],
            ConversationEntry::Player {
                action: "action 10".to_string()
            }
        );
    }

    #[test]
    fn test_recent_history_window() {
        let mut state = state();
        for i in 0..15 {
            state.push_history(ConversationEntry::Player {
                action: format!("action {i}"),
            });
        }
        let recent = state.recent_history();
        assert_eq!(recent.len(), DIRECTOR_HISTORY_WINDOW);
        assert_eq!(
            recent[0],
            ConversationEntry::Player {
                action: "action 5".to_string()
            }
        );
    }
}
