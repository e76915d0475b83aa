//! Wire messages between clients and the server.
//!
//! Tagged JSON both ways. Reserved chat prefixes (`/inventory`, `/reset`,
//! `/lobby`) are session commands, handled by the server before anything
//! reaches the turn pipeline.

use crate::engine::Scene;
use serde::{Deserialize, Serialize};

/// Messages a client sends over the websocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Claim or change a display name.
    Nickname { nickname: String },

    /// Toggle readiness in the lobby.
    Ready,

    /// Request a game start for a case (default case when omitted).
    StartGame {
        #[serde(default)]
        case: Option<String>,
    },

    /// Free text: chat in the lobby, a player action in game, or a
    /// slash command.
    Chat { text: String },
}

/// Messages the server sends to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The participant id for this connection; clients present it on
    /// reconnect to resume.
    AssignId { player_id: String },

    /// Full roster snapshot, sent on every roster change.
    PlayerList { players: Vec<PlayerInfo> },

    /// Relayed player chat.
    Chat { sender: String, text: String },

    /// Server notice shown in the transcript.
    System { text: String },

    /// A rendered scene.
    Scene { data: Scene },

    GameStarted { case: String, intro: String },

    /// Pre-start countdown tick.
    Countdown { count: u32 },

    /// True while a turn is being processed, false when done.
    Processing { status: bool },
}

/// One roster entry as shown to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: String,
    pub nickname: Option<String>,
    pub ready: bool,
    pub online: bool,
}

/// A parsed slash command from chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Inventory,
    Reset,
    Lobby,
}

impl ChatCommand {
    /// Parse a chat line as a command, if it is one.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "/inventory" => Some(Self::Inventory),
            "/reset" => Some(Self::Reset),
            "/lobby" => Some(Self::Lobby),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_decodes() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "nickname", "nickname": "Marlowe"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Nickname { nickname } if nickname == "Marlowe"));

        let msg: ClientMessage = serde_json::from_str(r#"{"type": "start_game"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::StartGame { case: None }));
    }

    #[test]
    fn test_server_message_encodes_tag() {
        let encoded = serde_json::to_string(&ServerMessage::Countdown { count: 3 }).unwrap();
        assert!(encoded.contains(r#""type":"countdown""#));
        assert!(encoded.contains(r#""count":3"#));
    }

    #[test]
    fn test_chat_commands() {
        assert_eq!(ChatCommand::parse("/inventory"), Some(ChatCommand::Inventory));
        assert_eq!(ChatCommand::parse("  /reset  "), Some(ChatCommand::Reset));
        assert_eq!(ChatCommand::parse("/lobby"), Some(ChatCommand::Lobby));
        assert_eq!(ChatCommand::parse("check the bar"), None);
        assert_eq!(ChatCommand::parse("/unknown"), None);
    }
}
