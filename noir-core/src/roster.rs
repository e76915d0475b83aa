//! The session roster.
//!
//! Tracks every participant across connects, disconnects, and reconnects.
//! Identity is the 8-character participant id handed out on first connect;
//! a client that presents its id on reconnect resumes the same seat with
//! nickname and readiness intact. The transport handle (an unbounded
//! channel into the socket's writer task) is replaceable: the newest
//! connection for an id always wins.

use crate::engine::Scene;
use crate::protocol::{PlayerInfo, ServerMessage};
use tokio::sync::mpsc::UnboundedSender;

/// Transport handle for one connected socket.
pub type Outbox = UnboundedSender<ServerMessage>;

/// Connection status of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Online,
    Offline,
}

/// One seat at the table.
#[derive(Debug)]
pub struct Participant {
    pub id: String,
    pub nickname: Option<String>,
    pub ready: bool,
    pub status: Status,
    outbox: Option<Outbox>,
}

impl Participant {
    fn new(id: String, outbox: Outbox) -> Self {
        Self {
            id,
            nickname: None,
            ready: false,
            status: Status::Online,
            outbox: Some(outbox),
        }
    }

    /// Display name: nickname when set, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.id)
    }
}

/// How a connect resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A fresh participant with a newly minted id.
    New { player_id: String },

    /// An offline participant came back.
    Resumed { player_id: String },

    /// The id was still marked online; the old transport is replaced.
    Superseded { player_id: String },
}

impl ConnectOutcome {
    pub fn player_id(&self) -> &str {
        match self {
            Self::New { player_id }
            | Self::Resumed { player_id }
            | Self::Superseded { player_id } => player_id,
        }
    }
}

/// Readiness summary for the lobby gate.
#[derive(Debug, Clone, Copy)]
pub struct ReadyCheck {
    pub all_ready: bool,
    pub ready: usize,
    pub named: usize,
}

/// All participants, online and offline, for the single game room.
#[derive(Debug, Default)]
pub struct Roster {
    participants: Vec<Participant>,
    /// The most recent committed scene, replayed to reconnecting clients.
    last_scene: Option<Scene>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
    }

    fn find(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    /// Attach a connection, resuming the claimed seat when it exists.
    pub fn connect(&mut self, outbox: Outbox, claimed_id: Option<&str>) -> ConnectOutcome {
        if let Some(id) = claimed_id {
            if let Some(participant) = self.find_mut(id) {
                let superseded = participant.status == Status::Online;
                participant.outbox = Some(outbox);
                participant.status = Status::Online;
                let player_id = participant.id.clone();
                return if superseded {
                    tracing::info!(player = %player_id, "Connection superseded by newer transport");
                    ConnectOutcome::Superseded { player_id }
                } else {
                    tracing::info!(player = %player_id, "Participant resumed");
                    ConnectOutcome::Resumed { player_id }
                };
            }
        }

        let id = Self::mint_id();
        tracing::info!(player = %id, "New participant");
        self.participants.push(Participant::new(id.clone(), outbox));
        ConnectOutcome::New { player_id: id }
    }

    /// Detach a connection. A stale handle (superseded by a newer connect
    /// for the same id) is ignored; the participant stays online on the
    /// newer transport. Nickname and readiness always survive. Returns
    /// whether the seat actually went offline.
    pub fn disconnect(&mut self, id: &str, closing: &Outbox) -> bool {
        let Some(participant) = self.find_mut(id) else {
            return false;
        };
        let current = match participant.outbox {
            Some(ref outbox) => outbox.same_channel(closing),
            None => false,
        };
        if !current {
            tracing::debug!(player = %id, "Stale disconnect ignored");
            return false;
        }
        participant.outbox = None;
        participant.status = Status::Offline;
        tracing::info!(player = %id, "Participant offline");
        true
    }

    pub fn set_nickname(&mut self, id: &str, nickname: impl Into<String>) {
        if let Some(participant) = self.find_mut(id) {
            participant.nickname = Some(nickname.into());
        }
    }

    /// Flip readiness. Ignored until the participant has a nickname.
    /// Returns the new readiness.
    pub fn toggle_ready(&mut self, id: &str) -> bool {
        match self.find_mut(id) {
            Some(participant) if participant.nickname.is_some() => {
                participant.ready = !participant.ready;
                participant.ready
            }
            _ => false,
        }
    }

    /// Clear every participant's readiness (on game start and reset).
    pub fn clear_ready(&mut self) {
        for participant in &mut self.participants {
            participant.ready = false;
        }
    }

    /// The lobby start gate: every named participant ready, and at least
    /// one of them. Unnamed lurkers don't block the start.
    pub fn ready_check(&self) -> ReadyCheck {
        let named: Vec<_> = self
            .participants
            .iter()
            .filter(|p| p.nickname.is_some())
            .collect();
        let ready = named.iter().filter(|p| p.ready).count();
        ReadyCheck {
            all_ready: !named.is_empty() && ready == named.len(),
            ready,
            named: named.len(),
        }
    }

    pub fn display_name(&self, id: &str) -> String {
        self.find(id)
            .map(|p| p.display_name().to_string())
            .unwrap_or_else(|| id.to_string())
    }

    /// Roster snapshot for the client player list.
    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        self.participants
            .iter()
            .map(|p| PlayerInfo {
                id: p.id.clone(),
                nickname: p.nickname.clone(),
                ready: p.ready,
                online: p.status == Status::Online,
            })
            .collect()
    }

    /// Send to one participant. A closed channel is treated as offline.
    pub fn send_to(&self, id: &str, message: ServerMessage) {
        if let Some(Participant {
            outbox: Some(outbox),
            ..
        }) = self.find(id)
        {
            if outbox.send(message).is_err() {
                tracing::debug!(player = %id, "Send to closed channel dropped");
            }
        }
    }

    /// Send to every online participant. A failed send never blocks the
    /// others; the socket's own close handling will mark the seat offline.
    pub fn broadcast(&self, message: &ServerMessage) {
        for participant in &self.participants {
            if let Some(ref outbox) = participant.outbox {
                if outbox.send(message.clone()).is_err() {
                    tracing::debug!(player = %participant.id, "Broadcast to closed channel dropped");
                }
            }
        }
    }

    /// Cache the last committed scene for reconnect replay.
    pub fn cache_scene(&mut self, scene: Scene) {
        self.last_scene = Some(scene);
    }

    pub fn clear_scene(&mut self) {
        self.last_scene = None;
    }

    /// Catch a resumed participant up: a notice plus the last scene.
    pub fn resync(&self, id: &str) {
        self.send_to(
            id,
            ServerMessage::System {
                text: "Reconnected. Catching you up.".to_string(),
            },
        );
        if let Some(ref scene) = self.last_scene {
            self.send_to(id, ServerMessage::Scene { data: scene.clone() });
        }
    }

    /// Drop offline seats. Called on explicit reset only; reconnection is
    /// otherwise always possible.
    pub fn prune_offline(&mut self) {
        self.participants.retain(|p| p.status == Status::Online);
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
