//! The websocket endpoint.
//!
//! One socket per client. Each socket gets a writer task fed by an
//! unbounded channel; the roster holds the channel's sender as the seat's
//! transport handle. Reconnecting clients pass `?player_id=` to resume
//! their seat.

use crate::AppState;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use noir_core::roster::ConnectOutcome;
use noir_core::{ChatCommand, ClientMessage, GameError, Roster, ServerMessage};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    player_id: Option<String>,
}

pub async fn handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, params.player_id, state))
}

/// Broadcast the current player list to everyone.
pub fn broadcast_roster(roster: &Roster) {
    roster.broadcast(&ServerMessage::PlayerList {
        players: roster.player_infos(),
    });
}

async fn handle_socket(socket: WebSocket, claimed_id: Option<String>, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Writer task: the only place this socket is written to.
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let encoded = match serde_json::to_string(&message) {
                Ok(encoded) => encoded,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode server message");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(encoded)).await.is_err() {
                break;
            }
        }
    });

    let player_id = {
        let mut roster = state.roster.lock().await;
        let outcome = roster.connect(tx.clone(), claimed_id.as_deref());
        let player_id = outcome.player_id().to_string();
        roster.send_to(
            &player_id,
            ServerMessage::AssignId {
                player_id: player_id.clone(),
            },
        );
        broadcast_roster(&roster);
        if matches!(
            outcome,
            ConnectOutcome::Resumed { .. } | ConnectOutcome::Superseded { .. }
        ) {
            roster.resync(&player_id);
        }
        player_id
    };

    while let Some(Ok(message)) = stream.next().await {
        match message {
            WsMessage::Text(raw) => {
                let parsed: Result<ClientMessage, _> = serde_json::from_str(&raw);
                match parsed {
                    Ok(client_message) => {
                        handle_message(&state, &player_id, client_message).await;
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Unparseable client message dropped");
                    }
                }
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut roster = state.roster.lock().await;
        let name = roster.display_name(&player_id);
        if roster.disconnect(&player_id, &tx) {
            broadcast_roster(&roster);
            roster.broadcast(&ServerMessage::System {
                text: format!("{name} stepped out."),
            });
        }
    }
    writer.abort();
}

async fn handle_message(state: &AppState, player_id: &str, message: ClientMessage) {
    match message {
        ClientMessage::Nickname { nickname } => {
            let mut roster = state.roster.lock().await;
            roster.set_nickname(player_id, nickname.clone());
            broadcast_roster(&roster);
            roster.broadcast(&ServerMessage::System {
                text: format!("{nickname} is on the case."),
            });
        }
        ClientMessage::Ready => {
            let mut roster = state.roster.lock().await;
            let named = roster
                .player_infos()
                .iter()
                .any(|p| p.id == player_id && p.nickname.is_some());
            if !named {
                roster.send_to(
                    player_id,
                    ServerMessage::System {
                        text: "Pick a name before you ready up.".to_string(),
                    },
                );
                return;
            }
            roster.toggle_ready(player_id);
            broadcast_roster(&roster);
        }
        ClientMessage::StartGame { case } => {
            start_game(state, player_id, case.as_deref()).await;
        }
        ClientMessage::Chat { text } => match ChatCommand::parse(&text) {
            Some(ChatCommand::Inventory) => {
                let report = state.game.lock().await.inventory_report();
                let roster = state.roster.lock().await;
                roster.send_to(player_id, ServerMessage::System { text: report });
            }
            Some(ChatCommand::Reset) => {
                if let Err(e) = full_reset(state).await {
                    tracing::error!(error = %e, "Reset failed");
                }
            }
            Some(ChatCommand::Lobby) => {
                state.game.lock().await.return_to_lobby();
                let roster = state.roster.lock().await;
                roster.broadcast(&ServerMessage::System {
                    text: "Back to the lobby. The case stays open.".to_string(),
                });
            }
            None => relay_or_act(state, player_id, text).await,
        },
    }
}

/// Lobby chat is just chat; in game, free text is the table's next action.
async fn relay_or_act(state: &AppState, player_id: &str, text: String) {
    let in_game = state.game.lock().await.in_game();

    {
        let roster = state.roster.lock().await;
        let sender = roster.display_name(player_id);
        roster.broadcast(&ServerMessage::Chat {
            sender,
            text: text.clone(),
        });
    }
    if !in_game {
        return;
    }

    state.roster.lock().await.broadcast(&ServerMessage::Processing { status: true });

    // The game lock is held until the scene has been handed to every
    // outbox, so turns reach clients in commit order.
    let mut game = state.game.lock().await;
    match game.player_action(&text).await {
        Ok(outcome) => {
            let mut roster = state.roster.lock().await;
            roster.cache_scene(outcome.scene.clone());
            roster.broadcast(&ServerMessage::Scene {
                data: outcome.scene,
            });
            if !outcome.decision.interactables.is_empty() {
                roster.broadcast(&ServerMessage::System {
                    text: format!("[Interactable] {}", outcome.decision.interactables.join(", ")),
                });
            }
            roster.broadcast(&ServerMessage::Processing { status: false });
        }
        Err(GameError::NotInGame) => {
            let roster = state.roster.lock().await;
            roster.send_to(
                player_id,
                ServerMessage::System {
                    text: "No game in progress.".to_string(),
                },
            );
            roster.broadcast(&ServerMessage::Processing { status: false });
        }
        Err(e) => {
            tracing::warn!(error = %e, "Turn aborted");
            let roster = state.roster.lock().await;
            roster.broadcast(&ServerMessage::System {
                text: "The trail goes cold for a moment. Try that again.".to_string(),
            });
            roster.broadcast(&ServerMessage::Processing { status: false });
        }
    }
}

async fn start_game(state: &AppState, player_id: &str, case: Option<&str>) {
    if state.game.lock().await.in_game() {
        let roster = state.roster.lock().await;
        roster.send_to(
            player_id,
            ServerMessage::System {
                text: "A game is already running.".to_string(),
            },
        );
        return;
    }

    let check = state.roster.lock().await.ready_check();
    if !check.all_ready {
        let roster = state.roster.lock().await;
        roster.broadcast(&ServerMessage::System {
            text: format!(
                "Everyone named has to be ready first ({}/{} ready).",
                check.ready, check.named
            ),
        });
        return;
    }

    for count in (1..=3).rev() {
        state
            .roster
            .lock()
            .await
            .broadcast(&ServerMessage::Countdown { count });
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    let mut game = state.game.lock().await;
    match game.start_game(case).await {
        Ok(started) => {
            let mut roster = state.roster.lock().await;
            roster.clear_ready();
            roster.clear_scene();
            roster.broadcast(&ServerMessage::GameStarted {
                case: started.title,
                intro: started.intro,
            });
            broadcast_roster(&roster);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Start rejected");
            let roster = state.roster.lock().await;
            roster.send_to(
                player_id,
                ServerMessage::System {
                    text: "The game got started out from under you.".to_string(),
                },
            );
        }
    }
}

/// Reset everything: documents, lobby gate, readiness, offline seats, and
/// the cached scene. Shared by the REST endpoint and the chat command.
pub async fn full_reset(state: &AppState) -> Result<(), GameError> {
    let mut game = state.game.lock().await;
    game.reset().await?;
    let mut roster = state.roster.lock().await;
    roster.clear_ready();
    roster.clear_scene();
    roster.prune_offline();
    broadcast_roster(&roster);
    roster.broadcast(&ServerMessage::System {
        text: "The case file is back at page one.".to_string(),
    });
    Ok(())
}
