//! Server bootstrap and REST surface.
//!
//! One process hosts one table. The websocket endpoint carries the whole
//! game; the REST endpoints are for operators: reset, a state snapshot,
//! and the engine model settings.

mod ws;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use noir_core::{Game, GameConfig, LlmDirector, LlmNarrator, Roster, Settings, SettingsUpdate};
use openai::OpenAi;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Shared server state.
///
/// The game mutex is the turn serializer: every player action runs to
/// commit (scene broadcast included) before the next one gets the lock.
#[derive(Clone)]
pub struct AppState {
    pub game: Arc<Mutex<Game>>,
    pub roster: Arc<Mutex<Roster>>,
    pub client: OpenAi,
}

impl AppState {
    /// Rebuild both engines from the current settings.
    pub fn engines_for(&self, settings: &Settings) -> (LlmDirector, LlmNarrator) {
        (
            LlmDirector::new(self.client.clone()).with_model(&settings.director_model),
            LlmNarrator::new(self.client.clone()).with_model(&settings.narrator_model),
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,noir_core=debug")),
        )
        .init();

    let client = OpenAi::from_env()?;
    let data_dir = std::env::var("NOIR_DATA_DIR").unwrap_or_else(|_| "./data".to_string());

    // Boot with default engines; the persisted settings are applied once
    // the game has loaded them.
    let mut game = Game::new(
        GameConfig::new(&data_dir),
        Box::new(LlmDirector::new(client.clone())),
        Box::new(LlmNarrator::new(client.clone())),
    )
    .await?;
    let settings = game.settings().clone();
    game.set_engines(
        Box::new(LlmDirector::new(client.clone()).with_model(&settings.director_model)),
        Box::new(LlmNarrator::new(client.clone()).with_model(&settings.narrator_model)),
    );

    let state = AppState {
        game: Arc::new(Mutex::new(game)),
        roster: Arc::new(Mutex::new(Roster::new())),
        client,
    };

    let app = Router::new()
        .route("/ws", get(ws::handler))
        .route("/reset", post(reset))
        .route("/state", get(state_snapshot))
        .route("/settings", get(get_settings).post(post_settings))
        .fallback_service(ServeDir::new("static").append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let bind_addr =
        std::env::var("NOIR_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// POST /reset. Full reset back to the lobby, offline seats dropped.
async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = ws::full_reset(&state).await {
        tracing::error!(error = %e, "Reset failed");
        return (StatusCode::INTERNAL_SERVER_ERROR, "reset failed").into_response();
    }
    Json(serde_json::json!({"status": "reset"})).into_response()
}

/// GET /state. Debug snapshot; never includes the solution.
async fn state_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    let game = state.game.lock().await;
    Json(game.state_snapshot())
}

/// GET /settings.
async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    let game = state.game.lock().await;
    Json(game.settings().clone())
}

/// POST /settings. Partial update; engines are rebuilt immediately.
async fn post_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> impl IntoResponse {
    let mut game = state.game.lock().await;
    match game.update_settings(update).await {
        Ok(settings) => {
            let (director, narrator) = state.engines_for(&settings);
            game.set_engines(Box::new(director), Box::new(narrator));
            Json(settings).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Settings update failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "settings update failed").into_response()
        }
    }
}
