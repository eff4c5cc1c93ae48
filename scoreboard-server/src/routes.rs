//! HTTP route handlers for the leaderboard API.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use scoreboard::core::types::{AwardAmount, Participant, ParticipantId, RankedParticipant, RankedView};
use scoreboard::ledger::HistoryEntry;

use crate::error::ApiError;
use crate::state::{AppState, ChangeEvent};

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users).post(register))
        .route("/claim/{id}", post(claim))
        .route("/history/{id}", get(history))
}

/// GET / - liveness message.
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Leaderboard API is running" }))
}

async fn health() -> &'static str {
    "ok"
}

/// GET /api/users - every participant in rank order.
async fn list_users(State(state): State<AppState>) -> Json<RankedView> {
    Json(state.scoreboard.leaderboard())
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    name: String,
}

/// POST /api/users - register a participant.
///
/// Registration and claims fsync the journal under a lock, so they run on the
/// blocking pool.
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let scoreboard = Arc::clone(&state.scoreboard);
    let participant =
        tokio::task::spawn_blocking(move || scoreboard.register(&request.name)).await??;
    state.publish(ChangeEvent::ParticipantRegistered {
        participant_id: participant.id.clone(),
    });
    Ok((StatusCode::CREATED, Json(participant)))
}

#[derive(Debug, Serialize)]
struct ClaimResponse {
    user: RankedParticipant,
    points_awarded: AwardAmount,
    leaderboard: RankedView,
}

/// POST /api/claim/{id} - award random points.
async fn claim(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = parse_id(&raw)?;
    let scoreboard = Arc::clone(&state.scoreboard);
    let outcome = tokio::task::spawn_blocking(move || scoreboard.claim(&id)).await??;
    state.publish(ChangeEvent::PointsClaimed {
        participant_id: outcome.participant.participant.id.clone(),
        amount: outcome.amount,
    });
    Ok(Json(ClaimResponse {
        user: outcome.participant,
        points_awarded: outcome.amount,
        leaderboard: outcome.leaderboard,
    }))
}

/// GET /api/history/{id} - awards for one participant, most recent first.
async fn history(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let id = parse_id(&raw)?;
    let history = state.scoreboard.history(&id)?;
    Ok(Json(history.entries()))
}

fn parse_id(raw: &str) -> Result<ParticipantId, ApiError> {
    ParticipantId::parse(raw).ok_or_else(|| ApiError::MalformedId(raw.to_string()))
}
