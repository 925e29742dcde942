//! Thin HTTP surface over the lobby, session, and stats services.
//!
//! Handlers authenticate the caller through the identity provider, delegate
//! to a service, and wrap the result in a `{ success, data }` envelope.
//! Domain errors map to status codes by taxonomy: validation 400, missing
//! documents 404, failed preconditions and transaction conflicts 409,
//! configuration defects 500.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::db::{DbError, PlayerStat};
use crate::games::{GameError, GameType, MoveInput};
use crate::identity::{AuthError, IdentityProvider, UserProfile};
use crate::lobby::{LeaveOutcome, LobbyError, LobbyService};
use crate::session::{SessionError, SessionService};
use crate::stats::{StatsService, StatsSummary};
use crate::store::StoreError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Lobby operations.
    pub lobbies: LobbyService,
    /// Session operations.
    pub sessions: SessionService,
    /// Stats reads.
    pub stats: StatsService,
    /// Bearer-credential resolver.
    pub identity: Arc<dyn IdentityProvider>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/lobbies", post(create_lobby).get(list_lobbies))
        .route("/lobbies/{id}", get(get_lobby))
        .route("/lobbies/{id}/join", post(join_lobby))
        .route("/lobbies/{id}/leave", post(leave_lobby))
        .route("/lobbies/{id}/ready", post(toggle_ready))
        .route("/lobbies/{id}/game-type", post(change_game_type))
        .route("/lobbies/{id}/start", post(start_game))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/moves", post(make_move).get(list_moves))
        .route("/games/{id}/abandon", post(abandon_game))
        .route("/stats/me", get(my_stats))
        .route("/stats/{user_id}", get(user_stats))
        .with_state(state)
}

/// Request body for creating a lobby.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLobbyRequest {
    /// Lobby display name.
    pub name: String,
    /// Game the lobby will play.
    pub game_type: GameType,
    /// Player capacity; defaults to the game's maximum.
    pub max_players: Option<usize>,
}

/// Request body for switching a lobby's game type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeGameTypeRequest {
    /// The new game type.
    pub game_type: GameType,
}

/// Request body for starting a game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartGameRequest {
    /// Starting-player override; defaults to the first joiner.
    pub starting_player_id: Option<String>,
}

/// One stats row in API shape.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatView {
    /// Game the counters are for.
    pub game_type: String,
    /// Wins.
    pub wins: i32,
    /// Losses.
    pub losses: i32,
    /// Draws.
    pub draws: i32,
    /// Games played, abandonments included.
    pub played: i32,
    /// Win rate percentage.
    pub win_rate: f64,
}

impl From<&PlayerStat> for PlayerStatView {
    fn from(row: &PlayerStat) -> Self {
        Self {
            game_type: row.game_type().clone(),
            wins: *row.wins(),
            losses: *row.losses(),
            draws: *row.draws(),
            played: *row.played(),
            win_rate: row.win_rate(),
        }
    }
}

/// Error payload carried to the client.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status to respond with.
    pub status: StatusCode,
    /// Human-readable reason.
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!(status = %self.status, message = %self.message, "Request failed");
        let body = Json(json!({ "success": false, "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, err.to_string())
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        let status = match err {
            GameError::OutOfRange { .. }
            | GameError::MalformedMove { .. }
            | GameError::StateMismatch { .. } => StatusCode::BAD_REQUEST,
            GameError::PositionTaken { .. }
            | GameError::ColumnFull { .. }
            | GameError::GameOver
            | GameError::NotAPlayer { .. } => StatusCode::CONFLICT,
            GameError::InvalidPlayerCount { .. } | GameError::UnsupportedGameType { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Conflict { .. } => StatusCode::CONFLICT,
            StoreError::AlreadyExists { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<LobbyError> for ApiError {
    fn from(err: LobbyError) -> Self {
        match err {
            LobbyError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            LobbyError::InvalidMaxPlayers { .. } => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            LobbyError::NotWaiting { .. }
            | LobbyError::LobbyFull { .. }
            | LobbyError::AlreadyInLobby { .. }
            | LobbyError::NotAMember { .. }
            | LobbyError::NotOwner { .. }
            | LobbyError::ReadyNotSupported { .. }
            | LobbyError::OwnerAlwaysReady
            | LobbyError::NotEnoughPlayers { .. }
            | LobbyError::PlayersNotReady => Self::new(StatusCode::CONFLICT, err.to_string()),
            LobbyError::Engine(e) => e.into(),
            LobbyError::Store(e) => e.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            SessionError::NotInProgress { .. }
            | SessionError::NotYourTurn { .. }
            | SessionError::NotAParticipant { .. } => {
                Self::new(StatusCode::CONFLICT, err.to_string())
            }
            SessionError::Engine(e) => e.into(),
            SessionError::Store(e) => e.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

/// Resolves the caller from the Authorization header.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserProfile, ApiError> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingCredentials)?;
    Ok(state.identity.resolve(bearer)?)
}

/// Wraps a payload in the success envelope.
fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

#[instrument(skip(state, headers, req))]
async fn create_lobby(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateLobbyRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;
    let lobby = state
        .lobbies
        .create_lobby(&user, req.name, req.game_type, req.max_players)?;
    Ok(ok(lobby))
}

#[instrument(skip(state))]
async fn list_lobbies(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(ok(state.lobbies.list_lobbies()?))
}

#[instrument(skip(state))]
async fn get_lobby(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(ok(state.lobbies.get_lobby(&id)?))
}

#[instrument(skip(state, headers))]
async fn join_lobby(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;
    Ok(ok(state.lobbies.join_lobby(&id, &user)?))
}

#[instrument(skip(state, headers))]
async fn leave_lobby(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;
    match state.lobbies.leave_lobby(&id, &user.user_id)? {
        LeaveOutcome::Deleted => Ok(ok(json!({ "deleted": true }))),
        LeaveOutcome::Left(lobby) => Ok(ok(json!({ "deleted": false, "lobby": lobby }))),
    }
}

#[instrument(skip(state, headers))]
async fn toggle_ready(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;
    Ok(ok(state.lobbies.toggle_ready(&id, &user.user_id)?))
}

#[instrument(skip(state, headers, req))]
async fn change_game_type(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ChangeGameTypeRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;
    Ok(ok(state
        .lobbies
        .change_game_type(&id, &user.user_id, req.game_type)?))
}

#[instrument(skip(state, headers, req))]
async fn start_game(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    req: Option<Json<StartGameRequest>>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let session =
        state
            .lobbies
            .start_game(&id, &user.user_id, req.starting_player_id.as_deref())?;
    Ok(ok(session))
}

#[instrument(skip(state))]
async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(ok(state.sessions.get_session(&id)?))
}

#[instrument(skip(state, headers, input))]
async fn make_move(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<MoveInput>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;
    Ok(ok(state.sessions.make_move(&id, &user.user_id, input)?))
}

#[instrument(skip(state, headers))]
async fn abandon_game(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;
    Ok(ok(state.sessions.abandon(&id, &user.user_id)?))
}

#[instrument(skip(state))]
async fn list_moves(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(ok(state.sessions.list_moves(&id)?))
}

#[instrument(skip(state, headers))]
async fn my_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers)?;
    stats_for(&state, &user.user_id)
}

#[instrument(skip(state))]
async fn user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    stats_for(&state, &user_id)
}

/// Shared stats read: per-game rows plus the cross-game summary.
fn stats_for(state: &AppState, user_id: &str) -> Result<Json<Value>, ApiError> {
    let (rows, summary) = state.stats.get_user_stats(user_id)?;
    let rows: Vec<PlayerStatView> = rows.iter().map(PlayerStatView::from).collect();
    Ok(ok(json!({
        "user_id": user_id,
        "games": rows,
        "summary": summary_view(&summary),
    })))
}

fn summary_view(summary: &StatsSummary) -> Value {
    json!({
        "wins": summary.wins(),
        "losses": summary.losses(),
        "draws": summary.draws(),
        "played": summary.played(),
        "win_rate": summary.win_rate(),
    })
}
