//! Routes for the Game Session bounded context.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use nightfall_core::event::DomainEvent;
use nightfall_game::application::command_handlers::{self, GameCommandResult};
use nightfall_game::application::query_handlers::{self, GameView};
use nightfall_game::domain::commands;
use nightfall_game::domain::commands::TimerAction;
use nightfall_game::domain::phase::Phase;
use nightfall_resolution::domain::handlers::SlotSelection;
use nightfall_roles::application::wake_order_source::load_wake_order;
use nightfall_roles::domain::roster::{Player, PlayerId};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /start.
#[derive(Debug, Deserialize)]
pub struct StartGameRequest {
    /// Seats in clockwise order.
    pub players: Vec<Player>,
    /// Variant whose wake order to use; defaults to the configured one.
    #[serde(default)]
    pub variant: Option<String>,
    /// Merge base-role wake orders; defaults to the configured value.
    #[serde(default)]
    pub include_base_roles: Option<bool>,
    /// Keep calling dead players' roles.
    #[serde(default)]
    pub include_dead_roles: bool,
}

/// Request body for commands that take no arguments.
#[derive(Debug, Default, Deserialize)]
pub struct SessionRequest {
    /// Session the moderator's screen shows.
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

/// Request body for POST /night/select.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    /// Session the moderator's screen shows.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// The active slot's choice.
    pub selection: SlotSelection,
}

/// Request body for POST /night/include-dead.
#[derive(Debug, Deserialize)]
pub struct IncludeDeadRequest {
    /// Session the moderator's screen shows.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// New toggle value.
    pub include_dead_roles: bool,
}

/// Request body for commands aimed at one player.
#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    /// Session the moderator's screen shows.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// The player.
    pub player: PlayerId,
}

/// Request body for POST /day/execution-mode.
#[derive(Debug, Deserialize)]
pub struct ExecutionModeRequest {
    /// Session the moderator's screen shows.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Allow several targets.
    pub multiple: bool,
}

/// Request body for POST /day/execution-targets.
#[derive(Debug, Deserialize)]
pub struct ExecutionTargetsRequest {
    /// Session the moderator's screen shows.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Players voted out.
    pub targets: Vec<PlayerId>,
}

/// Request body for POST /timer/start.
#[derive(Debug, Deserialize)]
pub struct StartTimerRequest {
    /// Session the moderator's screen shows.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Countdown length.
    pub duration_seconds: u32,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The session the command ran against.
    pub session_id: Uuid,
    /// Types of the events produced, in order.
    pub event_types: Vec<&'static str>,
    /// Phase after the command.
    pub phase: Phase,
}

impl From<GameCommandResult> for CommandResponse {
    fn from(result: GameCommandResult) -> Self {
        Self {
            session_id: result.session_id,
            event_types: result.events.iter().map(DomainEvent::event_type).collect(),
            phase: result.phase,
        }
    }
}

type CommandReply = Result<Json<CommandResponse>, ApiError>;

/// GET /
#[instrument(skip(state))]
async fn get_game(State(state): State<AppState>) -> Result<Json<GameView>, ApiError> {
    let game = state.game.lock().await;
    let view = query_handlers::get_game_view(game.as_ref())?;
    Ok(Json(view))
}

/// POST /start
#[instrument(skip(state, request), fields(players = request.players.len()))]
async fn start_game(
    State(state): State<AppState>,
    Json(request): Json<StartGameRequest>,
) -> CommandReply {
    let variant = request
        .variant
        .unwrap_or_else(|| state.defaults.variant.clone());
    let include_base_roles = request
        .include_base_roles
        .unwrap_or(state.defaults.include_base_roles);
    let wake_order =
        load_wake_order(state.wake_orders.as_ref(), &variant, include_base_roles).await;

    let command = commands::StartGame {
        correlation_id: Uuid::new_v4(),
        players: request.players,
        wake_order,
        include_dead_roles: request.include_dead_roles,
    };

    let mut game = state.game.lock().await;
    let result = command_handlers::handle_start_game(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /night/select
#[instrument(skip(state, request))]
async fn select(State(state): State<AppState>, Json(request): Json<SelectRequest>) -> CommandReply {
    let command = commands::StageSelection {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
        selection: request.selection,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_stage_selection(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /night/advance
#[instrument(skip(state, request))]
async fn advance(State(state): State<AppState>, Json(request): Json<SessionRequest>) -> CommandReply {
    let command = commands::AdvanceNight {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_advance_night(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /night/back
#[instrument(skip(state, request))]
async fn back(State(state): State<AppState>, Json(request): Json<SessionRequest>) -> CommandReply {
    let command = commands::StepBack {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_step_back(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /night/include-dead
#[instrument(skip(state, request), fields(include_dead_roles = request.include_dead_roles))]
async fn include_dead(
    State(state): State<AppState>,
    Json(request): Json<IncludeDeadRequest>,
) -> CommandReply {
    let command = commands::SetIncludeDeadRoles {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
        include_dead_roles: request.include_dead_roles,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_set_include_dead_roles(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /morning/hunter
#[instrument(skip(state, request), fields(target = %request.player))]
async fn hunter(State(state): State<AppState>, Json(request): Json<PlayerRequest>) -> CommandReply {
    let command = commands::ResolveHunter {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
        target: request.player,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_resolve_hunter(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /day/discussion
#[instrument(skip(state, request))]
async fn discussion(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> CommandReply {
    let command = commands::OpenDiscussion {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_open_discussion(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /day/execution
#[instrument(skip(state, request))]
async fn execution(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> CommandReply {
    let command = commands::OpenExecution {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_open_execution(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /day/execution-mode
#[instrument(skip(state, request), fields(multiple = request.multiple))]
async fn execution_mode(
    State(state): State<AppState>,
    Json(request): Json<ExecutionModeRequest>,
) -> CommandReply {
    let command = commands::SetExecutionMode {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
        multiple: request.multiple,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_set_execution_mode(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /day/execution-targets
#[instrument(skip(state, request))]
async fn execution_targets(
    State(state): State<AppState>,
    Json(request): Json<ExecutionTargetsRequest>,
) -> CommandReply {
    let command = commands::SelectExecutionTargets {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
        targets: request.targets,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_select_execution_targets(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /day/execute
#[instrument(skip(state, request))]
async fn execute(State(state): State<AppState>, Json(request): Json<SessionRequest>) -> CommandReply {
    let command = commands::ConfirmExecution {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_confirm_execution(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /day/skip-vote
#[instrument(skip(state, request))]
async fn skip_vote(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> CommandReply {
    let command = commands::SkipVote {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_skip_vote(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

async fn control_timer(
    state: &AppState,
    session_id: Option<Uuid>,
    action: TimerAction,
) -> CommandReply {
    let command = commands::ControlTimer {
        correlation_id: Uuid::new_v4(),
        session_id,
        action,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_control_timer(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /timer/start
#[instrument(skip(state, request), fields(duration_seconds = request.duration_seconds))]
async fn timer_start(
    State(state): State<AppState>,
    Json(request): Json<StartTimerRequest>,
) -> CommandReply {
    let action = TimerAction::Start {
        duration_seconds: request.duration_seconds,
    };
    control_timer(&state, request.session_id, action).await
}

/// POST /timer/pause
#[instrument(skip(state, request))]
async fn timer_pause(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> CommandReply {
    control_timer(&state, request.session_id, TimerAction::Pause).await
}

/// POST /timer/resume
#[instrument(skip(state, request))]
async fn timer_resume(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> CommandReply {
    control_timer(&state, request.session_id, TimerAction::Resume).await
}

/// POST /timer/reset
#[instrument(skip(state, request))]
async fn timer_reset(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> CommandReply {
    control_timer(&state, request.session_id, TimerAction::Reset).await
}

/// POST /timer/cancel
#[instrument(skip(state, request))]
async fn timer_cancel(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> CommandReply {
    control_timer(&state, request.session_id, TimerAction::Cancel).await
}

/// POST /admin/revive
#[instrument(skip(state, request), fields(player = %request.player))]
async fn revive(State(state): State<AppState>, Json(request): Json<PlayerRequest>) -> CommandReply {
    let command = commands::RevivePlayer {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
        player: request.player,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_revive_player(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /admin/kill
#[instrument(skip(state, request), fields(player = %request.player))]
async fn kill(State(state): State<AppState>, Json(request): Json<PlayerRequest>) -> CommandReply {
    let command = commands::KillPlayer {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
        player: request.player,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_kill_player(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// POST /restart
#[instrument(skip(state, request))]
async fn restart(State(state): State<AppState>, Json(request): Json<SessionRequest>) -> CommandReply {
    let command = commands::RestartGame {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
    };
    let mut game = state.game.lock().await;
    let result = command_handlers::handle_restart_game(
        &command,
        &mut game,
        state.clock.as_ref(),
        state.snapshots.as_ref(),
    )
    .await?;
    Ok(Json(result.into()))
}

/// Returns the router for the game context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_game))
        .route("/start", post(start_game))
        .route("/restart", post(restart))
        .route("/night/select", post(select))
        .route("/night/advance", post(advance))
        .route("/night/back", post(back))
        .route("/night/include-dead", post(include_dead))
        .route("/morning/hunter", post(hunter))
        .route("/day/discussion", post(discussion))
        .route("/day/execution", post(execution))
        .route("/day/execution-mode", post(execution_mode))
        .route("/day/execution-targets", post(execution_targets))
        .route("/day/execute", post(execute))
        .route("/day/skip-vote", post(skip_vote))
        .route("/timer/start", post(timer_start))
        .route("/timer/pause", post(timer_pause))
        .route("/timer/resume", post(timer_resume))
        .route("/timer/reset", post(timer_reset))
        .route("/timer/cancel", post(timer_cancel))
        .route("/admin/revive", post(revive))
        .route("/admin/kill", post(kill))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use nightfall_core::snapshot::SnapshotRepository;
    use nightfall_roles::application::wake_order_source::YamlWakeOrderSource;
    use nightfall_test_support::{FailingSnapshotRepository, FixedClock, RecordingSnapshotRepository};
    use tower::ServiceExt;

    use crate::state::GameDefaults;

    fn app_state_with(snapshots: Arc<dyn SnapshotRepository>) -> AppState {
        AppState::new(
            Arc::new(FixedClock(Utc::now())),
            snapshots,
            Arc::new(YamlWakeOrderSource::default()),
            GameDefaults {
                variant: "base".to_owned(),
                include_base_roles: true,
            },
        )
    }

    fn post(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn start_body() -> serde_json::Value {
        serde_json::json!({
            "players": [
                { "id": 1, "display_name": "Ada", "role": "werewolf" },
                { "id": 2, "display_name": "Bo", "role": "villager" },
                { "id": 3, "display_name": "Cy", "role": "villager" }
            ]
        })
    }

    #[tokio::test]
    async fn test_start_returns_200_and_saves_snapshot() {
        // Arrange
        let repo = Arc::new(RecordingSnapshotRepository::new());
        let app = router().with_state(app_state_with(repo.clone()));

        // Act
        let response = app.oneshot(post("/start", &start_body())).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(repo.saved_snapshots().len(), 1);
    }

    #[tokio::test]
    async fn test_start_succeeds_when_snapshot_save_fails() {
        // Arrange
        let state = app_state_with(Arc::new(FailingSnapshotRepository));
        let app = router().with_state(state.clone());

        // Act
        let response = app.oneshot(post("/start", &start_body())).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.game.lock().await.is_some());
    }

    #[tokio::test]
    async fn test_command_without_game_returns_404() {
        // Arrange
        let app = router().with_state(app_state_with(Arc::new(RecordingSnapshotRepository::new())));

        // Act
        let response = app
            .oneshot(post("/night/advance", &serde_json::json!({})))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
