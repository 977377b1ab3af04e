//! Command handlers for the Game Session context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: find the active session, execute the command,
//! then save a snapshot. Saving is best-effort: a failed save is logged and
//! the in-memory transition stands.

use nightfall_core::aggregate::AggregateRoot;
use nightfall_core::clock::Clock;
use nightfall_core::command::Command;
use nightfall_core::error::DomainError;
use nightfall_core::snapshot::SnapshotRepository;
use nightfall_roles::domain::roster::Roster;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::aggregates::GameSession;
use crate::domain::commands::{
    AdvanceNight, ConfirmExecution, ControlTimer, KillPlayer, OpenDiscussion, OpenExecution,
    ResolveHunter, RestartGame, RevivePlayer, SelectExecutionTargets, SetExecutionMode,
    SetIncludeDeadRoles, SkipVote, StageSelection, StartGame, StepBack, Tick, TimerAction,
};
use crate::domain::events::GameEvent;
use crate::domain::phase::Phase;
use crate::domain::snapshot::GameSnapshot;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct GameCommandResult {
    /// The session affected or created by the command.
    pub session_id: Uuid,
    /// The events the command produced, in order.
    pub events: Vec<GameEvent>,
    /// Phase after the command.
    pub phase: Phase,
}

/// Resolves the session a command targets.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if no game is running or the
/// running one is not `expected`.
pub fn active_session(
    slot: &mut Option<GameSession>,
    expected: Option<Uuid>,
) -> Result<&mut GameSession, DomainError> {
    let session = slot
        .as_mut()
        .ok_or_else(|| DomainError::SessionNotFound(expected.unwrap_or_default()))?;
    if let Some(id) = expected {
        if id != session.id {
            return Err(DomainError::SessionNotFound(id));
        }
    }
    Ok(session)
}

async fn save_snapshot(session: &GameSession, clock: &dyn Clock, repo: &dyn SnapshotRepository) {
    let stored = match session.snapshot().to_stored(session.version(), clock.now()) {
        Ok(stored) => stored,
        Err(e) => {
            warn!(session_id = %session.id, error = %e, "snapshot not saved");
            return;
        }
    };
    if let Err(e) = repo.save(session.id, &stored).await {
        warn!(
            session_id = %session.id,
            version = stored.version,
            error = %e,
            "snapshot not saved, continuing in memory"
        );
    }
}

async fn finish(
    session: &mut GameSession,
    command: &impl Command,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> GameCommandResult {
    let events = session.take_uncommitted_events();
    info!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        session_id = %session.id,
        events = events.len(),
        phase = %session.phase(),
        "command handled"
    );
    if !events.is_empty() {
        save_snapshot(session, clock, repo).await;
    }
    GameCommandResult {
        session_id: session.id,
        events,
        phase: session.phase(),
    }
}

/// Runs `action` against the targeted session and persists the result.
async fn execute<C, F>(
    command: &C,
    session_id: Option<Uuid>,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
    action: F,
) -> Result<GameCommandResult, DomainError>
where
    C: Command,
    F: FnOnce(&mut GameSession, Uuid, &dyn Clock) -> Result<(), DomainError> + Send,
{
    let session = active_session(slot, session_id)?;
    action(session, command.correlation_id(), clock)?;
    Ok(finish(session, command, clock, repo).await)
}

/// Restores the most recently saved session into `slot`. A missing,
/// unreadable or unloadable snapshot leaves `slot` empty so the moderator
/// starts a fresh game.
pub async fn restore_latest(
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Option<Uuid> {
    let stored = match repo.load_latest().await {
        Ok(Some(stored)) => stored,
        Ok(None) => {
            info!("no saved game, starting fresh");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "could not load saved game, starting fresh");
            return None;
        }
    };
    let snapshot = match GameSnapshot::from_stored(&stored) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(session_id = %stored.session_id, error = %e, "ignoring unreadable snapshot");
            return None;
        }
    };

    let mut session = GameSession::restore(snapshot, stored.version, Uuid::new_v4(), clock);
    let events = session.take_uncommitted_events();
    info!(
        session_id = %session.id,
        phase = %session.phase(),
        events = events.len(),
        "restored saved game"
    );
    save_snapshot(&session, clock, repo).await;
    let id = session.id;
    *slot = Some(session);
    Some(id)
}

/// Handles the `StartGame` command: validates the roster, deals a new
/// session into `slot` (replacing any running game) and saves it.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the roster is empty or invalid.
pub async fn handle_start_game(
    command: &StartGame,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    let roster = Roster::new(command.players.clone())?;
    let mut session = GameSession::new(Uuid::new_v4());
    session.start_game(
        roster,
        command.wake_order.clone(),
        command.include_dead_roles,
        command.correlation_id,
        clock,
    )?;

    let session = slot.insert(session);
    Ok(finish(session, command, clock, repo).await)
}

/// Handles the `StageSelection` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches, it is not night, or the
/// selection is not on offer.
pub async fn handle_stage_selection(
    command: &StageSelection,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, |session, id, clock| {
        session.stage_selection(command.selection.clone(), id, clock)
    })
    .await
}

/// Handles the `AdvanceNight` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches or it is not night.
pub async fn handle_advance_night(
    command: &AdvanceNight,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, GameSession::advance_night).await
}

/// Handles the `StepBack` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches, it is not night, or the
/// first slot is active.
pub async fn handle_step_back(
    command: &StepBack,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, GameSession::step_back).await
}

/// Handles the `SetIncludeDeadRoles` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches or the game is over.
pub async fn handle_set_include_dead_roles(
    command: &SetIncludeDeadRoles,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, |session, id, clock| {
        session.set_include_dead_roles(command.include_dead_roles, id, clock)
    })
    .await
}

/// Handles the `ResolveHunter` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches, it is not morning, no shot
/// is owed, or the target is not a living player.
pub async fn handle_resolve_hunter(
    command: &ResolveHunter,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, |session, id, clock| {
        session.resolve_hunter(command.target, id, clock)
    })
    .await
}

/// Handles the `OpenDiscussion` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches, it is not morning, or the
/// hunter has not shot yet.
pub async fn handle_open_discussion(
    command: &OpenDiscussion,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, GameSession::open_discussion).await
}

/// Handles the `OpenExecution` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches or it is not discussion.
pub async fn handle_open_execution(
    command: &OpenExecution,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, GameSession::open_execution).await
}

/// Handles the `SetExecutionMode` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches or the day has not started.
pub async fn handle_set_execution_mode(
    command: &SetExecutionMode,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, |session, id, clock| {
        session.set_execution_mode(command.multiple, id, clock)
    })
    .await
}

/// Handles the `SelectExecutionTargets` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches, the vote is not open, or a
/// target is invalid.
pub async fn handle_select_execution_targets(
    command: &SelectExecutionTargets,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, |session, id, clock| {
        session.select_execution_targets(command.targets.clone(), id, clock)
    })
    .await
}

/// Handles the `ConfirmExecution` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches or the vote is not open.
pub async fn handle_confirm_execution(
    command: &ConfirmExecution,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, GameSession::confirm_execution).await
}

/// Handles the `SkipVote` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches or it is not discussion.
pub async fn handle_skip_vote(
    command: &SkipVote,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, GameSession::skip_vote).await
}

/// Handles the `RevivePlayer` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches or the player is not dead.
pub async fn handle_revive_player(
    command: &RevivePlayer,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, |session, id, clock| {
        session.revive_player(command.player, id, clock)
    })
    .await
}

/// Handles the `KillPlayer` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches or the player is not alive.
pub async fn handle_kill_player(
    command: &KillPlayer,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, |session, id, clock| {
        session.kill_player(command.player, id, clock)
    })
    .await
}

/// Handles the `RestartGame` command.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if no session matches.
pub async fn handle_restart_game(
    command: &RestartGame,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, |session, id, clock| {
        session.restart(id, clock);
        Ok(())
    })
    .await
}

/// Handles the `ControlTimer` command.
///
/// # Errors
///
/// Returns `DomainError` if no session matches or the timer is not in a
/// state that allows the action.
pub async fn handle_control_timer(
    command: &ControlTimer,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
    repo: &dyn SnapshotRepository,
) -> Result<GameCommandResult, DomainError> {
    execute(command, command.session_id, slot, clock, repo, |session, id, clock| {
        match command.action {
            TimerAction::Start { duration_seconds } => {
                session.start_timer(duration_seconds, id, clock)
            }
            TimerAction::Pause => session.pause_timer(id, clock),
            TimerAction::Resume => session.resume_timer(id, clock),
            TimerAction::Reset => session.reset_timer(id, clock),
            TimerAction::Cancel => session.cancel_timer(id, clock),
        }
    })
    .await
}

/// Handles a `Tick` from the elapsed-time ticker. Ticks are not saved; the
/// next moderator action carries the counter into the snapshot. Returns
/// `None` when no game is running.
pub fn handle_tick(
    command: &Tick,
    slot: &mut Option<GameSession>,
    clock: &dyn Clock,
) -> Option<GameCommandResult> {
    let session = slot.as_mut()?;
    session.tick(command.seconds, command.correlation_id, clock);
    let events = session.take_uncommitted_events();
    Some(GameCommandResult {
        session_id: session.id,
        events,
        phase: session.phase(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use nightfall_core::event::DomainEvent;
    use nightfall_resolution::domain::handlers::SlotSelection;
    use nightfall_roles::domain::catalog::RoleId;
    use nightfall_roles::domain::roster::{Player, PlayerId};
    use nightfall_roles::domain::wake_order::WakeOrderConfig;
    use nightfall_test_support::{
        EmptySnapshotRepository, FailingSnapshotRepository, FixedClock,
        RecordingSnapshotRepository, RosterBuilder,
    };

    fn fixed_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 10, 31, 21, 0, 0).unwrap())
    }

    fn start_command(players: Vec<Player>) -> StartGame {
        StartGame {
            correlation_id: Uuid::new_v4(),
            players,
            wake_order: WakeOrderConfig::canonical(),
            include_dead_roles: false,
        }
    }

    fn table() -> Vec<Player> {
        RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Villager)
            .player(3, RoleId::Villager)
            .player(4, RoleId::Villager)
            .player(5, RoleId::Villager)
            .into_players()
    }

    async fn started(repo: &dyn SnapshotRepository) -> Option<GameSession> {
        let mut slot = None;
        handle_start_game(&start_command(table()), &mut slot, &fixed_clock(), repo)
            .await
            .unwrap();
        slot
    }

    #[tokio::test]
    async fn test_handle_start_game_saves_snapshot() {
        // Arrange
        let clock = fixed_clock();
        let repo = RecordingSnapshotRepository::new();
        let mut slot = None;
        let command = start_command(table());

        // Act
        let result = handle_start_game(&command, &mut slot, &clock, &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(result.phase, Phase::Night(1));
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].event_type(), "game.started");
        assert_eq!(result.events[0].metadata().correlation_id, command.correlation_id);

        let saved = repo.saved_snapshots();
        assert_eq!(saved.len(), 1);
        let (session_id, stored) = &saved[0];
        assert_eq!(*session_id, result.session_id);
        assert_eq!(stored.version, 1);
        assert_eq!(stored.saved_at, clock.0);
        assert_eq!(slot.map(|s| s.id), Some(result.session_id));
    }

    #[tokio::test]
    async fn test_handle_start_game_rejects_invalid_roster() {
        // Arrange
        let repo = RecordingSnapshotRepository::new();
        let mut slot = None;
        let mut players = table();
        players[1].love_partner = Some(PlayerId(3));

        // Act
        let result =
            handle_start_game(&start_command(players), &mut slot, &fixed_clock(), &repo).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(slot.is_none());
        assert!(repo.saved_snapshots().is_empty());
    }

    #[tokio::test]
    async fn test_command_without_session_is_not_found() {
        // Arrange
        let repo = RecordingSnapshotRepository::new();
        let mut slot = None;
        let command = AdvanceNight {
            correlation_id: Uuid::new_v4(),
            session_id: None,
        };

        // Act
        let result = handle_advance_night(&command, &mut slot, &fixed_clock(), &repo).await;

        // Assert
        assert!(matches!(result, Err(DomainError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_command_for_stale_session_is_not_found() {
        // Arrange
        let repo = RecordingSnapshotRepository::new();
        let mut slot = started(&repo).await;
        let stale = Uuid::new_v4();
        let command = AdvanceNight {
            correlation_id: Uuid::new_v4(),
            session_id: Some(stale),
        };

        // Act
        let result = handle_advance_night(&command, &mut slot, &fixed_clock(), &repo).await;

        // Assert
        assert!(matches!(result, Err(DomainError::SessionNotFound(id)) if id == stale));
    }

    #[tokio::test]
    async fn test_handle_stage_selection_then_advance_resolves_night() {
        // Arrange
        let clock = fixed_clock();
        let repo = RecordingSnapshotRepository::new();
        let mut slot = started(&repo).await;
        let stage = StageSelection {
            correlation_id: Uuid::new_v4(),
            session_id: None,
            selection: SlotSelection::Devour {
                target: PlayerId(3),
                infect: false,
            },
        };
        let advance = AdvanceNight {
            correlation_id: Uuid::new_v4(),
            session_id: None,
        };

        // Act
        handle_stage_selection(&stage, &mut slot, &clock, &repo)
            .await
            .unwrap();
        let result = handle_advance_night(&advance, &mut slot, &clock, &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(result.phase, Phase::Morning(1));
        assert_eq!(result.events[0].event_type(), "game.night_resolved");
        let saved = repo.saved_snapshots();
        assert_eq!(saved.len(), 3);
        let latest = GameSnapshot::from_stored(&saved[2].1).unwrap();
        assert_eq!(latest.ledgers.victims, vec![PlayerId(3)]);
        assert_eq!(latest.phase, Phase::Morning(1));
    }

    #[tokio::test]
    async fn test_rejected_command_is_not_saved() {
        // Arrange
        let repo = RecordingSnapshotRepository::new();
        let mut slot = started(&repo).await;
        let command = OpenDiscussion {
            correlation_id: Uuid::new_v4(),
            session_id: None,
        };

        // Act
        let result = handle_open_discussion(&command, &mut slot, &fixed_clock(), &repo).await;

        // Assert
        assert!(matches!(result, Err(DomainError::InvalidPhase { .. })));
        assert_eq!(repo.saved_snapshots().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_does_not_fail_command() {
        // Arrange
        let repo = FailingSnapshotRepository;
        let mut slot = started(&repo).await;
        let command = KillPlayer {
            correlation_id: Uuid::new_v4(),
            session_id: None,
            player: PlayerId(2),
        };

        // Act
        let result = handle_kill_player(&command, &mut slot, &fixed_clock(), &repo).await;

        // Assert
        assert!(result.is_ok());
        let session = slot.unwrap();
        assert_eq!(session.ledgers().victims, vec![PlayerId(2)]);
    }

    #[tokio::test]
    async fn test_handle_control_timer_starts_timer() {
        // Arrange
        let repo = EmptySnapshotRepository;
        let mut slot = started(&repo).await;
        let command = ControlTimer {
            correlation_id: Uuid::new_v4(),
            session_id: None,
            action: TimerAction::Start {
                duration_seconds: 120,
            },
        };

        // Act
        let result = handle_control_timer(&command, &mut slot, &fixed_clock(), &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(result.events[0].event_type(), "game.timer_started");
        let timer = slot.unwrap().timer().unwrap();
        assert_eq!(timer.remaining_seconds, 120);
        assert!(timer.running);
    }

    #[tokio::test]
    async fn test_handle_tick_is_not_saved() {
        // Arrange
        let repo = RecordingSnapshotRepository::new();
        let mut slot = started(&repo).await;
        let command = Tick {
            correlation_id: Uuid::new_v4(),
            seconds: 1,
        };

        // Act
        let result = handle_tick(&command, &mut slot, &fixed_clock()).unwrap();

        // Assert
        assert_eq!(result.events.len(), 1);
        assert_eq!(slot.unwrap().elapsed_seconds(), 1);
        assert_eq!(repo.saved_snapshots().len(), 1);
    }

    #[test]
    fn test_handle_tick_without_game_is_a_no_op() {
        let command = Tick {
            correlation_id: Uuid::new_v4(),
            seconds: 1,
        };

        assert!(handle_tick(&command, &mut None, &fixed_clock()).is_none());
    }

    #[tokio::test]
    async fn test_restore_latest_rebuilds_saved_session() {
        // Arrange
        let clock = fixed_clock();
        let repo = RecordingSnapshotRepository::new();
        let mut original = started(&repo).await;
        handle_kill_player(
            &KillPlayer {
                correlation_id: Uuid::new_v4(),
                session_id: None,
                player: PlayerId(4),
            },
            &mut original,
            &clock,
            &repo,
        )
        .await
        .unwrap();
        let original = original.unwrap();
        let mut slot = None;

        // Act
        let restored_id = restore_latest(&mut slot, &clock, &repo).await;

        // Assert
        assert_eq!(restored_id, Some(original.id));
        let session = slot.unwrap();
        assert_eq!(session.phase(), Phase::Night(1));
        assert_eq!(session.ledgers().victims, vec![PlayerId(4)]);
        assert_eq!(session.version(), original.version() + 1);
    }

    #[tokio::test]
    async fn test_restore_latest_with_nothing_saved_starts_fresh() {
        let mut slot = None;

        let restored = restore_latest(&mut slot, &fixed_clock(), &EmptySnapshotRepository).await;

        assert!(restored.is_none());
        assert!(slot.is_none());
    }

    #[tokio::test]
    async fn test_restore_latest_swallows_load_failure() {
        let mut slot = None;

        let restored =
            restore_latest(&mut slot, &fixed_clock(), &FailingSnapshotRepository).await;

        assert!(restored.is_none());
        assert!(slot.is_none());
    }
}
