//! Query handlers for the Game Session context.
//!
//! This module contains query handlers that read the active session and
//! return read-only view DTOs for the moderator's screen.

use nightfall_core::aggregate::AggregateRoot;
use nightfall_core::error::DomainError;
use nightfall_resolution::domain::handlers::Prompt;
use nightfall_resolution::domain::pipeline::NightOutcome;
use nightfall_resolution::domain::powers::SinglePowers;
use nightfall_resolution::domain::scratchpad::Scratchpad;
use nightfall_roles::domain::catalog::{RoleId, Team};
use nightfall_roles::domain::roster::{Ledgers, PlayerId};
use nightfall_roles::domain::wake_order::NightSlot;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{BorrowRecord, GameSession};
use crate::domain::phase::Phase;
use crate::domain::timer::DiscussionTimer;

/// One seat as the moderator sees it.
#[derive(Debug, Serialize)]
pub struct PlayerView {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub display_name: String,
    /// Dealt role.
    pub role: RoleId,
    /// Effective team (infection included).
    pub team: Team,
    /// Whether the player is alive.
    pub alive: bool,
    /// Whether the player was infected.
    pub infected: bool,
    /// Love-bond partner.
    pub love_partner: Option<PlayerId>,
}

/// Tonight's progress. Present only during a night.
#[derive(Debug, Serialize)]
pub struct NightView {
    /// Slots in wake order.
    pub slots: Vec<NightSlot>,
    /// Index of the active slot.
    pub cursor: usize,
    /// What the active slot may do.
    pub prompt: Option<Prompt>,
    /// Selections staged so far, seer results included.
    pub scratchpad: Scratchpad,
}

/// The vote in progress.
#[derive(Debug, Serialize)]
pub struct ExecutionView {
    /// Several players may be executed together.
    pub multiple: bool,
    /// Players chosen so far.
    pub selected: Vec<PlayerId>,
}

/// Read-only view of the active session.
#[derive(Debug, Serialize)]
pub struct GameView {
    /// The session identifier.
    pub session_id: Uuid,
    /// Current phase.
    pub phase: Phase,
    /// Round number.
    pub night: u32,
    /// Seats in clockwise order.
    pub players: Vec<PlayerView>,
    /// Death ledgers.
    pub ledgers: Ledgers,
    /// Single-use power usage.
    pub powers: SinglePowers,
    /// Whether dead players' roles are still called.
    pub include_dead_roles: bool,
    /// Night progress, during a night.
    pub night_progress: Option<NightView>,
    /// Result of the latest night.
    pub last_outcome: Option<NightOutcome>,
    /// Hunter still owed a shot.
    pub hunter_pending: Option<PlayerId>,
    /// Vote in progress.
    pub execution: ExecutionView,
    /// Seconds the game has been running.
    pub elapsed_seconds: u64,
    /// Discussion timer.
    pub timer: Option<DiscussionTimer>,
    /// Powers the actor has borrowed.
    pub borrow_history: Vec<BorrowRecord>,
    /// Current version (event count).
    pub version: i64,
}

/// Builds the view of the active session.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if no game is running.
pub fn get_game_view(session: Option<&GameSession>) -> Result<GameView, DomainError> {
    let session = session.ok_or(DomainError::SessionNotFound(Uuid::nil()))?;

    let players = session
        .roster
        .players()
        .iter()
        .map(|p| PlayerView {
            id: p.id,
            display_name: p.display_name.clone(),
            role: p.role,
            team: p.team(),
            alive: session.ledgers.is_alive(p.id),
            infected: p.infected,
            love_partner: p.love_partner,
        })
        .collect();

    let night_progress = matches!(session.phase, Phase::Night(_)).then(|| NightView {
        slots: session.progress.slots.clone(),
        cursor: session.progress.cursor,
        prompt: session.current_prompt(),
        scratchpad: session.progress.scratchpad.clone(),
    });

    Ok(GameView {
        session_id: session.id,
        phase: session.phase,
        night: session.night,
        players,
        ledgers: session.ledgers.clone(),
        powers: session.powers,
        include_dead_roles: session.include_dead_roles,
        night_progress,
        last_outcome: session.last_outcome.clone(),
        hunter_pending: session.hunter_pending,
        execution: ExecutionView {
            multiple: session.execution.multiple,
            selected: session.execution.selected.clone(),
        },
        elapsed_seconds: session.elapsed_seconds,
        timer: session.timer,
        borrow_history: session.borrow_history.clone(),
        version: session.version(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use nightfall_resolution::domain::handlers::SlotSelection;
    use nightfall_roles::domain::catalog::HandlerKind;
    use nightfall_roles::domain::wake_order::WakeOrderConfig;
    use nightfall_test_support::{FixedClock, RosterBuilder};

    fn fixed_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 10, 31, 21, 0, 0).unwrap())
    }

    fn session() -> GameSession {
        let roster = RosterBuilder::new()
            .player(1, RoleId::Werewolf)
            .player(2, RoleId::Seer)
            .player(3, RoleId::Villager)
            .player(4, RoleId::Villager)
            .bond(3, 4)
            .build();
        let mut session = GameSession::new(Uuid::new_v4());
        session
            .start_game(
                roster,
                WakeOrderConfig::canonical(),
                false,
                Uuid::new_v4(),
                &fixed_clock(),
            )
            .unwrap();
        session
    }

    #[test]
    fn test_view_without_game_is_not_found() {
        let result = get_game_view(None);

        assert!(matches!(result, Err(DomainError::SessionNotFound(_))));
    }

    #[test]
    fn test_night_view_shows_active_prompt() {
        let session = session();

        let view = get_game_view(Some(&session)).unwrap();

        assert_eq!(view.phase, Phase::Night(1));
        assert_eq!(view.players.len(), 4);
        assert_eq!(view.players[2].love_partner, Some(PlayerId(4)));
        let night = view.night_progress.unwrap();
        assert_eq!(night.cursor, 0);
        let prompt = night.prompt.unwrap();
        assert_eq!(prompt.handler, HandlerKind::Seer);
        assert_eq!(prompt.targets, vec![PlayerId(1), PlayerId(3), PlayerId(4)]);
    }

    #[test]
    fn test_morning_view_carries_outcome() {
        let mut session = session();
        let clock = fixed_clock();
        session.advance_night(Uuid::new_v4(), &clock).unwrap();
        session
            .stage_selection(
                SlotSelection::Devour {
                    target: PlayerId(3),
                    infect: false,
                },
                Uuid::new_v4(),
                &clock,
            )
            .unwrap();
        session.advance_night(Uuid::new_v4(), &clock).unwrap();

        let view = get_game_view(Some(&session)).unwrap();

        assert_eq!(view.phase, Phase::Morning(1));
        assert!(view.night_progress.is_none());
        let outcome = view.last_outcome.unwrap();
        assert_eq!(outcome.victims(), vec![PlayerId(3), PlayerId(4)]);
        assert!(!view.players[3].alive);
    }
}
