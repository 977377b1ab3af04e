//! Domain events for the Game Session context.

use nightfall_core::event::{DomainEvent, EventMetadata};
use nightfall_resolution::domain::handlers::SlotSelection;
use nightfall_resolution::domain::pipeline::{Death, NightOutcome};
use nightfall_resolution::domain::scratchpad::Scratchpad;
use nightfall_resolution::domain::victory::Victory;
use nightfall_roles::domain::catalog::RoleId;
use nightfall_roles::domain::roster::{PlayerId, Roster};
use nightfall_roles::domain::wake_order::WakeOrderConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::phase::Phase;
use super::snapshot::GameSnapshot;

/// Emitted when a new game is dealt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStarted {
    /// The session identifier.
    pub session_id: Uuid,
    /// Seated players.
    pub roster: Roster,
    /// Wake order for the chosen variant.
    pub wake_order: WakeOrderConfig,
    /// Whether dead players' roles are still called.
    pub include_dead_roles: bool,
}

/// Emitted when a session is rebuilt from a stored snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRestored {
    /// The snapshot restored from.
    pub snapshot: GameSnapshot,
}

/// Emitted when the moderator records a choice for the active slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionStaged {
    /// Current night.
    pub night: u32,
    /// Index of the slot in tonight's sequence.
    pub slot_index: usize,
    /// What the moderator chose.
    pub selection: SlotSelection,
    /// Scratchpad after the choice was staged.
    pub scratchpad: Scratchpad,
}

/// Emitted when the night moves to another slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotChanged {
    /// Current night.
    pub night: u32,
    /// Index of the slot now active.
    pub slot_index: usize,
}

/// Emitted when the "include dead roles" toggle changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludeDeadRolesSet {
    /// New value.
    pub include_dead_roles: bool,
}

/// Emitted when the night pipeline has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightResolved {
    /// Night resolved.
    pub night: u32,
    /// Everything the pipeline decided.
    pub outcome: NightOutcome,
    /// Player shielded tonight; starts the protector's cooldown.
    pub shielded: Option<PlayerId>,
    /// Power the actor borrowed tonight.
    pub borrowed: Option<RoleId>,
}

/// Emitted when a dead hunter takes someone with them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HunterRetaliated {
    /// The hunter.
    pub hunter: PlayerId,
    /// Who they shot.
    pub target: PlayerId,
    /// The shot and any heartbreak it caused.
    pub deaths: Vec<Death>,
}

/// Emitted when the day moves on (discussion or execution opened, vote
/// skipped).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAdvanced {
    /// Night number of the round.
    pub night: u32,
}

/// Emitted when the moderator switches between one and several executions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionModeSet {
    /// Whether several players may be executed at once.
    pub multiple: bool,
}

/// Emitted when the village's choice is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionTargetsSelected {
    /// Players to execute.
    pub targets: Vec<PlayerId>,
}

/// Emitted when the executions are carried out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfirmed {
    /// Night number of the round.
    pub night: u32,
    /// Executions and any heartbreak they caused.
    pub deaths: Vec<Death>,
}

/// Emitted by the administrative ledger overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerOverridden {
    /// Player affected.
    pub player: PlayerId,
}

/// Emitted when a win condition starts to hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEnded {
    /// Who won.
    pub victory: Victory,
}

/// Emitted when an administrative correction undoes a victory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResumed {
    /// Phase the game returns to.
    pub phase: Phase,
}

/// Emitted by the elapsed-time ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockTicked {
    /// Seconds elapsed since the previous tick.
    pub seconds: u32,
}

/// Emitted when a discussion timer is started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerStarted {
    /// Countdown length.
    pub duration_seconds: u32,
}

/// Event type identifier for [`GameStarted`].
pub const GAME_STARTED_EVENT_TYPE: &str = "game.started";
/// Event type identifier for [`SessionRestored`].
pub const SESSION_RESTORED_EVENT_TYPE: &str = "game.restored";
/// Event type identifier for [`SelectionStaged`].
pub const SELECTION_STAGED_EVENT_TYPE: &str = "game.selection_staged";
/// Event type identifier for a forward [`SlotChanged`].
pub const SLOT_ADVANCED_EVENT_TYPE: &str = "game.slot_advanced";
/// Event type identifier for a backward [`SlotChanged`].
pub const SLOT_STEPPED_BACK_EVENT_TYPE: &str = "game.slot_stepped_back";
/// Event type identifier for [`IncludeDeadRolesSet`].
pub const INCLUDE_DEAD_ROLES_SET_EVENT_TYPE: &str = "game.include_dead_roles_set";
/// Event type identifier for [`NightResolved`].
pub const NIGHT_RESOLVED_EVENT_TYPE: &str = "game.night_resolved";
/// Event type identifier for [`HunterRetaliated`].
pub const HUNTER_RETALIATED_EVENT_TYPE: &str = "game.hunter_retaliated";
/// Event type identifier for the morning-to-discussion transition.
pub const DISCUSSION_OPENED_EVENT_TYPE: &str = "game.discussion_opened";
/// Event type identifier for the discussion-to-execution transition.
pub const EXECUTION_OPENED_EVENT_TYPE: &str = "game.execution_opened";
/// Event type identifier for [`ExecutionModeSet`].
pub const EXECUTION_MODE_SET_EVENT_TYPE: &str = "game.execution_mode_set";
/// Event type identifier for [`ExecutionTargetsSelected`].
pub const EXECUTION_TARGETS_SELECTED_EVENT_TYPE: &str = "game.execution_targets_selected";
/// Event type identifier for [`ExecutionConfirmed`].
pub const EXECUTION_CONFIRMED_EVENT_TYPE: &str = "game.execution_confirmed";
/// Event type identifier for the skip-vote shortcut.
pub const VOTE_SKIPPED_EVENT_TYPE: &str = "game.vote_skipped";
/// Event type identifier for an administrative revival.
pub const PLAYER_REVIVED_EVENT_TYPE: &str = "game.player_revived";
/// Event type identifier for an administrative kill.
pub const PLAYER_KILLED_EVENT_TYPE: &str = "game.player_killed";
/// Event type identifier for [`GameEnded`].
pub const GAME_ENDED_EVENT_TYPE: &str = "game.ended";
/// Event type identifier for [`GameResumed`].
pub const GAME_RESUMED_EVENT_TYPE: &str = "game.resumed";
/// Event type identifier for a restart.
pub const GAME_RESTARTED_EVENT_TYPE: &str = "game.restarted";
/// Event type identifier for [`ClockTicked`].
pub const CLOCK_TICKED_EVENT_TYPE: &str = "game.clock_ticked";
/// Event type identifier for [`TimerStarted`].
pub const TIMER_STARTED_EVENT_TYPE: &str = "game.timer_started";
/// Event type identifier for a paused timer.
pub const TIMER_PAUSED_EVENT_TYPE: &str = "game.timer_paused";
/// Event type identifier for a resumed timer.
pub const TIMER_RESUMED_EVENT_TYPE: &str = "game.timer_resumed";
/// Event type identifier for a reset timer.
pub const TIMER_RESET_EVENT_TYPE: &str = "game.timer_reset";
/// Event type identifier for a cancelled timer.
pub const TIMER_CANCELLED_EVENT_TYPE: &str = "game.timer_cancelled";

/// Event payload variants for the Game Session context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameEventKind {
    /// A new game was dealt.
    GameStarted(GameStarted),
    /// A session was rebuilt from a snapshot.
    SessionRestored(Box<SessionRestored>),
    /// A slot selection was staged.
    SelectionStaged(SelectionStaged),
    /// The next slot became active.
    SlotAdvanced(SlotChanged),
    /// The previous slot became active again.
    SlotSteppedBack(SlotChanged),
    /// The "include dead roles" toggle changed.
    IncludeDeadRolesSet(IncludeDeadRolesSet),
    /// The night was resolved.
    NightResolved(NightResolved),
    /// The hunter fired.
    HunterRetaliated(HunterRetaliated),
    /// Morning ended.
    DiscussionOpened(DayAdvanced),
    /// The vote started.
    ExecutionOpened(DayAdvanced),
    /// Single or multiple execution chosen.
    ExecutionModeSet(ExecutionModeSet),
    /// Execution targets chosen.
    ExecutionTargetsSelected(ExecutionTargetsSelected),
    /// Executions carried out; the next night began.
    ExecutionConfirmed(ExecutionConfirmed),
    /// The vote was skipped; the next night began.
    VoteSkipped(DayAdvanced),
    /// A player was taken off both ledgers.
    PlayerRevived(LedgerOverridden),
    /// A player was added to the victims ledger.
    PlayerKilled(LedgerOverridden),
    /// A win condition holds.
    GameEnded(GameEnded),
    /// A victory was undone.
    GameResumed(GameResumed),
    /// Back to night one with the same table.
    GameRestarted,
    /// Time passed.
    ClockTicked(ClockTicked),
    /// Discussion timer started.
    TimerStarted(TimerStarted),
    /// Discussion timer paused.
    TimerPaused,
    /// Discussion timer resumed.
    TimerResumed,
    /// Discussion timer reset.
    TimerReset,
    /// Discussion timer removed.
    TimerCancelled,
}

impl GameEventKind {
    /// Event type identifier of this payload.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::GameStarted(_) => GAME_STARTED_EVENT_TYPE,
            Self::SessionRestored(_) => SESSION_RESTORED_EVENT_TYPE,
            Self::SelectionStaged(_) => SELECTION_STAGED_EVENT_TYPE,
            Self::SlotAdvanced(_) => SLOT_ADVANCED_EVENT_TYPE,
            Self::SlotSteppedBack(_) => SLOT_STEPPED_BACK_EVENT_TYPE,
            Self::IncludeDeadRolesSet(_) => INCLUDE_DEAD_ROLES_SET_EVENT_TYPE,
            Self::NightResolved(_) => NIGHT_RESOLVED_EVENT_TYPE,
            Self::HunterRetaliated(_) => HUNTER_RETALIATED_EVENT_TYPE,
            Self::DiscussionOpened(_) => DISCUSSION_OPENED_EVENT_TYPE,
            Self::ExecutionOpened(_) => EXECUTION_OPENED_EVENT_TYPE,
            Self::ExecutionModeSet(_) => EXECUTION_MODE_SET_EVENT_TYPE,
            Self::ExecutionTargetsSelected(_) => EXECUTION_TARGETS_SELECTED_EVENT_TYPE,
            Self::ExecutionConfirmed(_) => EXECUTION_CONFIRMED_EVENT_TYPE,
            Self::VoteSkipped(_) => VOTE_SKIPPED_EVENT_TYPE,
            Self::PlayerRevived(_) => PLAYER_REVIVED_EVENT_TYPE,
            Self::PlayerKilled(_) => PLAYER_KILLED_EVENT_TYPE,
            Self::GameEnded(_) => GAME_ENDED_EVENT_TYPE,
            Self::GameResumed(_) => GAME_RESUMED_EVENT_TYPE,
            Self::GameRestarted => GAME_RESTARTED_EVENT_TYPE,
            Self::ClockTicked(_) => CLOCK_TICKED_EVENT_TYPE,
            Self::TimerStarted(_) => TIMER_STARTED_EVENT_TYPE,
            Self::TimerPaused => TIMER_PAUSED_EVENT_TYPE,
            Self::TimerResumed => TIMER_RESUMED_EVENT_TYPE,
            Self::TimerReset => TIMER_RESET_EVENT_TYPE,
            Self::TimerCancelled => TIMER_CANCELLED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Game Session context.
#[derive(Debug, Clone)]
pub struct GameEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: GameEventKind,
}

impl DomainEvent for GameEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("GameEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
