//! Commands for the Game Session context.
//!
//! Every command but [`StartGame`] may name the session the moderator's
//! screen is showing. `None` targets whichever session is active.

use nightfall_core::command::Command;
use nightfall_resolution::domain::handlers::SlotSelection;
use nightfall_roles::domain::roster::{Player, PlayerId};
use nightfall_roles::domain::wake_order::WakeOrderConfig;
use uuid::Uuid;

/// Command to deal a new game.
#[derive(Debug, Clone)]
pub struct StartGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Seats in clockwise order.
    pub players: Vec<Player>,
    /// Wake order for the chosen variant.
    pub wake_order: WakeOrderConfig,
    /// Keep calling dead players' roles.
    pub include_dead_roles: bool,
}

impl Command for StartGame {
    fn command_type(&self) -> &'static str {
        "game.start"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to stage the active slot's selection.
#[derive(Debug, Clone)]
pub struct StageSelection {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
    /// The moderator's choice.
    pub selection: SlotSelection,
}

impl Command for StageSelection {
    fn command_type(&self) -> &'static str {
        "game.stage_selection"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to move to the next slot (or resolve the night).
#[derive(Debug, Clone)]
pub struct AdvanceNight {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
}

impl Command for AdvanceNight {
    fn command_type(&self) -> &'static str {
        "game.advance_night"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to revisit the previous slot.
#[derive(Debug, Clone)]
pub struct StepBack {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
}

impl Command for StepBack {
    fn command_type(&self) -> &'static str {
        "game.step_back"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to toggle calling dead players' roles.
#[derive(Debug, Clone)]
pub struct SetIncludeDeadRoles {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
    /// New toggle value.
    pub include_dead_roles: bool,
}

impl Command for SetIncludeDeadRoles {
    fn command_type(&self) -> &'static str {
        "game.set_include_dead_roles"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to record the hunter's shot.
#[derive(Debug, Clone)]
pub struct ResolveHunter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
    /// Player the hunter takes down.
    pub target: PlayerId,
}

impl Command for ResolveHunter {
    fn command_type(&self) -> &'static str {
        "game.resolve_hunter"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to open the day's discussion.
#[derive(Debug, Clone)]
pub struct OpenDiscussion {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
}

impl Command for OpenDiscussion {
    fn command_type(&self) -> &'static str {
        "game.open_discussion"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to move from discussion to the vote.
#[derive(Debug, Clone)]
pub struct OpenExecution {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
}

impl Command for OpenExecution {
    fn command_type(&self) -> &'static str {
        "game.open_execution"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to switch between single and multiple execution.
#[derive(Debug, Clone)]
pub struct SetExecutionMode {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
    /// Allow several targets.
    pub multiple: bool,
}

impl Command for SetExecutionMode {
    fn command_type(&self) -> &'static str {
        "game.set_execution_mode"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to choose who is executed.
#[derive(Debug, Clone)]
pub struct SelectExecutionTargets {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
    /// Players voted out.
    pub targets: Vec<PlayerId>,
}

impl Command for SelectExecutionTargets {
    fn command_type(&self) -> &'static str {
        "game.select_execution_targets"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to carry out the vote and start the next night.
#[derive(Debug, Clone)]
pub struct ConfirmExecution {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
}

impl Command for ConfirmExecution {
    fn command_type(&self) -> &'static str {
        "game.confirm_execution"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to skip the vote.
#[derive(Debug, Clone)]
pub struct SkipVote {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
}

impl Command for SkipVote {
    fn command_type(&self) -> &'static str {
        "game.skip_vote"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Administrative command to bring a dead player back.
#[derive(Debug, Clone)]
pub struct RevivePlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
    /// Player to revive.
    pub player: PlayerId,
}

impl Command for RevivePlayer {
    fn command_type(&self) -> &'static str {
        "game.revive_player"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Administrative command to mark a player dead.
#[derive(Debug, Clone)]
pub struct KillPlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
    /// Player to kill.
    pub player: PlayerId,
}

impl Command for KillPlayer {
    fn command_type(&self) -> &'static str {
        "game.kill_player"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to replay the game from night one with the same table.
#[derive(Debug, Clone)]
pub struct RestartGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
}

impl Command for RestartGame {
    fn command_type(&self) -> &'static str {
        "game.restart"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command issued by the elapsed-time ticker.
#[derive(Debug, Clone)]
pub struct Tick {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Seconds since the previous tick.
    pub seconds: u32,
}

impl Command for Tick {
    fn command_type(&self) -> &'static str {
        "game.tick"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Discussion timer controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Start a fresh countdown.
    Start {
        /// Countdown length.
        duration_seconds: u32,
    },
    /// Pause the countdown.
    Pause,
    /// Resume a paused countdown.
    Resume,
    /// Back to the full duration, paused.
    Reset,
    /// Remove the timer.
    Cancel,
}

/// Command to drive the discussion timer.
#[derive(Debug, Clone)]
pub struct ControlTimer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target session.
    pub session_id: Option<Uuid>,
    /// What to do.
    pub action: TimerAction,
}

impl Command for ControlTimer {
    fn command_type(&self) -> &'static str {
        match self.action {
            TimerAction::Start { .. } => "game.timer_start",
            TimerAction::Pause => "game.timer_pause",
            TimerAction::Resume => "game.timer_resume",
            TimerAction::Reset => "game.timer_reset",
            TimerAction::Cancel => "game.timer_cancel",
        }
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
