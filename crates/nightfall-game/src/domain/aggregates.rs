//! Aggregate root for the Game Session context.
//!
//! `GameSession` is the phase state machine. Every command method checks
//! its guards, builds one event and hands it to [`AggregateRoot::apply`],
//! the only place session state changes. The win evaluator runs after
//! every event that touches a ledger.

use nightfall_core::aggregate::AggregateRoot;
use nightfall_core::clock::Clock;
use nightfall_core::error::DomainError;
use nightfall_core::event::EventMetadata;
use nightfall_resolution::domain::handlers::{NightContext, Prompt, RoleHandler, SlotSelection};
use nightfall_resolution::domain::pipeline::{
    Death, DeathCause, DeferredEffect, NightInput, NightOutcome, heartbreak_pass, resolve_night,
};
use nightfall_resolution::domain::powers::SinglePowers;
use nightfall_resolution::domain::scratchpad::Scratchpad;
use nightfall_resolution::domain::victory::evaluate;
use nightfall_roles::domain::catalog::RoleId;
use nightfall_roles::domain::roster::{Ledgers, PlayerId, Roster};
use nightfall_roles::domain::wake_order::{NightSlot, WakeOrderConfig, resolve};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::events::{
    ClockTicked, DayAdvanced, ExecutionConfirmed, ExecutionModeSet, ExecutionTargetsSelected,
    GameEnded, GameEvent, GameEventKind, GameResumed, GameStarted, HunterRetaliated,
    IncludeDeadRolesSet, LedgerOverridden, NightResolved, SelectionStaged, SessionRestored,
    SlotChanged, TimerStarted,
};
use super::phase::Phase;
use super::snapshot::GameSnapshot;
use super::timer::DiscussionTimer;

/// A power the actor borrowed, kept for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRecord {
    /// Night it was borrowed on.
    pub night: u32,
    /// The borrowed role.
    pub power: RoleId,
}

/// Tonight's slot sequence and the undo stack over the scratchpad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightProgress {
    /// Slots in wake order.
    pub slots: Vec<NightSlot>,
    /// Index of the active slot.
    pub cursor: usize,
    /// Selections staged so far.
    pub scratchpad: Scratchpad,
    /// `checkpoints[i]` is the scratchpad as it was when slot `i` became
    /// active. Always `cursor + 1` entries long.
    checkpoints: Vec<Scratchpad>,
}

impl NightProgress {
    fn new(slots: Vec<NightSlot>) -> Self {
        Self {
            slots,
            cursor: 0,
            scratchpad: Scratchpad::default(),
            checkpoints: vec![Scratchpad::default()],
        }
    }

    /// The slot whose role is awake.
    #[must_use]
    pub fn active_slot(&self) -> Option<&NightSlot> {
        self.slots.get(self.cursor)
    }

    /// Scratchpad as it was before the active slot wrote to it.
    #[must_use]
    pub fn checkpoint(&self) -> Scratchpad {
        self.checkpoints
            .get(self.cursor)
            .cloned()
            .unwrap_or_default()
    }

    fn is_last_slot(&self) -> bool {
        self.cursor + 1 >= self.slots.len()
    }
}

/// The village's pending vote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionDraft {
    /// Whether several players may be executed together.
    pub multiple: bool,
    /// Players chosen so far.
    pub selected: Vec<PlayerId>,
}

/// The aggregate root for one game.
#[derive(Debug)]
pub struct GameSession {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) phase: Phase,
    /// Round number; survives `GameOver`.
    pub(crate) night: u32,
    pub(crate) roster: Roster,
    pub(crate) ledgers: Ledgers,
    pub(crate) powers: SinglePowers,
    pub(crate) deferred: Vec<DeferredEffect>,
    pub(crate) hunter_pending: Option<PlayerId>,
    pub(crate) previous_shield: Option<PlayerId>,
    pub(crate) wake_order: WakeOrderConfig,
    pub(crate) include_dead_roles: bool,
    pub(crate) progress: NightProgress,
    /// Result of the most recent night, for the morning announcement.
    pub(crate) last_outcome: Option<NightOutcome>,
    pub(crate) execution: ExecutionDraft,
    pub(crate) elapsed_seconds: u64,
    pub(crate) timer: Option<DiscussionTimer>,
    pub(crate) borrow_history: Vec<BorrowRecord>,
    pub(crate) resume_phase: Option<Phase>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<GameEvent>,
}

impl GameSession {
    /// Creates an empty session. Call [`start_game`](Self::start_game) to
    /// deal a table.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            phase: Phase::Night(1),
            night: 1,
            roster: Roster::default(),
            ledgers: Ledgers::default(),
            powers: SinglePowers::default(),
            deferred: Vec::new(),
            hunter_pending: None,
            previous_shield: None,
            wake_order: WakeOrderConfig::canonical(),
            include_dead_roles: false,
            progress: NightProgress::default(),
            last_outcome: None,
            execution: ExecutionDraft::default(),
            elapsed_seconds: 0,
            timer: None,
            borrow_history: Vec::new(),
            resume_phase: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Rebuilds a session from its latest snapshot. A night in progress
    /// restarts from its first slot.
    #[must_use]
    pub fn restore(
        snapshot: GameSnapshot,
        version: i64,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Self {
        let mut session = Self::new(snapshot.session_id);
        session.version = version;
        session.record(
            GameEventKind::SessionRestored(Box::new(SessionRestored { snapshot })),
            correlation_id,
            clock,
        );
        session.resolve_if_no_slots(correlation_id, clock);
        session
    }

    // --- accessors ---

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Round number.
    #[must_use]
    pub const fn night(&self) -> u32 {
        self.night
    }

    /// Seated players.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Death ledgers.
    #[must_use]
    pub const fn ledgers(&self) -> &Ledgers {
        &self.ledgers
    }

    /// Single-use power usage.
    #[must_use]
    pub const fn powers(&self) -> &SinglePowers {
        &self.powers
    }

    /// Tonight's progress.
    #[must_use]
    pub const fn progress(&self) -> &NightProgress {
        &self.progress
    }

    /// Seconds the game has been running.
    #[must_use]
    pub const fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Discussion timer, if one is set.
    #[must_use]
    pub const fn timer(&self) -> Option<DiscussionTimer> {
        self.timer
    }

    /// The active slot's prompt, built from the scratchpad as it stood
    /// before that slot acted.
    #[must_use]
    pub fn current_prompt(&self) -> Option<Prompt> {
        let Phase::Night(night) = self.phase else {
            return None;
        };
        let slot = self.progress.active_slot()?;
        let ctx = self.night_context(night, slot);
        Some(RoleHandler::for_slot(slot, &self.roster).prompt(&ctx, &self.progress.checkpoint()))
    }

    /// Snapshot of the persistent state.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            session_id: self.id,
            phase: self.phase,
            night: self.night,
            elapsed_seconds: self.elapsed_seconds,
            ledgers: self.ledgers.clone(),
            powers: self.powers,
            love_bonds: self.roster.love_bonds(),
            deferred: self.deferred.clone(),
            hunter_pending: self.hunter_pending,
            roster: self.roster.clone(),
            wake_order: self.wake_order.clone(),
            include_dead_roles: self.include_dead_roles,
            previous_shield: self.previous_shield,
            resume_phase: self.resume_phase,
            borrow_history: self.borrow_history.clone(),
        }
    }

    // --- setup ---

    /// Deals a new game on this session: night one, empty ledgers, every
    /// single-use power available.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the roster is empty.
    pub fn start_game(
        &mut self,
        roster: Roster,
        wake_order: WakeOrderConfig,
        include_dead_roles: bool,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if roster.players().is_empty() {
            return Err(DomainError::Validation(
                "a game needs at least one player".to_owned(),
            ));
        }

        self.record(
            GameEventKind::GameStarted(GameStarted {
                session_id: self.id,
                roster,
                wake_order,
                include_dead_roles,
            }),
            correlation_id,
            clock,
        );
        self.check_victory(correlation_id, clock);
        self.resolve_if_no_slots(correlation_id, clock);
        Ok(())
    }

    /// Back to night one with the same table. Ledgers, single-use powers,
    /// infections and deferred effects are cleared.
    pub fn restart(&mut self, correlation_id: Uuid, clock: &dyn Clock) {
        self.record(GameEventKind::GameRestarted, correlation_id, clock);
        self.check_victory(correlation_id, clock);
        self.resolve_if_no_slots(correlation_id, clock);
    }

    // --- night ---

    /// Stages the moderator's choice for the active slot, replacing any
    /// earlier choice for that slot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` outside the night and
    /// `DomainError::Validation` if no slot is active or the selection does
    /// not fit the slot's prompt.
    pub fn stage_selection(
        &mut self,
        selection: SlotSelection,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let night = self.require_night()?;
        let slot = self
            .progress
            .active_slot()
            .ok_or_else(|| DomainError::Validation("no role is awake".to_owned()))?;

        let handler = RoleHandler::for_slot(slot, &self.roster);
        let ctx = self.night_context(night, slot);
        let mut scratchpad = self.progress.checkpoint();
        handler.validate(&ctx, &scratchpad, &selection)?;
        handler.stage(&ctx, &selection, &mut scratchpad);

        let slot_index = self.progress.cursor;
        self.record(
            GameEventKind::SelectionStaged(SelectionStaged {
                night,
                slot_index,
                selection,
                scratchpad,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Moves to the next slot, or resolves the night after the last one.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` outside the night.
    pub fn advance_night(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let night = self.require_night()?;
        if self.progress.is_last_slot() {
            self.resolve_current_night(night, correlation_id, clock);
        } else {
            let slot_index = self.progress.cursor + 1;
            debug!(night, slot_index, "advancing to next slot");
            self.record(
                GameEventKind::SlotAdvanced(SlotChanged { night, slot_index }),
                correlation_id,
                clock,
            );
        }
        Ok(())
    }

    /// Returns to the previous slot, undoing the active slot's writes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` outside the night and
    /// `DomainError::Validation` on the first slot.
    pub fn step_back(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        let night = self.require_night()?;
        let Some(slot_index) = self.progress.cursor.checked_sub(1) else {
            return Err(DomainError::Validation(
                "already at the first slot of the night".to_owned(),
            ));
        };
        debug!(night, slot_index, "stepping back a slot");
        self.record(
            GameEventKind::SlotSteppedBack(SlotChanged { night, slot_index }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Sets whether dead players' roles are still called. During a night
    /// the sequence is rebuilt and the night starts over from its first
    /// slot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` once the game is over.
    pub fn set_include_dead_roles(
        &mut self,
        include_dead_roles: bool,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_running()?;
        if include_dead_roles == self.include_dead_roles {
            return Ok(());
        }
        self.record(
            GameEventKind::IncludeDeadRolesSet(IncludeDeadRolesSet { include_dead_roles }),
            correlation_id,
            clock,
        );
        self.resolve_if_no_slots(correlation_id, clock);
        Ok(())
    }

    // --- morning and day ---

    /// Records the dead hunter's shot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` outside the morning and
    /// `DomainError::Validation` if no shot is owed or `target` is not a
    /// living player.
    pub fn resolve_hunter(
        &mut self,
        target: PlayerId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_morning()?;
        let hunter = self.hunter_pending.ok_or_else(|| {
            DomainError::Validation("no hunter retaliation is pending".to_owned())
        })?;
        self.require_living(target)?;

        let deaths = heartbreak_pass(
            &self.roster,
            &self.ledgers,
            &[Death {
                player: target,
                cause: DeathCause::Hunter,
            }],
        );
        self.record(
            GameEventKind::HunterRetaliated(HunterRetaliated {
                hunter,
                target,
                deaths,
            }),
            correlation_id,
            clock,
        );
        self.check_victory(correlation_id, clock);
        Ok(())
    }

    /// Morning to discussion.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` outside the morning and
    /// `DomainError::Validation` while the hunter's shot is pending.
    pub fn open_discussion(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let night = self.require_morning()?;
        if self.hunter_pending.is_some() {
            return Err(DomainError::Validation(
                "the hunter must retaliate before the day starts".to_owned(),
            ));
        }
        self.record(
            GameEventKind::DiscussionOpened(DayAdvanced { night }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Discussion to execution.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` outside the discussion.
    pub fn open_execution(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let night = self.require_discussion()?;
        self.record(
            GameEventKind::ExecutionOpened(DayAdvanced { night }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Switches between single and multiple execution. Going back to single
    /// keeps only the first selected player.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` outside discussion and execution.
    pub fn set_execution_mode(
        &mut self,
        multiple: bool,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !matches!(self.phase, Phase::Discussion(_) | Phase::Execution(_)) {
            return Err(self.invalid_phase("discussion or execution"));
        }
        self.record(
            GameEventKind::ExecutionModeSet(ExecutionModeSet { multiple }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Records who the village votes out. An empty list executes nobody.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` outside the execution and
    /// `DomainError::Validation` for dead, unknown or repeated players, or
    /// for several targets in single mode.
    pub fn select_execution_targets(
        &mut self,
        targets: Vec<PlayerId>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_execution()?;
        if !self.execution.multiple && targets.len() > 1 {
            return Err(DomainError::Validation(
                "single execution mode allows one target".to_owned(),
            ));
        }
        for (index, &target) in targets.iter().enumerate() {
            if targets[..index].contains(&target) {
                return Err(DomainError::Validation(format!(
                    "{target} is selected twice"
                )));
            }
            self.require_living(target)?;
        }
        self.record(
            GameEventKind::ExecutionTargetsSelected(ExecutionTargetsSelected { targets }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Executes the selected players (with heartbreak) and starts the next
    /// night.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` outside the execution.
    pub fn confirm_execution(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let night = self.require_execution()?;
        let executions: Vec<Death> = self
            .execution
            .selected
            .iter()
            .map(|&player| Death {
                player,
                cause: DeathCause::Execution,
            })
            .collect();
        let deaths = heartbreak_pass(&self.roster, &self.ledgers, &executions);

        self.record(
            GameEventKind::ExecutionConfirmed(ExecutionConfirmed { night, deaths }),
            correlation_id,
            clock,
        );
        self.check_victory(correlation_id, clock);
        self.resolve_if_no_slots(correlation_id, clock);
        Ok(())
    }

    /// Discussion straight to the next night.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPhase` outside the discussion.
    pub fn skip_vote(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        let night = self.require_discussion()?;
        self.record(
            GameEventKind::VoteSkipped(DayAdvanced { night }),
            correlation_id,
            clock,
        );
        self.resolve_if_no_slots(correlation_id, clock);
        Ok(())
    }

    // --- administrative overrides ---

    /// Takes a dead player off both ledgers.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the player is unknown or alive.
    pub fn revive_player(
        &mut self,
        player: PlayerId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_known(player)?;
        if self.ledgers.is_alive(player) {
            return Err(DomainError::Validation(format!("{player} is not dead")));
        }
        self.record(
            GameEventKind::PlayerRevived(LedgerOverridden { player }),
            correlation_id,
            clock,
        );
        self.check_victory(correlation_id, clock);
        Ok(())
    }

    /// Adds a living player to the victims ledger. No heartbreak, vengeance
    /// or hunter rule is triggered.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the player is unknown or dead.
    pub fn kill_player(
        &mut self,
        player: PlayerId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_living(player)?;
        self.record(
            GameEventKind::PlayerKilled(LedgerOverridden { player }),
            correlation_id,
            clock,
        );
        self.check_victory(correlation_id, clock);
        Ok(())
    }

    // --- time ---

    /// Advances the elapsed counter and the discussion timer. Ticks after
    /// the game ended only move a running timer.
    pub fn tick(&mut self, seconds: u32, correlation_id: Uuid, clock: &dyn Clock) {
        let timer_running = self.timer.is_some_and(|t| t.running);
        if seconds == 0 || (self.phase.is_over() && !timer_running) {
            return;
        }
        self.record(
            GameEventKind::ClockTicked(ClockTicked { seconds }),
            correlation_id,
            clock,
        );
    }

    /// Starts (or restarts) the discussion timer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a zero duration.
    pub fn start_timer(
        &mut self,
        duration_seconds: u32,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if duration_seconds == 0 {
            return Err(DomainError::Validation(
                "timer duration must be positive".to_owned(),
            ));
        }
        self.record(
            GameEventKind::TimerStarted(TimerStarted { duration_seconds }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Pauses a running timer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if no timer is running.
    pub fn pause_timer(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        if !self.timer.is_some_and(|t| t.running) {
            return Err(DomainError::Validation("the timer is not running".to_owned()));
        }
        self.record(GameEventKind::TimerPaused, correlation_id, clock);
        Ok(())
    }

    /// Resumes a paused timer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless a timer is paused with time
    /// left.
    pub fn resume_timer(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.timer.is_some_and(|t| !t.running && !t.is_expired()) {
            return Err(DomainError::Validation("the timer is not paused".to_owned()));
        }
        self.record(GameEventKind::TimerResumed, correlation_id, clock);
        Ok(())
    }

    /// Resets the timer to its full duration, paused.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if there is no timer.
    pub fn reset_timer(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.require_timer()?;
        self.record(GameEventKind::TimerReset, correlation_id, clock);
        Ok(())
    }

    /// Removes the timer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if there is no timer.
    pub fn cancel_timer(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_timer()?;
        self.record(GameEventKind::TimerCancelled, correlation_id, clock);
        Ok(())
    }

    // --- internals ---

    fn record(&mut self, kind: GameEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = GameEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.version + 1,
                correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.apply(&event);
        self.uncommitted_events.push(event);
    }

    fn resolve_current_night(&mut self, night: u32, correlation_id: Uuid, clock: &dyn Clock) {
        let outcome = resolve_night(&NightInput {
            night,
            roster: &self.roster,
            ledgers: &self.ledgers,
            powers: &self.powers,
            scratchpad: &self.progress.scratchpad,
            deferred: &self.deferred,
        });
        debug!(night, victims = outcome.deaths.len(), "night resolved");
        self.record(
            GameEventKind::NightResolved(NightResolved {
                night,
                outcome,
                shielded: self.progress.scratchpad.shielded,
                borrowed: self.progress.scratchpad.borrowed,
            }),
            correlation_id,
            clock,
        );
        self.check_victory(correlation_id, clock);
    }

    /// A night with nothing to wake resolves on the spot.
    fn resolve_if_no_slots(&mut self, correlation_id: Uuid, clock: &dyn Clock) {
        if let Phase::Night(night) = self.phase {
            if self.progress.slots.is_empty() {
                self.resolve_current_night(night, correlation_id, clock);
            }
        }
    }

    fn check_victory(&mut self, correlation_id: Uuid, clock: &dyn Clock) {
        match (evaluate(&self.roster, &self.ledgers), self.phase) {
            (Some(victory), Phase::GameOver(current)) if victory == current => {}
            (Some(victory), _) => self.record(
                GameEventKind::GameEnded(GameEnded { victory }),
                correlation_id,
                clock,
            ),
            (None, Phase::GameOver(_)) => {
                if let Some(phase) = self.resume_phase {
                    self.record(
                        GameEventKind::GameResumed(GameResumed { phase }),
                        correlation_id,
                        clock,
                    );
                }
            }
            (None, _) => {}
        }
    }

    fn night_context<'a>(&'a self, night: u32, slot: &'a NightSlot) -> NightContext<'a> {
        NightContext {
            night,
            roster: &self.roster,
            ledgers: &self.ledgers,
            powers: &self.powers,
            previous_shield: self.previous_shield,
            slot,
        }
    }

    fn slots_for(&self, night: u32) -> Vec<NightSlot> {
        resolve(
            &self.roster,
            &self.ledgers,
            &self.wake_order,
            night,
            self.include_dead_roles,
        )
    }

    fn begin_night(&mut self, night: u32) {
        self.night = night;
        self.phase = Phase::Night(night);
        self.progress = NightProgress::new(self.slots_for(night));
        self.execution = ExecutionDraft::default();
    }

    fn invalid_phase(&self, expected: &str) -> DomainError {
        DomainError::InvalidPhase {
            expected: expected.to_owned(),
            actual: self.phase.to_string(),
        }
    }

    fn require_night(&self) -> Result<u32, DomainError> {
        match self.phase {
            Phase::Night(n) => Ok(n),
            _ => Err(self.invalid_phase("night")),
        }
    }

    fn require_morning(&self) -> Result<u32, DomainError> {
        match self.phase {
            Phase::Morning(n) => Ok(n),
            _ => Err(self.invalid_phase("morning")),
        }
    }

    fn require_discussion(&self) -> Result<u32, DomainError> {
        match self.phase {
            Phase::Discussion(n) => Ok(n),
            _ => Err(self.invalid_phase("discussion")),
        }
    }

    fn require_execution(&self) -> Result<u32, DomainError> {
        match self.phase {
            Phase::Execution(n) => Ok(n),
            _ => Err(self.invalid_phase("execution")),
        }
    }

    fn require_running(&self) -> Result<(), DomainError> {
        if self.phase.is_over() {
            return Err(self.invalid_phase("a running game"));
        }
        Ok(())
    }

    fn require_known(&self, player: PlayerId) -> Result<(), DomainError> {
        if self.roster.contains(player) {
            Ok(())
        } else {
            Err(DomainError::Validation(format!("unknown player {player}")))
        }
    }

    fn require_living(&self, player: PlayerId) -> Result<(), DomainError> {
        self.require_known(player)?;
        if self.ledgers.is_dead(player) {
            return Err(DomainError::Validation(format!("{player} is already dead")));
        }
        Ok(())
    }

    fn require_timer(&self) -> Result<(), DomainError> {
        if self.timer.is_none() {
            return Err(DomainError::Validation("no timer is set".to_owned()));
        }
        Ok(())
    }

    fn apply_restored(&mut self, snapshot: &GameSnapshot) {
        self.id = snapshot.session_id;
        self.night = snapshot.night;
        self.roster = snapshot.roster.clone();
        self.ledgers = snapshot.ledgers.clone();
        self.powers = snapshot.powers;
        self.deferred.clone_from(&snapshot.deferred);
        self.hunter_pending = snapshot.hunter_pending;
        self.previous_shield = snapshot.previous_shield;
        self.wake_order = snapshot.wake_order.clone();
        self.include_dead_roles = snapshot.include_dead_roles;
        self.elapsed_seconds = snapshot.elapsed_seconds;
        self.borrow_history.clone_from(&snapshot.borrow_history);
        self.resume_phase = snapshot.resume_phase;
        self.last_outcome = None;
        self.timer = None;
        self.execution = ExecutionDraft::default();
        self.progress = NightProgress::default();
        match snapshot.phase {
            Phase::Night(night) => self.begin_night(night),
            phase => self.phase = phase,
        }
    }
}

impl AggregateRoot for GameSession {
    type Event = GameEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            GameEventKind::GameStarted(payload) => {
                let id = self.id;
                *self = Self {
                    version: self.version,
                    uncommitted_events: std::mem::take(&mut self.uncommitted_events),
                    roster: payload.roster.clone(),
                    wake_order: payload.wake_order.clone(),
                    include_dead_roles: payload.include_dead_roles,
                    ..Self::new(id)
                };
                self.begin_night(1);
            }
            GameEventKind::SessionRestored(payload) => self.apply_restored(&payload.snapshot),
            GameEventKind::SelectionStaged(payload) => {
                self.progress.scratchpad = payload.scratchpad.clone();
            }
            GameEventKind::SlotAdvanced(payload) => {
                let progress = &mut self.progress;
                progress.checkpoints.truncate(payload.slot_index);
                progress.checkpoints.push(progress.scratchpad.clone());
                progress.cursor = payload.slot_index;
            }
            GameEventKind::SlotSteppedBack(payload) => {
                let progress = &mut self.progress;
                progress.scratchpad = progress.checkpoint();
                progress.checkpoints.truncate(payload.slot_index + 1);
                progress.cursor = payload.slot_index;
            }
            GameEventKind::IncludeDeadRolesSet(payload) => {
                self.include_dead_roles = payload.include_dead_roles;
                if let Phase::Night(night) = self.phase {
                    self.progress = NightProgress::new(self.slots_for(night));
                }
            }
            GameEventKind::NightResolved(payload) => {
                let outcome = &payload.outcome;
                outcome.commit(
                    payload.night,
                    &mut self.roster,
                    &mut self.ledgers,
                    &mut self.powers,
                );
                self.deferred.retain(|d| !outcome.applied.contains(d));
                self.deferred.extend(outcome.scheduled.iter().copied());
                self.hunter_pending = outcome.hunter_pending;
                self.previous_shield = payload.shielded;
                if let Some(power) = payload.borrowed {
                    self.borrow_history.push(BorrowRecord {
                        night: payload.night,
                        power,
                    });
                }
                self.last_outcome = Some(outcome.clone());
                self.progress = NightProgress::default();
                self.phase = Phase::Morning(payload.night);
            }
            GameEventKind::HunterRetaliated(payload) => {
                for death in &payload.deaths {
                    self.ledgers.record_victim(death.player);
                }
                self.hunter_pending = None;
            }
            GameEventKind::DiscussionOpened(payload) => {
                self.phase = Phase::Discussion(payload.night);
                self.execution = ExecutionDraft::default();
            }
            GameEventKind::ExecutionOpened(payload) => {
                self.phase = Phase::Execution(payload.night);
            }
            GameEventKind::ExecutionModeSet(payload) => {
                self.execution.multiple = payload.multiple;
                if !payload.multiple {
                    self.execution.selected.truncate(1);
                }
            }
            GameEventKind::ExecutionTargetsSelected(payload) => {
                self.execution.selected.clone_from(&payload.targets);
            }
            GameEventKind::ExecutionConfirmed(payload) => {
                for death in &payload.deaths {
                    self.ledgers.record_executed(death.player);
                }
                self.begin_night(payload.night + 1);
            }
            GameEventKind::VoteSkipped(payload) => self.begin_night(payload.night + 1),
            GameEventKind::PlayerRevived(payload) => {
                self.ledgers.revive(payload.player);
            }
            GameEventKind::PlayerKilled(payload) => {
                self.ledgers.record_victim(payload.player);
            }
            GameEventKind::GameEnded(payload) => {
                if !self.phase.is_over() {
                    self.resume_phase = Some(self.phase);
                }
                self.phase = Phase::GameOver(payload.victory);
            }
            GameEventKind::GameResumed(payload) => {
                self.phase = payload.phase;
                self.resume_phase = None;
            }
            GameEventKind::GameRestarted => {
                self.ledgers.clear();
                self.powers = SinglePowers::default();
                self.roster.clear_infections();
                self.deferred.clear();
                self.hunter_pending = None;
                self.previous_shield = None;
                self.last_outcome = None;
                self.elapsed_seconds = 0;
                self.timer = None;
                self.borrow_history.clear();
                self.resume_phase = None;
                self.begin_night(1);
            }
            GameEventKind::ClockTicked(payload) => {
                if !self.phase.is_over() {
                    self.elapsed_seconds += u64::from(payload.seconds);
                }
                if let Some(timer) = &mut self.timer {
                    timer.tick(payload.seconds);
                }
            }
            GameEventKind::TimerStarted(payload) => {
                self.timer = Some(DiscussionTimer::started(payload.duration_seconds));
            }
            GameEventKind::TimerPaused => {
                if let Some(timer) = &mut self.timer {
                    timer.pause();
                }
            }
            GameEventKind::TimerResumed => {
                if let Some(timer) = &mut self.timer {
                    timer.resume();
                }
            }
            GameEventKind::TimerReset => {
                if let Some(timer) = &mut self.timer {
                    timer.reset();
                }
            }
            GameEventKind::TimerCancelled => self.timer = None,
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn take_uncommitted_events(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.uncommitted_events)
    }
}
