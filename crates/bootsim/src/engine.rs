//! The boot engine: imperative shell around the kernel.
//!
//! The engine owns the state, the catalog and a [`Scheduler`]. Every public
//! operation becomes a kernel [`Command`]; the resulting effects are executed
//! here (timers armed and cancelled, events journaled and logged).
//!
//! ```text
//! operation → Command → apply() → (State, Vec<Effect>) → execute_effects()
//!                                                          │
//!                        scheduler.pop_due() ◄─────────────┘ ArmTimer
//! ```

use bootsim_kernel::{
    BootEvent, Command, Effect, Phase, Projection, StageCatalog, StageProgress, State,
    SubStepView, all_sub_steps, apply, project,
};
use bootsim_sim::{Scheduler, SimScheduler, TimerToken};
use bootsim_types::{BootMode, BootStatus, Speed, StageIndex, TimerId};

use crate::error::Result;
use crate::snapshot::BootSnapshot;

/// Name reported once the last stage has completed.
pub const COMPLETE_STAGE_NAME: &str = "Complete";

/// The timer currently scheduled on behalf of the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedTimer {
    id: TimerId,
    token: TimerToken,
    armed_at_ms: u64,
    span_ms: u64,
}

/// A single boot simulation session.
///
/// Dropping the engine cancels any pending timer.
#[derive(Debug)]
pub struct BootEngine<S: Scheduler> {
    catalog: StageCatalog,
    state: State,
    scheduler: S,
    armed: Option<ArmedTimer>,
    journal: Vec<BootEvent>,
}

impl BootEngine<SimScheduler> {
    /// Creates an engine over the built-in catalog with a deterministic
    /// scheduler starting at time zero.
    pub fn simulated(mode: BootMode) -> Self {
        Self::new(StageCatalog::secure_boot(), mode, Speed::NORMAL, SimScheduler::new())
    }
}

impl<S: Scheduler> BootEngine<S> {
    /// Creates an engine at stage 0, not playing, idle.
    pub fn new(catalog: StageCatalog, mode: BootMode, speed: Speed, scheduler: S) -> Self {
        tracing::debug!(%mode, %speed, stages = catalog.count(), "boot engine created");
        Self {
            catalog,
            state: State::new(mode, speed),
            scheduler,
            armed: None,
            journal: Vec::new(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn current_stage(&self) -> StageIndex {
        self.state.stage()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn speed(&self) -> Speed {
        self.state.speed()
    }

    pub fn boot_status(&self) -> BootStatus {
        self.state.status()
    }

    /// Number of stages, which is also the terminal position.
    pub fn total_stages(&self) -> u32 {
        self.catalog.count()
    }

    pub fn mode(&self) -> BootMode {
        self.state.mode()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase(self.catalog.terminal())
    }

    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Name of the current stage, or "Complete" at the terminal position.
    pub fn current_stage_name(&self) -> &str {
        self.catalog
            .get(self.current_stage())
            .map_or(COMPLETE_STAGE_NAME, |stage| stage.name.as_str())
    }

    /// Instruction of the current stage; `None` once complete.
    pub fn current_instruction(&self) -> Option<&str> {
        self.catalog
            .get(self.current_stage())
            .map(|stage| stage.instruction.as_str())
    }

    /// Fraction of the boot completed, `current / total`, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        f64::from(self.current_stage().as_u32()) / f64::from(self.total_stages())
    }

    /// How far the armed timer has run. Still when nothing is armed.
    pub fn stage_progress(&self) -> StageProgress {
        match self.armed {
            Some(armed) => StageProgress {
                elapsed_ms: self
                    .scheduler
                    .now_ms()
                    .saturating_sub(armed.armed_at_ms)
                    .min(armed.span_ms),
                span_ms: armed.span_ms,
            },
            None => StageProgress::STILL,
        }
    }

    /// Flags, status label, registers and memory for the current stage.
    pub fn projection(&self) -> Projection {
        project(self.current_stage(), self.mode(), self.catalog.terminal())
    }

    /// Derived status of every sub-step in the catalog.
    pub fn sub_steps(&self) -> Vec<SubStepView> {
        all_sub_steps(
            &self.catalog,
            self.current_stage(),
            self.stage_progress(),
            self.mode(),
        )
    }

    pub fn snapshot(&self) -> BootSnapshot {
        BootSnapshot {
            stage: self.current_stage(),
            total_stages: self.total_stages(),
            stage_name: self.current_stage_name().to_string(),
            instruction: self.current_instruction().map(str::to_string),
            phase: self.phase(),
            playing: self.is_playing(),
            speed: self.speed(),
            mode: self.mode(),
            status: self.boot_status(),
            progress: self.progress(),
            stage_progress: self.stage_progress(),
            projection: self.projection(),
            sub_steps: self.sub_steps(),
        }
    }

    /// Events emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<BootEvent> {
        std::mem::take(&mut self.journal)
    }

    /// Due time of the armed timer, if any.
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    /// Timers pending on the scheduler. Never more than one.
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    pub fn play(&mut self) {
        self.dispatch_infallible(Command::Play);
    }

    pub fn pause(&mut self) {
        self.dispatch_infallible(Command::Pause);
    }

    pub fn stop(&mut self) {
        self.dispatch_infallible(Command::Stop);
    }

    pub fn reset(&mut self) {
        self.dispatch_infallible(Command::Reset);
    }

    pub fn next(&mut self) {
        self.dispatch_infallible(Command::Next);
    }

    pub fn previous(&mut self) {
        self.dispatch_infallible(Command::Previous);
    }

    /// Seeks directly to stage `k` (`0..=total_stages`).
    pub fn go_to_stage(&mut self, k: u32) -> Result<()> {
        self.dispatch(Command::go_to_stage(k))
    }

    /// Sets the speed multiplier for the next armed timer.
    pub fn set_speed(&mut self, multiplier: f64) -> Result<()> {
        self.dispatch(Command::SetSpeed(multiplier))
    }

    /// Applies a command and executes its effects.
    ///
    /// On error the state is unchanged.
    pub(crate) fn dispatch(&mut self, cmd: Command) -> Result<()> {
        tracing::debug!(command = cmd.name(), stage = %self.current_stage(), "applying command");

        let (state, effects) = apply(self.state, cmd, &self.catalog).inspect_err(|error| {
            tracing::warn!(command = cmd.name(), %error, "command rejected");
        })?;

        self.state = state;
        self.release_superseded_timer();
        self.execute_effects(effects);
        Ok(())
    }

    /// Cancels the scheduled timer once the kernel no longer holds it.
    ///
    /// The kernel consumes a fired timer without emitting `CancelTimer`, so a
    /// firing that did not come through [`tick`](Self::tick) would otherwise
    /// leave it scheduled.
    fn release_superseded_timer(&mut self) {
        let Some(armed) = self.armed else { return };
        if self.state.armed_timer() == Some(armed.id) {
            return;
        }
        self.armed = None;
        let cancelled = self.scheduler.cancel(armed.token);
        tracing::debug!(timer = %armed.id, cancelled, "superseded timer released");
    }

    /// Dispatches a command the kernel never rejects.
    fn dispatch_infallible(&mut self, cmd: Command) {
        if let Err(error) = self.dispatch(cmd) {
            tracing::error!(command = cmd.name(), %error, "infallible command rejected");
        }
    }

    // ========================================================================
    // Time
    // ========================================================================

    /// Fires every timer that is due now. Returns how many fired.
    pub fn tick(&mut self) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.scheduler.pop_due() {
            if self.armed.is_some_and(|armed| armed.id == timer) {
                self.armed = None;
            }
            tracing::debug!(%timer, "timer fired");
            self.dispatch_infallible(Command::TimerFired(timer));
            fired += 1;
        }
        fired
    }

    /// Advances simulated time by `delta_ms`, firing timers as their due
    /// times are reached. Chained re-arms within the window fire too.
    pub fn advance_by(&mut self, delta_ms: u64) {
        let target = self.scheduler.now_ms().saturating_add(delta_ms);
        while let Some(due) = self.scheduler.next_due() {
            if due > target {
                break;
            }
            self.scheduler.advance_to(due);
            if self.tick() == 0 {
                break;
            }
        }
        if target > self.scheduler.now_ms() {
            self.scheduler.advance_to(target);
        }
    }

    /// Advances simulated time timer by timer until nothing is armed.
    ///
    /// Returns the simulated time at which playback stopped.
    pub fn run_until_idle(&mut self) -> u64 {
        while let Some(due) = self.scheduler.next_due() {
            self.scheduler.advance_to(due);
            if self.tick() == 0 {
                break;
            }
        }
        self.scheduler.now_ms()
    }

    // ========================================================================
    // Effects
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ArmTimer {
                    timer,
                    stage,
                    delay_ms,
                } => {
                    assert!(
                        self.armed.is_none(),
                        "at most one pending timer: arming {timer} while {:?} is armed",
                        self.armed
                    );
                    let token = self.scheduler.schedule(delay_ms, timer);
                    self.armed = Some(ArmedTimer {
                        id: timer,
                        token,
                        armed_at_ms: self.scheduler.now_ms(),
                        span_ms: delay_ms,
                    });
                    tracing::debug!(%timer, %token, %stage, delay_ms, "timer armed");
                }
                Effect::CancelTimer(timer) => {
                    if let Some(armed) = self.armed.take() {
                        debug_assert_eq!(armed.id, timer, "cancelling a timer that is not armed");
                        let cancelled = self.scheduler.cancel(armed.token);
                        tracing::debug!(%timer, cancelled, "timer cancelled");
                    }
                }
                Effect::Notify(event) => {
                    match event {
                        BootEvent::StageChanged { from, to } => {
                            tracing::info!(%from, %to, name = self.current_stage_name(), "stage changed");
                        }
                        BootEvent::Completed { status } => {
                            tracing::info!(%status, mode = %self.mode(), "boot complete");
                        }
                        other => tracing::debug!(event = ?other, "boot event"),
                    }
                    self.journal.push(event);
                }
            }
        }

        debug_assert!(self.scheduler.pending() <= 1, "more than one timer pending");
    }
}

impl<S: Scheduler> Drop for BootEngine<S> {
    fn drop(&mut self) {
        if let Some(armed) = self.armed.take() {
            self.scheduler.cancel(armed.token);
            tracing::debug!(timer = %armed.id, "pending timer cancelled on drop");
        }
    }
}
