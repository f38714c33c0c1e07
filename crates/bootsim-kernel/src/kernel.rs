//! The kernel - pure functional core of the boot simulator.
//!
//! Applies a command to the state, producing the next state and the effects
//! the runtime must execute. No clocks, no scheduler, no IO.
//!
//! # Example
//!
//! ```
//! use bootsim_kernel::{Command, State, StageCatalog, apply};
//!
//! let catalog = StageCatalog::secure_boot();
//! let (state, effects) = apply(State::default(), Command::Play, &catalog)?;
//! assert!(state.is_playing());
//! assert!(!effects.is_empty());
//! # Ok::<(), bootsim_kernel::KernelError>(())
//! ```

use bootsim_types::{BootMode, BootStatus, InvalidSpeed, Speed, StageIndex};

use crate::catalog::StageCatalog;
use crate::command::Command;
use crate::effects::{BootEvent, Effect};
use crate::state::{Phase, State};

/// Applies `cmd` to `state`.
///
/// Commands that have no effect in the current phase return the state
/// unchanged with no effects. Only out-of-range requests are errors.
pub fn apply(
    state: State,
    cmd: Command,
    catalog: &StageCatalog,
) -> Result<(State, Vec<Effect>), KernelError> {
    let terminal = catalog.terminal();

    // Precondition: the state belongs to this catalog
    assert!(
        state.stage() <= terminal,
        "state at stage {} beyond terminal {terminal}",
        state.stage()
    );

    let mut t = Transition {
        state,
        effects: Vec::new(),
        catalog,
    };

    match cmd {
        Command::Play => match state.phase(terminal) {
            Phase::Playing | Phase::Complete => {}
            Phase::Idle | Phase::Paused => {
                t.set_playing(true);
                if state.stage() == StageIndex::ZERO || state.status() == BootStatus::Idle {
                    t.set_status(BootStatus::Booting);
                }
                t.arm();
            }
        },

        Command::Pause => {
            if state.is_playing() {
                t.cancel();
                t.set_playing(false);
            }
        }

        Command::Stop => {
            t.cancel();
            t.set_playing(false);
            t.set_status(BootStatus::Idle);
        }

        Command::Reset => {
            t.cancel();
            t.set_stage(StageIndex::ZERO);
            t.set_playing(false);
            t.set_status(BootStatus::Idle);
        }

        Command::Next => {
            if state.stage() < terminal {
                let to = state.stage().next().unwrap_or(terminal);
                t.reposition(to);
            }
        }

        Command::Previous => {
            if let Some(to) = state.stage().previous() {
                t.reposition(to);
            }
        }

        Command::GoToStage(target) => {
            if target > terminal {
                return Err(KernelError::StageOutOfRange {
                    requested: target,
                    terminal,
                });
            }
            t.reposition(target);
        }

        Command::SetSpeed(multiplier) => {
            let speed = Speed::new(multiplier)?;
            // An armed timer keeps its original delay.
            if speed != state.speed() {
                t.state.set_speed(speed);
                t.notify(BootEvent::SpeedChanged {
                    from: state.speed(),
                    to: speed,
                });
            }
        }

        Command::TimerFired(timer) => {
            // Stale firings (cancelled or superseded timers) are ignored.
            if state.armed_timer() == Some(timer) && state.is_playing() {
                t.state.take_armed();
                if state.stage() < catalog.last() {
                    let to = state.stage().next().unwrap_or(terminal);
                    t.set_stage(to);
                    t.arm();
                } else {
                    t.complete();
                }
            }
        }
    }

    let Transition { state, effects, .. } = t;

    // Postcondition: stage within bounds
    assert!(
        state.stage() <= terminal,
        "stage {} escaped bound {terminal}",
        state.stage()
    );
    // Postcondition: playing iff a timer is armed
    assert_eq!(
        state.is_playing(),
        state.armed_timer().is_some(),
        "playing={} but armed={:?}",
        state.is_playing(),
        state.armed_timer()
    );
    // Postcondition: complete is never playing
    debug_assert!(!(state.stage() == terminal && state.is_playing()));

    Ok((state, effects))
}

/// Accumulates one command's state changes and effects.
struct Transition<'a> {
    state: State,
    effects: Vec<Effect>,
    catalog: &'a StageCatalog,
}

impl Transition<'_> {
    fn notify(&mut self, event: BootEvent) {
        self.effects.push(Effect::Notify(event));
    }

    fn set_stage(&mut self, to: StageIndex) {
        let from = self.state.stage();
        if from != to {
            self.state.set_stage(to);
            self.notify(BootEvent::StageChanged { from, to });
        }
    }

    fn set_playing(&mut self, playing: bool) {
        if self.state.is_playing() != playing {
            self.state.set_playing(playing);
            self.notify(BootEvent::PlaybackChanged { playing });
        }
    }

    fn set_status(&mut self, to: BootStatus) {
        let from = self.state.status();
        if from != to {
            self.state.set_status(to);
            self.notify(BootEvent::StatusChanged { from, to });
        }
    }

    fn cancel(&mut self) {
        if let Some(timer) = self.state.take_armed() {
            self.effects.push(Effect::CancelTimer(timer));
        }
    }

    /// Arms a timer for the current stage. The caller must have cancelled
    /// any previous timer.
    fn arm(&mut self) {
        let stage = self.state.stage();
        let duration = self.catalog.stage_at(stage).duration_ms;
        let delay_ms = self.state.speed().scale_ms(duration);
        let timer = self.state.arm_next();
        self.effects.push(Effect::ArmTimer {
            timer,
            stage,
            delay_ms,
        });
    }

    /// Moves to the terminal position and settles the outcome.
    fn complete(&mut self) {
        let terminal = self.catalog.terminal();
        let entered = self.state.stage() != terminal;
        self.cancel();
        self.set_stage(terminal);
        self.set_playing(false);
        let status = completion_status(self.state.mode());
        self.set_status(status);
        if entered {
            self.notify(BootEvent::Completed { status });
        }
    }

    /// Out-of-band stage change (step or seek).
    ///
    /// The old timer no longer applies and is cancelled. If playback is on,
    /// the new stage gets a fresh timer at its full duration.
    fn reposition(&mut self, to: StageIndex) {
        let terminal = self.catalog.terminal();
        let from = self.state.stage();

        self.cancel();

        if to == terminal {
            self.complete();
            return;
        }

        self.set_stage(to);
        // Leaving the terminal position discards the settled outcome.
        if from == terminal && self.state.status().is_terminal() {
            self.set_status(BootStatus::Idle);
        }
        if self.state.is_playing() {
            self.arm();
        }
    }
}

/// Outcome recorded when the terminal position is reached.
///
/// A tampered chain runs to the end in safe mode, which is a failed boot.
pub fn completion_status(mode: BootMode) -> BootStatus {
    match mode {
        BootMode::Normal => BootStatus::Success,
        BootMode::Tampered => BootStatus::Failed,
    }
}

/// Errors that can occur when applying commands to the kernel.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    #[error("stage {requested} out of range: valid stages are 0..={terminal}")]
    StageOutOfRange {
        requested: StageIndex,
        terminal: StageIndex,
    },

    #[error(transparent)]
    InvalidSpeed(#[from] InvalidSpeed),
}
