//! Simulation state.
//!
//! The state is a small `Copy` value. The kernel takes it by value and
//! returns the next state, so a rejected command leaves the caller's copy
//! untouched.

use bootsim_types::{BootMode, BootStatus, Speed, StageIndex, TimerId};
use serde::{Deserialize, Serialize};

/// Coarse state-machine phase, derived from the fields of [`State`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Stage 0, not playing.
    Idle,
    /// Playing with an armed auto-advance timer.
    Playing,
    /// Not playing, somewhere between the first and the terminal stage.
    Paused,
    /// At the terminal position. Never playing.
    Complete,
}

/// The simulation's mutable state, owned by a single engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    stage: StageIndex,
    playing: bool,
    speed: Speed,
    mode: BootMode,
    status: BootStatus,
    /// The single pending auto-advance timer, if any.
    armed: Option<TimerId>,
    next_timer: TimerId,
}

impl State {
    /// Creates a session at stage 0, not playing, idle.
    pub fn new(mode: BootMode, speed: Speed) -> Self {
        Self {
            stage: StageIndex::ZERO,
            playing: false,
            speed,
            mode,
            status: BootStatus::Idle,
            armed: None,
            next_timer: TimerId::default(),
        }
    }

    pub fn stage(&self) -> StageIndex {
        self.stage
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn mode(&self) -> BootMode {
        self.mode
    }

    pub fn status(&self) -> BootStatus {
        self.status
    }

    pub fn armed_timer(&self) -> Option<TimerId> {
        self.armed
    }

    /// Derives the phase given the catalog's terminal position.
    pub fn phase(&self, terminal: StageIndex) -> Phase {
        if self.stage >= terminal {
            Phase::Complete
        } else if self.playing {
            Phase::Playing
        } else if self.stage == StageIndex::ZERO {
            Phase::Idle
        } else {
            Phase::Paused
        }
    }

    pub(crate) fn set_stage(&mut self, stage: StageIndex) {
        self.stage = stage;
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub(crate) fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    pub(crate) fn set_status(&mut self, status: BootStatus) {
        self.status = status;
    }

    /// Clears the armed timer, returning it.
    pub(crate) fn take_armed(&mut self) -> Option<TimerId> {
        self.armed.take()
    }

    /// Allocates and records a new armed timer.
    ///
    /// # Panics
    ///
    /// Panics if a timer is already armed. Two overlapping timers would race
    /// and double-advance the stage.
    pub(crate) fn arm_next(&mut self) -> TimerId {
        assert!(
            self.armed.is_none(),
            "at most one pending timer: {} still armed",
            self.armed.map_or_else(String::new, |t| t.to_string())
        );
        let timer = self.next_timer;
        self.next_timer = timer.successor();
        self.armed = Some(timer);
        timer
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new(BootMode::Normal, Speed::NORMAL)
    }
}
