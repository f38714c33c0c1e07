//! Commands accepted by the kernel.
//!
//! One variant per engine operation, plus [`Command::TimerFired`] which the
//! runtime submits when an armed auto-advance timer comes due.

use bootsim_types::{StageIndex, TimerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Play,
    Pause,
    Stop,
    Reset,
    Next,
    Previous,
    /// Seek directly to a stage (timeline scrubbing).
    GoToStage(StageIndex),
    /// Change the speed multiplier. Validated by the kernel.
    SetSpeed(f64),
    /// An armed timer came due.
    TimerFired(TimerId),
}

impl Command {
    pub fn go_to_stage(stage: impl Into<StageIndex>) -> Self {
        Command::GoToStage(stage.into())
    }

    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::Reset => "reset",
            Command::Next => "next",
            Command::Previous => "previous",
            Command::GoToStage(_) => "go_to_stage",
            Command::SetSpeed(_) => "set_speed",
            Command::TimerFired(_) => "timer_fired",
        }
    }
}
