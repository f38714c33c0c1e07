//! Effects produced by the kernel.
//!
//! The kernel is pure: it never touches a clock or a scheduler. It describes
//! what the runtime must do (arm or cancel the auto-advance timer) and what
//! consumers should be told (events).

use bootsim_types::{BootStatus, Speed, StageIndex, TimerId};
use serde::{Deserialize, Serialize};

/// An effect to be executed by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Schedule `timer` to fire after `delay_ms`.
    ///
    /// Always preceded, within the same batch, by a [`Effect::CancelTimer`]
    /// for any previously armed timer.
    ArmTimer {
        timer: TimerId,
        /// The stage the timer will advance from.
        stage: StageIndex,
        delay_ms: u64,
    },

    /// Cancel a previously armed timer.
    CancelTimer(TimerId),

    /// Publish an event to consumers.
    Notify(BootEvent),
}

/// A state change observable by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum BootEvent {
    StageChanged { from: StageIndex, to: StageIndex },
    PlaybackChanged { playing: bool },
    StatusChanged { from: BootStatus, to: BootStatus },
    SpeedChanged { from: Speed, to: Speed },
    /// The terminal position was reached.
    Completed { status: BootStatus },
}
