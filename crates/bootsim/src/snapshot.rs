//! Read-only view of an engine for presentation layers.

use bootsim_kernel::{Phase, Projection, StageProgress, SubStepView};
use bootsim_types::{BootMode, BootStatus, Speed, StageIndex};
use serde::Serialize;

/// Everything a view needs to render one frame of the simulation.
///
/// Produced by [`crate::BootEngine::snapshot`]. Holds no reference to the
/// engine, so it can be handed to a renderer or serialized as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootSnapshot {
    pub stage: StageIndex,
    pub total_stages: u32,
    pub stage_name: String,
    pub instruction: Option<String>,
    pub phase: Phase,
    pub playing: bool,
    pub speed: Speed,
    pub mode: BootMode,
    pub status: BootStatus,
    /// `stage / total_stages`.
    pub progress: f64,
    pub stage_progress: StageProgress,
    pub projection: Projection,
    pub sub_steps: Vec<SubStepView>,
}

impl BootSnapshot {
    /// True once the terminal position is reached.
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Progress as a whole percentage for timeline bars.
    pub fn percent(&self) -> u8 {
        (self.progress * 100.0).round().clamp(0.0, 100.0) as u8
    }
}
