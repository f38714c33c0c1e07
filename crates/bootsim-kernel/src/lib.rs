//! # bootsim-kernel: Functional core of the secure boot simulator
//!
//! The kernel is the pure, deterministic heart of the simulator. It receives
//! commands and produces state changes plus effects to execute.
//!
//! ## Key Principles
//!
//! - **No IO**: The kernel never touches a scheduler, a clock, or a terminal
//! - **No clocks**: Timers are described as effects; the runtime arms them
//! - **Pure functions**: `apply(state, command) -> (state, effects)`
//! - **Derived, never stored**: flags, labels and sub-step statuses are
//!   recomputed from `(stage, mode)` on every read
//!
//! ## Architecture
//!
//! - [`catalog`]: The ordered, immutable stage list
//! - [`projector`]: `(stage, mode)` → flags, status label, registers, memory
//! - [`substeps`]: Sub-step verification status derivation
//! - [`command`]: Commands (`Play`, `Pause`, `GoToStage`, `TimerFired`, ...)
//! - [`effects`]: Effects for the runtime (`ArmTimer`, `CancelTimer`, `Notify`)
//! - [`state`]: The simulation state
//! - [`kernel`]: The `apply` function that ties it all together

pub mod catalog;
pub mod command;
pub mod effects;
pub mod kernel;
pub mod projector;
pub mod state;
pub mod substeps;


pub use catalog::{CatalogError, EntityRef, StageCatalog, StageDescriptor, SubStepTemplate};
pub use command::Command;
pub use effects::{BootEvent, Effect};
pub use kernel::{KernelError, apply, completion_status};
pub use projector::{
    DerivedFlags, MemoryRegion, Projection, Registers, StatusLabel, format_bytes, format_hex, project,
};
pub use state::{Phase, State};
pub use substeps::{EntityView, StageProgress, SubStepView, all_sub_steps, stage_sub_steps};
