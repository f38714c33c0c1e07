//! # Bootsim
//!
//! Secure-boot chain simulator.
//!
//! A boot is modelled as an ordered catalog of stages, from power-on through
//! ROM execution, key loading, flash read, signature verification and hash
//! check to CPU hand-off. The engine steps through them on timers, or under
//! manual control, and everything shown to a user (hardware activation
//! flags, status label, registers, memory, sub-step statuses) is derived
//! purely from `(stage, mode)`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        BootEngine                        │
//! │  ┌───────────┐   ┌───────────┐   ┌────────────────────┐  │
//! │  │  Command  │ → │  Kernel   │ → │ Effects (timers,   │  │
//! │  │ (play...) │   │(pure FSM) │   │ journal, logging)  │  │
//! │  └───────────┘   └───────────┘   └────────────────────┘  │
//! │                        ↓                                  │
//! │                 project(stage, mode)                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use bootsim::{BootEngine, BootMode, BootStatus};
//!
//! let mut engine = BootEngine::simulated(BootMode::Normal);
//! engine.play();
//! engine.run_until_idle();
//!
//! assert_eq!(engine.current_stage_name(), "Complete");
//! assert_eq!(engine.boot_status(), BootStatus::Success);
//! ```

mod engine;
mod error;
mod snapshot;

pub use engine::{BootEngine, COMPLETE_STAGE_NAME};
pub use error::{EngineError, Result};
pub use snapshot::BootSnapshot;

// Re-export shared types
pub use bootsim_types::{
    BootMode, BootStatus, EntityKind, EntityStatus, InvalidSpeed, Severity, Speed, StageIndex,
    TimerId, UnknownBootMode,
};

// Re-export kernel types
pub use bootsim_kernel::{
    BootEvent, CatalogError, Command, DerivedFlags, EntityView, KernelError, MemoryRegion, Phase,
    Projection, Registers, StageCatalog, StageDescriptor, StageProgress, StatusLabel, SubStepView,
    format_bytes, format_hex, project,
};

// Re-export scheduler adapters
pub use bootsim_sim::{Clock, Scheduler, SimClock, SimScheduler, SystemClock, SystemScheduler};
