//! # bootsim-sim: Time adapters for the boot simulator
//!
//! Trait-based abstractions for the imperative-shell boundary:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Pure Functional Core (bootsim-kernel)      │
//! ├─────────────────────────────────────────────┤
//! │  Adapters (Trait Boundary)                  │
//! │  • Clock     (time source)                  │
//! │  • Scheduler (timer arm/cancel/fire)        │
//! ├─────────────────────────────────────────────┤
//! │  Imperative Shell (bootsim engine)          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Tests drive [`SimScheduler`] by advancing simulated time; the CLI's
//! real-time mode uses [`SystemScheduler`].

pub mod clock;
pub mod scheduler;

pub use clock::{Clock, SimClock, SystemClock};
pub use scheduler::{Scheduler, SimScheduler, SystemScheduler, TimerQueue, TimerToken};
