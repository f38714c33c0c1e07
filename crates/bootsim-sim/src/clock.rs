//! Clock adapter trait for simulated vs wall-clock time sources.
//!
//! - **Deterministic simulation**: `SimClock` only moves when told to
//! - **Interactive use**: `SystemClock` follows a monotonic `Instant`
//!
//! Time is measured in milliseconds since the clock was created. Boot stage
//! durations are authored in milliseconds, so nothing finer is needed.
//!
//! Use `<C: Clock>` generic parameters rather than `&dyn Clock`; the
//! scheduler is monomorphized over its clock.

use std::time::Instant;

/// Trait for time sources (simulated or wall-clock).
pub trait Clock {
    /// Returns the current time in milliseconds.
    fn now_ms(&self) -> u64;

    /// Advances time to the given value (simulation only).
    ///
    /// Wall-clock implementations make this a no-op.
    ///
    /// # Panics
    ///
    /// May panic in debug builds if `time_ms < self.now_ms()`.
    fn advance_to(&mut self, time_ms: u64);

    /// Advances the clock by a delta (simulation only).
    #[inline]
    fn advance_by(&mut self, delta_ms: u64) {
        let target = self.now_ms().saturating_add(delta_ms);
        self.advance_to(target);
    }
}

// ============================================================================
// Simulation Implementation
// ============================================================================

/// Deterministic clock that advances only when explicitly requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimClock {
    now_ms: u64,
}

impl SimClock {
    /// Creates a new clock starting at time zero.
    pub fn new() -> Self {
        Self { now_ms: 0 }
    }
}

impl Clock for SimClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn advance_to(&mut self, time_ms: u64) {
        debug_assert!(
            time_ms >= self.now_ms,
            "time cannot go backwards: current={}, target={}",
            self.now_ms,
            time_ms
        );
        self.now_ms = self.now_ms.max(time_ms);
    }
}

// ============================================================================
// Wall-clock Implementation
// ============================================================================

/// Monotonic wall clock anchored at creation.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn advance_to(&mut self, _time_ms: u64) {
        // Time advances on its own.
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
