//! Scheduler adapter trait for auto-advance timers.
//!
//! The engine never sleeps or spawns. It hands a delay and a [`TimerId`] to a
//! [`Scheduler`] and gets back a [`TimerToken`] it can cancel with. Whoever
//! drives the engine asks the scheduler which timers are due and feeds them
//! back in.
//!
//! [`TimerQueue`] is the one implementation, generic over its [`Clock`]:
//! [`SimScheduler`] for deterministic tests, [`SystemScheduler`] for
//! interactive runs.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display};

use bootsim_types::TimerId;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SimClock, SystemClock};

/// Cancellation handle for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token#{}", self.0)
    }
}

/// Trait for timer scheduling (simulated or wall-clock).
pub trait Scheduler {
    /// Current time on the scheduler's clock, in milliseconds.
    fn now_ms(&self) -> u64;

    /// Schedules `timer` to fire `delay_ms` from now.
    fn schedule(&mut self, delay_ms: u64, timer: TimerId) -> TimerToken;

    /// Cancels a scheduled timer.
    ///
    /// Returns `false` if the token already fired or was cancelled.
    fn cancel(&mut self, token: TimerToken) -> bool;

    /// Removes and returns the earliest timer whose due time has passed.
    ///
    /// Timers due at the same instant come out in scheduling order.
    fn pop_due(&mut self) -> Option<TimerId>;

    /// Due time of the earliest pending timer, if any.
    fn next_due(&self) -> Option<u64>;

    /// Number of pending timers.
    fn pending(&self) -> usize;

    /// Moves simulated time forward. A no-op on wall-clock schedulers.
    fn advance_to(&mut self, time_ms: u64);
}

impl<S: Scheduler + ?Sized> Scheduler for &mut S {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn schedule(&mut self, delay_ms: u64, timer: TimerId) -> TimerToken {
        (**self).schedule(delay_ms, timer)
    }

    fn cancel(&mut self, token: TimerToken) -> bool {
        (**self).cancel(token)
    }

    fn pop_due(&mut self) -> Option<TimerId> {
        (**self).pop_due()
    }

    fn next_due(&self) -> Option<u64> {
        (**self).next_due()
    }

    fn pending(&self) -> usize {
        (**self).pending()
    }

    fn advance_to(&mut self, time_ms: u64) {
        (**self).advance_to(time_ms);
    }
}

// ============================================================================
// Timer Queue
// ============================================================================

/// Time-ordered timer queue over any [`Clock`].
#[derive(Debug, Clone, Default)]
pub struct TimerQueue<C> {
    clock: C,
    /// Ordered by due time, then token (scheduling order).
    queue: BTreeMap<(u64, TimerToken), TimerId>,
    /// Token to due time, for cancellation.
    due: HashMap<TimerToken, u64>,
    next_token: u64,
}

/// Deterministic scheduler driven by explicit time advancement.
pub type SimScheduler = TimerQueue<SimClock>;

/// Scheduler that follows the wall clock.
pub type SystemScheduler = TimerQueue<SystemClock>;

impl<C: Clock> TimerQueue<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            queue: BTreeMap::new(),
            due: HashMap::new(),
            next_token: 0,
        }
    }
}

impl SimScheduler {
    pub fn new() -> Self {
        Self::with_clock(SimClock::new())
    }
}

impl SystemScheduler {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl<C: Clock> Scheduler for TimerQueue<C> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn schedule(&mut self, delay_ms: u64, timer: TimerId) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;

        let due = self.clock.now_ms().saturating_add(delay_ms);
        self.queue.insert((due, token), timer);
        self.due.insert(token, due);

        debug_assert_eq!(self.queue.len(), self.due.len());
        token
    }

    fn cancel(&mut self, token: TimerToken) -> bool {
        match self.due.remove(&token) {
            Some(due) => self.queue.remove(&(due, token)).is_some(),
            None => false,
        }
    }

    fn pop_due(&mut self) -> Option<TimerId> {
        let now = self.clock.now_ms();
        let (&(due, token), _) = self.queue.first_key_value()?;
        if due > now {
            return None;
        }
        self.due.remove(&token);
        self.queue.remove(&(due, token))
    }

    fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }

    fn advance_to(&mut self, time_ms: u64) {
        self.clock.advance_to(time_ms);
    }
}

// ============================================================================
// Tests
// ============================================================================
