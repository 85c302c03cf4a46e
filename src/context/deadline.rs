//! Platform time budget.

use std::time::{Duration, Instant};

/// A source of "milliseconds left before the platform gives up".
pub trait RemainingTime: Send + Sync {
    fn remaining_millis(&self) -> u64;
}

/// Deadline anchored at a fixed instant.
///
/// The instant never moves, so the remaining time only ever shrinks.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self::starting_at(Instant::now(), budget)
    }

    /// A deadline `budget` after `start`.
    pub fn starting_at(start: Instant, budget: Duration) -> Self {
        Self { at: start + budget }
    }
}

impl RemainingTime for Deadline {
    fn remaining_millis(&self) -> u64 {
        let left = self.at.saturating_duration_since(Instant::now());
        u64::try_from(left.as_millis()).unwrap_or(u64::MAX)
    }
}

/// A clock that always reports the same remaining time.
#[derive(Debug, Clone, Copy)]
pub struct FixedRemaining(pub u64);

impl RemainingTime for FixedRemaining {
    fn remaining_millis(&self) -> u64 {
        self.0
    }
}
