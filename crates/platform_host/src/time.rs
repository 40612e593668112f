//! Local wall-clock helpers shared across host contracts and adapters.

use chrono::Timelike;

/// Host service reporting the local-clock hour used for time-of-day decisions.
pub trait LocalClock {
    /// Returns the current local hour in `0..24`.
    fn local_hour(&self) -> u32;
}

#[derive(Debug, Clone, Copy, Default)]
/// Clock backed by the operating system's local time zone.
pub struct SystemLocalClock;

impl LocalClock for SystemLocalClock {
    fn local_hour(&self) -> u32 {
        chrono::Local::now().hour()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Clock pinned to one hour, for deterministic hosts and tests.
pub struct FixedLocalClock(u32);

impl FixedLocalClock {
    /// Creates a clock reporting `hour` (wrapped into `0..24`).
    pub const fn new(hour: u32) -> Self {
        Self(hour % 24)
    }
}

impl LocalClock for FixedLocalClock {
    fn local_hour(&self) -> u32 {
        self.0
    }
}
