//! Countdown engine for rest periods and timed sets.
//!
//! The countdown is a plain value: it never schedules anything itself. The
//! runtime's ticker calls [`Countdown::tick`] once per second while the
//! countdown is running.

/// What a running countdown is timing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerMode {
    /// Rest between sets or exercises
    Rest,
    /// Work period of a DURATION set
    Duration,
}

/// Reported once when a running countdown reaches zero
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Expired {
    pub mode: TimerMode,
}

/// A single mutable countdown
#[derive(Clone, Debug, Default)]
pub struct Countdown {
    remaining: u32,
    mode: Option<TimerMode>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the countdown and mark it running.
    ///
    /// Arming with zero seconds leaves the countdown idle.
    pub fn arm(&mut self, seconds: u32, mode: TimerMode) {
        self.remaining = seconds;
        self.mode = (seconds > 0).then_some(mode);
        tracing::debug!("Countdown armed: {}s ({:?})", seconds, mode);
    }

    /// Stop the countdown without reporting expiry
    pub fn cancel(&mut self) {
        if self.mode.take().is_some() {
            tracing::debug!("Countdown cancelled with {}s left", self.remaining);
        }
        self.remaining = 0;
    }

    /// Advance by one second
    pub fn tick(&mut self) -> Option<Expired> {
        let mode = self.mode?;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.mode = None;
            return Some(Expired { mode });
        }
        None
    }

    /// Force the countdown to zero, reporting expiry if it was running
    pub fn expire(&mut self) -> Option<Expired> {
        self.remaining = 0;
        self.mode.take().map(|mode| Expired { mode })
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn mode(&self) -> Option<TimerMode> {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode.is_some()
    }
}

/// Render seconds as whole minutes and zero-padded seconds, e.g. `2m05s`
pub fn format_clock(seconds: u32) -> String {
    format!("{}m{:02}s", seconds / 60, seconds % 60)
}
