//! Suspendable clocks
//!
//! All times are milliseconds on the caller's monotonic clock (the runtime
//! passes milliseconds since session start). A suspended clock stops
//! accumulating until resumed, so pause never eats into a countdown.

use serde::{Deserialize, Serialize};

/// Accumulates running time, excluding suspended spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stopwatch {
    banked_ms: u64,
    running_since: Option<u64>,
}

impl Stopwatch {
    /// A stopwatch that starts running at `now`
    pub fn started(now: u64) -> Self {
        Self {
            banked_ms: 0,
            running_since: Some(now),
        }
    }

    pub fn elapsed(&self, now: u64) -> u64 {
        match self.running_since {
            Some(since) => self.banked_ms + now.saturating_sub(since),
            None => self.banked_ms,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Stop accumulating. No-op when already suspended.
    pub fn suspend(&mut self, now: u64) {
        if let Some(since) = self.running_since.take() {
            self.banked_ms += now.saturating_sub(since);
        }
    }

    /// Continue accumulating from `now`. No-op when running.
    pub fn resume(&mut self, now: u64) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }
}

/// Countdown that can be suspended and resumed without losing time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendableTimer {
    duration_ms: u64,
    watch: Stopwatch,
}

impl SuspendableTimer {
    pub fn started(duration_ms: u64, now: u64) -> Self {
        Self {
            duration_ms,
            watch: Stopwatch::started(now),
        }
    }

    pub fn remaining(&self, now: u64) -> u64 {
        self.duration_ms.saturating_sub(self.watch.elapsed(now))
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.remaining(now) == 0
    }

    pub fn is_suspended(&self) -> bool {
        !self.watch.is_running()
    }

    pub fn suspend(&mut self, now: u64) {
        self.watch.suspend(now);
    }

    pub fn resume(&mut self, now: u64) {
        self.watch.resume(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_stopwatch_excludes_suspended_span() {
        let mut watch = Stopwatch::started(100);
        assert_eq!(watch.elapsed(350), 250);

        watch.suspend(400);
        assert_eq!(watch.elapsed(10_000), 300);

        watch.resume(10_000);
        assert_eq!(watch.elapsed(10_050), 350);
    }

    #[test]
    fn test_double_suspend_is_noop() {
        let mut watch = Stopwatch::started(0);
        watch.suspend(100);
        watch.suspend(500);
        assert_eq!(watch.elapsed(900), 100);
    }

    #[test]
    fn test_timer_expires() {
        let timer = SuspendableTimer::started(1000, 0);
        assert!(!timer.is_expired(999));
        assert!(timer.is_expired(1000));
        assert_eq!(timer.remaining(5000), 0);
    }

    proptest! {
        #[test]
        fn prop_suspend_resume_preserves_remaining(
            duration in 1u64..120_000,
            run in 0u64..120_000,
            paused_for in 0u64..1_000_000,
        ) {
            let mut timer = SuspendableTimer::started(duration, 0);
            timer.suspend(run);
            let at_pause = timer.remaining(run);
            timer.resume(run + paused_for);
            prop_assert_eq!(timer.remaining(run + paused_for), at_pause);
        }
    }
}
