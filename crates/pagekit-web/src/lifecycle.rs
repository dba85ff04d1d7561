#![forbid(unsafe_code)]

//! Document readiness and timer arming for the browser runtime.

use std::time::Duration;

/// Whether `document.readyState` says the document is still being parsed,
/// in which case installation waits for `DOMContentLoaded`.
pub(crate) fn still_parsing(ready_state: &str) -> bool {
    ready_state == "loading"
}

/// Tracks the deadline of the pending browser `Timeout`.
///
/// At most one timeout is kept per earliest deadline. The runtime must call
/// [`disarm`](Self::disarm) whenever an armed timeout fires or is abandoned,
/// or later deadlines are never armed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimerArm {
    armed_for: Option<Duration>,
}

impl TimerArm {
    /// Millisecond delay for a new timeout covering `deadline`, or `None`
    /// when one armed at or before it is still pending.
    pub(crate) fn arm(&mut self, deadline: Duration, now: Duration) -> Option<u32> {
        if self.armed_for.is_some_and(|armed| armed <= deadline) {
            return None;
        }
        self.armed_for = Some(deadline);
        let delay = deadline.saturating_sub(now);
        Some(u32::try_from(delay.as_micros().div_ceil(1_000)).unwrap_or(u32::MAX))
    }

    pub(crate) fn disarm(&mut self) {
        self.armed_for = None;
    }

    #[cfg(test)]
    pub(crate) const fn armed_for(&self) -> Option<Duration> {
        self.armed_for
    }
}
