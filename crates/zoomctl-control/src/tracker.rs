//! Caller-side bookkeeping for patch requests.
//!
//! The pedal answers a patch request with a dump, or not at all. The
//! controller never retries; a caller that wants to can record each request
//! here and ask whether the answer is overdue.

use std::time::{Duration, Instant};

use crate::command::Command;
use crate::dispatch::DispatchOutcome;

/// Default wait before a patch request is reported overdue.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(500);

/// A request still waiting for its dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub command: Command,
    pub sent_at: Instant,
    /// How many times this request was sent in a row.
    pub attempts: u32,
}

/// Tracks the most recent patch request.
#[derive(Debug, Clone)]
pub struct PatchRequestTracker {
    timeout: Duration,
    pending: Option<PendingRequest>,
}

impl PatchRequestTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: None,
        }
    }

    /// Record that `command` was sent at `now`.
    ///
    /// Only read-only requests are tracked; other commands are ignored and
    /// `false` is returned. Re-sending the pending request bumps its attempt
    /// count; any other request replaces it.
    pub fn record(&mut self, command: Command, now: Instant) -> bool {
        if !command.is_read_only() {
            return false;
        }
        let attempts = match self.pending {
            Some(p) if p.command == command => p.attempts + 1,
            _ => 1,
        };
        self.pending = Some(PendingRequest {
            command,
            sent_at: now,
            attempts,
        });
        true
    }

    /// Clear the pending request if `outcome` carries a parsed patch.
    pub fn observe(&mut self, outcome: &DispatchOutcome) -> bool {
        if matches!(outcome.patch, Some(Ok(_))) && self.pending.is_some() {
            self.pending = None;
            return true;
        }
        false
    }

    /// The request to re-issue, if its reply is overdue at `now`.
    pub fn overdue(&self, now: Instant) -> Option<PendingRequest> {
        self.pending
            .filter(|p| now.saturating_duration_since(p.sent_at) >= self.timeout)
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    /// Forget the pending request.
    pub fn clear(&mut self) -> Option<PendingRequest> {
        self.pending.take()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for PatchRequestTracker {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use zoomctl_frame::{encode_frame, PATCH_DUMP};

    use super::*;
    use crate::dispatch::Dispatcher;

    #[test]
    fn overdue_after_timeout() {
        let start = Instant::now();
        let mut tracker = PatchRequestTracker::new(Duration::from_millis(100));
        assert!(tracker.record(Command::RequestCurrentPatch, start));

        assert!(tracker.overdue(start + Duration::from_millis(50)).is_none());
        let late = tracker.overdue(start + Duration::from_millis(100)).unwrap();
        assert_eq!(late.command, Command::RequestCurrentPatch);
        assert_eq!(late.attempts, 1);
    }

    #[test]
    fn resend_counts_attempts() {
        let start = Instant::now();
        let mut tracker = PatchRequestTracker::default();
        tracker.record(Command::RequestPatch { patch: 3 }, start);
        tracker.record(Command::RequestPatch { patch: 3 }, start);
        assert_eq!(tracker.pending().unwrap().attempts, 2);

        tracker.record(Command::RequestPatch { patch: 4 }, start);
        assert_eq!(tracker.pending().unwrap().attempts, 1);
    }

    #[test]
    fn mutations_not_tracked() {
        let mut tracker = PatchRequestTracker::default();
        assert!(!tracker.record(Command::ToggleEffect { slot: 0, enabled: true }, Instant::now()));
        assert!(tracker.pending().is_none());
    }

    #[test]
    fn dump_clears_pending() {
        let mut tracker = PatchRequestTracker::default();
        let mut dispatcher = Dispatcher::new();
        tracker.record(Command::RequestCurrentPatch, Instant::now());

        let outcome = dispatcher.dispatch(&[0xC0, 1]);
        assert!(!tracker.observe(&outcome));
        assert!(tracker.pending().is_some());

        let frame = encode_frame(PATCH_DUMP, &[0; 40]).unwrap();
        let outcome = dispatcher.dispatch(frame.as_bytes());
        assert!(tracker.observe(&outcome));
        assert!(tracker.pending().is_none());
    }
}
