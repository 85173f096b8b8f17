use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Why an upstream exchange was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseReason {
    /// The client consumed the whole body
    Completed,
    /// The body was dropped before it was exhausted
    ClientDisconnect,
    /// Reading the next upstream chunk failed
    UpstreamError(String),
}

impl ReleaseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseReason::Completed => "completed",
            ReleaseReason::ClientDisconnect => "client_disconnect",
            ReleaseReason::UpstreamError(_) => "upstream_error",
        }
    }
}

impl fmt::Display for ReleaseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseReason::UpstreamError(e) => write!(f, "upstream_error: {}", e),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Process-wide accounting of upstream exchanges.
///
/// Every opened exchange must eventually be released exactly once, so
/// `opened == released()` whenever no request is in flight.
#[derive(Debug, Default)]
pub struct ReleaseStats {
    opened: AtomicU64,
    completed: AtomicU64,
    client_disconnects: AtomicU64,
    upstream_errors: AtomicU64,
}

/// Point-in-time copy of [`ReleaseStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseSnapshot {
    pub opened: u64,
    pub completed: u64,
    pub client_disconnects: u64,
    pub upstream_errors: u64,
}

impl ReleaseSnapshot {
    pub fn released(&self) -> u64 {
        self.completed + self.client_disconnects + self.upstream_errors
    }

    pub fn in_flight(&self) -> u64 {
        self.opened.saturating_sub(self.released())
    }
}

impl ReleaseStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_open(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_release(&self, reason: &ReleaseReason) {
        let counter = match reason {
            ReleaseReason::Completed => &self.completed,
            ReleaseReason::ClientDisconnect => &self.client_disconnects,
            ReleaseReason::UpstreamError(_) => &self.upstream_errors,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ReleaseSnapshot {
        ReleaseSnapshot {
            opened: self.opened.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            client_disconnects: self.client_disconnects.load(Ordering::SeqCst),
            upstream_errors: self.upstream_errors.load(Ordering::SeqCst),
        }
    }
}
