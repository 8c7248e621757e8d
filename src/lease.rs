//! Lease-based admission control (spec §4.5).
//!
//! When a connection negotiates `LEASE` in its SETUP frame, a requester may not issue
//! requests until the peer's responder has granted it a window: `N` requests usable
//! within `T` milliseconds. [`LeaseManager`] tracks the currently active window on the
//! requester side; the responder side of the same feature (supplying an initial grant
//! after SETUP, per SPEC_FULL.md §10) lives in the connection engine, since it is just a
//! frame send with no local state to track.
use crate::connection::RequestCounter;
use crate::error::Error;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

struct Window {
    remaining: RequestCounter,
    expires_at: Instant,
}

/// Tracks the requester-side lease window granted by the peer's `LEASE` frames.
///
/// A connection that never negotiated `LEASE` simply never calls [`acquire`](Self::acquire);
/// one that did starts with no window at all, so every request is rejected until the
/// peer's first `LEASE` frame arrives, matching "both sides must wait for a LEASE frame
/// before issuing requests".
pub(crate) struct LeaseManager {
    window: Mutex<Option<Window>>,
}

impl LeaseManager {
    pub(crate) fn new() -> LeaseManager {
        LeaseManager { window: Mutex::new(None) }
    }

    /// Records a new grant. A later grant always supersedes an earlier one, even if the
    /// earlier window hasn't expired or been exhausted yet.
    pub(crate) fn grant(&self, number_of_requests: u32, ttl: Duration) {
        let window =
            Window { remaining: RequestCounter::new(number_of_requests), expires_at: Instant::now() + ttl };
        *self.window.lock().unwrap() = Some(window);
    }

    /// Consumes one unit of the current window.
    ///
    /// Fails with a local `RSocketRejected`-equivalent (`Error::rejected`) if no window
    /// has ever been granted, the active window has expired, or its quota is exhausted.
    pub(crate) fn acquire(&self) -> crate::Result<()> {
        let guard = self.window.lock().unwrap();
        match guard.as_ref() {
            Some(window) if Instant::now() < window.expires_at && window.remaining.load() > 0 => {
                window.remaining.dec();
                Ok(())
            }
            Some(_) => Err(Error::rejected("lease window expired or exhausted")),
            None => Err(Error::rejected("no lease window has been granted yet")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_before_any_grant() {
        let lease = LeaseManager::new();
        assert!(lease.acquire().is_err());
    }

    #[test]
    fn grant_admits_up_to_quota() {
        let lease = LeaseManager::new();
        lease.grant(2, Duration::from_secs(60));
        assert!(lease.acquire().is_ok());
        assert!(lease.acquire().is_ok());
        assert!(lease.acquire().is_err());
    }

    #[test]
    fn new_grant_supersedes_old_window() {
        let lease = LeaseManager::new();
        lease.grant(1, Duration::from_secs(60));
        lease.grant(5, Duration::from_secs(60));
        for _ in 0..5 {
            assert!(lease.acquire().is_ok());
        }
        assert!(lease.acquire().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_window_rejects() {
        let lease = LeaseManager::new();
        lease.grant(10, Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;
        assert!(lease.acquire().is_err());
    }
}
