use crate::stream::Demand;
use crate::types::Subscription;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A cancellation flag shared between a stream's [`CancelHandle`] (driven by inbound
/// CANCEL frames) and the task producing that stream's payloads.
pub(crate) struct CancelToken {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    fn new() -> CancelToken {
        CancelToken { cancelled: AtomicBool::new(false), notify: Notify::new() }
    }

    fn set(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Returns true if [`set`](CancelToken::set) has already been called.
    pub(crate) fn is_set(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token has been cancelled. Safe to use in a `tokio::select!` arm
    /// alongside a producer's own work.
    ///
    /// Registers interest before re-checking the flag, matching [`Demand::acquire`]'s
    /// pattern, so a `set()` racing with a not-yet-registered waiter is never missed.
    ///
    /// [`Demand::acquire`]: crate::stream::Demand::acquire
    pub(crate) async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

/// The connection engine's handle onto a locally-running producer for a stream.
///
/// Registered in the stream table's subscription map under the stream's id; a `CANCEL`
/// frame from the peer calls [`cancel`](Subscription::cancel), a `REQUEST_N` frame calls
/// [`request`](Subscription::request). The producer task observes cancellation through the
/// [`CancelToken`] returned alongside the handle.
pub(crate) struct CancelHandle {
    token: Arc<CancelToken>,
    demand: Option<Arc<Demand>>,
}

impl CancelHandle {
    /// Builds a handle and the token its producer task should watch for cancellation.
    pub(crate) fn new(demand: Option<Arc<Demand>>) -> (CancelHandle, Arc<CancelToken>) {
        let token = Arc::new(CancelToken::new());
        (CancelHandle { token: token.clone(), demand }, token)
    }
}

impl Subscription for CancelHandle {
    fn request(&mut self, n: u32) -> crate::Result<()> {
        if let Some(demand) = &self.demand {
            demand.add(n);
        }
        Ok(())
    }

    fn cancel(&mut self) -> crate::Result<()> {
        self.token.set();
        Ok(())
    }
}
