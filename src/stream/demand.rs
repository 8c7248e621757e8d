use crate::connection::RequestCounter;
use tokio::sync::Notify;

/// Credit-based demand shared between a stream's frame-producing task and the connection
/// engine, which replenishes it as `REQUEST_N` frames (or a request/stream's
/// `initial_request_n`) arrive.
///
/// This is the wire-facing half of the reactive-streams contract described in spec §4.3:
/// a producer calls [`Demand::acquire`] before emitting each item, and the engine calls
/// [`Demand::add`] whenever it sees more credit granted on the stream.
pub(crate) struct Demand {
    counter: RequestCounter,
    notify: Notify,
}

impl Demand {
    pub(crate) fn new(initial: u32) -> Demand {
        Demand { counter: RequestCounter::new(initial), notify: Notify::new() }
    }

    /// Grants `n` more units of demand and wakes any producer waiting on [`acquire`].
    ///
    /// [`acquire`]: Demand::acquire
    pub(crate) fn add(&self, n: u32) {
        if n == 0 {
            return;
        }
        self.counter.add(n);
        self.notify.notify_waiters();
    }

    fn try_take(&self) -> bool {
        if self.counter.load() > 0 {
            self.counter.dec();
            true
        } else {
            false
        }
    }

    /// Waits until at least one unit of demand is available, then consumes it.
    ///
    /// Only ever awaited from the single task driving this stream's production, so the
    /// load-then-decrement in [`try_take`] races against `add` only, never against another
    /// consumer.
    ///
    /// Registers interest on `notify` *before* re-checking demand, per `Notify`'s documented
    /// pattern: `notify_waiters` only wakes already-registered waiters, so calling
    /// `notified()` after the failed check would leave a window where a concurrent `add`'s
    /// wakeup is missed entirely.
    ///
    /// [`try_take`]: Demand::try_take
    pub(crate) async fn acquire(&self) {
        loop {
            let notified = self.notify.notified();
            if self.try_take() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_consumes_initial_demand() {
        let demand = Demand::new(1);
        demand.acquire().await;
        assert_eq!(demand.counter.load(), 0);
    }

    #[tokio::test]
    async fn add_wakes_waiting_acquire() {
        let demand = std::sync::Arc::new(Demand::new(0));
        let waiter = demand.clone();
        let handle = tokio::spawn(async move {
            waiter.acquire().await;
        });
        tokio::task::yield_now().await;
        demand.add(1);
        handle.await.unwrap();
    }
}
