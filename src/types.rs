//! The internal seam between the connection engine and a stream's driver task.
//!
//! The public-facing publisher/subscriber contract (spec §4.3) is realized with Rust's own
//! `Stream` trait: a `Flux<Result<Payload>>` (`Pin<Box<dyn Stream<...>>>`) already gives
//! `on_subscribe`/`on_next`/`on_complete`/`on_error` for free through polling, so there is no
//! separate reactive-streams trait to define. What *is* engine-specific is the narrower
//! seam below: routing inbound wire frames to a stream's driver task ([`Subject`]), and
//! letting the engine signal REQUEST_N/CANCEL back into that task's outbound demand
//! ([`Subscription`]).

pub(crate) trait Subscription: Send + Sync + 'static {
    fn request(&mut self, _n: u32) -> crate::Result<()> {
        Ok(())
    }

    fn cancel(&mut self) -> crate::Result<()>;
}

pub(crate) trait Subject: Send + 'static {
    type Item;

    fn on_next(&mut self, item: Self::Item) -> crate::Result<()>;

    fn on_error(&mut self, err: crate::Error);

    fn on_complete(&mut self) -> crate::Result<()>;
}
