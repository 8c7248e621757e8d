//! In-process duplex transport for integration tests.
//!
//! Two `tokio::sync::mpsc` channels wired back to back, each side implementing
//! `rscore::connection::DuplexConnection`. This is test infrastructure only (per
//! SPEC_FULL.md §9): the engine treats it exactly like any other transport, since it only
//! ever talks to the `DuplexConnection` trait.
use rscore::connection::{ConnectionStatus, DuplexConnection};
use rscore::frame::Frame;
use rscore::{Flux, Mono, Result};

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, UnboundedReceiverStream};

/// Builds a connected in-process pair: frames sent on `a` arrive on `b`'s `receive()`
/// stream and vice versa.
pub fn new_pair() -> (Arc<Endpoint>, Arc<Endpoint>) {
    let (a_tx, b_rx) = mpsc::unbounded_channel::<Frame>();
    let (b_tx, a_rx) = mpsc::unbounded_channel::<Frame>();

    let a = Arc::new(Endpoint {
        outbound: a_tx,
        inbound: std::sync::Mutex::new(Some(a_rx)),
        closed: AtomicBool::new(false),
    });
    let b = Arc::new(Endpoint {
        outbound: b_tx,
        inbound: std::sync::Mutex::new(Some(b_rx)),
        closed: AtomicBool::new(false),
    });

    (a, b)
}

/// One half of an in-process duplex pair. See [`new_pair`].
pub struct Endpoint {
    outbound: mpsc::UnboundedSender<Frame>,
    inbound: std::sync::Mutex<Option<mpsc::UnboundedReceiver<Frame>>>,
    closed: AtomicBool,
}

fn disconnected() -> rscore::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "peer endpoint dropped").into()
}

impl DuplexConnection for Endpoint {
    fn send(&self, frame: Frame) -> Mono<Result<()>> {
        let result = if self.closed.load(Ordering::SeqCst) {
            Ok(())
        } else {
            self.outbound.send(frame).map_err(|_| disconnected())
        };
        Box::pin(async move { result })
    }

    fn send_and_forget(&self, frame: Frame) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.outbound.send(frame).map_err(|_| disconnected())
    }

    fn send_stream(&self, _frames: Flux<Frame>) {
        unimplemented!("not exercised by these integration tests")
    }

    fn receive(&self) -> Flux<Frame> {
        let receiver = self.inbound.lock().unwrap().take().expect("receive() called twice");
        Box::pin(UnboundedReceiverStream::new(receiver))
    }

    fn connect(&self) {}

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn connection_status(&self) -> Flux<ConnectionStatus> {
        let (_tx, rx) = mpsc::channel(1);
        Box::pin(ReceiverStream::new(rx))
    }
}
