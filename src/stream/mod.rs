//! Per-interaction-model stream state machines.
//!
//! This module is the multiplexer's counterpart to [`crate::connection`]: the connection
//! engine owns the stream table and the single read/write loop, while the functions here
//! drive one stream's lifecycle from the moment a request frame is sent or accepted to the
//! moment the stream reaches a terminal state. Every driver is a plain `async fn` spawned
//! as its own task (one per handler invocation, per the engine's concurrency model), and
//! all of them talk to the rest of the connection only through [`FrameSink`] (inbound) and
//! [`crate::connection::DuplexConnection`] (outbound).
mod cancel;
mod demand;

pub(crate) mod channel;
pub(crate) mod fnf;
pub(crate) mod response;
pub(crate) mod streaming;

pub(crate) use cancel::{CancelHandle, CancelToken};
pub(crate) use demand::Demand;

use crate::frame::codec::PayloadFrame;
use crate::frame::{Flags, Frame};
use crate::types::Subject;
use tokio::sync::mpsc;

/// Forwards frames arriving for a stream into that stream's driver task.
///
/// Registered in the connection engine's stream table under the stream's id; the engine's
/// read loop calls `on_next` synchronously as frames arrive (after fragment reassembly),
/// so the only work it can do is a non-blocking channel send.
pub(crate) struct FrameSink {
    sender: mpsc::UnboundedSender<Frame>,
}

impl FrameSink {
    /// Creates a connected sink/receiver pair for a new stream entry.
    pub(crate) fn new() -> (FrameSink, mpsc::UnboundedReceiver<Frame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (FrameSink { sender }, receiver)
    }
}

impl Subject for FrameSink {
    type Item = Frame;

    fn on_next(&mut self, item: Frame) -> crate::Result<()> {
        // A failed send means the stream's driver task already finished (e.g. it hit a
        // terminal state on its own and deregistered); the late frame is simply dropped.
        let _ = self.sender.send(item);
        Ok(())
    }

    fn on_error(&mut self, _err: crate::Error) {}

    fn on_complete(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

/// What an interaction model's request frame carries that isn't a plain payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InteractionModel {
    RequestResponse,
    FireAndForget,
    RequestStream,
    RequestChannel,
}

/// Splits one item of an in-progress stream (request/stream or request/channel) into wire
/// `PAYLOAD` fragments.
///
/// Unlike [`crate::fragment::fragment_request`], which always marks a payload's final
/// fragment COMPLETE, this takes `terminal` explicitly: only the last item of a stream may
/// carry COMPLETE, every intermediate item must carry NEXT alone.
pub(crate) fn emit_payload_frames(
    stream_id: u32,
    payload: crate::payload::Payload,
    terminal: bool,
    fragment_size: usize,
) -> Vec<Frame> {
    assert!(fragment_size >= 3, "fragment_size must be >= 3");

    let mut chunks: Vec<crate::payload::Payload> = if payload.len() <= fragment_size {
        vec![payload]
    } else {
        payload.chunks(fragment_size).collect()
    };
    let last = chunks.pop().expect("at least one chunk");

    let mut frames = Vec::with_capacity(chunks.len() + 1);
    for chunk in chunks {
        frames.push(Frame::Payload(PayloadFrame::new(stream_id, Flags::FOLLOWS | Flags::NEXT, chunk)));
    }

    let mut last_flags = Flags::NEXT;
    if terminal {
        last_flags |= Flags::COMPLETE;
    }
    frames.push(Frame::Payload(PayloadFrame::new(stream_id, last_flags, last)));
    frames
}

/// A `PAYLOAD(COMPLETE)` frame carrying no item, for a stream that completes without a
/// final value to emit.
pub(crate) fn complete_frame(stream_id: u32) -> Frame {
    Frame::Payload(PayloadFrame::new(stream_id, Flags::COMPLETE, crate::payload::Payload::default()))
}

/// The connection engine's per-connection bookkeeping for live streams: inbound frame
/// routing, peer-visible cancellation/demand control, and fragment reassembly. Cloned into
/// every spawned stream driver task so it can deregister itself on reaching a terminal
/// state.
#[derive(Clone)]
pub(crate) struct StreamTables {
    pub(crate) receivers: std::sync::Arc<dashmap::DashMap<u32, Box<dyn Subject<Item = Frame>>>>,
    pub(crate) subscriptions:
        std::sync::Arc<dashmap::DashMap<u32, Box<dyn crate::types::Subscription>>>,
    pub(crate) fragments: std::sync::Arc<crate::fragment::FragmentCache>,
}

impl StreamTables {
    pub(crate) fn new() -> StreamTables {
        StreamTables {
            receivers: std::sync::Arc::new(dashmap::DashMap::new()),
            subscriptions: std::sync::Arc::new(dashmap::DashMap::new()),
            fragments: std::sync::Arc::new(crate::fragment::FragmentCache::new()),
        }
    }

    /// Removes every trace of `stream_id` from the tables: its inbound-frame route, its
    /// cancellation/demand handle, and any in-progress fragment sequence.
    pub(crate) fn evict(&self, stream_id: u32) {
        self.receivers.remove(&stream_id);
        self.subscriptions.remove(&stream_id);
        self.fragments.evict(stream_id);
    }
}

impl Default for StreamTables {
    fn default() -> Self {
        StreamTables::new()
    }
}
