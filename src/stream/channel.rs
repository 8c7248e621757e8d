//! Request/channel driver: both directions are driven by one task per stream so
//! completion of either side can be observed without risking a half-closed deadlock.
use crate::connection::DuplexConnection;
use crate::error::Error;
use crate::fragment;
use crate::frame::codec::ErrorFrame;
use crate::frame::{Frame, FrameType};
use crate::payload::Payload;
use crate::rsocket::{Flux, RSocket};
use crate::stream::{
    complete_frame, emit_payload_frames, CancelHandle, CancelToken, Demand, FrameSink, StreamTables,
};
use crate::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

/// Requester side: sends the first item of `outbound` as the initial REQUEST_CHANNEL frame
/// (fragmented if needed), then drives both directions. Returns the inbound items the
/// responder sends back.
pub(crate) fn request(
    conn: Arc<dyn DuplexConnection>,
    tables: StreamTables,
    stream_id: u32,
    outbound: Flux<Result<Payload>>,
    initial_request_n: u32,
    fragment_size: usize,
) -> Flux<Result<Payload>> {
    let (sink, raw_inbound) = FrameSink::new();
    tables.receivers.insert(stream_id, Box::new(sink));
    let (in_tx, in_rx) = mpsc::unbounded_channel::<Result<Payload>>();

    let out_demand = Arc::new(Demand::new(crate::consts::DEFAULT_INITIAL_REQUEST_N));
    let (handle, cancel_token) = CancelHandle::new(Some(out_demand.clone()));
    tables.subscriptions.insert(stream_id, Box::new(handle));

    let drive_conn = conn;
    let drive_tables = tables;
    crate::runtime::spawn(async move {
        let mut outbound = outbound;
        let first = outbound.next().await;
        let (head, already_done) = match first {
            Some(Ok(payload)) => (payload, false),
            Some(Err(err)) => {
                let data = err.message().map(bytes::Bytes::from);
                let _ = drive_conn
                    .send(Frame::Error(ErrorFrame::new(stream_id, err.wire_code(), data)))
                    .await;
                drive_tables.evict(stream_id);
                return;
            }
            None => (Payload::default(), true),
        };

        for frame in fragment::fragment_request(
            FrameType::REQUEST_CHANNEL,
            stream_id,
            Some(initial_request_n),
            already_done,
            head,
            fragment_size,
        ) {
            if drive_conn.send(frame).await.is_err() {
                drive_tables.evict(stream_id);
                return;
            }
        }

        drive(
            drive_conn,
            drive_tables,
            stream_id,
            outbound,
            raw_inbound,
            in_tx,
            out_demand,
            cancel_token,
            fragment_size,
            already_done,
        )
        .await;
    });

    Box::pin(UnboundedReceiverStream::new(in_rx))
}

/// Responder side: `raw_inbound` is fed by the engine with the initial channel payload
/// followed by subsequent PAYLOAD frames. Invokes the handler with an adapted inbound
/// [`Flux`] and drives its returned outbound [`Flux`] back to the peer.
pub(crate) fn respond(
    conn: Arc<dyn DuplexConnection>,
    tables: StreamTables,
    handler: Arc<dyn RSocket>,
    stream_id: u32,
    raw_inbound: mpsc::UnboundedReceiver<Frame>,
    initial_request_n: u32,
    fragment_size: usize,
) {
    let (in_tx, in_rx) = mpsc::unbounded_channel::<Result<Payload>>();
    let inbound_flux: Flux<Result<Payload>> = Box::pin(UnboundedReceiverStream::new(in_rx));

    let out_demand = Arc::new(Demand::new(initial_request_n));
    let (handle, cancel_token) = CancelHandle::new(Some(out_demand.clone()));
    tables.subscriptions.insert(stream_id, Box::new(handle));

    let outbound = handler.request_channel(inbound_flux);

    crate::runtime::spawn(async move {
        drive(
            conn,
            tables,
            stream_id,
            outbound,
            raw_inbound,
            in_tx,
            out_demand,
            cancel_token,
            fragment_size,
            false,
        )
        .await;
    });
}

/// Bidirectional driver loop shared by requester and responder: pulls `outbound` as credit
/// allows while forwarding frames arriving on `raw_inbound` into `in_tx`, stopping once both
/// directions are terminal or either side signals CANCEL/ERROR.
#[allow(clippy::too_many_arguments)]
async fn drive(
    conn: Arc<dyn DuplexConnection>,
    tables: StreamTables,
    stream_id: u32,
    mut outbound: Flux<Result<Payload>>,
    mut raw_inbound: mpsc::UnboundedReceiver<Frame>,
    in_tx: mpsc::UnboundedSender<Result<Payload>>,
    out_demand: Arc<Demand>,
    cancel_token: Arc<CancelToken>,
    fragment_size: usize,
    mut outbound_done: bool,
) {
    let mut inbound_done = false;

    while !(inbound_done && outbound_done) {
        tokio::select! {
            _ = cancel_token.cancelled(), if !inbound_done || !outbound_done => {
                inbound_done = true;
                outbound_done = true;
            }
            frame = raw_inbound.recv(), if !inbound_done => {
                match frame {
                    Some(Frame::Payload(p)) => {
                        let complete = p.is_complete();
                        if p.is_next() {
                            let _ = in_tx.send(Ok(p.payload()));
                        }
                        if complete {
                            inbound_done = true;
                        }
                    }
                    Some(Frame::Error(e)) => {
                        let _ = in_tx.send(Err(Error::from_wire(
                            e.error_code(),
                            e.data_utf8().map(String::from),
                        )));
                        inbound_done = true;
                        outbound_done = true;
                    }
                    Some(_) | None => {
                        let _ = in_tx.send(Err(Error::disconnected()));
                        inbound_done = true;
                        outbound_done = true;
                    }
                }
            }
            _ = out_demand.acquire(), if !outbound_done => {
                match outbound.next().await {
                    Some(Ok(payload)) => {
                        let mut failed = false;
                        for frame in emit_payload_frames(stream_id, payload, false, fragment_size) {
                            if conn.send(frame).await.is_err() {
                                failed = true;
                                break;
                            }
                        }
                        if failed {
                            outbound_done = true;
                        }
                    }
                    Some(Err(err)) => {
                        let data = err.message().map(bytes::Bytes::from);
                        let _ = conn
                            .send(Frame::Error(ErrorFrame::new(stream_id, err.wire_code(), data)))
                            .await;
                        outbound_done = true;
                        inbound_done = true;
                    }
                    None => {
                        let _ = conn.send(complete_frame(stream_id)).await;
                        outbound_done = true;
                    }
                }
            }
        }
    }

    tables.evict(stream_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionStatus;
    use std::sync::Mutex;

    struct RecordingConnection {
        sent: Mutex<Vec<Frame>>,
    }

    impl DuplexConnection for RecordingConnection {
        fn send(&self, frame: Frame) -> crate::Mono<Result<()>> {
            self.sent.lock().unwrap().push(frame);
            Box::pin(async { Ok(()) })
        }
        fn send_and_forget(&self, frame: Frame) -> Result<()> {
            self.sent.lock().unwrap().push(frame);
            Ok(())
        }
        fn send_stream(&self, _frames: Flux<Frame>) {}
        fn receive(&self) -> Flux<Frame> {
            Box::pin(tokio_stream::empty())
        }
        fn connect(&self) {}
        fn close(&self) {}
        fn connection_status(&self) -> Flux<ConnectionStatus> {
            Box::pin(tokio_stream::once(ConnectionStatus::Connected))
        }
    }

    struct EchoChannelHandler;

    impl RSocket for EchoChannelHandler {
        fn request_response(&self, _payload: Payload) -> crate::Mono<Result<Payload>> {
            unimplemented!()
        }
        fn request_stream(&self, _payload: Payload) -> Flux<Result<Payload>> {
            unimplemented!()
        }
        fn request_channel(&self, payloads: Flux<Result<Payload>>) -> Flux<Result<Payload>> {
            payloads
        }
        fn fire_and_forget(&self, _payload: Payload) -> Result<()> {
            unimplemented!()
        }
        fn metadata_push(&self, _metadata: bytes::Bytes) -> crate::Mono<Result<()>> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn responder_echoes_requester_items_back() {
        let conn = Arc::new(RecordingConnection { sent: Mutex::new(Vec::new()) });
        let conn_dyn: Arc<dyn DuplexConnection> = conn.clone();
        let tables = StreamTables::new();

        // Mirrors what the connection engine does when a REQUEST_CHANNEL arrives: register
        // the stream's inbound route before handing the receiving half to the driver.
        let (sink, raw_inbound) = FrameSink::new();
        tables.receivers.insert(1, Box::new(sink));

        respond(conn_dyn, tables.clone(), Arc::new(EchoChannelHandler), 1, raw_inbound, 3, 1024);

        use crate::frame::codec::PayloadFrame;
        use crate::frame::Flags;
        use crate::types::Subject;
        if let Some(mut entry) = tables.receivers.get_mut(&1) {
            entry
                .on_next(Frame::Payload(PayloadFrame::new(
                    1,
                    Flags::NEXT,
                    Payload::builder().set_data("hello").build(),
                )))
                .unwrap();
            entry
                .on_next(Frame::Payload(PayloadFrame::new(
                    1,
                    Flags::NEXT | Flags::COMPLETE,
                    Payload::builder().set_data("world").build(),
                )))
                .unwrap();
        }

        for _ in 0..50 {
            if conn.sent.lock().unwrap().len() >= 2 {
                break;
            }
            tokio::task::yield_now().await;
        }

        let sent = conn.sent.lock().unwrap();
        assert!(sent.len() >= 2);
        match &sent[0] {
            Frame::Payload(p) => assert_eq!(p.data_utf8(), Some("hello")),
            other => panic!("unexpected frame {:?}", other),
        }
    }
}
