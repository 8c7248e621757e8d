//! Request/stream driver: the requester accumulates items until completion or error; the
//! responder pulls from the handler's publisher, gated by credit-based demand.
use crate::connection::DuplexConnection;
use crate::error::Error;
use crate::fragment;
use crate::frame::codec::{CancelFrame, ErrorFrame};
use crate::frame::{Frame, FrameType};
use crate::payload::Payload;
use crate::rsocket::{Flux, RSocket};
use crate::stream::{complete_frame, emit_payload_frames, CancelHandle, Demand, FrameSink, StreamTables};
use crate::Result;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

/// Sends a REQUEST_STREAM and returns a [`Flux`] of the responder's items, terminating on
/// PAYLOAD(COMPLETE) or ERROR.
pub(crate) fn request(
    conn: Arc<dyn DuplexConnection>,
    tables: StreamTables,
    stream_id: u32,
    payload: Payload,
    initial_request_n: u32,
    fragment_size: usize,
) -> Flux<Result<Payload>> {
    let (sink, mut raw_inbound) = FrameSink::new();
    tables.receivers.insert(stream_id, Box::new(sink));
    let (out_tx, out_rx) = tokio::sync::mpsc::unbounded_channel::<Result<Payload>>();

    let drive_conn = conn;
    let drive_tables = tables;
    crate::runtime::spawn(async move {
        for frame in fragment::fragment_request(
            FrameType::REQUEST_STREAM,
            stream_id,
            Some(initial_request_n),
            false,
            payload,
            fragment_size,
        ) {
            if let Err(err) = drive_conn.send(frame).await {
                let _ = out_tx.send(Err(err));
                drive_tables.evict(stream_id);
                return;
            }
        }

        loop {
            match raw_inbound.recv().await {
                Some(Frame::Payload(p)) => {
                    let complete = p.is_complete();
                    if p.is_next() && out_tx.send(Ok(p.payload())).is_err() {
                        let _ = drive_conn.send(Frame::Cancel(CancelFrame::new(stream_id))).await;
                        break;
                    }
                    if complete {
                        break;
                    }
                }
                Some(Frame::Error(e)) => {
                    let _ = out_tx
                        .send(Err(Error::from_wire(e.error_code(), e.data_utf8().map(String::from))));
                    break;
                }
                Some(_) | None => {
                    let _ = out_tx.send(Err(Error::disconnected()));
                    break;
                }
            }
        }
        drive_tables.evict(stream_id);
    });

    Box::pin(UnboundedReceiverStream::new(out_rx))
}

/// Drives the responder side of a request/stream: pulls from the handler's publisher as
/// credit becomes available, stopping early on cancellation.
pub(crate) async fn respond(
    conn: Arc<dyn DuplexConnection>,
    tables: StreamTables,
    handler: Arc<dyn RSocket>,
    stream_id: u32,
    payload: Payload,
    initial_request_n: u32,
    fragment_size: usize,
) {
    let demand = Arc::new(Demand::new(initial_request_n));
    let (handle, token) = CancelHandle::new(Some(demand.clone()));
    tables.subscriptions.insert(stream_id, Box::new(handle));

    let mut items = handler.request_stream(payload);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = demand.acquire() => {
                if token.is_set() {
                    break;
                }
                match items.next().await {
                    Some(Ok(payload)) => {
                        let mut failed = false;
                        for frame in emit_payload_frames(stream_id, payload, false, fragment_size) {
                            if conn.send(frame).await.is_err() {
                                failed = true;
                                break;
                            }
                        }
                        if failed {
                            break;
                        }
                    }
                    Some(Err(err)) => {
                        let data = err.message().map(bytes::Bytes::from);
                        let _ = conn
                            .send(Frame::Error(ErrorFrame::new(stream_id, err.wire_code(), data)))
                            .await;
                        break;
                    }
                    None => {
                        let _ = conn.send(complete_frame(stream_id)).await;
                        break;
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
    use crate::frame::codec::PayloadFrame;
    use crate::frame::Flags;
    use crate::types::Subject;
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

    struct ThreeItemHandler;

    impl RSocket for ThreeItemHandler {
        fn request_response(&self, _payload: Payload) -> crate::Mono<Result<Payload>> {
            unimplemented!()
        }
        fn request_stream(&self, _payload: Payload) -> Flux<Result<Payload>> {
            let items: Vec<Result<Payload>> = (0..3)
                .map(|i| Ok(Payload::builder().set_data(format!("Feed Item: {}", i)).build()))
                .collect();
            Box::pin(tokio_stream::iter(items))
        }
        fn request_channel(&self, _payloads: Flux<Result<Payload>>) -> Flux<Result<Payload>> {
            unimplemented!()
        }
        fn fire_and_forget(&self, _payload: Payload) -> Result<()> {
            unimplemented!()
        }
        fn metadata_push(&self, _metadata: bytes::Bytes) -> crate::Mono<Result<()>> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn responder_emits_all_items_then_completes() {
        let conn = Arc::new(RecordingConnection { sent: Mutex::new(Vec::new()) });
        let conn_dyn: Arc<dyn DuplexConnection> = conn.clone();
        let tables = StreamTables::new();

        respond(
            conn_dyn,
            tables.clone(),
            Arc::new(ThreeItemHandler),
            1,
            Payload::default(),
            3,
            1024,
        )
        .await;

        let sent = conn.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        for (i, frame) in sent.iter().enumerate() {
            match frame {
                Frame::Payload(p) => {
                    assert!(p.is_next());
                    assert_eq!(p.is_complete(), i == 2);
                    let expected = format!("Feed Item: {}", i);
                    assert_eq!(p.data_utf8(), Some(expected.as_str()));
                }
                other => panic!("unexpected frame {:?}", other),
            }
        }
        assert!(tables.subscriptions.is_empty());
    }

    #[tokio::test]
    async fn requester_collects_until_terminal_payload() {
        let tables = StreamTables::new();
        let conn: Arc<dyn DuplexConnection> =
            Arc::new(RecordingConnection { sent: Mutex::new(Vec::new()) });

        let flux = request(conn, tables.clone(), 1, Payload::default(), 3, 1024);
        tokio::pin!(flux);

        loop {
            if tables.receivers.contains_key(&1) {
                break;
            }
            tokio::task::yield_now().await;
        }
        for (i, complete) in [(0, false), (1, false), (2, true)] {
            let frame = Frame::Payload(PayloadFrame::new(
                1,
                if complete { Flags::NEXT | Flags::COMPLETE } else { Flags::NEXT },
                Payload::builder().set_data(format!("Feed Item: {}", i)).build(),
            ));
            if let Some(mut entry) = tables.receivers.get_mut(&1) {
                entry.on_next(frame).unwrap();
            }
        }

        let mut items = Vec::new();
        while let Some(item) = flux.next().await {
            items.push(item.unwrap());
        }
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].data_utf8(), Some("Feed Item: 2"));
    }
}
