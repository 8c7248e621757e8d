//! Request/response driver: requester sends one request and awaits exactly one terminal
//! frame; responder invokes the handler once and sends back its single result.
use crate::connection::DuplexConnection;
use crate::error::Error;
use crate::fragment;
use crate::frame::codec::ErrorFrame;
use crate::frame::{Frame, FrameType};
use crate::payload::Payload;
use crate::rsocket::RSocket;
use crate::stream::{emit_payload_frames, CancelHandle, FrameSink, StreamTables};
use crate::Result;
use std::sync::Arc;

/// Sends a REQUEST_RESPONSE and resolves with the peer's single terminal answer.
pub(crate) async fn request(
    conn: Arc<dyn DuplexConnection>,
    tables: StreamTables,
    stream_id: u32,
    payload: Payload,
    fragment_size: usize,
) -> Result<Payload> {
    let (sink, mut inbound) = FrameSink::new();
    tables.receivers.insert(stream_id, Box::new(sink));

    for frame in fragment::fragment_request(
        FrameType::REQUEST_RESPONSE,
        stream_id,
        None,
        false,
        payload,
        fragment_size,
    ) {
        if let Err(err) = conn.send(frame).await {
            tables.evict(stream_id);
            return Err(err);
        }
    }

    let result = match inbound.recv().await {
        Some(Frame::Payload(p)) => Ok(p.payload()),
        Some(Frame::Error(e)) => {
            Err(Error::from_wire(e.error_code(), e.data_utf8().map(String::from)))
        }
        Some(_) | None => Err(Error::disconnected()),
    };

    tables.evict(stream_id);
    result
}

/// Invokes the handler for an incoming REQUEST_RESPONSE and sends back its terminal result,
/// or stops silently if the requester cancels first.
pub(crate) async fn respond(
    conn: Arc<dyn DuplexConnection>,
    tables: StreamTables,
    handler: Arc<dyn RSocket>,
    stream_id: u32,
    payload: Payload,
    fragment_size: usize,
) {
    let (handle, token) = CancelHandle::new(None);
    tables.subscriptions.insert(stream_id, Box::new(handle));

    tokio::select! {
        result = handler.request_response(payload) => {
            match result {
                Ok(payload) => {
                    for frame in emit_payload_frames(stream_id, payload, true, fragment_size) {
                        if conn.send(frame).await.is_err() {
                            break;
                        }
                    }
                }
                Err(err) => {
                    let data = err.message().map(bytes::Bytes::from);
                    let _ = conn
                        .send(Frame::Error(ErrorFrame::new(stream_id, err.wire_code(), data)))
                        .await;
                }
            }
        }
        _ = token.cancelled() => {
            tracing::debug!(stream_id, "request/response cancelled before completion");
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
    use crate::rsocket::{Flux, Mono};
    use crate::types::Subject;
    use std::sync::Mutex;

    struct RecordingConnection {
        sent: Mutex<Vec<Frame>>,
    }

    impl DuplexConnection for RecordingConnection {
        fn send(&self, frame: Frame) -> Mono<Result<()>> {
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

    struct EchoHandler;

    impl RSocket for EchoHandler {
        fn request_response(&self, payload: Payload) -> Mono<Result<Payload>> {
            Box::pin(async move { Ok(payload) })
        }
        fn request_stream(&self, _payload: Payload) -> Flux<Result<Payload>> {
            unimplemented!()
        }
        fn request_channel(&self, _payloads: Flux<Result<Payload>>) -> Flux<Result<Payload>> {
            unimplemented!()
        }
        fn fire_and_forget(&self, _payload: Payload) -> Result<()> {
            unimplemented!()
        }
        fn metadata_push(&self, _metadata: bytes::Bytes) -> Mono<Result<()>> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn responder_echoes_single_payload() {
        let conn = Arc::new(RecordingConnection { sent: Mutex::new(Vec::new()) });
        let conn_dyn: Arc<dyn DuplexConnection> = conn.clone();
        let tables = StreamTables::new();
        let payload = Payload::builder().set_data("ping").build();

        respond(conn_dyn, tables.clone(), Arc::new(EchoHandler), 1, payload, 1024).await;

        let sent = conn.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            Frame::Payload(p) => {
                assert!(p.is_complete());
                assert!(p.is_next());
                assert_eq!(p.data().unwrap(), "ping");
            }
            other => panic!("unexpected frame {:?}", other),
        }
        assert!(tables.receivers.is_empty());
        assert!(tables.subscriptions.is_empty());
    }

    #[tokio::test]
    async fn requester_resolves_on_terminal_payload() {
        let tables = StreamTables::new();
        let conn: Arc<dyn DuplexConnection> =
            Arc::new(RecordingConnection { sent: Mutex::new(Vec::new()) });
        let request_payload = Payload::builder().set_data("ping").build();

        let task_tables = tables.clone();
        let task_conn = conn.clone();
        let handle =
            tokio::spawn(async move { request(task_conn, task_tables, 1, request_payload, 1024).await });

        let response_frame = Frame::Payload(PayloadFrame::new(
            1,
            Flags::NEXT | Flags::COMPLETE,
            Payload::builder().set_data("pong").build(),
        ));
        loop {
            if let Some(mut entry) = tables.receivers.get_mut(&1) {
                entry.on_next(response_frame.clone()).unwrap();
                break;
            }
            tokio::task::yield_now().await;
        }

        let result = handle.await.unwrap();
        assert_eq!(result.unwrap().data_utf8(), Some("pong"));
    }
}
