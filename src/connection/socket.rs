//! The connection engine: owns a connection's single read loop, drives the SETUP
//! handshake, keepalive, and lease bookkeeping, and dispatches inbound frames to the
//! `stream::*` drivers after fragment reassembly (spec §4.7).
use crate::connection::{ConnectionStatus, DuplexConnection, StreamIdProvider};
use crate::error::Error;
use crate::frame::codec::*;
use crate::frame::{Flags, Frame};
use crate::lease::LeaseManager;
use crate::mimetype::DEFAULT_MIMETYPE;
use crate::payload::{Metadata, Payload};
use crate::rsocket::RSocket;
use crate::runtime;
use crate::stream::{self, FrameSink, StreamTables};
use crate::types::{Subject, Subscription};
use crate::{Flux, Mono, Result};

use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::StreamExt;
use tracing::{debug, error, warn};

/// Which side of the connection this engine is driving. The initiator (the side that
/// dials out and sends SETUP) is always `Client`; the side that accepts a connection and
/// waits for SETUP is always `Server`. This determines stream ID parity only — once
/// SETUP completes, either role may issue requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Client,
    Server,
}

/// Connection-level configuration negotiated at SETUP.
///
/// Mirrors the teacher's [`crate::frame::codec::setup::SetupFrameBuilder`] idiom: build
/// with chained `set_*` calls, finish with `build()`.
#[derive(Clone, Debug)]
pub(crate) struct EngineConfig {
    pub(crate) keepalive_interval: Duration,
    pub(crate) keepalive_timeout: Duration,
    pub(crate) fragment_size: usize,
    pub(crate) metadata_mimetype: String,
    pub(crate) data_mimetype: String,
    pub(crate) resume_token: Option<Bytes>,
    pub(crate) requester_lease: bool,
    pub(crate) responder_lease: Option<(u32, Duration)>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            keepalive_interval: crate::consts::DEFAULT_KEEPALIVE_INTERVAL,
            keepalive_timeout: crate::consts::DEFAULT_KEEPALIVE_TIMEOUT,
            fragment_size: crate::consts::DEFAULT_FRAGMENT_SIZE,
            metadata_mimetype: DEFAULT_MIMETYPE.to_string(),
            data_mimetype: DEFAULT_MIMETYPE.to_string(),
            resume_token: None,
            requester_lease: false,
            responder_lease: None,
        }
    }
}

/// Builds an [`EngineConfig`]. The adapter layer (`client`/`server` modules) wraps this
/// with its own public builder rather than exposing it directly.
pub(crate) struct EngineConfigBuilder(EngineConfig);

impl EngineConfigBuilder {
    pub(crate) fn new() -> Self {
        EngineConfigBuilder(EngineConfig::default())
    }

    pub(crate) fn set_keepalive_interval(mut self, interval: Duration) -> Self {
        self.0.keepalive_interval = interval;
        self
    }

    pub(crate) fn set_keepalive_timeout(mut self, timeout: Duration) -> Self {
        self.0.keepalive_timeout = timeout;
        self
    }

    pub(crate) fn set_fragment_size(mut self, fragment_size: usize) -> Self {
        debug_assert!(fragment_size >= 3, "fragment_size MUST be >= 3");
        self.0.fragment_size = fragment_size;
        self
    }

    pub(crate) fn set_metadata_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.0.metadata_mimetype = mimetype.into();
        self
    }

    pub(crate) fn set_data_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.0.data_mimetype = mimetype.into();
        self
    }

    pub(crate) fn set_resume_token(mut self, token: Bytes) -> Self {
        self.0.resume_token = Some(token);
        self
    }

    pub(crate) fn require_lease(mut self) -> Self {
        self.0.requester_lease = true;
        self
    }

    pub(crate) fn supply_lease(mut self, number_of_requests: u32, ttl: Duration) -> Self {
        self.0.responder_lease = Some((number_of_requests, ttl));
        self
    }

    pub(crate) fn build(self) -> EngineConfig {
        self.0
    }
}

/// Drives one connection: the SETUP handshake, the read loop, keepalive, lease
/// admission, and dispatch into the `stream::*` drivers. Cheaply `Clone`: every field is
/// an `Arc` or `Copy` value, so the background tasks spawned by [`RSocketMachine::run`]
/// each hold their own handle onto the same shared state.
#[derive(Clone)]
pub(crate) struct RSocketMachine {
    role: Role,
    stream_ids: Arc<StreamIdProvider>,
    connection: Arc<dyn DuplexConnection>,
    handler: Arc<dyn RSocket>,
    tables: StreamTables,
    fragment_size: usize,
    lease: Arc<LeaseManager>,
    lease_active: Arc<AtomicBool>,
    requester_lease: bool,
    responder_lease: Option<(u32, Duration)>,
    metadata_mimetype: String,
    data_mimetype: String,
    resume_token: Option<Bytes>,
    keepalive_interval: Duration,
    keepalive_timeout: Duration,
}

impl RSocketMachine {
    pub(crate) fn new(
        role: Role,
        connection: Arc<dyn DuplexConnection>,
        handler: Arc<dyn RSocket>,
        config: EngineConfig,
    ) -> RSocketMachine {
        let stream_ids = Arc::new(match role {
            Role::Client => StreamIdProvider::new_for_client(),
            Role::Server => StreamIdProvider::new_for_server(),
        });

        RSocketMachine {
            role,
            stream_ids,
            connection,
            handler,
            tables: StreamTables::new(),
            fragment_size: config.fragment_size,
            lease: Arc::new(LeaseManager::new()),
            lease_active: Arc::new(AtomicBool::new(false)),
            requester_lease: config.requester_lease,
            responder_lease: config.responder_lease,
            metadata_mimetype: config.metadata_mimetype,
            data_mimetype: config.data_mimetype,
            resume_token: config.resume_token,
            keepalive_interval: config.keepalive_interval,
            keepalive_timeout: config.keepalive_timeout,
        }
    }

    /// Opens the underlying transport, performs the SETUP handshake (sending it if
    /// `Role::Client`, waiting for it if `Role::Server`), and runs the read loop until
    /// the connection closes. Intended to be spawned with [`crate::runtime::spawn`].
    pub(crate) async fn run(self) {
        self.connection.connect();

        if self.role == Role::Client {
            if self.requester_lease {
                self.lease_active.store(true, Ordering::SeqCst);
            }
            if let Err(err) = self.send_setup().await {
                error!(%err, "failed to send SETUP");
                self.teardown();
                return;
            }
        }

        let keepalive_task = self.spawn_keepalive_sender();
        let status_task = self.spawn_status_watcher();

        self.read_loop().await;

        keepalive_task.abort();
        status_task.abort();
        self.teardown();
    }

    /// Closes the underlying connection directly, without waiting for the read loop.
    pub(crate) fn close(&self) {
        self.connection.close();
    }

    async fn send_setup(&self) -> Result<()> {
        let mut builder = SetupFrame::builder()
            .set_keepalive_interval(self.keepalive_interval.as_millis() as u32)
            .set_keepalive_timeout(self.keepalive_timeout.as_millis() as u32)
            .set_metadata_mimetype(self.metadata_mimetype.clone())
            .set_data_mimetype(self.data_mimetype.clone());
        if let Some(token) = &self.resume_token {
            builder = builder.set_resume_token(token.clone()).set_resume_flag();
        }
        if self.requester_lease {
            builder = builder.set_lease_flag();
        }
        self.connection.send(Frame::Setup(builder.build())).await
    }

    async fn accept_setup(&self, setup: SetupFrame) -> Result<()> {
        let metadata_mimetype = setup.metadata_mimetype().unwrap_or(DEFAULT_MIMETYPE).to_string();
        let data_mimetype = setup.data_mimetype().unwrap_or(DEFAULT_MIMETYPE).to_string();

        self.handler.on_setup(&data_mimetype, &metadata_mimetype)?;

        if setup.is_lease() {
            self.lease_active.store(true, Ordering::SeqCst);
            if let Some((number_of_requests, ttl)) = self.responder_lease {
                let frame = Frame::Lease(LeaseFrame::new(ttl.as_millis() as u32, number_of_requests, None));
                self.connection.send(frame).await?;
            }
        }

        Ok(())
    }

    fn spawn_keepalive_sender(&self) -> JoinHandle<()> {
        let conn = self.connection.clone();
        let interval = self.keepalive_interval;
        runtime::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let frame = Frame::Keepalive(KeepaliveFrame::new(0, None, true));
                if conn.send(frame).await.is_err() {
                    break;
                }
            }
        })
    }

    fn spawn_status_watcher(&self) -> JoinHandle<()> {
        let conn = self.connection.clone();
        let tables = self.tables.clone();
        runtime::spawn(async move {
            let mut statuses = conn.connection_status();
            while let Some(status) = statuses.next().await {
                match status {
                    ConnectionStatus::Closed => {
                        debug!("connection closed");
                        tables.receivers.clear();
                        tables.subscriptions.clear();
                        break;
                    }
                    ConnectionStatus::Error(err) => {
                        error!(%err, "connection transport error");
                        tables.receivers.clear();
                        tables.subscriptions.clear();
                        break;
                    }
                    _ => {}
                }
            }
        })
    }

    /// Drops every registered stream handle. A pending requester's `FrameSink` sender is
    /// dropped along with it, so a blocked `inbound.recv()` resolves to `None` and the
    /// driver surfaces `Error::disconnected()` on its own, matching the "transport EOF
    /// with live streams" contract without needing to call `on_error` directly.
    fn teardown(&self) {
        self.tables.receivers.clear();
        self.tables.subscriptions.clear();
        self.connection.close();
    }

    async fn read_loop(&self) {
        let mut inbound = self.connection.receive();
        let mut setup_done = self.role == Role::Client;
        let mut deadline = Instant::now() + self.keepalive_timeout;

        loop {
            tokio::select! {
                frame = inbound.next() => {
                    let frame = match frame {
                        Some(frame) => frame,
                        None => {
                            debug!("transport closed");
                            return;
                        }
                    };
                    deadline = Instant::now() + self.keepalive_timeout;

                    if !setup_done {
                        match frame {
                            Frame::Setup(setup) => {
                                if let Err(err) = self.accept_setup(setup).await {
                                    let data = err.message().map(Bytes::from);
                                    let _ = self
                                        .connection
                                        .send(Frame::Error(ErrorFrame::new(0, err.wire_code(), data)))
                                        .await;
                                    return;
                                }
                                setup_done = true;
                            }
                            other => {
                                warn!(?other, "frame received before SETUP handshake completed");
                                let data = Bytes::from_static(b"expected SETUP");
                                let _ = self
                                    .connection
                                    .send(Frame::Error(ErrorFrame::new(
                                        0,
                                        ErrorFrame::INVALID_SETUP,
                                        Some(data),
                                    )))
                                    .await;
                                return;
                            }
                        }
                        continue;
                    }

                    self.dispatch(frame).await;
                }
                _ = tokio::time::sleep_until(deadline) => {
                    error!("keepalive timeout exceeded, closing connection");
                    let data = Bytes::from_static(b"keepalive timeout exceeded");
                    let _ = self
                        .connection
                        .send(Frame::Error(ErrorFrame::new(0, ErrorFrame::CONNECTION_ERROR, Some(data))))
                        .await;
                    return;
                }
            }
        }
    }

    async fn dispatch(&self, frame: Frame) {
        let stream_id = frame_stream_id(&frame);
        if stream_id == 0 {
            self.dispatch_connection_frame(frame).await;
            return;
        }

        let frame = match self.tables.fragments.append(frame) {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(err) => {
                warn!(stream_id, %err, "fragment reassembly failed");
                let data = Bytes::from(err.to_string());
                let _ = self
                    .connection
                    .send(Frame::Error(ErrorFrame::new(stream_id, ErrorFrame::INVALID, Some(data))))
                    .await;
                self.tables.evict(stream_id);
                return;
            }
        };

        if let Some(mut sink) = self.tables.receivers.get_mut(&stream_id) {
            let _ = sink.on_next(frame);
            return;
        }

        if let Some(mut subscription) = self.tables.subscriptions.get_mut(&stream_id) {
            match frame {
                Frame::RequestN(f) => {
                    let _ = subscription.request(f.request_n());
                }
                Frame::Cancel(_) => {
                    let _ = subscription.cancel();
                }
                _ => {}
            }
            return;
        }

        self.dispatch_new_request(frame).await;
    }

    async fn dispatch_connection_frame(&self, frame: Frame) {
        match frame {
            Frame::Lease(f) => {
                self.lease.grant(f.number_of_requests(), f.ttl());
            }
            Frame::Keepalive(f) => {
                if f.is_respond() {
                    let echo = Frame::Keepalive(KeepaliveFrame::new(
                        f.last_received_position(),
                        f.data().cloned(),
                        false,
                    ));
                    let _ = self.connection.send(echo).await;
                }
            }
            Frame::Error(f) => {
                warn!(code = f.error_code(), "peer sent a connection-level error");
                self.connection.close();
            }
            Frame::MetadataPush(f) => {
                let handler = self.handler.clone();
                let metadata: Metadata = f.metadata().clone();
                runtime::spawn(async move {
                    if let Err(err) = handler.metadata_push(metadata).await {
                        error!(%err, "metadata_push handler returned an error");
                    }
                });
            }
            Frame::Setup(_) => {
                warn!("unexpected SETUP received after the handshake already completed");
            }
            Frame::Resume(_) | Frame::ResumeOk(_) => {
                let data = Bytes::from_static(b"resume is not supported");
                let _ = self
                    .connection
                    .send(Frame::Error(ErrorFrame::new(0, ErrorFrame::REJECTED_RESUME, Some(data))))
                    .await;
            }
            _ => {}
        }
    }

    /// Dispatches a freshly-reassembled frame for a stream ID with no table entry: either
    /// a brand-new inbound request, or a stray frame for an already-terminated stream
    /// (silently dropped, per spec).
    async fn dispatch_new_request(&self, frame: Frame) {
        match frame {
            Frame::RequestResponse(f) => {
                let stream_id = f.stream_id();
                let conn = self.connection.clone();
                let tables = self.tables.clone();
                let handler = self.handler.clone();
                let fragment_size = self.fragment_size;
                runtime::spawn(async move {
                    stream::response::respond(conn, tables, handler, stream_id, f.payload(), fragment_size)
                        .await;
                });
            }
            Frame::RequestFnf(f) => {
                let stream_id = f.stream_id();
                stream::fnf::respond(self.handler.clone(), stream_id, f.payload());
            }
            Frame::RequestStream(f) => {
                let stream_id = f.stream_id();
                let initial_request_n = f.initial_request_n();
                let conn = self.connection.clone();
                let tables = self.tables.clone();
                let handler = self.handler.clone();
                let fragment_size = self.fragment_size;
                runtime::spawn(async move {
                    stream::streaming::respond(
                        conn,
                        tables,
                        handler,
                        stream_id,
                        f.payload(),
                        initial_request_n,
                        fragment_size,
                    )
                    .await;
                });
            }
            Frame::RequestChannel(f) => {
                let stream_id = f.stream_id();
                let initial_request_n = f.initial_request_n();
                let complete = f.is_complete();
                let payload = f.payload();

                let (sink, raw_inbound) = FrameSink::new();
                self.tables.receivers.insert(stream_id, Box::new(sink));

                let mut flags = Flags::NEXT;
                if complete {
                    flags |= Flags::COMPLETE;
                }
                if let Some(mut entry) = self.tables.receivers.get_mut(&stream_id) {
                    let _ = entry.on_next(Frame::Payload(PayloadFrame::new(stream_id, flags, payload)));
                }

                stream::channel::respond(
                    self.connection.clone(),
                    self.tables.clone(),
                    self.handler.clone(),
                    stream_id,
                    raw_inbound,
                    initial_request_n,
                    self.fragment_size,
                );
            }
            _ => {
                // Stray frame for an unknown or already-terminated stream ID: dropped.
            }
        }
    }

    fn lease_gate(&self) -> Result<()> {
        if self.lease_active.load(Ordering::SeqCst) {
            self.lease.acquire()
        } else {
            Ok(())
        }
    }
}

fn frame_stream_id(frame: &Frame) -> u32 {
    match frame {
        Frame::Setup(_)
        | Frame::Lease(_)
        | Frame::Keepalive(_)
        | Frame::MetadataPush(_)
        | Frame::Resume(_)
        | Frame::ResumeOk(_) => 0,
        Frame::Error(f) => f.stream_id(),
        Frame::RequestResponse(f) => f.stream_id(),
        Frame::RequestFnf(f) => f.stream_id(),
        Frame::RequestStream(f) => f.stream_id(),
        Frame::RequestChannel(f) => f.stream_id(),
        Frame::RequestN(f) => f.stream_id(),
        Frame::Cancel(f) => f.stream_id(),
        Frame::Payload(f) => f.stream_id(),
        Frame::Ext(f) => f.stream_id(),
    }
}

impl RSocket for RSocketMachine {
    fn request_response(&self, payload: Payload) -> Mono<Result<Payload>> {
        let lease = self.lease_gate();
        let conn = self.connection.clone();
        let tables = self.tables.clone();
        let stream_id = self.stream_ids.next_stream_id(&self.tables.receivers);
        let fragment_size = self.fragment_size;
        Box::pin(async move {
            lease?;
            stream::response::request(conn, tables, stream_id, payload, fragment_size).await
        })
    }

    fn request_stream(&self, payload: Payload) -> Flux<Result<Payload>> {
        if let Err(err) = self.lease_gate() {
            return Box::pin(tokio_stream::once(Err(err)));
        }
        let stream_id = self.stream_ids.next_stream_id(&self.tables.receivers);
        stream::streaming::request(
            self.connection.clone(),
            self.tables.clone(),
            stream_id,
            payload,
            crate::consts::DEFAULT_INITIAL_REQUEST_N,
            self.fragment_size,
        )
    }

    fn request_channel(&self, payloads: Flux<Result<Payload>>) -> Flux<Result<Payload>> {
        if let Err(err) = self.lease_gate() {
            return Box::pin(tokio_stream::once(Err(err)));
        }
        let stream_id = self.stream_ids.next_stream_id(&self.tables.receivers);
        stream::channel::request(
            self.connection.clone(),
            self.tables.clone(),
            stream_id,
            payloads,
            crate::consts::DEFAULT_INITIAL_REQUEST_N,
            self.fragment_size,
        )
    }

    fn fire_and_forget(&self, payload: Payload) -> Result<()> {
        self.lease_gate()?;
        let stream_id = self.stream_ids.next_stream_id(&self.tables.receivers);
        let conn = self.connection.clone();
        let fragment_size = self.fragment_size;
        runtime::spawn(async move {
            if let Err(err) = stream::fnf::request(conn, stream_id, payload, fragment_size).await {
                error!(%err, "fire-and-forget send failed");
            }
        });
        Ok(())
    }

    fn metadata_push(&self, metadata: Metadata) -> Mono<Result<()>> {
        let conn = self.connection.clone();
        Box::pin(async move { conn.send(Frame::MetadataPush(MetadataPushFrame::new(metadata))).await })
    }
}
