//! Client-side entry point: builds an [`RSocketMachine`] bound to a requester role and
//! drives it to completion on [`crate::runtime::spawn`].
use crate::connection::{DuplexConnection, EngineConfigBuilder, Role, RSocketMachine};
use crate::rsocket::{DummyRSocket, RSocket};
use crate::runtime;

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Builds and starts a client connection.
///
/// Mirrors [`crate::frame::codec::setup::SetupFrameBuilder`]'s chained `set_*` idiom:
/// configure, then call [`ClientBuilder::start`] to send `SETUP` and begin serving
/// requests.
pub struct ClientBuilder {
    config: EngineConfigBuilder,
    handler: Option<Arc<dyn RSocket>>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder").field("handler_set", &self.handler.is_some()).finish()
    }
}

impl ClientBuilder {
    /// Creates a client builder with the engine's default configuration.
    pub fn new() -> Self {
        ClientBuilder { config: EngineConfigBuilder::new(), handler: None }
    }

    /// Registers the handler that serves requests the peer sends to this client.
    ///
    /// Defaults to a handler that panics if invoked, for clients that never expect the
    /// peer to initiate a request.
    pub fn handler(mut self, handler: Arc<dyn RSocket>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Sets how often this client sends a `KEEPALIVE`.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.set_keepalive_interval(interval);
        self
    }

    /// Sets how long this client waits for any frame before closing the connection.
    pub fn keepalive_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.set_keepalive_timeout(timeout);
        self
    }

    /// Sets the maximum combined data+metadata size before a request is fragmented.
    pub fn fragment_size(mut self, fragment_size: usize) -> Self {
        self.config = self.config.set_fragment_size(fragment_size);
        self
    }

    /// Sets the metadata mimetype negotiated at `SETUP`.
    pub fn metadata_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.config = self.config.set_metadata_mimetype(mimetype);
        self
    }

    /// Sets the data mimetype negotiated at `SETUP`.
    pub fn data_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.config = self.config.set_data_mimetype(mimetype);
        self
    }

    /// Attaches a resume token to `SETUP`, so the peer associates this connection with a
    /// prior session it may be able to resume.
    pub fn resume_token(mut self, token: Bytes) -> Self {
        self.config = self.config.set_resume_token(token);
        self
    }

    /// Requires a `LEASE` grant from the peer before issuing any request.
    pub fn require_lease(mut self) -> Self {
        self.config = self.config.require_lease();
        self
    }

    /// Connects over `connection`, completes the `SETUP` handshake, and returns a handle
    /// implementing [`RSocket`] for issuing requests to the peer.
    ///
    /// The connection engine runs on its own spawned task for the lifetime of the
    /// connection; dropping the returned handle does not close it; call
    /// [`RSocket::on_close`]'s counterpart, the handle's own `close`, explicitly (see
    /// [`crate::connection::DuplexConnection::close`]).
    pub fn start(self, connection: Arc<dyn DuplexConnection>) -> Arc<dyn RSocket> {
        let handler = self.handler.unwrap_or_else(|| Arc::new(DummyRSocket));
        let machine = RSocketMachine::new(Role::Client, connection, handler, self.config.build());
        runtime::spawn(machine.clone().run());
        Arc::new(machine)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        ClientBuilder::new()
    }
}
