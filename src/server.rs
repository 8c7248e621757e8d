//! Server-side entry point: builds an [`RSocketMachine`] bound to a responder role and
//! drives it to completion on [`crate::runtime::spawn`].
use crate::connection::{DuplexConnection, EngineConfigBuilder, Role, RSocketMachine};
use crate::rsocket::{DummyRSocket, RSocket};
use crate::runtime;

use std::sync::Arc;
use std::time::Duration;

/// Builds and starts a server connection.
///
/// Mirrors [`crate::frame::codec::setup::SetupFrameBuilder`]'s chained `set_*` idiom:
/// configure, then call [`ServerBuilder::accept`] once an incoming connection has been
/// accepted by the transport layer, to wait for `SETUP` and begin serving requests.
pub struct ServerBuilder {
    config: EngineConfigBuilder,
    handler: Option<Arc<dyn RSocket>>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder").field("handler_set", &self.handler.is_some()).finish()
    }
}

impl ServerBuilder {
    /// Creates a server builder with the engine's default configuration.
    pub fn new() -> Self {
        ServerBuilder { config: EngineConfigBuilder::new(), handler: None }
    }

    /// Registers the handler that serves the peer's requests.
    ///
    /// Defaults to a handler that panics if invoked — real servers should always set
    /// this, typically to a [`crate::routing_handler::RoutingRequestHandler`].
    pub fn handler(mut self, handler: Arc<dyn RSocket>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Sets how long this server waits for any frame before closing the connection.
    pub fn keepalive_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.set_keepalive_timeout(timeout);
        self
    }

    /// Sets the maximum combined data+metadata size before a response is fragmented.
    pub fn fragment_size(mut self, fragment_size: usize) -> Self {
        self.config = self.config.set_fragment_size(fragment_size);
        self
    }

    /// Grants the requester `number_of_requests` over the next `ttl`, sent immediately
    /// after `SETUP` is accepted, if the requester's `SETUP` asked for lease semantics.
    pub fn supply_lease(mut self, number_of_requests: u32, ttl: Duration) -> Self {
        self.config = self.config.supply_lease(number_of_requests, ttl);
        self
    }

    /// Waits for `SETUP` on `connection`, accepts it, and returns a handle implementing
    /// [`RSocket`] for issuing requests back to the peer.
    ///
    /// The connection engine runs on its own spawned task for the lifetime of the
    /// connection.
    pub fn accept(self, connection: Arc<dyn DuplexConnection>) -> Arc<dyn RSocket> {
        let handler = self.handler.unwrap_or_else(|| Arc::new(DummyRSocket));
        let machine = RSocketMachine::new(Role::Server, connection, handler, self.config.build());
        runtime::spawn(machine.clone().run());
        Arc::new(machine)
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        ServerBuilder::new()
    }
}
