use crate::error::Result;
use crate::frame::Frame;
use crate::{Flux, Mono};

/// Represents a network connection over `RSocket` to send/receive data.
pub trait DuplexConnection: Send + Sync {
    /// Send a frame to the remote peer.
    ///
    /// Do nothing if the underlying connection is closed.
    fn send(&self, frame: Frame) -> Mono<Result<()>>;

    /// Similar to [`send`], but doesn't wait for response.
    fn send_and_forget(&self, frame: Frame) -> Result<()>;

    /// Send a stream of frames to the remote peer.
    ///
    /// Do nothing if the underlying connection is closed.
    fn send_stream(&self, frames: Flux<Frame>);

    /// Returns a stream of frames received on this connection.
    fn receive(&self) -> Flux<Frame>;

    /// Open the underlying connection.
    fn connect(&self);

    /// Close the underlying connection.
    fn close(&self);

    /// Returns a stream that immediately publishes the currrent connection status and thereafter
    /// updates as it changes.
    fn connection_status(&self) -> Flux<ConnectionStatus>;
}

/// Describes connection status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection established or pending.
    Unconnected,
    /// `connect()` is called but a connection is not yet established.
    Connecting,
    /// Connection is established.
    Connected,
    /// Connection has been closed via `close()`.
    Closed,
    /// Connection has been closed for any other reason.
    Error(String),
}
