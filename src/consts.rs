use crate::frame::MAX_U31;
use std::time::Duration;

/// Default value of the time between KEEPALIVE frames that the client will send.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Default value of the time that a client will allow a server to not respond to
/// a KEEPALIVE before it is assumed to be dead.
pub const DEFAULT_KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default `initial_request_n` for REQUEST_STREAM/REQUEST_CHANNEL frames when the caller
/// doesn't pick one explicitly: effectively unbounded, so the protocol's credit machinery
/// only throttles production when a peer deliberately asks for less with its own
/// `initial_request_n` or rations further demand via REQUEST_N.
pub const DEFAULT_INITIAL_REQUEST_N: u32 = MAX_U31;

/// Default maximum size (in bytes) of a single logical frame's combined data+metadata
/// before the sender fragments it across multiple wire frames.
pub const DEFAULT_FRAGMENT_SIZE: usize = 16 * 1024 * 1024;
