//! RSocket transport session between client and server.
mod buf;

mod conn;
mod counter;
mod socket;
mod stream_id;

pub use self::buf::{FrameBuf, DEFAULT_MAX_FRAME_LENGTH};
pub use self::conn::{ConnectionStatus, DuplexConnection};
pub use self::counter::RequestCounter;
pub(crate) use self::socket::{EngineConfigBuilder, Role, RSocketMachine};
pub use self::stream_id::StreamIdProvider;
