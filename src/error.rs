//! RSocket error and result types.
use crate::frame::DecodeError;
use std::error::Error as StdError;
use std::fmt;
use std::io;

/// A Result type aliased for [`Result`]<T, [`Error`]>.
///
/// [`Result`]: std::result::Result
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when handling RSocket streams.
pub struct Error {
    inner: Box<ErrorImpl>,
}

type Source = Box<dyn Send + Sync + StdError>;

struct ErrorImpl {
    kind: Kind,
    source: Option<Source>,
}

#[derive(Debug, PartialEq)]
#[non_exhaustive]
pub(crate) enum Kind {
    // Decode errors
    Decode(DecodeError),

    // Protocol errors
    InvalidSetup,
    UnsupportedSetup,
    RejectedSetup,
    RejectedResume,
    ConnectionError,
    ConnectionClose,
    ApplicationError,
    Rejected,
    Canceled,
    Invalid,

    // IO errors
    Io,
}

/// A list of valid RSocket protocol error codes.
///
/// See [`here`] for more information about RSocket error codes.
///
/// [`here`]: https://github.com/rsocket/rsocket/blob/master/Protocol.md#error-codes
#[non_exhaustive]
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    /// The Setup frame is invalid for the server
    /// (it could be that the client is too recent for the old server).
    InvalidSetup       = 0x00000001,
    /// Some (or all) of the parameters specified by the client are unsupported by the server.
    UnsupportedSetup   = 0x00000002,
    /// The server rejected the setup, it can specify the reason in the payload. 
    RejectedSetup      = 0x00000003,
    /// The server rejected the resume, it can specify the reason in the payload.
    RejectedResume     = 0x00000004,
    /// The connection is being terminated. Sender or Receiver of this frame MAY close the 
    /// connection immediately without waiting for outstanding streams to terminate.
    ConnectionError    = 0x00000101,
    /// The connection is being terminated. Sender or Receiver of this frame MUST wait for
    /// outstanding streams to terminate before closing the connection. New requests MAY not be 
    /// accepted.
    ConnectionClose    = 0x00000102,
    /// Application layer logic generating a Reactive Streams onError event.
    ApplicationError   = 0x00000201,
    /// Despite being a valid request, the Responder decided to reject it. 
    /// The Responder guarantees that it didn't process the request.
    Rejected           = 0x00000202,
    /// The Responder canceled the request but may have started processing it 
    /// (similar to REJECTED but doesn't guarantee lack of side-effects).
    Canceled           = 0x00000203,
    /// The request is invalid.
    Invalid            = 0x00000204,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<Source>,
    {
        Error {
            inner: Box::new(ErrorImpl {
                kind,
                source: source.map(Into::into),
            }),
        }
    }

    fn with_message(kind: Kind, message: impl Into<String>) -> Error {
        Error::new(kind, Some(message.into()))
    }

    /// Builds an `INVALID_SETUP` error with the given message.
    pub(crate) fn invalid_setup(message: impl Into<String>) -> Error {
        Error::with_message(Kind::InvalidSetup, message)
    }

    /// Builds an `UNSUPPORTED_SETUP` error with the given message.
    pub(crate) fn unsupported_setup(message: impl Into<String>) -> Error {
        Error::with_message(Kind::UnsupportedSetup, message)
    }

    /// Builds a `REJECTED_SETUP` error with the given message.
    pub(crate) fn rejected_setup(message: impl Into<String>) -> Error {
        Error::with_message(Kind::RejectedSetup, message)
    }

    /// Builds a `CONNECTION_ERROR` error with the given message.
    pub(crate) fn connection_error(message: impl Into<String>) -> Error {
        Error::with_message(Kind::ConnectionError, message)
    }

    /// Builds an `APPLICATION_ERROR` error with the given message.
    pub(crate) fn application_error(message: impl Into<String>) -> Error {
        Error::with_message(Kind::ApplicationError, message)
    }

    /// Builds a `REJECTED` error with the given message.
    pub(crate) fn rejected(message: impl Into<String>) -> Error {
        Error::with_message(Kind::Rejected, message)
    }

    /// Builds a `CANCELED` error with the given message.
    pub(crate) fn canceled(message: impl Into<String>) -> Error {
        Error::with_message(Kind::Canceled, message)
    }

    /// Builds an `INVALID` error with the given message.
    pub(crate) fn invalid(message: impl Into<String>) -> Error {
        Error::with_message(Kind::Invalid, message)
    }

    /// Builds the local error reported to live streams when the transport is lost.
    pub(crate) fn disconnected() -> Error {
        Error::with_message(Kind::ConnectionError, "peer disconnected")
    }

    /// Returns the wire error code this error maps onto when sent as an `ERROR` frame.
    ///
    /// Non-protocol errors (decode/IO) are reported as `CONNECTION_ERROR`, since they can
    /// only ever originate locally and close the connection rather than a single stream.
    pub(crate) fn wire_code(&self) -> u32 {
        use Kind::*;
        match &self.inner.kind {
            InvalidSetup => Code::InvalidSetup as u32,
            UnsupportedSetup => Code::UnsupportedSetup as u32,
            RejectedSetup => Code::RejectedSetup as u32,
            RejectedResume => Code::RejectedResume as u32,
            ConnectionError => Code::ConnectionError as u32,
            ConnectionClose => Code::ConnectionClose as u32,
            ApplicationError => Code::ApplicationError as u32,
            Rejected => Code::Rejected as u32,
            Canceled => Code::Canceled as u32,
            Invalid => Code::Invalid as u32,
            Decode(_) | Io => Code::ConnectionError as u32,
        }
    }

    /// Reconstructs an `Error` from a wire error code and message, as received in an
    /// `ERROR` frame from the peer.
    pub(crate) fn from_wire(code: u32, message: Option<String>) -> Error {
        let kind = match code {
            0x00000001 => Kind::InvalidSetup,
            0x00000002 => Kind::UnsupportedSetup,
            0x00000003 => Kind::RejectedSetup,
            0x00000004 => Kind::RejectedResume,
            0x00000101 => Kind::ConnectionError,
            0x00000102 => Kind::ConnectionClose,
            0x00000202 => Kind::Rejected,
            0x00000203 => Kind::Canceled,
            0x00000204 => Kind::Invalid,
            _ => Kind::ApplicationError,
        };
        match message {
            Some(m) => Error::with_message(kind, m),
            None => Error::new::<String>(kind, None),
        }
    }

    /// Returns true if this error is related to decoding `Bytes`.
    pub fn is_decode(&self) -> bool {
        matches!(self.inner.kind, Kind::Decode(_))
    }

    /// Returns true if this error is a RSocket protocol error.
    pub fn is_protocol(&self) -> bool {
        use Kind::*;
        matches!(
            self.inner.kind,
            InvalidSetup
                | UnsupportedSetup
                | RejectedSetup
                | RejectedResume
                | ConnectionError
                | ConnectionClose
                | ApplicationError
                | Rejected
                | Canceled
                | Invalid
        )
    }

    /// Returns true if this error is related to connection setup.
    pub fn is_setup(&self) -> bool {
        matches!(
            self.inner.kind,
            Kind::InvalidSetup | Kind::UnsupportedSetup | Kind::RejectedSetup
        )
    }

    /// Returns true if this is protocol error `INVALID_SETUP`.
    pub fn is_invalid_setup(&self) -> bool {
        matches!(self.inner.kind, Kind::InvalidSetup)
    }

    /// Returns true if this is protocol error `UNSUPPORTED_SETUP`.
    pub fn is_unsupported_setup(&self) -> bool {
        matches!(self.inner.kind, Kind::UnsupportedSetup)
    }

    /// Returns true if this is protocol error `REJECTED_SETUP`.
    pub fn is_rejected_setup(&self) -> bool {
        matches!(self.inner.kind, Kind::RejectedSetup)
    }

    /// Returns true if this is protocol error `REJECTED_RESUME`.
    pub fn is_rejected_resume(&self) -> bool {
        matches!(self.inner.kind, Kind::RejectedResume)
    }

    /// Returns true if this is protocol error `CONNECTION_ERROR`.
    ///
    /// Sender or Receiver of this error MAY close the connection immediately without waiting
    /// for outstanding streams to terminate.
    pub fn is_connection_error(&self) -> bool {
        matches!(self.inner.kind, Kind::ConnectionError)
    }

    /// Returns true if this is protocol error `CONNECTION_CLOSE`.
    ///
    /// Sender or Receiver of this error MUST wait for outstanding streams to terminate before
    /// closing the connection. New requests MAY not be accepted.
    pub fn is_connection_close(&self) -> bool {
        matches!(self.inner.kind, Kind::ConnectionClose)
    }

    /// Returns true if this is protocol error `APPLICATION_ERROR`.
    pub fn is_application_error(&self) -> bool {
        matches!(self.inner.kind, Kind::ApplicationError)
    }

    /// Returns true if this is protocol error `REJECTED`.
    pub fn is_rejected(&self) -> bool {
        matches!(self.inner.kind, Kind::Rejected)
    }

    /// Returns true if this is protocol error `CANCELED`.
    pub fn is_cancel(&self) -> bool {
        matches!(self.inner.kind, Kind::Canceled)
    }

    /// Returns true if this is protocol error `INVALID`.
    pub fn is_invalid(&self) -> bool {
        matches!(self.inner.kind, Kind::Invalid)
    }

    /// Returns the message carried by this error, if any, without `Display`'s leading
    /// protocol-code prefix.
    ///
    /// This is what an `ERROR` frame's `data` field should be built from, and what a
    /// reconstructed error's message should be read back from: going through `Display`
    /// instead (on either hop) double-wraps the text with a second "CODE: " prefix on top
    /// of whatever the peer already sent, so the message no longer matches what the
    /// application originally raised.
    pub fn message(&self) -> Option<String> {
        self.inner.source.as_ref().map(|s| s.to_string())
    }

    fn description(&self) -> &str {
        use Kind::*;
        match &self.inner.kind {
            InvalidSetup => "INVALID_SETUP (0x00000001)",
            UnsupportedSetup => "UNSUPPORTED_SETUP (0x00000002)",
            RejectedSetup => "REJECTED_SETUP (0x00000003)",
            RejectedResume => "REJECTED_RESUME (0x00000004)",
            ConnectionError => "CONNECTION_ERROR (0x00000101)",
            ConnectionClose => "CONNECTION_CLOSE (0x00000102)",
            ApplicationError => "APPLICATION_ERROR (0x00000201)",
            Rejected => "REJECTED (0x00000202)",
            Canceled => "CANCELED (0x00000203)",
            Invalid => "INVALID (0x00000204)",
            Decode(_) => "error decoding frame",
            Io => "I/O error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref source) = self.inner.source {
            write!(f, "{}: {}", self.description(), source)
        } else {
            f.write_str(self.description())
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_tuple("rscore::Error");
        f.field(&self.inner.kind);
        if let Some(ref source) = self.inner.source {
            f.field(source);
        }
        f.finish()
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Error {
        let source = e.to_string();
        Error::new(Kind::Decode(e), Some(source))
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::new(Kind::Io, Some(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn size_of() {
        assert_eq!(mem::size_of::<Error>(), mem::size_of::<usize>());
    }

    #[test]
    fn assert_send_sync() {
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn from_decode_error() {
        let decode = DecodeError::InComplete;
        let actual: Error = decode.clone().into();
        match actual.inner.kind {
            Kind::Decode(e) => assert_eq!(e, decode),
            _ => panic!("{:?}", actual),
        }
        assert!(actual.inner.source.is_some());
    }
}
