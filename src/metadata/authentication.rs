use crate::frame::Encode;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Well-known authentication scheme identifiers, carried in the high-bit-set type byte of
/// an authentication metadata entry (mirrors the well-known mime id scheme used by
/// composite metadata).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WellKnownAuthType {
    /// Username/password authentication.
    Simple,
    /// Opaque bearer token authentication.
    Bearer,
}

impl WellKnownAuthType {
    /// Returns the one-byte well-known id of this auth type.
    pub fn id(self) -> u8 {
        match self {
            WellKnownAuthType::Simple => 0x00,
            WellKnownAuthType::Bearer => 0x01,
        }
    }

    /// Looks up a well-known auth type by its one-byte id.
    pub fn from_id(id: u8) -> Option<WellKnownAuthType> {
        match id {
            0x00 => Some(WellKnownAuthType::Simple),
            0x01 => Some(WellKnownAuthType::Bearer),
            _ => None,
        }
    }
}

/// Parsed content of an authentication metadata entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// Username/password authentication.
    Simple {
        /// The username.
        username: Bytes,
        /// The password.
        password: Bytes,
    },
    /// Opaque bearer token authentication.
    Bearer {
        /// The token.
        token: Bytes,
    },
    /// An authentication scheme identified by an explicit mime string rather than a
    /// well-known id.
    Custom {
        /// The mime type string identifying the scheme.
        mime: String,
        /// The raw scheme-specific content.
        content: Bytes,
    },
}

impl Authentication {
    /// Parses authentication metadata from raw bytes.
    pub fn parse(bytes: &Bytes) -> Result<Authentication, AuthenticationDecodeError> {
        let mut buf = bytes.clone();
        if buf.remaining() < 1 {
            return Err(AuthenticationDecodeError::Truncated);
        }
        let type_byte = buf.get_u8();

        if type_byte & 0x80 != 0 {
            let id = type_byte & 0x7F;
            match WellKnownAuthType::from_id(id) {
                Some(WellKnownAuthType::Simple) => {
                    if buf.remaining() < 2 {
                        return Err(AuthenticationDecodeError::Truncated);
                    }
                    let username_len = buf.get_u16() as usize;
                    if buf.remaining() < username_len {
                        return Err(AuthenticationDecodeError::Truncated);
                    }
                    let username = buf.copy_to_bytes(username_len);
                    let password = buf.copy_to_bytes(buf.remaining());
                    Ok(Authentication::Simple { username, password })
                }
                Some(WellKnownAuthType::Bearer) => {
                    let token = buf.copy_to_bytes(buf.remaining());
                    Ok(Authentication::Bearer { token })
                }
                None => Err(AuthenticationDecodeError::UnknownAuthTypeId(id)),
            }
        } else {
            let mime_len = (type_byte & 0x7F) as usize;
            if buf.remaining() < mime_len {
                return Err(AuthenticationDecodeError::Truncated);
            }
            let mime_bytes = buf.copy_to_bytes(mime_len);
            let mime = std::str::from_utf8(&mime_bytes)
                .map_err(|_| AuthenticationDecodeError::InvalidMimeString)?
                .to_string();
            let content = buf.copy_to_bytes(buf.remaining());
            Ok(Authentication::Custom { mime, content })
        }
    }
}

impl Encode for Authentication {
    fn encode(&self, buf: &mut BytesMut) {
        match self {
            Authentication::Simple { username, password } => {
                buf.put_u8(0x80 | WellKnownAuthType::Simple.id());
                buf.put_u16(username.len() as u16);
                buf.put_slice(username);
                buf.put_slice(password);
            }
            Authentication::Bearer { token } => {
                buf.put_u8(0x80 | WellKnownAuthType::Bearer.id());
                buf.put_slice(token);
            }
            Authentication::Custom { mime, content } => {
                assert!(mime.len() <= 0x7F, "auth mime type string too long");
                buf.put_u8(mime.len() as u8);
                buf.put_slice(mime.as_bytes());
                buf.put_slice(content);
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Authentication::Simple { username, password } => {
                1 + 2 + username.len() + password.len()
            }
            Authentication::Bearer { token } => 1 + token.len(),
            Authentication::Custom { mime, content } => 1 + mime.len() + content.len(),
        }
    }
}

/// Errors that can occur while parsing authentication metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationDecodeError {
    /// The buffer ended before a complete entry could be parsed.
    Truncated,
    /// A well-known auth type id has no registered scheme.
    UnknownAuthTypeId(u8),
    /// An inline mime type string was not valid UTF-8.
    InvalidMimeString,
}

impl std::fmt::Display for AuthenticationDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthenticationDecodeError::Truncated => write!(f, "authentication metadata truncated"),
            AuthenticationDecodeError::UnknownAuthTypeId(id) => {
                write!(f, "unknown well-known auth type id {:#x}", id)
            }
            AuthenticationDecodeError::InvalidMimeString => {
                write!(f, "auth mime type string was not valid utf-8")
            }
        }
    }
}

impl std::error::Error for AuthenticationDecodeError {}
