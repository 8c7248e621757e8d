use crate::error::{Error, Kind};
use crate::frame::{Encode, U24};
use crate::mimetype::WellKnownMimeType;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

/// The mime type of one composite metadata entry: either a one-byte well-known id, or an
/// explicit ASCII mime string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mime {
    /// A well-known mime type, carried on the wire as a single byte with the high bit set.
    WellKnown(WellKnownMimeType),
    /// An explicit mime type string, carried on the wire as a length byte (high bit unset)
    /// followed by the ASCII bytes of the string.
    Custom(String),
}

impl Mime {
    fn encoded_len(&self) -> usize {
        match self {
            Mime::WellKnown(_) => 1,
            Mime::Custom(s) => 1 + s.len(),
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        match self {
            Mime::WellKnown(mime) => {
                let id = mime.id().expect("well-known mimetype must have an id");
                buf.put_u8(0x80 | id);
            }
            Mime::Custom(s) => {
                assert!(s.len() <= 0x7F, "mime type string too long");
                buf.put_u8(s.len() as u8);
                buf.put_slice(s.as_bytes());
            }
        }
    }
}

impl From<WellKnownMimeType> for Mime {
    fn from(mime: WellKnownMimeType) -> Self {
        Mime::WellKnown(mime)
    }
}

impl From<&str> for Mime {
    fn from(s: &str) -> Self {
        let well_known = WellKnownMimeType::from(s);
        if well_known != WellKnownMimeType::UNPARSEABLE {
            Mime::WellKnown(well_known)
        } else {
            Mime::Custom(s.to_string())
        }
    }
}

/// One `(mime, content)` tuple of a composite metadata section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeMetadataEntry {
    mime: Mime,
    content: Bytes,
}

impl CompositeMetadataEntry {
    /// Creates a new entry with the given `mime` and `content`.
    pub fn new<M: Into<Mime>>(mime: M, content: Bytes) -> Self {
        CompositeMetadataEntry { mime: mime.into(), content }
    }

    /// Returns the mime type of this entry.
    pub fn mime(&self) -> &Mime {
        &self.mime
    }

    /// Returns the content of this entry.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Returns true if this entry's mime type is the well-known `mime`.
    pub fn is_mime(&self, mime: WellKnownMimeType) -> bool {
        matches!(&self.mime, Mime::WellKnown(m) if *m == mime)
    }
}

impl Encode for CompositeMetadataEntry {
    fn encode(&self, buf: &mut BytesMut) {
        self.mime.encode(buf);
        let len = U24::from_usize(self.content.len());
        buf.put_u8(len.0);
        buf.put_u16(len.1);
        buf.put_slice(&self.content);
    }

    fn len(&self) -> usize {
        self.mime.encoded_len() + 3 + self.content.len()
    }
}

/// A parsed list of composite metadata entries, as carried in the metadata section of a
/// frame whose metadata mimetype is `message/x.rsocket.composite-metadata.v0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeMetadata {
    entries: Vec<CompositeMetadataEntry>,
}

impl CompositeMetadata {
    /// Creates an empty composite metadata list.
    pub fn new() -> Self {
        CompositeMetadata::default()
    }

    /// Builds a composite metadata list from the given entries.
    pub fn from_entries(entries: Vec<CompositeMetadataEntry>) -> Self {
        CompositeMetadata { entries }
    }

    /// Appends an entry to this composite metadata list.
    pub fn push(&mut self, entry: CompositeMetadataEntry) {
        self.entries.push(entry);
    }

    /// Returns the entries of this composite metadata list.
    pub fn entries(&self) -> &[CompositeMetadataEntry] {
        &self.entries
    }

    /// Returns the first entry whose mime type is the well-known `mime`.
    pub fn find(&self, mime: WellKnownMimeType) -> Option<&CompositeMetadataEntry> {
        self.entries.iter().find(|e| e.is_mime(mime))
    }

    /// Parses a composite metadata section from raw bytes.
    pub fn parse(bytes: &Bytes) -> Result<CompositeMetadata, CompositeMetadataDecodeError> {
        let mut buf = bytes.clone();
        let mut entries = Vec::new();

        while buf.remaining() > 0 {
            if buf.remaining() < 1 {
                return Err(CompositeMetadataDecodeError::Truncated);
            }
            let type_byte = buf.get_u8();
            let mime = if type_byte & 0x80 != 0 {
                let id = type_byte & 0x7F;
                let well_known = WellKnownMimeType::from_id(id)
                    .ok_or(CompositeMetadataDecodeError::UnknownMimeId(id))?;
                Mime::WellKnown(well_known)
            } else {
                let mime_len = (type_byte & 0x7F) as usize;
                if buf.remaining() < mime_len {
                    return Err(CompositeMetadataDecodeError::Truncated);
                }
                let mime_bytes = buf.copy_to_bytes(mime_len);
                let s = std::str::from_utf8(&mime_bytes)
                    .map_err(|_| CompositeMetadataDecodeError::InvalidMimeString)?
                    .to_string();
                Mime::Custom(s)
            };

            if buf.remaining() < 3 {
                return Err(CompositeMetadataDecodeError::Truncated);
            }
            let content_len = U24::new(buf.get_u8(), buf.get_u16()).into_usize();
            if buf.remaining() < content_len {
                return Err(CompositeMetadataDecodeError::Truncated);
            }
            let content = buf.copy_to_bytes(content_len);
            entries.push(CompositeMetadataEntry { mime, content });
        }

        Ok(CompositeMetadata { entries })
    }
}

impl Encode for CompositeMetadata {
    fn encode(&self, buf: &mut BytesMut) {
        for entry in &self.entries {
            entry.encode(buf);
        }
    }

    fn len(&self) -> usize {
        self.entries.iter().map(Encode::len).sum()
    }
}

/// Errors that can occur while parsing a composite metadata section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositeMetadataDecodeError {
    /// The buffer ended in the middle of an entry.
    Truncated,
    /// A well-known mime id has no registered mime type.
    UnknownMimeId(u8),
    /// An inline mime type string was not valid UTF-8.
    InvalidMimeString,
}

impl fmt::Display for CompositeMetadataDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeMetadataDecodeError::Truncated => {
                write!(f, "composite metadata entry truncated")
            }
            CompositeMetadataDecodeError::UnknownMimeId(id) => {
                write!(f, "unknown well-known mime id {:#x}", id)
            }
            CompositeMetadataDecodeError::InvalidMimeString => {
                write!(f, "mime type string was not valid utf-8")
            }
        }
    }
}

impl std::error::Error for CompositeMetadataDecodeError {}

impl From<CompositeMetadataDecodeError> for Error {
    fn from(e: CompositeMetadataDecodeError) -> Error {
        let source = e.to_string();
        Error::new(Kind::Invalid, Some(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_mixed_entries() {
        let mut composite = CompositeMetadata::new();
        composite.push(CompositeMetadataEntry::new(
            WellKnownMimeType::MESSAGE_X_RSOCKET_ROUTING_V0,
            Bytes::from_static(b"\x09test.path"),
        ));
        composite.push(CompositeMetadataEntry::new(
            "application/x-custom",
            Bytes::from_static(b"hello"),
        ));

        let mut buf = BytesMut::new();
        composite.encode(&mut buf);
        let bytes = buf.freeze();

        let decoded = CompositeMetadata::parse(&bytes).unwrap();
        assert_eq!(decoded, composite);
        assert_eq!(decoded.entries().len(), 2);
        assert!(decoded.find(WellKnownMimeType::MESSAGE_X_RSOCKET_ROUTING_V0).is_some());
    }

    #[test]
    fn empty_composite_round_trips() {
        let composite = CompositeMetadata::new();
        let mut buf = BytesMut::new();
        composite.encode(&mut buf);
        assert!(buf.is_empty());
        let decoded = CompositeMetadata::parse(&buf.freeze()).unwrap();
        assert_eq!(decoded.entries().len(), 0);
    }

    #[test]
    fn truncated_entry_fails() {
        let mut buf = BytesMut::new();
        buf.put_u8(0x80 | 0x05); // APPLICATION_JSON, well-known
        buf.put_u8(0);
        buf.put_u16(10); // claims 10 bytes of content but supplies none
        let err = CompositeMetadata::parse(&buf.freeze()).unwrap_err();
        assert_eq!(err, CompositeMetadataDecodeError::Truncated);
    }

    #[test]
    fn unknown_well_known_id_fails() {
        let mut buf = BytesMut::new();
        buf.put_u8(0x80 | 0x29); // unassigned id
        let err = CompositeMetadata::parse(&buf.freeze()).unwrap_err();
        assert_eq!(err, CompositeMetadataDecodeError::UnknownMimeId(0x29));
    }
}
