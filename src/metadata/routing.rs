use crate::frame::Encode;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Routing metadata: a list of UTF-8 tags, the first of which is the route used to
/// dispatch a request to a handler.
///
/// Serialized as a sequence of tags, each prefixed by a single length byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingMetadata {
    tags: Vec<String>,
}

impl RoutingMetadata {
    /// Builds routing metadata whose first (and only) tag is `route`.
    pub fn from_route(route: impl Into<String>) -> Self {
        RoutingMetadata { tags: vec![route.into()] }
    }

    /// Builds routing metadata from an explicit list of tags; the first tag is the route.
    pub fn from_tags(tags: Vec<String>) -> Self {
        RoutingMetadata { tags }
    }

    /// Returns the route: the first tag, if any.
    pub fn route(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    /// Returns all tags, including the route.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Parses routing metadata from raw bytes.
    pub fn parse(bytes: &Bytes) -> Result<RoutingMetadata, RoutingDecodeError> {
        let mut buf = bytes.clone();
        let mut tags = Vec::new();
        while buf.remaining() > 0 {
            if buf.remaining() < 1 {
                return Err(RoutingDecodeError::Truncated);
            }
            let len = buf.get_u8() as usize;
            if buf.remaining() < len {
                return Err(RoutingDecodeError::Truncated);
            }
            let tag_bytes = buf.copy_to_bytes(len);
            let tag = std::str::from_utf8(&tag_bytes)
                .map_err(|_| RoutingDecodeError::InvalidUtf8)?
                .to_string();
            tags.push(tag);
        }
        Ok(RoutingMetadata { tags })
    }
}

impl Encode for RoutingMetadata {
    fn encode(&self, buf: &mut BytesMut) {
        for tag in &self.tags {
            assert!(tag.len() <= 0xFF, "routing tag too long");
            buf.put_u8(tag.len() as u8);
            buf.put_slice(tag.as_bytes());
        }
    }

    fn len(&self) -> usize {
        self.tags.iter().map(|t| 1 + t.len()).sum()
    }
}

/// Errors that can occur while parsing routing metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecodeError {
    /// The buffer ended in the middle of a tag.
    Truncated,
    /// A tag was not valid UTF-8.
    InvalidUtf8,
}

impl std::fmt::Display for RoutingDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingDecodeError::Truncated => write!(f, "routing tag truncated"),
            RoutingDecodeError::InvalidUtf8 => write!(f, "routing tag was not valid utf-8"),
        }
    }
}

impl std::error::Error for RoutingDecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_route_round_trips() {
        let routing = RoutingMetadata::from_route("test.path");
        let mut buf = BytesMut::new();
        routing.encode(&mut buf);
        let decoded = RoutingMetadata::parse(&buf.freeze()).unwrap();
        assert_eq!(decoded.route(), Some("test.path"));
    }

    #[test]
    fn multiple_tags_round_trip() {
        let routing =
            RoutingMetadata::from_tags(vec!["a.b".to_string(), "c.d".to_string()]);
        let mut buf = BytesMut::new();
        routing.encode(&mut buf);
        let decoded = RoutingMetadata::parse(&buf.freeze()).unwrap();
        assert_eq!(decoded.tags(), &["a.b".to_string(), "c.d".to_string()]);
        assert_eq!(decoded.route(), Some("a.b"));
    }
}
