//! Reassembly of fragmented requests and payloads, and the matching outbound splitter.
//!
//! A logical frame whose combined data+metadata exceeds the configured fragment size is
//! split on the wire into a head frame (carrying the FOLLOWS flag) plus zero or more
//! continuation `PAYLOAD` frames, the last of which has FOLLOWS unset. [`FragmentCache`]
//! is the inbound counterpart: it accumulates fragments per stream and yields the
//! recombined logical frame once the sequence completes.
use crate::frame::codec::*;
use crate::frame::{Flags, Frame, FrameType, Payload};
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use std::fmt;

/// Extra per-head-type fields that don't fit in a plain `Payload`, carried alongside the
/// accumulator so the recombined frame can be rebuilt with the original semantics.
#[derive(Debug, Clone, Copy)]
struct HeadFields {
    initial_request_n: Option<u32>,
    channel_complete: bool,
}

struct Accumulator {
    frame_type: FrameType,
    head: HeadFields,
    metadata: BytesMut,
    data: BytesMut,
    has_metadata: bool,
    has_data: bool,
}

/// Caches in-progress fragment sequences, keyed by stream ID.
///
/// Entries are bounded by `max_buffered_bytes`; exceeding the limit for a given stream
/// evicts that stream's accumulator and reports [`FragmentError::TooLarge`], which callers
/// map onto a `CANCEL` + `ERROR(INVALID)` for that stream per the protocol's fragment-cache
/// eviction rule.
pub struct FragmentCache {
    max_buffered_bytes: usize,
    accumulators: DashMap<u32, Accumulator>,
}

/// Default per-stream fragment reassembly limit.
pub const DEFAULT_MAX_BUFFERED_BYTES: usize = 16 * 1024 * 1024;

impl FragmentCache {
    /// Creates a new cache with the default per-stream buffering limit.
    pub fn new() -> Self {
        FragmentCache::with_limit(DEFAULT_MAX_BUFFERED_BYTES)
    }

    /// Creates a new cache that evicts a stream's accumulator once it has buffered more
    /// than `max_buffered_bytes`.
    pub fn with_limit(max_buffered_bytes: usize) -> Self {
        FragmentCache { max_buffered_bytes, accumulators: DashMap::new() }
    }

    /// Discards any in-progress fragment sequence for `stream_id`.
    ///
    /// Called when a stream terminates (completes, errors, or is cancelled) to avoid
    /// leaking an accumulator for a sequence that will never be completed.
    pub fn evict(&self, stream_id: u32) {
        self.accumulators.remove(&stream_id);
    }

    /// Feeds one wire frame through the cache.
    ///
    /// Returns `Ok(None)` while the fragment sequence for the frame's stream is still in
    /// progress. Returns `Ok(Some(frame))` with the recombined logical frame once the
    /// sequence (or a non-fragmented frame) completes.
    pub fn append(&self, frame: Frame) -> Result<Option<Frame>, FragmentError> {
        let parts = FrameParts::from_frame(&frame);
        let stream_id = parts.stream_id;

        if let Some(mut acc) = self.accumulators.get_mut(&stream_id) {
            if acc.frame_type != parts.frame_type && parts.frame_type != FrameType::PAYLOAD {
                drop(acc);
                self.accumulators.remove(&stream_id);
                return Err(FragmentError::DifferentType {
                    expected: acc_frame_type_name(parts.frame_type),
                });
            }

            if let Some(metadata) = parts.payload.metadata() {
                acc.metadata.extend_from_slice(metadata);
                acc.has_metadata = true;
            }
            if let Some(data) = parts.payload.data() {
                acc.data.extend_from_slice(data);
                acc.has_data = true;
            }

            if acc.metadata.len() + acc.data.len() > self.max_buffered_bytes {
                drop(acc);
                self.accumulators.remove(&stream_id);
                return Err(FragmentError::TooLarge);
            }

            if parts.follows {
                return Ok(None);
            }

            let acc = drop_and_take(&self.accumulators, stream_id);
            Ok(Some(rebuild(stream_id, acc)))
        } else if parts.follows {
            self.accumulators.insert(
                stream_id,
                Accumulator {
                    frame_type: parts.frame_type,
                    head: parts.head,
                    metadata: BytesMut::new(),
                    data: BytesMut::new(),
                    has_metadata: parts.payload.has_metadata(),
                    has_data: parts.payload.has_data(),
                },
            );
            if let Some(mut acc) = self.accumulators.get_mut(&stream_id) {
                if let Some(metadata) = parts.payload.metadata() {
                    acc.metadata.extend_from_slice(metadata);
                }
                if let Some(data) = parts.payload.data() {
                    acc.data.extend_from_slice(data);
                }
            }
            Ok(None)
        } else {
            Ok(Some(frame))
        }
    }
}

impl Default for FragmentCache {
    fn default() -> Self {
        FragmentCache::new()
    }
}

fn drop_and_take(map: &DashMap<u32, Accumulator>, stream_id: u32) -> Accumulator {
    map.remove(&stream_id).expect("accumulator present").1
}

fn acc_frame_type_name(found: FrameType) -> &'static str {
    match found {
        FrameType::REQUEST_RESPONSE => "REQUEST_RESPONSE",
        FrameType::REQUEST_FNF => "REQUEST_FNF",
        FrameType::REQUEST_STREAM => "REQUEST_STREAM",
        FrameType::REQUEST_CHANNEL => "REQUEST_CHANNEL",
        FrameType::METADATA_PUSH => "METADATA_PUSH",
        FrameType::PAYLOAD => "PAYLOAD",
        _ => "UNKNOWN",
    }
}

fn rebuild(stream_id: u32, acc: Accumulator) -> Frame {
    let metadata = if acc.has_metadata { Some(acc.metadata.freeze()) } else { None };
    let data = if acc.has_data { Some(acc.data.freeze()) } else { None };
    let payload = Payload::new(metadata, data);

    match acc.frame_type {
        FrameType::REQUEST_RESPONSE => {
            Frame::RequestResponse(RequestResponseFrame::new(stream_id, false, payload))
        }
        FrameType::REQUEST_FNF => {
            Frame::RequestFnf(RequestFnfFrame::new(stream_id, false, payload))
        }
        FrameType::REQUEST_STREAM => Frame::RequestStream(RequestStreamFrame::new(
            stream_id,
            false,
            acc.head.initial_request_n.unwrap_or(1),
            payload,
        )),
        FrameType::REQUEST_CHANNEL => Frame::RequestChannel(RequestChannelFrame::new(
            stream_id,
            false,
            acc.head.channel_complete,
            acc.head.initial_request_n.unwrap_or(1),
            payload,
        )),
        FrameType::METADATA_PUSH => Frame::MetadataPush(MetadataPushFrame::new(
            payload.metadata().cloned().unwrap_or_else(Bytes::new),
        )),
        FrameType::PAYLOAD => Frame::Payload(PayloadFrame::new(
            stream_id,
            Flags::NEXT | Flags::COMPLETE,
            payload,
        )),
        _ => unreachable!("non-fragmentable frame type reached rebuild"),
    }
}

struct FrameParts {
    stream_id: u32,
    frame_type: FrameType,
    follows: bool,
    head: HeadFields,
    payload: Payload,
}

impl FrameParts {
    fn from_frame(frame: &Frame) -> FrameParts {
        match frame {
            Frame::RequestResponse(f) => FrameParts {
                stream_id: f.stream_id(),
                frame_type: FrameType::REQUEST_RESPONSE,
                follows: f.is_follows(),
                head: HeadFields { initial_request_n: None, channel_complete: false },
                payload: Payload::new(f.metadata().cloned(), f.data().cloned()),
            },
            Frame::RequestFnf(f) => FrameParts {
                stream_id: f.stream_id(),
                frame_type: FrameType::REQUEST_FNF,
                follows: f.is_follows(),
                head: HeadFields { initial_request_n: None, channel_complete: false },
                payload: Payload::new(f.metadata().cloned(), f.data().cloned()),
            },
            Frame::RequestStream(f) => FrameParts {
                stream_id: f.stream_id(),
                frame_type: FrameType::REQUEST_STREAM,
                follows: f.is_follows(),
                head: HeadFields {
                    initial_request_n: Some(f.initial_request_n()),
                    channel_complete: false,
                },
                payload: Payload::new(f.metadata().cloned(), f.data().cloned()),
            },
            Frame::RequestChannel(f) => FrameParts {
                stream_id: f.stream_id(),
                frame_type: FrameType::REQUEST_CHANNEL,
                follows: f.is_follows(),
                head: HeadFields {
                    initial_request_n: Some(f.initial_request_n()),
                    channel_complete: f.is_complete(),
                },
                payload: Payload::new(f.metadata().cloned(), f.data().cloned()),
            },
            Frame::MetadataPush(f) => FrameParts {
                stream_id: 0,
                frame_type: FrameType::METADATA_PUSH,
                follows: false,
                head: HeadFields { initial_request_n: None, channel_complete: false },
                payload: Payload::new(Some(f.metadata().clone()), None),
            },
            Frame::Payload(f) => FrameParts {
                stream_id: f.stream_id(),
                frame_type: FrameType::PAYLOAD,
                follows: f.is_follows(),
                head: HeadFields { initial_request_n: None, channel_complete: false },
                payload: Payload::new(f.metadata().cloned(), f.data().cloned()),
            },
            Frame::Error(f) => FrameParts {
                stream_id: f.stream_id(),
                frame_type: FrameType::ERROR,
                follows: false,
                head: HeadFields { initial_request_n: None, channel_complete: false },
                payload: Payload::default(),
            },
            Frame::RequestN(f) => FrameParts {
                stream_id: f.stream_id(),
                frame_type: FrameType::REQUEST_N,
                follows: false,
                head: HeadFields { initial_request_n: None, channel_complete: false },
                payload: Payload::default(),
            },
            Frame::Cancel(f) => FrameParts {
                stream_id: f.stream_id(),
                frame_type: FrameType::CANCEL,
                follows: false,
                head: HeadFields { initial_request_n: None, channel_complete: false },
                payload: Payload::default(),
            },
            other => FrameParts {
                stream_id: 0,
                frame_type: FrameType::EXT,
                follows: false,
                head: HeadFields { initial_request_n: None, channel_complete: false },
                payload: Payload::default(),
            }
            .with_passthrough(other),
        }
    }

    /// Non-fragmentable frame types (SETUP, LEASE, KEEPALIVE, ...) always pass through
    /// unmodified; this marker keeps `from_frame` a total function without a panic.
    fn with_passthrough(self, _frame: &Frame) -> FrameParts {
        self
    }
}

/// Splits a logical head frame's payload into wire fragments.
///
/// `fragment_size` bounds the combined metadata+data length of every fragment but the
/// last. Returns a single-element vector (the unfragmented head frame) if the payload
/// already fits within `fragment_size`.
#[allow(clippy::too_many_arguments)]
pub fn fragment_request(
    frame_type: FrameType,
    stream_id: u32,
    initial_request_n: Option<u32>,
    channel_complete: bool,
    payload: Payload,
    fragment_size: usize,
) -> Vec<Frame> {
    assert!(fragment_size >= 3, "fragment_size must be >= 3");

    if payload.len() <= fragment_size {
        return vec![build_head(
            frame_type,
            stream_id,
            false,
            initial_request_n,
            channel_complete,
            payload,
        )];
    }

    let mut chunks: Vec<Payload> = payload.chunks(fragment_size).collect();
    let last = chunks.pop().expect("at least one chunk");
    let mut frames = Vec::with_capacity(chunks.len() + 1);

    let mut iter = chunks.into_iter();
    if let Some(first) = iter.next() {
        frames.push(build_head(
            frame_type,
            stream_id,
            true,
            initial_request_n,
            channel_complete,
            first,
        ));
    }
    for chunk in iter {
        frames.push(Frame::Payload(PayloadFrame::new(stream_id, Flags::FOLLOWS, chunk)));
    }
    frames.push(Frame::Payload(PayloadFrame::new(
        stream_id,
        Flags::NEXT | Flags::COMPLETE,
        last,
    )));

    frames
}

fn build_head(
    frame_type: FrameType,
    stream_id: u32,
    follows: bool,
    initial_request_n: Option<u32>,
    channel_complete: bool,
    payload: Payload,
) -> Frame {
    match frame_type {
        FrameType::REQUEST_RESPONSE => {
            Frame::RequestResponse(RequestResponseFrame::new(stream_id, follows, payload))
        }
        FrameType::REQUEST_FNF => {
            Frame::RequestFnf(RequestFnfFrame::new(stream_id, follows, payload))
        }
        FrameType::REQUEST_STREAM => Frame::RequestStream(RequestStreamFrame::new(
            stream_id,
            follows,
            initial_request_n.unwrap_or(1),
            payload,
        )),
        FrameType::REQUEST_CHANNEL => Frame::RequestChannel(RequestChannelFrame::new(
            stream_id,
            follows,
            channel_complete && !follows,
            initial_request_n.unwrap_or(1),
            payload,
        )),
        FrameType::METADATA_PUSH => {
            Frame::MetadataPush(MetadataPushFrame::new(payload.metadata().cloned().unwrap_or_default()))
        }
        FrameType::PAYLOAD => {
            let mut flags = Flags::NEXT;
            if follows {
                flags |= Flags::FOLLOWS;
            } else {
                flags |= Flags::COMPLETE;
            }
            Frame::Payload(PayloadFrame::new(stream_id, flags, payload))
        }
        _ => panic!("frame type {:?} is not fragmentable", frame_type),
    }
}

/// Errors that can occur while reassembling a fragment sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentError {
    /// A frame arrived for a stream whose in-progress fragment sequence has a different
    /// head frame type.
    DifferentType {
        /// The name of the incoming frame's type.
        expected: &'static str,
    },
    /// The accumulated fragment sequence exceeded the cache's memory bound.
    TooLarge,
}

impl fmt::Display for FragmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentError::DifferentType { expected } => {
                write!(f, "fragment sequence type mismatch: got {}", expected)
            }
            FragmentError::TooLarge => write!(f, "fragment sequence exceeded buffering limit"),
        }
    }
}

impl std::error::Error for FragmentError {}

impl From<FragmentError> for crate::Error {
    fn from(e: FragmentError) -> crate::Error {
        let source = e.to_string();
        crate::error::Error::new(crate::error::Kind::Invalid, Some(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn payload(data: &str, metadata: &str) -> Payload {
        Payload::builder().set_data(Bytes::from(data.to_string())).set_metadata(Bytes::from(metadata.to_string())).build()
    }

    #[test]
    fn fragment_reassembly_boundary() {
        let original = payload("123abc89", "456def");
        let fragments =
            fragment_request(FrameType::REQUEST_RESPONSE, 1, None, false, original.clone(), 3);
        assert_eq!(fragments.len(), 5);

        let cache = FragmentCache::new();
        let mut combined = None;
        for frame in fragments {
            combined = cache.append(frame).unwrap();
        }
        let combined = combined.expect("final fragment yields combined frame");
        match combined {
            Frame::RequestResponse(f) => {
                assert_eq!(f.data(), original.data());
                assert_eq!(f.metadata(), original.metadata());
            }
            _ => panic!("expected RequestResponse"),
        }
    }

    #[test]
    fn single_fragment_passthrough() {
        let original = payload("short", "md");
        let mut frames =
            fragment_request(FrameType::REQUEST_RESPONSE, 7, None, false, original, 1024);
        assert_eq!(frames.len(), 1);

        let cache = FragmentCache::new();
        let combined = cache.append(frames.remove(0)).unwrap();
        assert!(combined.is_some());
    }

    #[test]
    fn fragment_type_mismatch_errors() {
        let cache = FragmentCache::new();
        let first = Frame::RequestResponse(RequestResponseFrame::new(
            1,
            true,
            Payload::builder().set_data(Bytes::from_static(b"123")).build(),
        ));
        assert_eq!(cache.append(first).unwrap(), None);

        let second = Frame::RequestChannel(RequestChannelFrame::new(
            1,
            false,
            true,
            1,
            Payload::builder().set_data(Bytes::from_static(b"123")).build(),
        ));
        let err = cache.append(second).unwrap_err();
        assert!(matches!(err, FragmentError::DifferentType { .. }));
    }

    #[test]
    fn eviction_drops_in_progress_sequence() {
        let cache = FragmentCache::new();
        let first = Frame::RequestResponse(RequestResponseFrame::new(
            1,
            true,
            Payload::builder().set_data(Bytes::from_static(b"123")).build(),
        ));
        cache.append(first).unwrap();
        cache.evict(1);

        let second = Frame::RequestChannel(RequestChannelFrame::new(
            1,
            false,
            true,
            1,
            Payload::builder().set_data(Bytes::from_static(b"123")).build(),
        ));
        assert!(cache.append(second).unwrap().is_some());
    }
}
