//! Streaming frame length-framing for stream transports (TCP, WebSocket).
use crate::frame::{DecodeError, Encode, Frame, U24};
use bytes::{Buf, BufMut, BytesMut};

/// Maximum length (in bytes) a single framed RSocket frame may have.
///
/// Frames larger than this cause the connection to be torn down with a
/// `CONNECTION_ERROR`, per the oversize-frame constraint.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Accumulates bytes read off a stream transport and yields whole frames,
/// each of which is length-prefixed on the wire by a 3-byte big-endian length.
///
/// Bytes belonging to a not-yet-complete frame are preserved across calls.
#[derive(Debug)]
pub struct FrameBuf {
    max_frame_length: usize,
}

impl FrameBuf {
    /// Creates a new `FrameBuf` with the default maximum frame length.
    pub fn new() -> Self {
        FrameBuf { max_frame_length: DEFAULT_MAX_FRAME_LENGTH }
    }

    /// Creates a new `FrameBuf` that rejects frames larger than `max_frame_length`.
    pub fn with_max_frame_length(max_frame_length: usize) -> Self {
        FrameBuf { max_frame_length }
    }

    /// Attempts to decode one length-prefixed frame from the front of `buf`.
    ///
    /// Returns `Ok(None)` if `buf` does not yet contain a whole frame; the
    /// partial bytes are left untouched so the caller can append more data
    /// and try again. Returns `Err` if the declared frame length exceeds the
    /// configured maximum, or if the frame bytes themselves fail to decode.
    pub fn decode_frame(
        &self,
        buf: &mut BytesMut,
    ) -> Result<Option<Frame>, DecodeError> {
        if buf.remaining() < 3 {
            return Ok(None);
        }

        let mut peek = &buf[..3];
        let len = U24::new(peek.get_u8(), peek.get_u16()).into_usize();

        if len > self.max_frame_length {
            return Err(DecodeError::InComplete);
        }

        if buf.remaining() < 3 + len {
            return Ok(None);
        }

        buf.advance(3);
        let mut frame_bytes = buf.split_to(len);
        let frame = Frame::decode(&mut frame_bytes)?;
        Ok(Some(frame))
    }

    /// Encodes `frame`, prefixed by its 3-byte big-endian length, into `out`.
    pub fn encode_frame(&self, frame: &Frame, out: &mut BytesMut) {
        let len = frame.len();
        let u24 = U24::from_usize(len);
        out.reserve(3 + len);
        out.put_u8(u24.0);
        out.put_u16(u24.1);
        frame.encode(out);
    }
}

impl Default for FrameBuf {
    fn default() -> Self {
        FrameBuf::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::codec::RequestFnfFrame;
    use crate::payload::Payload;

    fn sample_frame() -> Frame {
        Frame::RequestFnf(RequestFnfFrame::new(
            1,
            false,
            Payload::builder().set_data("hello").build(),
        ))
    }

    #[test]
    fn incomplete_length_prefix() {
        let codec = FrameBuf::new();
        let mut buf = BytesMut::from(&[0u8, 0][..]);
        assert_eq!(codec.decode_frame(&mut buf).unwrap(), None);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn incomplete_frame_body() {
        let codec = FrameBuf::new();
        let mut out = BytesMut::new();
        codec.encode_frame(&sample_frame(), &mut out);
        out.truncate(out.len() - 1);
        assert_eq!(codec.decode_frame(&mut out).unwrap(), None);
    }

    #[test]
    fn round_trip_single_frame() {
        let codec = FrameBuf::new();
        let frame = sample_frame();
        let mut out = BytesMut::new();
        codec.encode_frame(&frame, &mut out);

        let decoded = codec.decode_frame(&mut out).unwrap();
        assert_eq!(decoded, Some(frame));
        assert!(out.is_empty());
    }

    #[test]
    fn round_trip_multiple_frames_leaves_trailing_bytes() {
        let codec = FrameBuf::new();
        let frame = sample_frame();
        let mut out = BytesMut::new();
        codec.encode_frame(&frame, &mut out);
        codec.encode_frame(&frame, &mut out);
        out.put_u8(0xFF); // trailing partial length prefix

        assert_eq!(codec.decode_frame(&mut out).unwrap(), Some(frame.clone()));
        assert_eq!(codec.decode_frame(&mut out).unwrap(), Some(frame));
        assert_eq!(codec.decode_frame(&mut out).unwrap(), None);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn oversize_frame_rejected() {
        let codec = FrameBuf::with_max_frame_length(4);
        let mut out = BytesMut::new();
        codec.encode_frame(&sample_frame(), &mut out);
        assert!(codec.decode_frame(&mut out).is_err());
    }
}
