use super::*;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// The ext frame.
///
/// Used to extend RSocket with additional extension frame types, as well as extensions to
/// existing frames.
///
/// # Frame Contents
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Stream ID                           |
/// +-----------+-+-+-+-------------+-------------------------------+
/// |Frame Type |0|M|               Extended Type                   |
/// +-------------------------------+-------------------------------+
///                      Extended Type                               |
/// +-------------------------------+-------------------------------+
///                      Metadata & Extension Data
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtFrame {
    stream_id: u32,
    flags: Flags,
    extended_type: u32,
    payload: Payload,
}

impl ExtFrame {
    /// Type of this frame.
    pub const TYPE: FrameType = FrameType::EXT;

    /// Create a new `Ext` frame.
    ///
    /// - `stream_id` MUST be <= [`MAX_U31`].
    pub fn new(stream_id: u32, extended_type: u32, payload: Payload) -> Self {
        debug_assert_max_u31!(stream_id);
        let stream_id = stream_id & MAX_U31;
        let mut flags = Flags::empty();
        if payload.has_metadata() {
            flags |= Flags::METADATA
        }
        ExtFrame { stream_id, flags, extended_type, payload }
    }

    /// Returns the stream ID of this frame.
    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    /// Returns the application-defined extended frame type.
    pub fn extended_type(&self) -> u32 {
        self.extended_type
    }

    /// Returns the metadata attached to this frame, if any.
    pub fn metadata(&self) -> Option<&Bytes> {
        self.payload.metadata()
    }

    /// Returns the payload attached to this frame.
    pub fn payload(self) -> Payload {
        self.payload
    }
}

impl Encode for ExtFrame {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.stream_id);
        buf.put_u16(FrameType::EXT.bits() | self.flags.bits());
        buf.put_u32(self.extended_type);
        if self.payload.has_metadata() {
            let u24 = U24::from_usize(
                self.payload.metadata().map(|v| v.len()).unwrap_or_default(),
            );
            buf.put_u8(u24.0);
            buf.put_u16(u24.1);
        }
        self.payload.encode(buf);
    }

    fn len(&self) -> usize {
        // len(stream_id): 4
        // len(flags): 2
        // len(extended_type): 4
        // len(metadata_len): 3 (only if metadata present)
        // len(payload)
        let metadata_len_prefix = if self.payload.has_metadata() { 3 } else { 0 };
        10 + metadata_len_prefix + self.payload.len()
    }
}

impl Decode for ExtFrame {
    type Value = Self;

    fn decode<B: Buf>(
        buf: &mut B,
        stream_id: u32,
        flags: Flags,
    ) -> Result<Self::Value> {
        if buf.remaining() < 4 {
            return Err(DecodeError::InComplete);
        }
        let extended_type = buf.get_u32();
        let payload = eat_payload(buf, flags.is_metadata())?;
        Ok(ExtFrame { stream_id, flags, extended_type, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec() {
        let ext = ExtFrame::new(
            1,
            0xCAFE,
            Payload::builder()
                .set_metadata(Bytes::from("metadata"))
                .set_data(Bytes::from("data"))
                .build(),
        );

        let mut buf = BytesMut::new();
        ext.encode(&mut buf);
        let mut buf = buf.freeze();

        // len(stream_id): 4
        // len(flags): 2
        // len(extended_type): 4
        // len(metadata_len): 3
        // len(metadata): 8
        // len(data): 4
        let buf_len = buf.len();
        assert_eq!(buf_len, 4 + 2 + 4 + 3 + 8 + 4);

        let stream_id = eat_stream_id(&mut buf).unwrap();
        let (frame_type, flags) = eat_flags(&mut buf).unwrap();
        assert_eq!(frame_type, FrameType::EXT);
        assert_eq!(flags, Flags::METADATA);

        let decoded = ExtFrame::decode(&mut buf, stream_id, flags).unwrap();

        assert_eq!(decoded, ext);
        assert_eq!(ext.len(), buf_len);
        assert_eq!(decoded.len(), buf_len);
    }

    #[test]
    fn test_codec_no_metadata() {
        let ext = ExtFrame::new(
            2,
            1,
            Payload::builder().set_data(Bytes::from("data")).build(),
        );

        let mut buf = BytesMut::new();
        ext.encode(&mut buf);
        let mut buf = buf.freeze();

        let stream_id = eat_stream_id(&mut buf).unwrap();
        let (frame_type, flags) = eat_flags(&mut buf).unwrap();
        assert!(!flags.is_metadata());

        let decoded = ExtFrame::decode(&mut buf, stream_id, flags).unwrap();
        assert_eq!(decoded, ext);
        assert_eq!(decoded.extended_type(), 1);
    }
}
