//! A list of wellknown MIME types.

/// Default mimetype for encoding metadata and data.
pub const DEFAULT_MIMETYPE: &str = "application/binary";

/// Well-known MIME types.
#[rustfmt::skip]
#[allow(missing_docs)]
#[allow(non_camel_case_types)]
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownMimeType {
    UNPARSEABLE,
    APPLICATION_AVRO,
    APPLICATION_CBOR,
    APPLICATION_GRAPHQL,
    APPLICATION_GZIP,
    APPLICATION_JAVASCRIPT,
    APPLICATION_JSON,
    APPLICATION_OCTET_STREAM,
    APPLICATION_PDF,
    APPLICATION_VND_APACHE_THRIFT_BINARY,
    APPLICATION_VND_GOOGLE_PROTOBUF,
    APPLICATION_XML,
    APPLICATION_ZIP,
    AUDIO_AAC,
    AUDIO_MP3,
    AUDIO_MP4,
    AUDIO_MPEG3,
    AUDIO_MPEG,
    AUDIO_OGG,
    AUDIO_OPUS,
    AUDIO_VORBIS,
    IMAGE_BMP,
    IMAGE_GIF,
    IMAGE_HEIC_SEQUENCE,
    IMAGE_HEIC,
    IMAGE_HEIF_SEQUENCE,
    IMAGE_HEIF,
    IMAGE_JPEG,
    IMAGE_PNG,
    IMAGE_TIFF,
    MULTIPART_MIXED,
    TEXT_CSS,
    TEXT_CSV,
    TEXT_HTML,
    TEXT_PLAIN,
    TEXT_XML,
    VIDEO_H264,
    VIDEO_H265,
    VIDEO_VP8,
    APPLICATION_X_HESSIAN,
    APPLICATION_X_JAVA_OBJECT,
    APPLICATION_CLOUDEVENTS_JSON,
    MESSAGE_X_RSOCKET_MIME_TYPE_V0,
    MESSAGE_X_RSOCKET_ACCEPT_TIME_TYPES_V0,
    MESSAGE_X_RSOCKET_AUTHENTICATION_V0,
    MESSAGE_X_RSOCKET_TRACING_ZIPKIN_V0,
    MESSAGE_X_RSOCKET_ROUTING_V0,
    MESSAGE_X_RSOCKET_COMPOSITE_METADATA_V0,
}

#[rustfmt::skip]
impl From<&str> for WellKnownMimeType {
    fn from(v: &str) -> Self {
        use WellKnownMimeType::*;
        match v {
            "application/avro" => APPLICATION_AVRO,
            "application/cbor" => APPLICATION_CBOR,
            "application/graphql" => APPLICATION_GRAPHQL,
            "application/gzip" => APPLICATION_GZIP,
            "application/javascript" => APPLICATION_JAVASCRIPT,
            "application/json" => APPLICATION_JSON,
            "application/octet-stream" => APPLICATION_OCTET_STREAM,
            "application/pdf" => APPLICATION_PDF,
            "application/vnd.apache.thrift.binary" => APPLICATION_VND_APACHE_THRIFT_BINARY,
            "application/vnd.google.protobuf" => APPLICATION_VND_GOOGLE_PROTOBUF,
            "application/xml" => APPLICATION_XML,
            "application/zip" => APPLICATION_ZIP,
            "audio/aac" => AUDIO_AAC,
            "audio/mp3" => AUDIO_MP3,
            "audio/mp4" => AUDIO_MP4,
            "audio/mpeg3" => AUDIO_MPEG3,
            "audio/mpeg" => AUDIO_MPEG,
            "audio/ogg" => AUDIO_OGG,
            "audio/opus" => AUDIO_OPUS,
            "audio/vorbis" => AUDIO_VORBIS,
            "image/bmp" => IMAGE_BMP,
            "image/gif" => IMAGE_GIF,
            "image/heic-sequence" => IMAGE_HEIC_SEQUENCE,
            "image/heic" => IMAGE_HEIC,
            "image/heif-sequence" => IMAGE_HEIF_SEQUENCE,
            "image/heif" => IMAGE_HEIF,
            "image/jpeg" => IMAGE_JPEG,
            "image/png" => IMAGE_PNG,
            "image/tiff" => IMAGE_TIFF,
            "multipart/mixed" => MULTIPART_MIXED,
            "text/css" => TEXT_CSS,
            "text/csv" => TEXT_CSV,
            "text/html" => TEXT_HTML,
            "text/plain" => TEXT_PLAIN,
            "text/xml" => TEXT_XML,
            "video/H264" => VIDEO_H264,
            "video/H265" => VIDEO_H265,
            "video/VP8" => VIDEO_VP8,
            "application/x-hessian" => APPLICATION_X_HESSIAN,
            "application/x-java-object" => APPLICATION_X_JAVA_OBJECT,
            "application/cloudevents+json" => APPLICATION_CLOUDEVENTS_JSON,
            "message/x.rsocket.mime.type.v0" => MESSAGE_X_RSOCKET_MIME_TYPE_V0,
            "message/x.rsocket.accept.time.types.v0" => MESSAGE_X_RSOCKET_ACCEPT_TIME_TYPES_V0,
            "message/x.rsocket.authentication.v0" => MESSAGE_X_RSOCKET_AUTHENTICATION_V0,
            "message/x.rsocket.tracing.zipkin.v0" => MESSAGE_X_RSOCKET_TRACING_ZIPKIN_V0,
            "message/x.rsocket.routing.v0" => MESSAGE_X_RSOCKET_ROUTING_V0,
            "message/x.rsocket.composite.metadata.v0" => MESSAGE_X_RSOCKET_COMPOSITE_METADATA_V0,
            _ => UNPARSEABLE,
        }
    }
}

#[rustfmt::skip]
impl From<WellKnownMimeType> for &'static str {
    fn from(t: WellKnownMimeType) -> &'static str {
        use WellKnownMimeType::*;
        match t {
            UNPARSEABLE => "",
            APPLICATION_AVRO => "application/avro",
            APPLICATION_CBOR => "application/cbor",
            APPLICATION_GRAPHQL => "application/graphql",
            APPLICATION_GZIP => "application/gzip",
            APPLICATION_JAVASCRIPT => "application/javascript",
            APPLICATION_JSON => "application/json",
            APPLICATION_OCTET_STREAM => "application/octet-stream",
            APPLICATION_PDF => "application/pdf",
            APPLICATION_VND_APACHE_THRIFT_BINARY => "application/vnd.apache.thrift.binary",
            APPLICATION_VND_GOOGLE_PROTOBUF => "application/vnd.google.protobuf",
            APPLICATION_XML => "application/xml",
            APPLICATION_ZIP => "application/zip",
            AUDIO_AAC => "audio/aac",
            AUDIO_MP3 => "audio/mp3",
            AUDIO_MP4 => "audio/mp4",
            AUDIO_MPEG3 => "audio/mpeg3",
            AUDIO_MPEG => "audio/mpeg",
            AUDIO_OGG => "audio/ogg",
            AUDIO_OPUS => "audio/opus",
            AUDIO_VORBIS => "audio/vorbis",
            IMAGE_BMP => "image/bmp",
            IMAGE_GIF => "image/gif",
            IMAGE_HEIC_SEQUENCE => "image/heic-sequence",
            IMAGE_HEIC => "image/heic",
            IMAGE_HEIF_SEQUENCE => "image/heif-sequence",
            IMAGE_HEIF => "image/heif",
            IMAGE_JPEG => "image/jpeg",
            IMAGE_PNG => "image/png",
            IMAGE_TIFF => "image/tiff",
            MULTIPART_MIXED => "multipart/mixed",
            TEXT_CSS => "text/css",
            TEXT_CSV => "text/csv",
            TEXT_HTML => "text/html",
            TEXT_PLAIN => "text/plain",
            TEXT_XML => "text/xml",
            VIDEO_H264 => "video/H264",
            VIDEO_H265 => "video/H265",
            VIDEO_VP8 => "video/VP8",
            APPLICATION_X_HESSIAN => "application/x-hessian",
            APPLICATION_X_JAVA_OBJECT => "application/x-java-object",
            APPLICATION_CLOUDEVENTS_JSON => "application/cloudevents+json",
            MESSAGE_X_RSOCKET_MIME_TYPE_V0 => "message/x.rsocket.mime.type.v0",
            MESSAGE_X_RSOCKET_ACCEPT_TIME_TYPES_V0 => "message/x.rsocket.accept.time.types.v0",
            MESSAGE_X_RSOCKET_AUTHENTICATION_V0 => "message/x.rsocket.authentication.v0",
            MESSAGE_X_RSOCKET_TRACING_ZIPKIN_V0 => "message/x.rsocket.tracing.zipkin.v0",
            MESSAGE_X_RSOCKET_ROUTING_V0 => "message/x.rsocket.routing.v0",
            MESSAGE_X_RSOCKET_COMPOSITE_METADATA_V0 => "message/x.rsocket.composite.metadata.v0",
        }
    }
}

impl WellKnownMimeType {
    /// Returns the one-byte well-known mimetype identifier used in composite
    /// metadata entries, or `None` if this mimetype has no well-known id and
    /// must be carried as an explicit string.
    #[rustfmt::skip]
    pub fn id(self) -> Option<u8> {
        use WellKnownMimeType::*;
        let id = match self {
            UNPARSEABLE => return None,
            APPLICATION_AVRO => 0x00,
            APPLICATION_CBOR => 0x01,
            APPLICATION_GRAPHQL => 0x02,
            APPLICATION_GZIP => 0x03,
            APPLICATION_JAVASCRIPT => 0x04,
            APPLICATION_JSON => 0x05,
            APPLICATION_OCTET_STREAM => 0x06,
            APPLICATION_PDF => 0x07,
            APPLICATION_VND_APACHE_THRIFT_BINARY => 0x08,
            APPLICATION_VND_GOOGLE_PROTOBUF => 0x09,
            APPLICATION_XML => 0x0A,
            APPLICATION_ZIP => 0x0B,
            AUDIO_AAC => 0x0C,
            AUDIO_MP3 => 0x0D,
            AUDIO_MP4 => 0x0E,
            AUDIO_MPEG3 => 0x0F,
            AUDIO_MPEG => 0x10,
            AUDIO_OGG => 0x11,
            AUDIO_OPUS => 0x12,
            AUDIO_VORBIS => 0x13,
            IMAGE_BMP => 0x14,
            IMAGE_GIF => 0x15,
            IMAGE_HEIC_SEQUENCE => 0x16,
            IMAGE_HEIC => 0x17,
            IMAGE_HEIF_SEQUENCE => 0x18,
            IMAGE_HEIF => 0x19,
            IMAGE_JPEG => 0x1A,
            IMAGE_PNG => 0x1B,
            IMAGE_TIFF => 0x1C,
            MULTIPART_MIXED => 0x1D,
            TEXT_CSS => 0x1E,
            TEXT_CSV => 0x1F,
            TEXT_HTML => 0x20,
            TEXT_PLAIN => 0x21,
            TEXT_XML => 0x22,
            VIDEO_H264 => 0x23,
            VIDEO_H265 => 0x24,
            VIDEO_VP8 => 0x25,
            APPLICATION_X_HESSIAN => 0x26,
            APPLICATION_X_JAVA_OBJECT => 0x27,
            APPLICATION_CLOUDEVENTS_JSON => 0x28,
            MESSAGE_X_RSOCKET_COMPOSITE_METADATA_V0 => 0x7A,
            MESSAGE_X_RSOCKET_MIME_TYPE_V0 => 0x7B,
            MESSAGE_X_RSOCKET_ACCEPT_TIME_TYPES_V0 => 0x7C,
            MESSAGE_X_RSOCKET_AUTHENTICATION_V0 => 0x7D,
            MESSAGE_X_RSOCKET_TRACING_ZIPKIN_V0 => 0x7E,
            MESSAGE_X_RSOCKET_ROUTING_V0 => 0x7F,
        };
        Some(id)
    }

    /// Looks up a well-known mimetype by its one-byte composite metadata id.
    #[rustfmt::skip]
    pub fn from_id(id: u8) -> Option<WellKnownMimeType> {
        use WellKnownMimeType::*;
        let mime = match id {
            0x00 => APPLICATION_AVRO,
            0x01 => APPLICATION_CBOR,
            0x02 => APPLICATION_GRAPHQL,
            0x03 => APPLICATION_GZIP,
            0x04 => APPLICATION_JAVASCRIPT,
            0x05 => APPLICATION_JSON,
            0x06 => APPLICATION_OCTET_STREAM,
            0x07 => APPLICATION_PDF,
            0x08 => APPLICATION_VND_APACHE_THRIFT_BINARY,
            0x09 => APPLICATION_VND_GOOGLE_PROTOBUF,
            0x0A => APPLICATION_XML,
            0x0B => APPLICATION_ZIP,
            0x0C => AUDIO_AAC,
            0x0D => AUDIO_MP3,
            0x0E => AUDIO_MP4,
            0x0F => AUDIO_MPEG3,
            0x10 => AUDIO_MPEG,
            0x11 => AUDIO_OGG,
            0x12 => AUDIO_OPUS,
            0x13 => AUDIO_VORBIS,
            0x14 => IMAGE_BMP,
            0x15 => IMAGE_GIF,
            0x16 => IMAGE_HEIC_SEQUENCE,
            0x17 => IMAGE_HEIC,
            0x18 => IMAGE_HEIF_SEQUENCE,
            0x19 => IMAGE_HEIF,
            0x1A => IMAGE_JPEG,
            0x1B => IMAGE_PNG,
            0x1C => IMAGE_TIFF,
            0x1D => MULTIPART_MIXED,
            0x1E => TEXT_CSS,
            0x1F => TEXT_CSV,
            0x20 => TEXT_HTML,
            0x21 => TEXT_PLAIN,
            0x22 => TEXT_XML,
            0x23 => VIDEO_H264,
            0x24 => VIDEO_H265,
            0x25 => VIDEO_VP8,
            0x26 => APPLICATION_X_HESSIAN,
            0x27 => APPLICATION_X_JAVA_OBJECT,
            0x28 => APPLICATION_CLOUDEVENTS_JSON,
            0x7A => MESSAGE_X_RSOCKET_COMPOSITE_METADATA_V0,
            0x7B => MESSAGE_X_RSOCKET_MIME_TYPE_V0,
            0x7C => MESSAGE_X_RSOCKET_ACCEPT_TIME_TYPES_V0,
            0x7D => MESSAGE_X_RSOCKET_AUTHENTICATION_V0,
            0x7E => MESSAGE_X_RSOCKET_TRACING_ZIPKIN_V0,
            0x7F => MESSAGE_X_RSOCKET_ROUTING_V0,
            _ => return None,
        };
        Some(mime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsable_mime_type() {
        let mime: WellKnownMimeType = "unparsable".into();
        let string: &'static str = mime.into();
        assert_eq!(mime, WellKnownMimeType::UNPARSEABLE);
        assert_eq!(string, "");
    }

    #[test]
    fn fixed_ids_match_registry() {
        assert_eq!(WellKnownMimeType::APPLICATION_AVRO.id(), Some(0x00));
        assert_eq!(WellKnownMimeType::APPLICATION_JSON.id(), Some(0x05));
        assert_eq!(WellKnownMimeType::APPLICATION_OCTET_STREAM.id(), Some(0x06));
        assert_eq!(
            WellKnownMimeType::MESSAGE_X_RSOCKET_COMPOSITE_METADATA_V0.id(),
            Some(0x7A)
        );
        assert_eq!(
            WellKnownMimeType::MESSAGE_X_RSOCKET_AUTHENTICATION_V0.id(),
            Some(0x7D)
        );
        assert_eq!(
            WellKnownMimeType::MESSAGE_X_RSOCKET_TRACING_ZIPKIN_V0.id(),
            Some(0x7E)
        );
        assert_eq!(WellKnownMimeType::MESSAGE_X_RSOCKET_ROUTING_V0.id(), Some(0x7F));
    }

    #[test]
    fn id_round_trip() {
        for id in 0x00..=0x28u8 {
            let mime = WellKnownMimeType::from_id(id).unwrap();
            assert_eq!(mime.id(), Some(id));
        }
        for id in 0x7Au8..=0x7F {
            let mime = WellKnownMimeType::from_id(id).unwrap();
            assert_eq!(mime.id(), Some(id));
        }
    }

    #[test]
    fn unassigned_id_is_none() {
        assert_eq!(WellKnownMimeType::from_id(0x29), None);
        assert_eq!(WellKnownMimeType::from_id(0x79), None);
    }

    #[test]
    fn unparseable_has_no_id() {
        assert_eq!(WellKnownMimeType::UNPARSEABLE.id(), None);
    }
}
