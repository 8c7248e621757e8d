//! The RSocket prelude.
pub use crate::payload::{
    Data, Metadata, Payload, PayloadBuilder, PayloadChunks,
};

#[doc(inline)]
pub use super::mimetype::DEFAULT_MIMETYPE;
