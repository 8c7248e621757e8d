//! Payload of frame.
//!
//! Payload can be distinguished into two types: `Data` and `Metadata`. The distinction between
//! the types in an application is left to the application.
//!
//! The canonical definition lives alongside the frame codec; it is re-exported here so
//! callers reach it without going through the `frame` module path.
pub use crate::frame::{Data, Metadata, Payload, PayloadBuilder, PayloadChunks};
