//! The handler-facing API (spec §4.9 / §9).
//!
//! [`BaseRequestHandler`] is the contract an application implements to serve requests on a
//! connection. In most RSocket implementations this is its own trait with its own five
//! methods, forwarded into the engine's internal request/response machinery. Here it is a
//! trivial supertrait of [`RSocket`] instead: `RSocket` already carries exactly the methods
//! a request handler needs (including the `on_setup`/`on_close` lifecycle hooks), so there
//! is nothing left for `BaseRequestHandler` to add. Declaring it this way — rather than the
//! other direction, a blanket `impl RSocket for T: BaseRequestHandler` — keeps the engine
//! free to hold a plain `Arc<dyn RSocket>` everywhere without a second trait object type,
//! and avoids any risk of conflicting blanket impls against the concrete `RSocket`
//! implementors used throughout this crate's tests.
use crate::rsocket::RSocket;

/// Marker trait for types that serve as a connection's request handler.
///
/// Implement [`RSocket`] and this trait comes for free.
pub trait BaseRequestHandler: RSocket {}

impl<T: RSocket + ?Sized> BaseRequestHandler for T {}
