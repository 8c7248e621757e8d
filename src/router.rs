//! Route registry dispatching an incoming request to a handler closure by route string
//! (spec §4.8 / §9), grounded in
//! `examples/original_source/rsocket/routing/request_router.py`.
//!
//! The Python original binds handler arguments by introspecting parameter names
//! (`inspect.signature`); Rust has no equivalent, so every handler closure here receives an
//! explicit, fixed argument list instead: the request [`Payload`] plus the parsed
//! [`CompositeMetadata`] of the frame that carried it (`None` if the frame carried no
//! metadata at all), and — for request/channel only — the remaining inbound [`Flux`].
use crate::error::Error;
use crate::metadata::CompositeMetadata;
use crate::payload::Payload;
use crate::rsocket::{Flux, Mono};
use crate::Result;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::RwLock;

/// A registered request/response handler.
pub type ResponseHandler =
    std::sync::Arc<dyn Fn(Payload, Option<CompositeMetadata>) -> Mono<Result<Payload>> + Send + Sync>;

/// A registered request/stream handler.
pub type StreamHandler =
    std::sync::Arc<dyn Fn(Payload, Option<CompositeMetadata>) -> Flux<Result<Payload>> + Send + Sync>;

/// A registered request/channel handler: receives the first payload, its metadata, and the
/// rest of the requester's outbound stream; returns the responder's outbound stream.
pub type ChannelHandler = std::sync::Arc<
    dyn Fn(Payload, Option<CompositeMetadata>, Flux<Result<Payload>>) -> Flux<Result<Payload>>
        + Send
        + Sync,
>;

/// A registered fire-and-forget handler.
pub type FireAndForgetHandler =
    std::sync::Arc<dyn Fn(Payload, Option<CompositeMetadata>) -> Result<()> + Send + Sync>;

/// A registered metadata-push handler.
pub type MetadataPushHandler = std::sync::Arc<dyn Fn(Bytes, Option<CompositeMetadata>) + Send + Sync>;

/// Per-frame-type route table: a map of route string to handler, plus one optional
/// fallback invoked when a route isn't found.
struct RouteTable<H> {
    routes: DashMap<String, H>,
    unknown: RwLock<Option<H>>,
}

impl<H: Clone> RouteTable<H> {
    fn new() -> Self {
        RouteTable { routes: DashMap::new(), unknown: RwLock::new(None) }
    }

    fn register(&self, route: impl Into<String>, handler: H) -> Result<()> {
        let route = route.into();
        if route.is_empty() {
            return Err(Error::invalid("route must not be empty"));
        }
        if self.routes.contains_key(&route) {
            return Err(Error::invalid(format!("route {:?} is already registered", route)));
        }
        self.routes.insert(route, handler);
        Ok(())
    }

    fn register_unknown(&self, handler: H) -> Result<()> {
        let mut slot = self.unknown.write().unwrap();
        if slot.is_some() {
            return Err(Error::invalid("an unknown-route handler is already registered"));
        }
        *slot = Some(handler);
        Ok(())
    }

    fn lookup(&self, route: Option<&str>) -> Option<H> {
        if let Some(route) = route {
            if let Some(handler) = self.routes.get(route) {
                return Some(handler.clone());
            }
        }
        self.unknown.read().unwrap().clone()
    }
}

/// Dispatches incoming requests to registered handlers by route.
///
/// A `RequestRouter` is built once (via the `*_route`/`*_unknown` registration methods) and
/// then shared, read-only, across every connection a [`RoutingRequestHandler`] serves.
///
/// [`RoutingRequestHandler`]: crate::routing_handler::RoutingRequestHandler
#[derive(Default)]
pub struct RequestRouter {
    responses: RouteTable<ResponseHandler>,
    streams: RouteTable<StreamHandler>,
    channels: RouteTable<ChannelHandler>,
    fire_and_forgets: RouteTable<FireAndForgetHandler>,
    metadata_pushes: RouteTable<MetadataPushHandler>,
}

impl RequestRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        RequestRouter {
            responses: RouteTable::new(),
            streams: RouteTable::new(),
            channels: RouteTable::new(),
            fire_and_forgets: RouteTable::new(),
            metadata_pushes: RouteTable::new(),
        }
    }

    /// Registers a request/response handler for `route`.
    pub fn response(&self, route: impl Into<String>, handler: ResponseHandler) -> Result<()> {
        self.responses.register(route, handler)
    }

    /// Registers the request/response fallback invoked when no route matches.
    pub fn response_unknown(&self, handler: ResponseHandler) -> Result<()> {
        self.responses.register_unknown(handler)
    }

    /// Registers a request/stream handler for `route`.
    pub fn stream(&self, route: impl Into<String>, handler: StreamHandler) -> Result<()> {
        self.streams.register(route, handler)
    }

    /// Registers the request/stream fallback invoked when no route matches.
    pub fn stream_unknown(&self, handler: StreamHandler) -> Result<()> {
        self.streams.register_unknown(handler)
    }

    /// Registers a request/channel handler for `route`.
    pub fn channel(&self, route: impl Into<String>, handler: ChannelHandler) -> Result<()> {
        self.channels.register(route, handler)
    }

    /// Registers the request/channel fallback invoked when no route matches.
    pub fn channel_unknown(&self, handler: ChannelHandler) -> Result<()> {
        self.channels.register_unknown(handler)
    }

    /// Registers a fire-and-forget handler for `route`.
    pub fn fire_and_forget(&self, route: impl Into<String>, handler: FireAndForgetHandler) -> Result<()> {
        self.fire_and_forgets.register(route, handler)
    }

    /// Registers the fire-and-forget fallback invoked when no route matches.
    pub fn fire_and_forget_unknown(&self, handler: FireAndForgetHandler) -> Result<()> {
        self.fire_and_forgets.register_unknown(handler)
    }

    /// Registers a metadata-push handler for `route`.
    pub fn metadata_push(&self, route: impl Into<String>, handler: MetadataPushHandler) -> Result<()> {
        self.metadata_pushes.register(route, handler)
    }

    /// Registers the metadata-push fallback invoked when no route matches.
    pub fn metadata_push_unknown(&self, handler: MetadataPushHandler) -> Result<()> {
        self.metadata_pushes.register_unknown(handler)
    }

    pub(crate) fn route_response(&self, route: Option<&str>) -> Option<ResponseHandler> {
        self.responses.lookup(route)
    }

    pub(crate) fn route_stream(&self, route: Option<&str>) -> Option<StreamHandler> {
        self.streams.lookup(route)
    }

    pub(crate) fn route_channel(&self, route: Option<&str>) -> Option<ChannelHandler> {
        self.channels.lookup(route)
    }

    pub(crate) fn route_fire_and_forget(&self, route: Option<&str>) -> Option<FireAndForgetHandler> {
        self.fire_and_forgets.lookup(route)
    }

    pub(crate) fn route_metadata_push(&self, route: Option<&str>) -> Option<MetadataPushHandler> {
        self.metadata_pushes.lookup(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_route_is_rejected() {
        let router = RequestRouter::new();
        let err = router.response("", std::sync::Arc::new(|p, _| Box::pin(async move { Ok(p) }))).unwrap_err();
        assert!(err.is_invalid());
    }

    #[test]
    fn duplicate_route_is_rejected() {
        let router = RequestRouter::new();
        router.response("path1", std::sync::Arc::new(|p, _| Box::pin(async move { Ok(p) }))).unwrap();
        let err = router
            .response("path1", std::sync::Arc::new(|p, _| Box::pin(async move { Ok(p) })))
            .unwrap_err();
        assert!(err.is_invalid());
    }

    #[test]
    fn lookup_falls_back_to_unknown() {
        let router = RequestRouter::new();
        router
            .fire_and_forget_unknown(std::sync::Arc::new(|_, _| Ok(())))
            .unwrap();
        assert!(router.route_fire_and_forget(Some("nope")).is_some());
        assert!(router.route_fire_and_forget(None).is_some());
    }

    #[test]
    fn lookup_prefers_exact_route_over_unknown() {
        let router = RequestRouter::new();
        router
            .metadata_push("a.b", std::sync::Arc::new(|_, _| ()))
            .unwrap();
        router
            .metadata_push_unknown(std::sync::Arc::new(|_, _| panic!("should not be called")))
            .unwrap();
        assert!(router.route_metadata_push(Some("a.b")).is_some());
    }

    #[test]
    fn lookup_with_no_route_and_no_fallback_is_none() {
        let router = RequestRouter::new();
        assert!(router.route_response(None).is_none());
    }
}
