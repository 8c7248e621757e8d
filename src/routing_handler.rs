//! A responder [`RSocket`] that dispatches every incoming request to a handler registered
//! in a [`RequestRouter`] by route, optionally gating every dispatch (including the
//! unknown-route fallback) behind an authenticator callback.
//!
//! Grounded in `examples/original_source/rsocket/routing/routing_request_handler.py`: the
//! Python original pulls the route and credentials out of composite metadata before handing
//! off to the matching handler, and rejects the request outright when no handler matches and
//! no fallback is registered. This module follows the same shape using this crate's own
//! `CompositeMetadata`/`RoutingMetadata`/`Authentication` decoders.
use crate::error::Error;
use crate::frame::Encode;
use crate::metadata::{Authentication, CompositeMetadata, RoutingMetadata};
use crate::mimetype::WellKnownMimeType;
use crate::payload::Payload;
use crate::router::RequestRouter;
use crate::rsocket::{Flux, Mono, RSocket};
use crate::runtime;
use crate::Result;

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

/// Verifies a decoded [`Authentication`] entry against a username/password, bearer token, or
/// custom scheme. Returning `Err` rejects the request with that error.
pub type Authenticator = Arc<dyn Fn(&Authentication) -> Result<()> + Send + Sync>;

/// Parsed composite metadata of an incoming request: the route (if a routing entry was
/// present) and the full [`CompositeMetadata`] so handlers can reach any other entry.
struct Routed {
    route: Option<String>,
    composite: Option<CompositeMetadata>,
}

/// Dispatches every interaction model to a [`RequestRouter`] entry by route.
///
/// Construct with [`RoutingRequestHandler::new`], or [`RoutingRequestHandler::with_authenticator`]
/// to require an authentication metadata entry on every request before a handler (including the
/// unknown-route fallback) is invoked.
pub struct RoutingRequestHandler {
    router: Arc<RequestRouter>,
    authenticator: Option<Authenticator>,
}

impl RoutingRequestHandler {
    /// Creates a handler that dispatches by route only, without authentication.
    pub fn new(router: Arc<RequestRouter>) -> Self {
        RoutingRequestHandler { router, authenticator: None }
    }

    /// Creates a handler that requires a valid authentication metadata entry before any
    /// request is dispatched.
    pub fn with_authenticator(router: Arc<RequestRouter>, authenticator: Authenticator) -> Self {
        RoutingRequestHandler { router, authenticator: Some(authenticator) }
    }

    /// Parses the route and full composite metadata out of `payload`, and — if an
    /// authenticator is configured — requires and verifies an authentication entry.
    ///
    /// Runs identically whether or not a route was found, so authentication always precedes
    /// dispatch, including on the unknown-route fallback path.
    fn route_and_authenticate(&self, payload: &Payload) -> Result<Routed> {
        let composite = match payload.metadata() {
            Some(metadata) => Some(CompositeMetadata::parse(metadata)?),
            None => None,
        };

        let route = match &composite {
            Some(composite) => composite
                .find(WellKnownMimeType::MESSAGE_X_RSOCKET_ROUTING_V0)
                .map(|entry| RoutingMetadata::parse(entry.content()))
                .transpose()
                .map_err(|e| Error::invalid(e.to_string()))?
                .and_then(|routing| routing.route().map(str::to_owned)),
            None => None,
        };

        if let Some(authenticator) = &self.authenticator {
            let entry = composite
                .as_ref()
                .and_then(|composite| composite.find(WellKnownMimeType::MESSAGE_X_RSOCKET_AUTHENTICATION_V0))
                .ok_or_else(|| Error::rejected("authentication required"))?;
            let authentication =
                Authentication::parse(entry.content()).map_err(|e| Error::invalid(e.to_string()))?;
            authenticator(&authentication)?;
        }

        Ok(Routed { route, composite })
    }
}

impl RSocket for RoutingRequestHandler {
    fn request_response(&self, payload: Payload) -> Mono<Result<Payload>> {
        let routed = match self.route_and_authenticate(&payload) {
            Ok(routed) => routed,
            Err(err) => return Box::pin(async move { Err(err) }),
        };
        match self.router.route_response(routed.route.as_deref()) {
            Some(handler) => handler(payload, routed.composite),
            None => {
                let route = routed.route;
                Box::pin(async move { Err(Error::rejected(format!("no handler for route {:?}", route))) })
            }
        }
    }

    fn request_stream(&self, payload: Payload) -> Flux<Result<Payload>> {
        let routed = match self.route_and_authenticate(&payload) {
            Ok(routed) => routed,
            Err(err) => return Box::pin(tokio_stream::once(Err(err))),
        };
        match self.router.route_stream(routed.route.as_deref()) {
            Some(handler) => handler(payload, routed.composite),
            None => {
                let route = routed.route;
                Box::pin(tokio_stream::once(Err(Error::rejected(format!(
                    "no handler for route {:?}",
                    route
                )))))
            }
        }
    }

    fn request_channel(&self, payloads: Flux<Result<Payload>>) -> Flux<Result<Payload>> {
        let router = self.router.clone();
        let authenticator = self.authenticator.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        runtime::spawn(async move {
            let mut payloads = payloads;
            let first = match payloads.next().await {
                Some(Ok(first)) => first,
                Some(Err(err)) => {
                    let _ = tx.send(Err(err));
                    return;
                }
                None => return,
            };

            let handler_and_rest = {
                let handler = RoutingRequestHandler { router: router.clone(), authenticator };
                match handler.route_and_authenticate(&first) {
                    Ok(routed) => router
                        .route_channel(routed.route.as_deref())
                        .map(|handler| (handler, routed.composite))
                        .ok_or_else(|| Error::rejected(format!("no handler for route {:?}", routed.route))),
                    Err(err) => Err(err),
                }
            };

            let (handler, composite) = match handler_and_rest {
                Ok(pair) => pair,
                Err(err) => {
                    let _ = tx.send(Err(err));
                    return;
                }
            };

            let mut outbound = handler(first, composite, payloads);
            while let Some(item) = outbound.next().await {
                if tx.send(item).is_err() {
                    break;
                }
            }
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }

    fn fire_and_forget(&self, payload: Payload) -> Result<()> {
        let routed = self.route_and_authenticate(&payload)?;
        match self.router.route_fire_and_forget(routed.route.as_deref()) {
            Some(handler) => handler(payload, routed.composite),
            None => Err(Error::rejected(format!("no handler for route {:?}", routed.route))),
        }
    }

    fn metadata_push(&self, metadata: Bytes) -> Mono<Result<()>> {
        let composite = match CompositeMetadata::parse(&metadata) {
            Ok(composite) => Some(composite),
            Err(err) => return Box::pin(async move { Err(err.into()) }),
        };
        let route = composite
            .as_ref()
            .and_then(|composite| composite.find(WellKnownMimeType::MESSAGE_X_RSOCKET_ROUTING_V0))
            .map(|entry| RoutingMetadata::parse(entry.content()))
            .transpose();
        let route = match route {
            Ok(route) => route.and_then(|routing| routing.route().map(str::to_owned)),
            Err(err) => return Box::pin(async move { Err(Error::invalid(err.to_string())) }),
        };

        if let Some(authenticator) = &self.authenticator {
            let entry = composite
                .as_ref()
                .and_then(|composite| composite.find(WellKnownMimeType::MESSAGE_X_RSOCKET_AUTHENTICATION_V0));
            let entry = match entry {
                Some(entry) => entry,
                None => return Box::pin(async move { Err(Error::rejected("authentication required")) }),
            };
            let authentication = match Authentication::parse(entry.content()) {
                Ok(authentication) => authentication,
                Err(err) => return Box::pin(async move { Err(Error::invalid(err.to_string())) }),
            };
            if let Err(err) = authenticator(&authentication) {
                return Box::pin(async move { Err(err) });
            }
        }

        match self.router.route_metadata_push(route.as_deref()) {
            Some(handler) => {
                handler(metadata, composite);
                Box::pin(async move { Ok(()) })
            }
            None => Box::pin(async move { Err(Error::rejected(format!("no handler for route {:?}", route))) }),
        }
    }

    /// Rejects `SETUP`s that don't negotiate composite metadata, since every route and
    /// authentication entry this handler reads is carried inside it.
    fn on_setup(&self, _data_mimetype: &str, metadata_mimetype: &str) -> Result<()> {
        let composite_mimetype: &str = WellKnownMimeType::MESSAGE_X_RSOCKET_COMPOSITE_METADATA_V0.into();
        if metadata_mimetype != composite_mimetype {
            return Err(Error::unsupported_setup(format!(
                "metadata mimetype {:?} is not {:?}",
                metadata_mimetype, composite_mimetype
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::CompositeMetadataEntry;

    fn routed_payload(route: &str) -> Payload {
        let routing = RoutingMetadata::from_route(route);
        let entry = CompositeMetadataEntry::new(
            WellKnownMimeType::MESSAGE_X_RSOCKET_ROUTING_V0,
            routing.to_bytes(),
        );
        let composite = CompositeMetadata::from_entries(vec![entry]);
        Payload::builder()
            .set_data(Bytes::from_static(b"hello"))
            .set_metadata(composite.to_bytes())
            .build()
    }

    #[tokio::test]
    async fn dispatches_to_registered_route() {
        let router = Arc::new(RequestRouter::new());
        router
            .response(
                "echo",
                Arc::new(|payload, _metadata| Box::pin(async move { Ok(payload) })),
            )
            .unwrap();
        let handler = RoutingRequestHandler::new(router);

        let result = handler.request_response(routed_payload("echo")).await.unwrap();
        assert_eq!(result.data_utf8().unwrap(), "hello");
    }

    #[tokio::test]
    async fn unknown_route_without_fallback_is_rejected() {
        let router = Arc::new(RequestRouter::new());
        let handler = RoutingRequestHandler::new(router);

        let err = handler.request_response(routed_payload("missing")).await.unwrap_err();
        assert!(err.is_rejected());
    }

    #[tokio::test]
    async fn missing_authentication_is_rejected_before_dispatch() {
        let router = Arc::new(RequestRouter::new());
        router
            .response("echo", Arc::new(|payload, _metadata| Box::pin(async move { Ok(payload) })))
            .unwrap();
        let handler = RoutingRequestHandler::with_authenticator(router, Arc::new(|_auth| Ok(())));

        let err = handler.request_response(routed_payload("echo")).await.unwrap_err();
        assert!(err.is_rejected());
    }
}
