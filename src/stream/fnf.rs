//! Fire-and-forget driver: the requester sends and forgets, the responder's handler runs
//! with no result ever sent back.
use crate::connection::DuplexConnection;
use crate::fragment;
use crate::frame::FrameType;
use crate::payload::Payload;
use crate::rsocket::RSocket;
use crate::Result;
use std::sync::Arc;

/// Sends a REQUEST_FNF. The stream closes the moment the last fragment is written; there is
/// nothing further to await.
pub(crate) async fn request(
    conn: Arc<dyn DuplexConnection>,
    stream_id: u32,
    payload: Payload,
    fragment_size: usize,
) -> Result<()> {
    for frame in
        fragment::fragment_request(FrameType::REQUEST_FNF, stream_id, None, false, payload, fragment_size)
    {
        conn.send(frame).await?;
    }
    Ok(())
}

/// Invokes the handler for an incoming REQUEST_FNF. Any error is logged and never surfaced
/// to the requester, per the fire-and-forget contract.
pub(crate) fn respond(handler: Arc<dyn RSocket>, stream_id: u32, payload: Payload) {
    if let Err(err) = handler.fire_and_forget(payload) {
        tracing::error!(stream_id, %err, "fire-and-forget handler returned an error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingHandler;

    impl RSocket for FailingHandler {
        fn request_response(&self, _payload: Payload) -> crate::Mono<Result<Payload>> {
            unimplemented!()
        }
        fn request_stream(&self, _payload: Payload) -> crate::Flux<Result<Payload>> {
            unimplemented!()
        }
        fn request_channel(
            &self,
            _payloads: crate::Flux<Result<Payload>>,
        ) -> crate::Flux<Result<Payload>> {
            unimplemented!()
        }
        fn fire_and_forget(&self, _payload: Payload) -> Result<()> {
            Err(crate::error::Error::application_error("boom"))
        }
        fn metadata_push(&self, _metadata: bytes::Bytes) -> crate::Mono<Result<()>> {
            unimplemented!()
        }
    }

    #[test]
    fn responder_error_is_swallowed() {
        respond(Arc::new(FailingHandler), 7, Payload::default());
    }
}
