//! # Proxy Handler
//!
//! Translates one gRPC-Web request into one upstream gRPC call and back.
//!
//! [`GrpcWebProxy`] is installed as an `axum` middleware in front of any [`Router`]:
//!
//! 1. **Preflight**: `OPTIONS` requests are answered with `204 No Content` and permissive
//!    CORS headers.
//! 2. **Namespace**: paths outside `/<service>/` are handed to the wrapped router untouched.
//! 3. **Decode**: the body is read and its data frame extracted. A malformed frame ends the
//!    call with a trailer carrying `INTERNAL`.
//! 4. **Route**: an unknown method is answered with a bare `404`, without gRPC framing.
//! 5. **Execute**: the [`CallExecutor`] performs the upstream call.
//! 6. **Respond**: always `200 OK`, an optional data frame and exactly one trailer frame. The
//!    logical status of the call lives in the trailer, never in the HTTP status line.
use crate::{
    executor::{CallExecutor, DEFAULT_FAILURE_CODE},
    frame,
    router::{HabitMethod, MethodRouter},
};
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use bytes::{Bytes, BytesMut};
use http::{Method, StatusCode, header};
use std::sync::Arc;
use tonic::Status;

/// Content type of every gRPC-Web response produced by the proxy.
pub const CONTENT_TYPE_GRPC_WEB: &str = "application/grpc-web+proto";

const EXPOSED_HEADERS: &str = "grpc-status,grpc-message";

/// The gRPC-Web bridge. Cheap to clone: the router is shared and the executor only holds a
/// channel handle.
#[derive(Debug, Clone)]
pub struct GrpcWebProxy {
    router: Arc<MethodRouter>,
    executor: CallExecutor,
}

impl GrpcWebProxy {
    pub fn new(router: MethodRouter, executor: CallExecutor) -> Self {
        Self {
            router: Arc::new(router),
            executor,
        }
    }

    /// Installs the proxy in front of `next`.
    ///
    /// Requests the proxy does not handle reach `next`'s routes and fallback unchanged, so
    /// `next` must already contain all of them.
    pub fn wrap(self, next: Router) -> Router {
        next.layer(middleware::from_fn_with_state(self, grpc_web_proxy))
    }

    async fn serve(&self, request: Request) -> Response {
        let path = request.uri().path().to_owned();

        let body = match to_bytes(request.into_body(), usize::MAX).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "Failed to read request body");
                let status = Status::new(
                    DEFAULT_FAILURE_CODE,
                    format!("Failed to read request body: {err}"),
                );
                return grpc_web_response(Err(status));
            }
        };

        let payload = match frame::decode_data_frame(body) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "Rejecting malformed gRPC-Web frame");
                return grpc_web_response(Err(Status::internal(err.to_string())));
            }
        };

        let method = match self.router.route(&path) {
            Ok(method) => method,
            Err(err) => {
                tracing::debug!(path = %path, error = %err, "No such method");
                return StatusCode::NOT_FOUND.into_response();
            }
        };

        grpc_web_response(self.call(method, payload).await)
    }

    async fn call(&self, method: HabitMethod, payload: Bytes) -> Result<Bytes, Status> {
        tracing::debug!(
            method = method.name(),
            request_bytes = payload.len(),
            "Proxying gRPC-Web call"
        );

        match self.executor.execute(method, payload).await {
            Ok(response) => {
                tracing::debug!(
                    method = method.name(),
                    response_bytes = response.len(),
                    "Upstream call succeeded"
                );
                Ok(response)
            }
            Err(err) => {
                let status = err.into_status();
                tracing::warn!(
                    method = method.name(),
                    code = ?status.code(),
                    grpc_message = status.message(),
                    "Upstream call failed"
                );
                Err(status)
            }
        }
    }
}

/// The middleware function behind [`GrpcWebProxy::wrap`].
pub async fn grpc_web_proxy(
    State(proxy): State<GrpcWebProxy>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return preflight_response();
    }

    if !proxy.router.handles(request.uri().path()) {
        return next.run(request).await;
    }

    proxy.serve(request).await
}

fn preflight_response() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
        ],
    )
        .into_response()
}

/// Builds the `200 OK` response: the data frame on success, then the trailer frame.
fn grpc_web_response(outcome: Result<Bytes, Status>) -> Response {
    let mut body = BytesMut::new();

    let status = match outcome {
        Ok(message) => match frame::encode_data_frame(&message) {
            Ok(data) => {
                body.extend_from_slice(&data);
                Status::ok("")
            }
            Err(err) => Status::internal(err.to_string()),
        },
        Err(status) => status,
    };

    match frame::encode_trailer_frame(status.code(), status.message()) {
        Ok(trailer) => body.extend_from_slice(&trailer),
        Err(err) => {
            // Only reachable with a message of more than 4 GiB.
            tracing::error!(error = %err, "Failed to encode trailer frame");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, CONTENT_TYPE_GRPC_WEB),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
            (header::ACCESS_CONTROL_EXPOSE_HEADERS, EXPOSED_HEADERS),
        ],
        Body::from(body.freeze()),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, decode_frames, parse_trailer_block};
    use tonic::Code;

    async fn frames_of(response: Response) -> Vec<Frame> {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        decode_frames(body).unwrap()
    }

    #[tokio::test]
    async fn test_success_response_has_data_then_trailer() {
        let response = grpc_web_response(Ok(Bytes::from_static(b"\x08\x01")));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            CONTENT_TYPE_GRPC_WEB
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_EXPOSE_HEADERS],
            EXPOSED_HEADERS
        );

        let frames = frames_of(response).await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Frame::Data(Bytes::from_static(b"\x08\x01")));

        let Frame::Trailer(block) = &frames[1] else {
            panic!("Expected trailer frame last");
        };
        assert_eq!(
            parse_trailer_block(block).unwrap(),
            (Code::Ok, String::new())
        );
    }

    #[tokio::test]
    async fn test_failure_response_is_trailer_only() {
        let response = grpc_web_response(Err(Status::not_found("no habit: 'read'")));

        assert_eq!(response.status(), StatusCode::OK);

        let frames = frames_of(response).await;
        let [Frame::Trailer(block)] = frames.as_slice() else {
            panic!("Expected a single trailer frame, got {frames:?}");
        };
        assert_eq!(
            parse_trailer_block(block).unwrap(),
            (Code::NotFound, "no habit: 'read'".to_string())
        );
    }

    #[test]
    fn test_preflight_response() {
        let response = preflight_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "POST, OPTIONS"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
    }
}
