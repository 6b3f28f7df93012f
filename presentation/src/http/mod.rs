//! HTTP surface
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /api/chat/{session_id}/message` | start a generation, stream its text |
//! | `POST /api/chat/{session_id}/stop` | stop a session's generation |
//! | `GET /api/chat/active` | list sessions that are streaming |
//! | `GET /health` | liveness |

mod body_sink;
mod error;
mod handlers;
mod state;

pub use body_sink::{ChannelSink, channel_body};
pub use error::{ApiError, ErrorResponse};
pub use handlers::{ActiveSessionsResponse, HealthResponse, MessageRequest, StopResponse};
pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Build the relay router.
pub fn create_router(state: AppState, cors: bool) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/chat/active", get(handlers::active_sessions))
        .route(
            "/api/chat/{session_id}/message",
            post(handlers::send_message),
        )
        .route(
            "/api/chat/{session_id}/stop",
            post(handlers::stop_generation),
        )
        .with_state(state)
        .layer(trace_layer);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chatrelay_application::{
        BackendError, FragmentStream, GenerationBackend, GenerationRequest, RelayGenerationUseCase,
        SessionRegistry,
    };
    use chatrelay_domain::Fragment;
    use futures::StreamExt;
    use futures::stream;
    use serde_json::Value;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    /// Emits "Hello", then either " world" or nothing ever again.
    struct TestBackend {
        hang: bool,
    }

    #[async_trait]
    impl GenerationBackend for TestBackend {
        async fn generate(
            &self,
            _request: GenerationRequest,
            _cancellation: CancellationToken,
        ) -> Result<FragmentStream, BackendError> {
            let hello = stream::iter(vec![Ok(Fragment::new("Hello").unwrap())]);
            if self.hang {
                Ok(hello.chain(stream::pending()).boxed())
            } else {
                Ok(hello
                    .chain(stream::iter(vec![Ok(Fragment::new(" world").unwrap())]))
                    .boxed())
            }
        }
    }

    fn app(hang: bool) -> (Router, AppState) {
        let relay = RelayGenerationUseCase::new(
            Arc::new(TestBackend { hang }),
            Arc::new(SessionRegistry::new()),
        );
        let state = AppState::new(relay, 1);
        (create_router(state.clone(), true), state)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_empty(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(false);
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let payload = json(response).await;
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_message_streams_text_then_done_marker() {
        let (app, state) = app(false);
        let response = app
            .oneshot(post_json(
                "/api/chat/s1/message",
                serde_json::json!({"content": "Hi"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Hello world\n[DONE]");
        assert!(state.registry().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_start_conflicts_and_stop_ends_first_stream() {
        let (app, state) = app(true);

        let first = app
            .clone()
            .oneshot(post_json(
                "/api/chat/s1/message",
                serde_json::json!({"content": "Hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let mut first_body = first.into_body().into_data_stream();
        let chunk = first_body.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"Hello");

        let second = app
            .clone()
            .oneshot(post_json(
                "/api/chat/s1/message",
                serde_json::json!({"content": "Again"}),
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(json(second).await["code"], "ALREADY_ACTIVE");

        let active = json(app.clone().oneshot(get("/api/chat/active")).await.unwrap()).await;
        assert_eq!(active["sessions"], serde_json::json!(["s1"]));

        let stop = app
            .clone()
            .oneshot(post_empty("/api/chat/s1/stop"))
            .await
            .unwrap();
        assert_eq!(stop.status(), StatusCode::OK);
        assert_eq!(json(stop).await, serde_json::json!({"success": true}));

        let mut rest = Vec::new();
        while let Some(chunk) = first_body.next().await {
            rest.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(rest, b"\n[STOPPED]");
        assert!(state.registry().is_empty());
    }

    #[tokio::test]
    async fn test_stop_without_active_stream_is_not_found() {
        let (app, _) = app(false);
        let response = app.oneshot(post_empty("/api/chat/s9/stop")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json(response).await,
            serde_json::json!({"error": "No active stream found", "code": "NOT_FOUND"})
        );
    }

    #[tokio::test]
    async fn test_blank_content_is_bad_request() {
        let (app, state) = app(false);
        let response = app
            .oneshot(post_json(
                "/api/chat/s1/message",
                serde_json::json!({"content": "  "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "BAD_REQUEST");
        assert!(state.registry().is_empty());
    }

    #[tokio::test]
    async fn test_active_is_empty_when_idle() {
        let (app, _) = app(false);
        let payload = json(app.oneshot(get("/api/chat/active")).await.unwrap()).await;
        assert_eq!(payload, serde_json::json!({"sessions": []}));
    }
}
