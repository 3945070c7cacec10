//! chainwatch-api: read-only HTTP views over ChainWatch state.
//!
//! | Method | Path                             | Success                 |
//! |--------|----------------------------------|-------------------------|
//! | GET    | `/health`                        | 200 `OK`                |
//! | GET    | `/block/number`                  | 200 `{"block":"0x…"}`   |
//! | POST   | `/address/subscribe`             | 204                     |
//! | GET    | `/address/transaction?address=…` | 200 `{"transactions":[…]}` |
//!
//! Errors are rendered as `{"message": "…"}`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;

use std::any::Any;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use chainwatch_core::Parser;

pub use config::ServerConfig;
pub use error::ApiError;

/// Build the API router.
pub fn router(parser: Arc<Parser>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/block/number", get(handlers::current_block))
        .route("/address/subscribe", post(handlers::subscribe))
        .route("/address/transaction", get(handlers::transactions))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(parser)
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_default();
    tracing::error!(panic = %message, "Handler panicked");
    ApiError::Internal.into_response()
}

/// Bind `config` and serve until `cancel` fires.
pub async fn serve(
    config: &ServerConfig,
    parser: Arc<Parser>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.addr()).await?;
    serve_on(listener, parser, cancel).await
}

/// Serve on an already bound listener until `cancel` fires. In-flight
/// requests are allowed to complete.
pub async fn serve_on(
    listener: TcpListener,
    parser: Arc<Parser>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "API server listening");
    axum::serve(listener, router(parser))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    tracing::info!("API server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use chainwatch_core::repository::{BlockRepository, TransactionRepository};
    use chainwatch_core::types::{Block, BlockStatus, Transaction};
    use chainwatch_storage::{
        InMemoryBlockStore, InMemorySubscriberStore, InMemoryTransactionStore,
    };

    struct Fixture {
        blocks: Arc<InMemoryBlockStore>,
        subscribers: Arc<InMemorySubscriberStore>,
        transactions: Arc<InMemoryTransactionStore>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                blocks: Arc::new(InMemoryBlockStore::new()),
                subscribers: Arc::new(InMemorySubscriberStore::new()),
                transactions: Arc::new(InMemoryTransactionStore::new()),
            }
        }

        fn parser(&self) -> Arc<Parser> {
            Arc::new(Parser::new(
                self.transactions.clone(),
                self.subscribers.clone(),
                self.blocks.clone(),
            ))
        }

        fn app(&self) -> Router {
            router(self.parser())
        }
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = send(Fixture::new().app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn current_block_as_hex() {
        let fx = Fixture::new();
        fx.blocks
            .upsert(Block::new(436, BlockStatus::Parsed))
            .await
            .unwrap();

        let (status, body) = send(fx.app(), get("/block/number")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), json!({"block": "0x1b4"}));
    }

    #[tokio::test]
    async fn current_block_before_anything_parsed() {
        let (status, body) = send(Fixture::new().app(), get("/block/number")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json(&body), json!({"message": "fail get block"}));
    }

    #[tokio::test]
    async fn subscribe_stores_address() {
        let fx = Fixture::new();
        let (status, body) = send(
            fx.app(),
            post_json("/address/subscribe", r#"{"address":"0xABC"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
        assert_eq!(fx.subscribers.len(), 1);
    }

    #[tokio::test]
    async fn subscribe_rejects_malformed_json() {
        let (status, body) = send(
            Fixture::new().app(),
            post_json("/address/subscribe", "{not json"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = json(&body)["message"].as_str().unwrap().to_string();
        assert!(message.starts_with("fail decode request"));
    }

    #[tokio::test]
    async fn subscribe_rejects_empty_address() {
        let fx = Fixture::new();
        let (status, _) = send(
            fx.app(),
            post_json("/address/subscribe", r#"{"address":"  "}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(fx.subscribers.is_empty());
    }

    #[tokio::test]
    async fn transactions_for_address() {
        let fx = Fixture::new();
        fx.transactions
            .save(Transaction {
                from: "0xaa".into(),
                to: "0xbb".into(),
                value: "0x10".into(),
                block_number: 5,
                transaction_index: 1,
            })
            .await
            .unwrap();

        let (status, body) = send(fx.app(), get("/address/transaction?address=0xBB")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json(&body),
            json!({"transactions": [{
                "from": "0xaa",
                "to": "0xbb",
                "value": "0x10",
                "blockNumber": 5,
                "transactionIndex": 1
            }]})
        );
    }

    #[tokio::test]
    async fn transactions_for_unknown_address_is_empty() {
        let (status, body) = send(
            Fixture::new().app(),
            get("/address/transaction?address=0xcc"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), json!({"transactions": []}));
    }

    #[tokio::test]
    async fn transactions_require_address() {
        for uri in ["/address/transaction", "/address/transaction?address="] {
            let (status, body) = send(Fixture::new().app(), get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json(&body), json!({"message": "address is required"}));
        }
    }

    #[tokio::test]
    async fn wrong_method_is_rejected() {
        let req = Request::builder()
            .method("POST")
            .uri("/block/number")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(Fixture::new().app(), req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(Fixture::new().app(), get("/address/subscribe")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    async fn boom() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn panics_become_500() {
        let app = Router::new()
            .route("/boom", axum::routing::get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let (status, body) = send(app, get("/boom")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(&body), json!({"message": "internal server error"}));
    }

    #[tokio::test]
    async fn server_stops_on_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cancel = CancellationToken::new();
        let server = tokio::spawn(serve_on(
            listener,
            Fixture::new().parser(),
            cancel.clone(),
        ));

        cancel.cancel();
        let stopped = tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .expect("server did not shut down");
        stopped.unwrap().unwrap();
    }
}
