//! HTTP JSON-RPC chain client backed by `reqwest`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use chainwatch_core::error::ClientError;
use chainwatch_core::types::{format_quantity, parse_quantity, Transaction};
use chainwatch_core::ChainClient;

use crate::block::RawBlock;
use crate::request::{JsonRpcRequest, JsonRpcResponse, RpcId};

const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";

/// Configuration for [`HttpChainClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// JSON-RPC endpoint URL.
    pub url: String,
    /// Per-request timeout (milliseconds), connect and body included.
    pub timeout_ms: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".into(),
            timeout_ms: 5_000,
        }
    }
}

impl HttpClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Ethereum JSON-RPC client over HTTP.
pub struct HttpChainClient {
    url: String,
    http: reqwest::Client,
    timeout_ms: u64,
    next_id: AtomicU64,
}

impl HttpChainClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: config.url,
            http,
            timeout_ms: config.timeout_ms,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and return its `result`, `None` when the node answered
    /// with `null`.
    async fn call(
        &self,
        method: &'static str,
        params: Vec<Value>,
    ) -> Result<Option<Value>, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Http(format!("HTTP {status}: {body}")));
        }

        let body: JsonRpcResponse = resp.json().await.map_err(|e| self.transport_error(e))?;

        if let Some(err) = body.error {
            return Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        if body.id != RpcId::Number(id) {
            return Err(ClientError::IdMismatch {
                expected: id,
                got: body.id.to_string(),
            });
        }

        tracing::trace!(method, id, url = %self.url, "RPC call complete");
        Ok(body.result)
    }

    fn transport_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout { ms: self.timeout_ms }
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn block_number(&self) -> Result<u64, ClientError> {
        let result = self
            .call(ETH_BLOCK_NUMBER, vec![])
            .await?
            .ok_or_else(|| ClientError::Decode("eth_blockNumber returned null".into()))?;

        result
            .as_str()
            .and_then(parse_quantity)
            .ok_or_else(|| ClientError::Decode(format!("invalid block number {result}")))
    }

    async fn block_transactions(&self, number: u64) -> Result<Vec<Transaction>, ClientError> {
        let result = self
            .call(
                ETH_GET_BLOCK_BY_NUMBER,
                vec![json!(format_quantity(number)), json!(true)],
            )
            .await?
            .ok_or(ClientError::BlockUnavailable { number })?;

        let block: RawBlock = serde_json::from_value(result)
            .map_err(|e| ClientError::Decode(format!("block {number}: {e}")))?;
        block.into_transactions(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client(url: &str) -> HttpChainClient {
        HttpChainClient::new(HttpClientConfig {
            url: url.to_string(),
            timeout_ms: 500,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn block_number_parses_hex() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "jsonrpc": "2.0",
                "method": "eth_blockNumber",
                "params": [],
                "id": 1
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x12a05f2"}"#)
            .create_async()
            .await;

        let head = client(&server.url()).block_number().await.unwrap();
        assert_eq!(head, 19_531_250);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn block_transactions_requests_full_block() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBlockByNumber",
                "params": ["0x86e6", true]
            })))
            .with_status(200)
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"result":{"transactions":[
                    {"from":"0xd7def8de6bff40e7fa3a19b6749aca84bd5ba0ae",
                     "to":"0x00000000006c3852cbef3e08e8df289169ede581",
                     "value":"0xb1a2bc2ec50000","blockNumber":"0x86e6","transactionIndex":"0x0"}
                ]}}"#,
            )
            .create_async()
            .await;

        let txs = client(&server.url()).block_transactions(34534).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].to, "0x00000000006c3852cbef3e08e8df289169ede581");
        assert_eq!(txs[0].id(), (34534, 0));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn ids_increase_per_request() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"id": 1})))
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#)
            .create_async()
            .await;
        let second = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"id": 2})))
            .with_body(r#"{"jsonrpc":"2.0","id":2,"result":"0x2"}"#)
            .create_async()
            .await;

        let c = client(&server.url());
        assert_eq!(c.block_number().await.unwrap(), 1);
        assert_eq!(c.block_number().await.unwrap(), 2);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn null_block_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
            .create_async()
            .await;

        let err = client(&server.url()).block_transactions(99).await.unwrap_err();
        assert!(matches!(err, ClientError::BlockUnavailable { number: 99 }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn rpc_error_object() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"limit exceeded"}}"#,
            )
            .create_async()
            .await;

        let err = client(&server.url()).block_number().await.unwrap_err();
        match err {
            ClientError::Rpc { code, message } => {
                assert_eq!(code, -32005);
                assert_eq!(message, "limit exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn mismatched_id_is_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":42,"result":"0x1"}"#)
            .create_async()
            .await;

        let err = client(&server.url()).block_number().await.unwrap_err();
        assert!(matches!(err, ClientError::IdMismatch { expected: 1, .. }));
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let err = client(&server.url()).block_number().await.unwrap_err();
        assert!(matches!(err, ClientError::Http(ref m) if m.contains("502")));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body("not json")
            .create_async()
            .await;

        let err = client(&server.url()).block_number().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn slow_node_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and never answer.
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let err = client(&format!("http://{addr}"))
            .block_number()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout { ms: 500 }));
    }
}
