//! Private submission channel
//!
//! Purpose:
//!     Two private paths around the public mempool:
//!       - Flashbots-style `eth_sendBundle` (single tx, next block, signed header)
//!       - `eth_sendRawTransaction` against a private RPC with a short timeout
//!
//! Author: AI-Generated
//! Created: 2026-10-18
//!
//! Notes:
//!     - One reqwest client per worker; the client timeout bounds both paths
//!     - X-Flashbots-Signature = "<address>:<sig>" where sig signs the hex
//!       keccak of the request body (EIP-191)
//!     - JSON-RPC errors from the private RPC are classified so sequencing
//!       conflicts surface to the controller

use super::PrivateChannel;
use crate::error::ChainError;
use alloy::hex;
use alloy::primitives::{keccak256, Bytes, TxHash};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub struct RelayClient {
    http: Client,
    bundle_url: Option<String>,
    private_rpc_url: String,
    auth: PrivateKeySigner,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    message: String,
}

impl RelayClient {
    pub fn new(
        bundle_url: Option<String>,
        private_rpc_url: String,
        auth: PrivateKeySigner,
        timeout: Duration,
    ) -> Result<Self, ChainError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Transport(format!("relay client build failed: {}", e)))?;

        Ok(Self {
            http,
            bundle_url,
            private_rpc_url,
            auth,
        })
    }

    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        signature: Option<String>,
    ) -> Result<(StatusCode, String), ChainError> {
        let mut request = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .body(body);

        if let Some(sig) = signature {
            let value = HeaderValue::from_str(&sig)
                .map_err(|e| ChainError::Signing(format!("signature header invalid: {}", e)))?;
            request = request.header("X-Flashbots-Signature", value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChainError::classify(format!("relay POST {} failed: {}", url, e)))?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Ok((status, text))
    }
}

/// JSON-RPC body for a single-transaction bundle targeting `target_block`
pub fn bundle_request_body(raw: &Bytes, target_block: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_sendBundle",
        "params": [{
            "txs": [format!("0x{}", hex::encode(raw))],
            "blockNumber": format!("0x{:x}", target_block),
        }]
    })
}

pub fn raw_transaction_body(raw: &Bytes) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_sendRawTransaction",
        "params": [format!("0x{}", hex::encode(raw))]
    })
}

/// Flashbots auth header value for `body`
pub fn flashbots_signature(key: &PrivateKeySigner, body: &[u8]) -> Result<String, ChainError> {
    let digest = format!("{:?}", keccak256(body));
    let sig = key
        .sign_message_sync(digest.as_bytes())
        .map_err(|e| ChainError::Signing(format!("bundle signing failed: {}", e)))?;
    Ok(format!("{}:0x{}", key.address(), hex::encode(sig.as_bytes())))
}

/// Interpret a private-RPC reply: a `result` is success, an `error` is
/// classified, anything else is "no result".
pub fn parse_relay_response(status: StatusCode, body: &str) -> Result<Option<TxHash>, ChainError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ChainError::RateLimited(format!("relay returned {}", status)));
    }

    let parsed: RpcResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(_) if !status.is_success() => {
            return Err(ChainError::classify(format!("relay returned {}: {}", status, body)))
        }
        Err(e) => return Err(ChainError::Decode(format!("relay body: {}", e))),
    };

    if let Some(err) = parsed.error {
        return Err(ChainError::classify(err.message));
    }

    match parsed.result {
        Some(Value::String(hash)) => hash
            .parse::<TxHash>()
            .map(Some)
            .map_err(|e| ChainError::Decode(format!("relay tx hash '{}': {}", hash, e))),
        _ => Ok(None),
    }
}

#[async_trait]
impl PrivateChannel for RelayClient {
    fn supports_bundles(&self) -> bool {
        self.bundle_url.is_some()
    }

    async fn send_bundle(&self, raw: &Bytes, target_block: u64) -> Result<(), ChainError> {
        let url = self
            .bundle_url
            .as_deref()
            .ok_or_else(|| ChainError::Transport("no bundle relay configured".into()))?;

        let body = serde_json::to_vec(&bundle_request_body(raw, target_block))
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        let signature = flashbots_signature(&self.auth, &body)?;

        let (status, text) = self.post(url, body, Some(signature)).await?;
        if status.is_success() {
            debug!("Bundle accepted by {} for block {}: {}", url, target_block, text);
            Ok(())
        } else {
            Err(ChainError::classify(format!(
                "bundle relay returned {}: {}",
                status, text
            )))
        }
    }

    async fn send_private(&self, raw: &Bytes) -> Result<Option<TxHash>, ChainError> {
        let body = serde_json::to_vec(&raw_transaction_body(raw))
            .map_err(|e| ChainError::Decode(e.to_string()))?;

        let (status, text) = self.post(&self.private_rpc_url, body, None).await?;
        parse_relay_response(status, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_bundle_body_targets_block_hex() {
        let raw = Bytes::from_static(&[0x02, 0xab]);
        let body = bundle_request_body(&raw, 19_000_001);
        assert_eq!(body["method"], "eth_sendBundle");
        assert_eq!(body["params"][0]["blockNumber"], "0x121eac1");
        assert_eq!(body["params"][0]["txs"][0], "0x02ab");
    }

    #[test]
    fn test_signature_header_shape() {
        let key: PrivateKeySigner = DEV_KEY.parse().unwrap();
        let header = flashbots_signature(&key, b"{}").unwrap();
        let (addr, sig) = header.split_once(':').unwrap();
        assert_eq!(addr.parse::<alloy::primitives::Address>().unwrap(), key.address());
        // 0x + 65 bytes hex
        assert_eq!(sig.len(), 2 + 130);
    }

    #[test]
    fn test_parse_relay_success() {
        let hash = format!("{:?}", TxHash::repeat_byte(0x42));
        let body = format!(r#"{{"jsonrpc":"2.0","id":1,"result":"{}"}}"#, hash);
        let parsed = parse_relay_response(StatusCode::OK, &body).unwrap();
        assert_eq!(parsed, Some(TxHash::repeat_byte(0x42)));
    }

    #[test]
    fn test_parse_relay_null_result() {
        let parsed = parse_relay_response(StatusCode::OK, r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap();
        assert_eq!(parsed, None);
    }

    #[test]
    fn test_parse_relay_nonce_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nonce too low"}}"#;
        let err = parse_relay_response(StatusCode::OK, body).unwrap_err();
        assert!(err.is_nonce_conflict());
    }

    #[test]
    fn test_parse_relay_throttled() {
        let err = parse_relay_response(StatusCode::TOO_MANY_REQUESTS, "slow down").unwrap_err();
        assert_eq!(err.kind(), "rate_limited");
    }
}
