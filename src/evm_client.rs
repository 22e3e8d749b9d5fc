//! EVM Client Module
//!
//! This module provides a client for communicating with an EVM-compatible
//! blockchain node via its JSON-RPC API. It covers the four operations the
//! payout-address update needs: nonce lookup, a read-only contract call,
//! raw transaction submission, and receipt polling.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

// ============================================================================
// API RESPONSE STRUCTURES
// ============================================================================

/// EVM JSON-RPC request wrapper
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<serde_json::Value>,
    id: u64,
}

/// EVM JSON-RPC response wrapper
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// EVM transaction receipt from JSON-RPC; only the fields this tool consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionReceipt {
    /// Transaction hash (JSON-RPC uses camelCase: transactionHash)
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    /// Block the transaction was mined in (hex string)
    #[serde(rename = "blockNumber")]
    pub block_number: Option<String>,
    /// Execution status ("0x1" = success, "0x0" = reverted, absent pre-Byzantium)
    pub status: Option<String>,
}

// ============================================================================
// EVM CLIENT IMPLEMENTATION
// ============================================================================

/// Client for communicating with an EVM-compatible node via JSON-RPC
pub struct EvmClient {
    /// HTTP client for making requests
    client: Client,
    /// Base URL of the EVM node (e.g., "http://127.0.0.1:8545")
    base_url: String,
}

impl EvmClient {
    /// Creates a new EVM client for the given node URL
    ///
    /// # Arguments
    ///
    /// * `node_url` - Base URL of the EVM node (e.g., "http://127.0.0.1:8545")
    ///
    /// # Returns
    ///
    /// * `Ok(EvmClient)` - Successfully created client
    /// * `Err(anyhow::Error)` - Failed to create client
    pub fn new(node_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: node_url.to_string(),
        })
    }

    /// Sends one JSON-RPC request and unwraps the typed result.
    async fn rpc_call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<Option<T>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response: JsonRpcResponse<T> = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, self.base_url))?
            .json()
            .await
            .with_context(|| {
                format!("Failed to parse {} response from {}", method, self.base_url)
            })?;

        if let Some(error) = response.error {
            return Err(anyhow::anyhow!(
                "JSON-RPC error from {}: {} (code: {})",
                self.base_url,
                error.message,
                error.code
            ));
        }

        Ok(response.result)
    }

    /// Queries the account's transaction count using eth_getTransactionCount
    ///
    /// Uses the "pending" block tag so an in-flight transaction from the same
    /// account is accounted for.
    ///
    /// # Arguments
    ///
    /// * `address` - Account address (0x-prefixed hex)
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Next nonce for the account
    /// * `Err(anyhow::Error)` - Failed to query transaction count
    pub async fn get_transaction_count(&self, address: &str) -> Result<u64> {
        let result: Option<String> = self
            .rpc_call(
                "eth_getTransactionCount",
                vec![serde_json::json!(address), serde_json::json!("pending")],
            )
            .await?;

        let nonce_hex = result
            .ok_or_else(|| anyhow::anyhow!("No result in eth_getTransactionCount response"))?;
        u64::from_str_radix(nonce_hex.strip_prefix("0x").unwrap_or(&nonce_hex), 16)
            .with_context(|| format!("Failed to parse nonce '{}'", nonce_hex))
    }

    /// Performs a read-only contract call using eth_call
    ///
    /// # Arguments
    ///
    /// * `to` - Contract address (0x-prefixed hex)
    /// * `data` - ABI-encoded calldata
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Hex-encoded return data
    /// * `Err(anyhow::Error)` - Failed to perform the call
    pub async fn call_contract(&self, to: &str, data: &[u8]) -> Result<String> {
        let call = serde_json::json!({
            "to": to,
            "data": format!("0x{}", hex::encode(data)),
        });

        let result: Option<String> = self
            .rpc_call("eth_call", vec![call, serde_json::json!("latest")])
            .await?;

        result.ok_or_else(|| anyhow::anyhow!("No result in eth_call response"))
    }

    /// Broadcasts a raw signed transaction using eth_sendRawTransaction
    ///
    /// # Arguments
    ///
    /// * `raw_tx` - RLP-encoded signed transaction bytes
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Transaction hash (0x-prefixed hex)
    /// * `Err(anyhow::Error)` - Node rejected the transaction or request failed
    pub async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<String> {
        let raw_hex = format!("0x{}", hex::encode(raw_tx));

        let result: Option<String> = self
            .rpc_call("eth_sendRawTransaction", vec![serde_json::json!(raw_hex)])
            .await?;

        result.ok_or_else(|| anyhow::anyhow!("No result in eth_sendRawTransaction response"))
    }

    /// Queries a transaction receipt using eth_getTransactionReceipt
    ///
    /// # Arguments
    ///
    /// * `tx_hash` - Transaction hash (0x-prefixed hex)
    ///
    /// # Returns
    ///
    /// * `Ok(Some(TransactionReceipt))` - Transaction is mined
    /// * `Ok(None)` - Transaction is still pending or unknown
    /// * `Err(anyhow::Error)` - Failed to query the receipt
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>> {
        self.rpc_call(
            "eth_getTransactionReceipt",
            vec![serde_json::json!(tx_hash)],
        )
        .await
    }

    /// Polls for the transaction receipt until it arrives, the timeout
    /// elapses, or the cancellation token fires.
    ///
    /// A mined receipt with status "0x0" means the call reverted and is
    /// reported as an error; a missing status field (pre-Byzantium node) is
    /// treated as success. Network failures during polling propagate
    /// immediately, there is no retry.
    ///
    /// # Arguments
    ///
    /// * `tx_hash` - Transaction hash to wait for
    /// * `timeout` - Maximum total time to wait
    /// * `poll_interval` - Delay between receipt queries
    /// * `cancel` - Token that aborts the wait (e.g. on Ctrl-C)
    pub async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        timeout: Duration,
        poll_interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<TransactionReceipt> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(receipt) = self.get_transaction_receipt(tx_hash).await? {
                if receipt.status.as_deref() == Some("0x0") {
                    return Err(anyhow::anyhow!(
                        "Transaction {} reverted (status 0x0)",
                        tx_hash
                    ));
                }
                return Ok(receipt);
            }

            debug!("No receipt yet for tx_hash={}, polling again", tx_hash);

            if tokio::time::Instant::now() + poll_interval > deadline {
                return Err(anyhow::anyhow!(
                    "Timed out after {:?} waiting for receipt of transaction {} \
                     (it may still be mined later)",
                    timeout,
                    tx_hash
                ));
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(anyhow::anyhow!(
                        "Cancelled while waiting for receipt of transaction {} \
                         (it may still be mined)",
                        tx_hash
                    ));
                }
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    /// Returns the base URL of this client
    #[allow(dead_code)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
