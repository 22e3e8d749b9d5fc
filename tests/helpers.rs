//! Shared test helpers for payout-admin tests
//!
//! This module provides constants and helper functions used by the keystore
//! and JSON-RPC tests: a well-known development key, keystore/secret fixture
//! builders, and JSON-RPC response builders.

#![allow(dead_code)]

use serde_json::json;
use std::path::{Path, PathBuf};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Passphrase used to encrypt the test keystore fixtures
pub const DUMMY_PASSPHRASE: &str = "hunter2";

/// Well-known development private key (Hardhat account #0)
pub const DUMMY_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// EIP-55 checksummed address of [`DUMMY_PRIVATE_KEY`]
pub const DUMMY_ACCOUNT_ADDR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Dummy new payout address (EVM format, 40 hex characters)
pub const DUMMY_PAYOUT_ADDR: &str = "0x00000000000000000000000000000000000000ab";

/// Dummy previously registered payout address (EVM format, 40 hex characters)
pub const DUMMY_OLD_PAYOUT_ADDR: &str = "0x00000000000000000000000000000000000000cd";

/// Dummy transaction hash (64 hex characters)
pub const DUMMY_TX_HASH: &str =
    "0x1111111111111111111111111111111111111111111111111111111111111111";

/// Keystore file name with the geth-style `UTC` prefix
pub const DUMMY_KEY_FILE_NAME: &str =
    "UTC--2024-01-01T00-00-00.000000000Z--f39fd6e51aad88f6f4ce6ab8827279cfffb92266";

// ============================================================================
// FIXTURE BUILDERS
// ============================================================================

/// Encrypts [`DUMMY_PRIVATE_KEY`] under [`DUMMY_PASSPHRASE`] into `dir`,
/// using the given file name, and returns the key file path.
pub fn write_keystore(dir: &Path, name: &str) -> PathBuf {
    let key_bytes = hex::decode(DUMMY_PRIVATE_KEY).expect("Test key must be valid hex");
    let mut rng = rand::thread_rng();
    eth_keystore::encrypt_key(dir, &mut rng, key_bytes, DUMMY_PASSPHRASE, Some(name))
        .expect("Failed to write keystore fixture");
    dir.join(name)
}

/// Writes a secret file holding the given passphrase on its first line.
pub fn write_secret(dir: &Path, passphrase: &str) -> PathBuf {
    let path = dir.join(".secret");
    std::fs::write(&path, format!("{}\n", passphrase)).expect("Failed to write secret fixture");
    path
}

// ============================================================================
// JSON-RPC RESPONSE BUILDERS
// ============================================================================

/// Wraps a result value in a JSON-RPC 2.0 response envelope.
pub fn rpc_result(result: serde_json::Value) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": 1
    })
}

/// Builds a JSON-RPC 2.0 error response.
pub fn rpc_error(code: i32, message: &str) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "error": { "code": code, "message": message },
        "id": 1
    })
}

/// Builds a transaction receipt result for the given hash and status.
pub fn receipt_result(tx_hash: &str, status: &str) -> serde_json::Value {
    rpc_result(json!({
        "transactionHash": tx_hash,
        "blockNumber": "0x10",
        "status": status
    }))
}

/// Builds the `eth_call` return word for `payoutAddresses(address)`: the
/// registered address left-padded to 32 bytes.
pub fn payout_address_word(address: &str) -> String {
    let clean = address.strip_prefix("0x").unwrap_or(address).to_lowercase();
    format!("0x{:0>64}", clean)
}
