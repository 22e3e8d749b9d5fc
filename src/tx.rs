//! Transaction Construction Module
//!
//! Legacy (pre-EIP-1559) transaction assembly for the reward contract:
//! ABI calldata encoding, the EIP-155 signing hash, and raw signed
//! transaction encoding ready for `eth_sendRawTransaction`.

use anyhow::{Context, Result};
use sha3::{Digest, Keccak256};

use crate::crypto::TransactionSigner;

// ============================================================================
// TRANSACTION STRUCTURE
// ============================================================================

/// A legacy contract-call transaction, immutable once built.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Account transaction count at submission time.
    pub nonce: u64,
    /// Gas price, in the network's smallest unit.
    pub gas_price: u64,
    /// Gas limit for the call.
    pub gas_limit: u64,
    /// Recipient contract address.
    pub to: [u8; 20],
    /// Transferred value in wei.
    pub value: u64,
    /// ABI-encoded calldata.
    pub data: Vec<u8>,
    /// EIP-155 chain ID.
    pub chain_id: u64,
}

impl Transaction {
    /// Computes the EIP-155 signing hash: the keccak256 of the RLP list
    /// `[nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]`.
    pub fn signing_hash(&self) -> [u8; 32] {
        let unsigned_items: Vec<Vec<u8>> = vec![
            rlp_encode_u64(self.nonce),
            rlp_encode_u64(self.gas_price),
            rlp_encode_u64(self.gas_limit),
            self.to.to_vec(),
            rlp_encode_u64(self.value),
            self.data.clone(),
            rlp_encode_u64(self.chain_id),
            vec![], // 0
            vec![], // 0
        ];
        let unsigned_rlp = rlp_encode_list(&unsigned_items);

        let mut hasher = Keccak256::new();
        hasher.update(&unsigned_rlp);
        hasher.finalize().into()
    }

    /// Signs the transaction and returns the raw RLP bytes:
    /// `[nonce, gasPrice, gasLimit, to, value, data, v, r, s]` with
    /// `v = recovery_id + chainId * 2 + 35`.
    pub fn sign(&self, signer: &TransactionSigner) -> Result<Vec<u8>> {
        let hash = self.signing_hash();
        let (r, s, recovery_id) = signer
            .sign_hash(&hash)
            .context("Failed to sign transaction")?;

        let v = (recovery_id as u64) + self.chain_id * 2 + 35;

        // r and s are integers in RLP terms: leading zero bytes must be
        // stripped or nodes reject the encoding as non-canonical.
        let signed_items: Vec<Vec<u8>> = vec![
            rlp_encode_u64(self.nonce),
            rlp_encode_u64(self.gas_price),
            rlp_encode_u64(self.gas_limit),
            self.to.to_vec(),
            rlp_encode_u64(self.value),
            self.data.clone(),
            rlp_encode_u64(v),
            strip_leading_zeros(&r),
            strip_leading_zeros(&s),
        ];
        Ok(rlp_encode_list(&signed_items))
    }
}

// ============================================================================
// ABI ENCODING
// ============================================================================

/// Decodes a 20-byte hex address, with or without the 0x prefix.
pub fn decode_address(address: &str) -> Result<[u8; 20]> {
    let clean = address.strip_prefix("0x").unwrap_or(address);
    let bytes = hex::decode(clean)
        .with_context(|| format!("Failed to decode address '{}' as hex", address))?;
    if bytes.len() != 20 {
        return Err(anyhow::anyhow!(
            "Invalid address '{}': expected 20 bytes, got {}",
            address,
            bytes.len()
        ));
    }

    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Builds calldata for `setPayoutAddress(address)`: the 4-byte function
/// selector followed by the payout address left-padded to a 32-byte word.
pub fn set_payout_address_call(payout_address: &str) -> Result<Vec<u8>> {
    // Function selector: keccak256("setPayoutAddress(address)")[0..4]
    let selector = &Keccak256::digest(b"setPayoutAddress(address)")[..4];
    let address = decode_address(payout_address)?;

    let mut calldata = Vec::with_capacity(36);
    calldata.extend_from_slice(selector);
    let mut padded = [0u8; 32];
    padded[12..].copy_from_slice(&address);
    calldata.extend_from_slice(&padded);

    Ok(calldata)
}

/// Builds calldata for the `payoutAddresses(address)` view function, used to
/// read the currently registered payout address of an account.
pub fn payout_addresses_call(account: &str) -> Result<Vec<u8>> {
    // Function selector: keccak256("payoutAddresses(address)")[0..4]
    let selector = &Keccak256::digest(b"payoutAddresses(address)")[..4];
    let address = decode_address(account)?;

    let mut calldata = Vec::with_capacity(36);
    calldata.extend_from_slice(selector);
    let mut padded = [0u8; 32];
    padded[12..].copy_from_slice(&address);
    calldata.extend_from_slice(&padded);

    Ok(calldata)
}

// ============================================================================
// RLP ENCODING HELPERS (for legacy transactions)
// ============================================================================

/// Encode a u64 as big-endian bytes with no leading zeros (RLP integer format).
fn rlp_encode_u64(val: u64) -> Vec<u8> {
    if val == 0 {
        return vec![];
    }
    let bytes = val.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(8);
    bytes[start..].to_vec()
}

/// Strip leading zero bytes so a fixed-width big-endian value encodes as an
/// RLP integer.
fn strip_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}

/// RLP-encode a single byte-string item.
fn rlp_encode_item(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        // Single byte below 0x80: encoded as itself
        vec![data[0]]
    } else if data.is_empty() {
        // Empty bytes: 0x80
        vec![0x80]
    } else if data.len() <= 55 {
        let mut out = vec![0x80 + data.len() as u8];
        out.extend_from_slice(data);
        out
    } else {
        let len_bytes = rlp_encode_u64(data.len() as u64);
        let mut out = vec![0xb7 + len_bytes.len() as u8];
        out.extend_from_slice(&len_bytes);
        out.extend_from_slice(data);
        out
    }
}

/// RLP-encode a list of items (each item is raw bytes, NOT yet RLP-encoded).
fn rlp_encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = Vec::new();
    for item in items {
        payload.extend(rlp_encode_item(item));
    }

    if payload.len() <= 55 {
        let mut out = vec![0xc0 + payload.len() as u8];
        out.extend(payload);
        out
    } else {
        let len_bytes = rlp_encode_u64(payload.len() as u64);
        let mut out = vec![0xf7 + len_bytes.len() as u8];
        out.extend_from_slice(&len_bytes);
        out.extend(payload);
        out
    }
}

// ============================================================================
// TESTS
// ============================================================================
