//! Configuration Management Module
//!
//! Defaults, resolution helpers, and validation for the payout-address
//! update tool. All settings live on an explicit [`Config`] struct that the
//! binary assembles from CLI arguments, environment variables, and defaults.

use anyhow::{Context, Result};
use std::path::PathBuf;
use url::Url;

// ============================================================================
// DEFAULTS
// ============================================================================

/// Reward contract address on the Volta network.
pub const REWARD_CONTRACT: &str = "0x1204700000000000000000000000000000000003";

/// Volta chain ID (0x12047 = 73799).
pub const DEFAULT_CHAIN_ID: u64 = 0x12047;

/// Default directory holding the encrypted account key file.
pub const DEFAULT_KEYDIR: &str = "docker-stack/chain-data/keys/Volta/";

/// Default path of the passphrase file.
pub const DEFAULT_SECRET_PATH: &str = "docker-stack/.secret";

/// Default JSON-RPC endpoint, used when neither the CLI flag nor the
/// environment variable provides one.
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Environment variable consulted for the JSON-RPC endpoint.
pub const RPC_URL_ENV: &str = "WEB3_PROVIDER_URI";

const DEFAULT_GAS_LIMIT: u64 = 100_000;
const DEFAULT_GAS_PRICE: u64 = 10;
const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RECEIPT_POLL_MS: u64 = 500;

// ============================================================================
// CONFIGURATION STRUCTURE
// ============================================================================

/// Settings for a single payout-address update.
///
/// Holds the key-material locations, the fixed contract call parameters, and
/// the network settings for one transaction.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for the encrypted key file.
    pub keydir: PathBuf,
    /// Path of the passphrase file (first line is the passphrase).
    pub secret_path: PathBuf,
    /// New payout address to register, hex with 0x prefix.
    pub payout_address: String,
    /// EIP-155 chain ID the transaction is signed for.
    pub chain_id: u64,
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Address of the reward contract.
    pub reward_contract: String,
    /// Gas limit for the setPayoutAddress call.
    pub gas_limit: u64,
    /// Gas price, in the network's smallest unit.
    pub gas_price: u64,
    /// Maximum time to wait for the transaction receipt, in seconds.
    pub receipt_timeout_secs: u64,
    /// Delay between receipt polls, in milliseconds.
    pub receipt_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keydir: PathBuf::from(DEFAULT_KEYDIR),
            secret_path: PathBuf::from(DEFAULT_SECRET_PATH),
            payout_address: String::new(),
            chain_id: DEFAULT_CHAIN_ID,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            reward_contract: REWARD_CONTRACT.to_string(),
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            receipt_timeout_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
            receipt_poll_ms: DEFAULT_RECEIPT_POLL_MS,
        }
    }
}

impl Config {
    /// Checks that the configuration is usable before any file or network
    /// access happens.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Configuration is valid
    /// - `Err(anyhow::Error)` - Description of the offending setting
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.rpc_url).with_context(|| {
            format!("Configuration error: invalid RPC URL '{}'", self.rpc_url)
        })?;

        let contract = self
            .reward_contract
            .strip_prefix("0x")
            .unwrap_or(&self.reward_contract);
        let decoded = hex::decode(contract);
        if decoded.map(|bytes| bytes.len() != 20).unwrap_or(true) {
            return Err(anyhow::anyhow!(
                "Configuration error: reward contract '{}' is not a 20-byte hex address",
                self.reward_contract
            ));
        }

        if self.payout_address.is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration error: payout address is empty"
            ));
        }

        Ok(())
    }
}

// ============================================================================
// RESOLUTION HELPERS
// ============================================================================

/// Resolves the JSON-RPC endpoint URL.
///
/// Priority: CLI argument > `WEB3_PROVIDER_URI` environment variable >
/// default endpoint.
pub fn resolve_rpc_url(cli_value: Option<String>, env_value: Option<String>) -> String {
    cli_value
        .or(env_value)
        .unwrap_or_else(|| DEFAULT_RPC_URL.to_string())
}

/// Parses a chain ID given in hex format, with or without the 0x prefix.
pub fn parse_chain_id(value: &str) -> Result<u64> {
    let clean = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(clean, 16)
        .with_context(|| format!("Failed to parse chain ID '{}' as hex", value))
}

// ============================================================================
// TESTS
// ============================================================================
