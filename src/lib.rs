//! Payout Address Administration Library
//!
//! This crate changes the payout address registered for an account in the
//! on-chain reward contract. It resolves the encrypted account key, decrypts
//! it with a passphrase from the secret file, then builds, signs, broadcasts
//! and confirms a single `setPayoutAddress(address)` transaction.

pub mod config;
pub mod crypto;
pub mod evm_client;
pub mod keystore;
pub mod tx;

// Re-export commonly used types
pub use config::Config;
pub use crypto::{to_checksum_address, TransactionSigner};
pub use evm_client::{EvmClient, TransactionReceipt};
pub use keystore::{KeyResolutionError, UnlockedAccount};
pub use tx::Transaction;

use anyhow::{Context, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Performs one payout-address update and returns the transaction hash.
///
/// Steps: read the passphrase, resolve and decrypt the account key, read the
/// currently registered payout address (informational), fetch the nonce,
/// build and sign the `setPayoutAddress` transaction, broadcast it, and wait
/// for the receipt. Any failure aborts the operation; nothing is retried.
///
/// # Arguments
///
/// * `config` - Validated settings for the update
/// * `cancel` - Token that aborts the receipt wait (e.g. on Ctrl-C)
pub async fn run(config: &Config, cancel: &CancellationToken) -> Result<String> {
    let passphrase = keystore::read_secret(&config.secret_path)?;
    let key_path = keystore::find_key_file(&config.keydir)?;
    let account = keystore::unlock_account(&key_path, &passphrase)?;
    drop(passphrase);

    info!("Using account {}", account.address);

    let client = EvmClient::new(&config.rpc_url)?;

    // Informational read of the currently registered payout address; a node
    // that rejects eth_call must not block the update.
    match read_current_payout_address(&client, config, &account.address).await {
        Ok(current) => info!("Currently registered payout address: {}", current),
        Err(e) => warn!("Could not read current payout address: {:#}", e),
    }

    let nonce = client
        .get_transaction_count(&account.address)
        .await
        .context("Failed to fetch account nonce")?;
    info!("Account nonce: {}", nonce);

    let transaction = Transaction {
        nonce,
        gas_price: config.gas_price,
        gas_limit: config.gas_limit,
        to: tx::decode_address(&config.reward_contract)?,
        value: 0,
        data: tx::set_payout_address_call(&config.payout_address)?,
        chain_id: config.chain_id,
    };

    let raw_tx = transaction.sign(&account.signer)?;
    let tx_hash = client
        .send_raw_transaction(&raw_tx)
        .await
        .context("Failed to broadcast transaction")?;
    info!("Transaction submitted: {}", tx_hash);

    let receipt = client
        .wait_for_receipt(
            &tx_hash,
            Duration::from_secs(config.receipt_timeout_secs),
            Duration::from_millis(config.receipt_poll_ms),
            cancel,
        )
        .await?;
    info!(
        "Transaction mined in block {}",
        receipt.block_number.as_deref().unwrap_or("<unknown>")
    );

    Ok(receipt.transaction_hash)
}

/// Reads the payout address currently registered for the account via the
/// contract's `payoutAddresses(address)` view function.
async fn read_current_payout_address(
    client: &EvmClient,
    config: &Config,
    account: &str,
) -> Result<String> {
    let calldata = tx::payout_addresses_call(account)?;
    let returned = client
        .call_contract(&config.reward_contract, &calldata)
        .await?;

    // The view returns one 32-byte word; the address is its last 20 bytes.
    let clean = returned.strip_prefix("0x").unwrap_or(&returned);
    if clean.len() < 64 {
        return Err(anyhow::anyhow!(
            "Unexpected eth_call return data '{}': expected a 32-byte word",
            returned
        ));
    }
    to_checksum_address(&clean[24..64])
}
