//! Payout Address Update Tool
//!
//! Binary that changes the payout address registered for the local account
//! in the on-chain reward contract.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin change-payout-address -- --payoutAddress 0x... \
//!     [--keydir DIR] [--secret FILE] [--chain 0xNNNNN] [--rpc-url URL]
//! ```
//!
//! The JSON-RPC endpoint can also be set via the `WEB3_PROVIDER_URI`
//! environment variable.

use anyhow::Result;
use clap::Parser;
use payout_admin::config::{self, Config};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "change-payout-address")]
#[command(about = "Changes the payout address registered in the reward contract")]
struct Args {
    /// Directory holding the encrypted account key file
    #[arg(long, default_value = config::DEFAULT_KEYDIR)]
    keydir: PathBuf,

    /// Path of the passphrase file (first line is the passphrase)
    #[arg(long, default_value = config::DEFAULT_SECRET_PATH)]
    secret: PathBuf,

    /// New payout address to register (0x-prefixed hex)
    #[arg(long = "payoutAddress")]
    payout_address: String,

    /// Chain ID in hex (default: Volta)
    #[arg(long = "chain", default_value = "0x12047")]
    chain: String,

    /// JSON-RPC endpoint URL (default: WEB3_PROVIDER_URI env var, then localhost)
    #[arg(long = "rpc-url")]
    rpc_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first (before initializing logging)
    let args = Args::parse();

    // Initialize structured logging
    tracing_subscriber::fmt::init();

    let config = Config {
        keydir: args.keydir,
        secret_path: args.secret,
        payout_address: args.payout_address,
        chain_id: config::parse_chain_id(&args.chain)?,
        rpc_url: config::resolve_rpc_url(
            args.rpc_url,
            std::env::var(config::RPC_URL_ENV).ok(),
        ),
        ..Config::default()
    };
    config.validate()?;

    info!("Changing payout address to {}", config.payout_address);
    info!("Reward contract: {}", config.reward_contract);
    info!("Chain ID: 0x{:x}", config.chain_id);
    info!("RPC endpoint: {}", config.rpc_url);

    // Ctrl-C aborts the receipt wait; the transaction may still be mined.
    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl-C, aborting");
            ctrl_c_cancel.cancel();
        }
    });

    let tx_hash = payout_admin::run(&config, &cancel).await?;

    println!("Success. Tx hash: {}", tx_hash);
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_require_payout_address() {
        assert!(Args::try_parse_from(["change-payout-address"]).is_err());
    }

    #[test]
    fn test_args_parse_with_defaults() {
        let args = Args::try_parse_from([
            "change-payout-address",
            "--payoutAddress",
            "0x00000000000000000000000000000000000000aa",
        ])
        .unwrap();

        assert_eq!(
            args.payout_address,
            "0x00000000000000000000000000000000000000aa"
        );
        assert_eq!(args.keydir, PathBuf::from(config::DEFAULT_KEYDIR));
        assert_eq!(args.secret, PathBuf::from(config::DEFAULT_SECRET_PATH));
        assert_eq!(args.chain, "0x12047");
        assert!(args.rpc_url.is_none());
    }

    #[test]
    fn test_args_accept_overrides() {
        let args = Args::try_parse_from([
            "change-payout-address",
            "--payoutAddress",
            "0x00000000000000000000000000000000000000aa",
            "--keydir",
            "/tmp/keys",
            "--secret",
            "/tmp/secret",
            "--chain",
            "0x1",
            "--rpc-url",
            "http://node:8545",
        ])
        .unwrap();

        assert_eq!(args.keydir, PathBuf::from("/tmp/keys"));
        assert_eq!(args.chain, "0x1");
        assert_eq!(args.rpc_url.as_deref(), Some("http://node:8545"));
    }
}
