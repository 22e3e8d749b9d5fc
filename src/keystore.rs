//! Keystore Module
//!
//! Locates the encrypted account key file, reads the passphrase from the
//! secret file, and decrypts the key. The key file follows the Web3 Secret
//! Storage (V3) format; the crypto envelope itself is handled by the
//! `eth-keystore` crate, this module only selects the file and verifies the
//! decrypted key against the file's `address` field.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::crypto::TransactionSigner;

// ============================================================================
// KEY FILE SELECTION
// ============================================================================

/// Filename prefix of V3 keystore files as written by geth-style tooling.
pub const KEY_FILE_PREFIX: &str = "UTC";

/// Errors selecting the account key file from the key directory.
#[derive(Debug, Error)]
pub enum KeyResolutionError {
    /// The directory holds no file with the `UTC` prefix.
    #[error("no key found in key directory")]
    NoKeyFound,
    /// The directory holds several `UTC` files and the account is ambiguous.
    #[error("found more than one key in key directory ({0} matches)")]
    MultipleKeysFound(usize),
}

/// Selects the single key file name from a directory listing.
///
/// Pure function over file names so the selection rule is testable without
/// touching the filesystem. Exactly one `UTC`-prefixed name must be present.
pub fn select_key_file(names: &[String]) -> Result<String, KeyResolutionError> {
    let mut matches: Vec<&String> = names
        .iter()
        .filter(|name| name.starts_with(KEY_FILE_PREFIX))
        .collect();

    match matches.len() {
        0 => Err(KeyResolutionError::NoKeyFound),
        1 => Ok(matches.remove(0).clone()),
        n => Err(KeyResolutionError::MultipleKeysFound(n)),
    }
}

/// Scans the key directory and returns the path of the single key file.
///
/// # Arguments
///
/// * `keydir` - Directory holding the encrypted account key
pub fn find_key_file(keydir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(keydir)
        .with_context(|| format!("Failed to read key directory '{}'", keydir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read key directory '{}'", keydir.display()))?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    let selected = select_key_file(&names)
        .with_context(|| format!("Failed to resolve key in '{}'", keydir.display()))?;
    Ok(keydir.join(selected))
}

// ============================================================================
// SECRET FILE
// ============================================================================

/// Reads the passphrase from the secret file: first line, trimmed.
pub fn read_secret(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read secret file '{}'", path.display()))?;
    Ok(contents.lines().next().unwrap_or("").trim().to_string())
}

// ============================================================================
// ACCOUNT UNLOCKING
// ============================================================================

/// Subset of the V3 keystore JSON read directly; the crypto envelope is
/// parsed by `eth-keystore` during decryption.
#[derive(Debug, Deserialize)]
struct KeyFileHeader {
    /// Account address stored alongside the encrypted key (no 0x prefix in
    /// geth-style files, but tolerated either way).
    address: String,
}

/// An account recovered from the encrypted key file.
#[derive(Debug)]
pub struct UnlockedAccount {
    /// EIP-55 checksummed address derived from the decrypted key.
    pub address: String,
    /// Signer holding the decrypted private key.
    pub signer: TransactionSigner,
}

/// Decrypts the key file with the passphrase and returns the account.
///
/// The address derived from the decrypted key must match the key file's
/// `address` field; a mismatch means the file is corrupt or mislabelled and
/// aborts the operation. A wrong passphrase surfaces as the underlying MAC
/// mismatch error from the keystore crate.
pub fn unlock_account(key_path: &Path, passphrase: &str) -> Result<UnlockedAccount> {
    let contents = fs::read_to_string(key_path)
        .with_context(|| format!("Failed to read key file '{}'", key_path.display()))?;
    let header: KeyFileHeader = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse key file '{}' as JSON", key_path.display()))?;

    let key_bytes = eth_keystore::decrypt_key(key_path, passphrase).with_context(|| {
        format!(
            "Failed to decrypt key file '{}' (wrong passphrase or corrupt file)",
            key_path.display()
        )
    })?;

    let signer = TransactionSigner::from_key_bytes(&key_bytes)?;
    let address = signer.address()?;

    let stored = header.address.strip_prefix("0x").unwrap_or(&header.address);
    let derived = address.strip_prefix("0x").unwrap_or(&address);
    if !stored.eq_ignore_ascii_case(derived) {
        return Err(anyhow::anyhow!(
            "Key file address 0x{} does not match address {} derived from the decrypted key",
            stored.to_lowercase(),
            address
        ));
    }

    Ok(UnlockedAccount { address, signer })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_key_file_single_match() {
        let listing = names(&[
            "UTC--2024-01-01T00-00-00Z--aabbcc",
            ".gitignore",
            "notes.txt",
        ]);
        assert_eq!(
            select_key_file(&listing).unwrap(),
            "UTC--2024-01-01T00-00-00Z--aabbcc"
        );
    }

    #[test]
    fn test_select_key_file_empty_directory() {
        assert!(matches!(
            select_key_file(&[]),
            Err(KeyResolutionError::NoKeyFound)
        ));
    }

    #[test]
    fn test_select_key_file_no_prefixed_entries() {
        let listing = names(&["keystore.json", "backup.tar"]);
        assert!(matches!(
            select_key_file(&listing),
            Err(KeyResolutionError::NoKeyFound)
        ));
    }

    #[test]
    fn test_select_key_file_multiple_matches() {
        let listing = names(&[
            "UTC--2024-01-01T00-00-00Z--aabbcc",
            "UTC--2024-02-02T00-00-00Z--ddeeff",
        ]);
        match select_key_file(&listing) {
            Err(KeyResolutionError::MultipleKeysFound(n)) => assert_eq!(n, 2),
            other => panic!("Expected MultipleKeysFound, got {:?}", other),
        }
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        assert_eq!(
            KeyResolutionError::NoKeyFound.to_string(),
            "no key found in key directory"
        );
        assert!(KeyResolutionError::MultipleKeysFound(3)
            .to_string()
            .contains("more than one key"));
    }
}
