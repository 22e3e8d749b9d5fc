//! Cryptographic Operations Module
//!
//! Account signing for payout-address updates: secp256k1 key handling,
//! Ethereum address derivation, and EIP-55 checksum encoding.
//!
//! Private keys must never be exposed or logged.

use anyhow::Result;
use k256::ecdsa::{
    RecoveryId, Signature as EcdsaSignature, SigningKey as EcdsaSigningKey,
    VerifyingKey as EcdsaVerifyingKey,
};
use sha3::{Digest, Keccak256};

// ============================================================================
// TRANSACTION SIGNER
// ============================================================================

/// Signer for the account whose payout address is being changed.
///
/// Wraps the secp256k1 key recovered from the encrypted key file. The key
/// exists only inside this struct for the lifetime of one invocation; there
/// is intentionally no way to read it back out.
#[derive(Debug)]
pub struct TransactionSigner {
    /// ECDSA signing key (secp256k1)
    signing_key: EcdsaSigningKey,
}

impl TransactionSigner {
    /// Creates a signer from raw private key bytes.
    ///
    /// # Arguments
    ///
    /// * `key_bytes` - 32-byte secp256k1 private key
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self> {
        if key_bytes.len() != 32 {
            return Err(anyhow::anyhow!(
                "Invalid private key length: expected 32 bytes, got {}",
                key_bytes.len()
            ));
        }

        let secret_key_bytes: [u8; 32] = key_bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("Failed to convert private key to array"))?;

        let signing_key = EcdsaSigningKey::from_bytes(&secret_key_bytes.into())
            .map_err(|e| anyhow::anyhow!("Failed to create ECDSA signing key: {}", e))?;

        Ok(Self { signing_key })
    }

    /// Derives the Ethereum address controlled by this signer.
    ///
    /// The address is computed as keccak256(uncompressed_public_key)[12..32]
    /// and rendered in EIP-55 checksum form.
    pub fn address(&self) -> Result<String> {
        let verifying_key = self.signing_key.verifying_key();
        let public_key_point = verifying_key.to_encoded_point(false); // Uncompressed format
        let public_key_bytes = public_key_point.as_bytes();

        // Uncompressed format: 0x04 || x (32 bytes) || y (32 bytes) = 65 bytes total
        if public_key_bytes.len() != 65 || public_key_bytes[0] != 0x04 {
            return Err(anyhow::anyhow!(
                "Invalid public key format: expected 65 bytes with 0x04 prefix"
            ));
        }

        let hash = Keccak256::digest(&public_key_bytes[1..]);
        to_checksum_address(&hex::encode(&hash[12..]))
    }

    /// Signs a raw transaction hash with the ECDSA key.
    ///
    /// This does NOT apply the Ethereum signed message prefix — the caller is
    /// expected to pass a keccak256 hash of an RLP-encoded transaction.
    ///
    /// # Returns
    ///
    /// * `Ok((r, s, recovery_id))` — r and s are 32-byte big-endian, recovery_id is 0 or 1
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<([u8; 32], [u8; 32], u8)> {
        use k256::ecdsa::signature::hazmat::PrehashSigner;
        let signature: EcdsaSignature = self
            .signing_key
            .sign_prehash(hash)
            .map_err(|e| anyhow::anyhow!("Failed to sign transaction hash: {}", e))?;

        let sig_bytes = signature.to_bytes();
        if sig_bytes.len() != 64 {
            return Err(anyhow::anyhow!(
                "Invalid signature length: expected 64 bytes, got {}",
                sig_bytes.len()
            ));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&sig_bytes[..32]);
        s.copy_from_slice(&sig_bytes[32..64]);

        // Calculate recovery ID by trying both 0 and 1
        let verifying_key = self.signing_key.verifying_key();
        let public_key_point = verifying_key.to_encoded_point(false);
        let public_key_bytes = public_key_point.as_bytes();

        let recovery_id_0 = RecoveryId::new(false, false);
        let recovery_id = if let Ok(recovered) =
            EcdsaVerifyingKey::recover_from_prehash(hash, &signature, recovery_id_0)
        {
            let recovered_point = recovered.to_encoded_point(false);
            if recovered_point.as_bytes() == public_key_bytes {
                0u8
            } else {
                1u8
            }
        } else {
            1u8
        };

        Ok((r, s, recovery_id))
    }
}

// ============================================================================
// ADDRESS CHECKSUMMING
// ============================================================================

/// Renders an address in EIP-55 checksum form.
///
/// Accepts the address with or without the 0x prefix, in any letter case.
/// Letters are uppercased wherever the corresponding nibble of
/// keccak256(lowercase_hex) is 8 or higher.
pub fn to_checksum_address(address: &str) -> Result<String> {
    let clean = address.strip_prefix("0x").unwrap_or(address).to_lowercase();
    if clean.len() != 40 || !clean.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(anyhow::anyhow!(
            "Invalid address '{}': expected 40 hex characters",
            address
        ));
    }

    let digest = Keccak256::digest(clean.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");
    for (i, c) in clean.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            digest[i / 2] >> 4
        } else {
            digest[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    Ok(checksummed)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Well-known development key (Hardhat account #0).
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn test_signer() -> TransactionSigner {
        let key_bytes = hex::decode(TEST_PRIVATE_KEY).unwrap();
        TransactionSigner::from_key_bytes(&key_bytes).unwrap()
    }

    #[test]
    fn test_address_derivation_matches_known_account() {
        assert_eq!(test_signer().address().unwrap(), TEST_ADDRESS);
    }

    #[test]
    fn test_from_key_bytes_rejects_wrong_length() {
        assert!(TransactionSigner::from_key_bytes(&[0u8; 31]).is_err());
        assert!(TransactionSigner::from_key_bytes(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_sign_hash_is_deterministic() {
        let signer = test_signer();
        let hash = [0x42u8; 32];
        let first = signer.sign_hash(&hash).unwrap();
        let second = signer.sign_hash(&hash).unwrap();
        assert_eq!(first, second);
        assert!(first.2 <= 1, "recovery id must be 0 or 1");
    }

    #[test]
    fn test_checksum_known_vectors() {
        // Vectors from the EIP-55 reference list
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            assert_eq!(
                to_checksum_address(&expected.to_lowercase()).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn test_checksum_accepts_missing_prefix() {
        assert_eq!(
            to_checksum_address("fb6916095ca1df60bb79ce92ce3ea74c37c5d359").unwrap(),
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
        );
    }

    #[test]
    fn test_checksum_rejects_malformed_addresses() {
        assert!(to_checksum_address("0x1234").is_err());
        assert!(to_checksum_address("0xzz6916095ca1df60bb79ce92ce3ea74c37c5d359").is_err());
    }
}
