//! # Local Signer
//!
//! In-process secp256k1 key producing Ethereum-style recoverable
//! signatures. Used to provision owners in tests and the demo binary.

use crate::adapters::recovery::address_from_verifying_key;
use crate::domain::services::hash_message;
use crate::domain::signature::RecoverableSignature;
use crate::domain::value_objects::{Address, Hash};
use crate::errors::SignatureError;
use k256::ecdsa::{RecoveryId, SigningKey};

/// secp256k1 signing key with its derived address.
pub struct LocalSigner {
    signing_key: SigningKey,
    address: Address,
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl LocalSigner {
    /// Generates a fresh random key.
    #[must_use]
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Loads a key from its 32-byte secret. Returns None if out of range.
    #[must_use]
    pub fn from_bytes(secret: &[u8; 32]) -> Option<Self> {
        SigningKey::from_slice(secret).ok().map(Self::from_signing_key)
    }

    /// Parses a hex secret with or without `0x`.
    #[must_use]
    pub fn from_hex(secret: &str) -> Option<Self> {
        let bytes = hex::decode(secret.strip_prefix("0x").unwrap_or(secret)).ok()?;
        let secret: [u8; 32] = bytes.try_into().ok()?;
        Self::from_bytes(&secret)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = address_from_verifying_key(signing_key.verifying_key());
        Self {
            signing_key,
            address,
        }
    }

    /// Address controlled by this key.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Signs a 32-byte digest as-is. Returns `r ‖ s ‖ v` with low S and
    /// `v` in {27, 28}.
    pub fn sign_hash(&self, digest: &Hash) -> Result<[u8; 65], SignatureError> {
        let (sig, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|_| SignatureError::SigningFailed)?;

        let (sig, recovery_id) = match sig.normalize_s() {
            Some(normalized) => (
                normalized,
                RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
            ),
            None => (sig, recovery_id),
        };

        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            r,
            s,
            y_parity: u8::from(recovery_id.is_y_odd()),
        }
        .to_bytes())
    }

    /// EIP-191 `personal_sign`: signs `hash_message(message)`.
    pub fn sign_message(&self, message: &[u8]) -> Result<[u8; 65], SignatureError> {
        self.sign_hash(&hash_message(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARDHAT_KEY_0: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_known_address() {
        let signer = LocalSigner::from_hex(HARDHAT_KEY_0).unwrap();
        assert_eq!(
            hex::encode(signer.address().as_bytes()),
            "f39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_secrets_rejected() {
        assert!(LocalSigner::from_bytes(&[0u8; 32]).is_none());
        assert!(LocalSigner::from_bytes(&[0xFF; 32]).is_none());
        assert!(LocalSigner::from_hex("0x1234").is_none());
        assert!(LocalSigner::from_hex("not hex").is_none());
    }

    #[test]
    fn test_signatures_are_deterministic_and_low_s() {
        let signer = LocalSigner::from_hex(HARDHAT_KEY_0).unwrap();
        let a = signer.sign_message(b"Hello World").unwrap();
        let b = signer.sign_message(b"Hello World").unwrap();
        assert_eq!(a, b);
        assert!(a[64] == 27 || a[64] == 28);

        let decoded = RecoverableSignature::decode(&a).unwrap();
        assert!(decoded.check_scalars(true).is_ok());
    }

    #[test]
    fn test_distinct_keys_distinct_addresses() {
        assert_ne!(LocalSigner::random().address(), LocalSigner::random().address());
    }
}
