//! # secp256k1 Recovery Adapter
//!
//! Implements the `SignatureRecovery` port with the k256 crate.

use crate::domain::services::{address_from_hash, keccak256};
use crate::domain::signature::RecoverableSignature;
use crate::domain::value_objects::{Address, Hash};
use crate::errors::SignatureError;
use crate::ports::outbound::SignatureRecovery;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

/// ECDSA public-key recovery over secp256k1.
///
/// High-S signatures are normalized before recovery, so the policy on
/// malleability stays with the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Recovery;

impl Secp256k1Recovery {
    /// Creates the adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SignatureRecovery for Secp256k1Recovery {
    fn recover(
        &self,
        digest: &Hash,
        signature: &RecoverableSignature,
    ) -> Result<Address, SignatureError> {
        let mut sig_bytes = [0u8; 64];
        sig_bytes[..32].copy_from_slice(&signature.r);
        sig_bytes[32..].copy_from_slice(&signature.s);

        let sig = Signature::from_slice(&sig_bytes).map_err(|_| SignatureError::InvalidFormat)?;
        let recovery_id = RecoveryId::try_from(signature.y_parity)
            .map_err(|_| SignatureError::InvalidRecoveryId(signature.y_parity))?;

        // k256 only verifies low-S signatures; fold the twin back.
        let (sig, recovery_id) = match sig.normalize_s() {
            Some(normalized) => (
                normalized,
                RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
            ),
            None => (sig, recovery_id),
        };

        let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id)
            .map_err(|_| SignatureError::RecoveryFailed)?;

        Ok(address_from_verifying_key(&key))
    }
}

/// Derives the Ethereum address of a public key:
/// last 20 bytes of keccak256 over the uncompressed point without its prefix.
#[must_use]
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    address_from_hash(&keccak256(&encoded.as_bytes()[1..]))
}
