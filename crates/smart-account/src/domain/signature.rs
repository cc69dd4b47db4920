//! # Signature Validation (ERC-1271)
//!
//! Decoding of recoverable secp256k1 signatures and the owner check behind
//! `is_valid_signature`.
//!
//! ## Security Notes
//!
//! - **Never throws**: every failure collapses into [`MagicValue::FAILURE`]
//! - **Malleability (EIP-2)**: high-S signatures are rejected when strict
//! - **Scalar range**: R and S must be in [1, n-1]
//! - **Zero identity**: a recovered zero address never matches

use crate::domain::value_objects::{Address, Hash};
use crate::errors::SignatureError;
use crate::ports::outbound::SignatureRecovery;
use std::fmt;
use subtle::{Choice, ConstantTimeEq};

/// secp256k1 curve order n.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// n/2, the largest S accepted under EIP-2.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

// =============================================================================
// MAGIC VALUE
// =============================================================================

/// 4-byte answer of the ERC-1271 oracle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MagicValue(pub [u8; 4]);

impl MagicValue {
    /// `bytes4(keccak256("isValidSignature(bytes32,bytes)"))`.
    pub const SUCCESS: Self = Self([0x16, 0x26, 0xba, 0x7e]);

    /// Returned for every non-matching or malformed input.
    pub const FAILURE: Self = Self([0xff, 0xff, 0xff, 0xff]);

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Big-endian numeric view, e.g. `0x1626ba7e`.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl fmt::Debug for MagicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for MagicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// SIGNATURE CHECK
// =============================================================================

/// Outcome of validating a signature against the owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureCheck {
    /// Recovered signer is the owner.
    Valid,
    /// Anything else, with the reason kept for logging.
    Invalid(SignatureError),
}

impl SignatureCheck {
    /// Returns true for [`SignatureCheck::Valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Maps the outcome onto the wire constant.
    #[must_use]
    pub fn magic_value(&self) -> MagicValue {
        match self {
            Self::Valid => MagicValue::SUCCESS,
            Self::Invalid(_) => MagicValue::FAILURE,
        }
    }
}

// =============================================================================
// RECOVERABLE SIGNATURE
// =============================================================================

/// A decoded `(r, s, y_parity)` triple.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoverableSignature {
    /// R component.
    pub r: [u8; 32],
    /// S component.
    pub s: [u8; 32],
    /// Recovery id: parity of the R point's y coordinate (0 or 1).
    pub y_parity: u8,
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoverableSignature")
            .field("r", &hex::encode(&self.r[..4]))
            .field("s", &hex::encode(&self.s[..4]))
            .field("y_parity", &self.y_parity)
            .finish()
    }
}

impl RecoverableSignature {
    /// Decodes a signature blob.
    ///
    /// Accepted encodings:
    /// - 65 bytes `r ‖ s ‖ v` with `v` in {0, 1, 27, 28}
    /// - 64 bytes EIP-2098 compact `r ‖ vs`, parity in the top bit of `vs`
    pub fn decode(bytes: &[u8]) -> Result<Self, SignatureError> {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        match bytes.len() {
            65 => {
                r.copy_from_slice(&bytes[..32]);
                s.copy_from_slice(&bytes[32..64]);
                let y_parity = match bytes[64] {
                    0 | 27 => 0,
                    1 | 28 => 1,
                    v => return Err(SignatureError::InvalidRecoveryId(v)),
                };
                Ok(Self { r, s, y_parity })
            }
            64 => {
                r.copy_from_slice(&bytes[..32]);
                s.copy_from_slice(&bytes[32..]);
                let y_parity = s[0] >> 7;
                s[0] &= 0x7f;
                Ok(Self { r, s, y_parity })
            }
            len => Err(SignatureError::InvalidLength(len)),
        }
    }

    /// Encodes as 65 bytes with `v` in {27, 28}.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = 27 + self.y_parity;
        out
    }

    /// Range and malleability checks performed before recovery.
    pub fn check_scalars(&self, strict_low_s: bool) -> Result<(), SignatureError> {
        if !is_valid_scalar(&self.r) || !is_valid_scalar(&self.s) {
            return Err(SignatureError::InvalidFormat);
        }
        if strict_low_s && !is_low_s(&self.s) {
            return Err(SignatureError::MalleableSignature);
        }
        Ok(())
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Validates `signature` over `digest` against `owner`.
///
/// Pure with respect to its inputs. Every decoding, range, recovery or
/// identity failure is reported as [`SignatureCheck::Invalid`].
pub fn validate_signature<R: SignatureRecovery + ?Sized>(
    recovery: &R,
    owner: Address,
    digest: &Hash,
    signature: &[u8],
    strict_low_s: bool,
) -> SignatureCheck {
    match recover_signer(recovery, digest, signature, strict_low_s) {
        Ok(signer) if signer == owner => SignatureCheck::Valid,
        Ok(signer) => SignatureCheck::Invalid(SignatureError::SignerMismatch {
            expected: owner.0,
            actual: signer.0,
        }),
        Err(e) => SignatureCheck::Invalid(e),
    }
}

/// Decodes, range-checks and recovers the signer of `signature`.
pub fn recover_signer<R: SignatureRecovery + ?Sized>(
    recovery: &R,
    digest: &Hash,
    signature: &[u8],
    strict_low_s: bool,
) -> Result<Address, SignatureError> {
    let decoded = RecoverableSignature::decode(signature)?;
    decoded.check_scalars(strict_low_s)?;
    let signer = recovery.recover(digest, &decoded)?;
    if signer.is_zero() {
        return Err(SignatureError::ZeroAddress);
    }
    Ok(signer)
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Constant-time `a < b` over big-endian 32-byte values.
fn ct_less_than(a: &[u8; 32], b: &[u8; 32]) -> Choice {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let not_decided = !(less | greater);
        less |= not_decided & Choice::from(u8::from(a[i] < b[i]));
        greater |= not_decided & Choice::from(u8::from(a[i] > b[i]));
    }

    less
}

/// S must be strictly below n/2 + 1, i.e. `s <= n/2` (EIP-2).
fn is_low_s(s: &[u8; 32]) -> bool {
    let below = ct_less_than(s, &SECP256K1_HALF_ORDER);
    let equal = s.ct_eq(&SECP256K1_HALF_ORDER);
    (below | equal).into()
}

/// Scalar must be in [1, n-1].
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let is_zero = scalar.ct_eq(&[0u8; 32]);
    let below_order = ct_less_than(scalar, &SECP256K1_ORDER);
    (!is_zero & below_order).into()
}

/// Computes `n - s`, the high-S twin of a signature.
#[must_use]
pub fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow = 0i16;

    for i in (0..32).rev() {
        let diff = i16::from(SECP256K1_ORDER[i]) - i16::from(s[i]) - borrow;
        if diff < 0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                result[i] = (diff + 256) as u8;
            }
            borrow = 1;
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                result[i] = diff as u8;
            }
            borrow = 0;
        }
    }

    result
}

// =============================================================================
// TESTS
// =============================================================================
