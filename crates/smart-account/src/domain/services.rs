//! # Domain Services
//!
//! Pure functions used by the account: hashing, contract address
//! derivation, personal-message hashing and ABI word encoding.
//!
//! NO I/O, NO async, deterministic.

use crate::domain::value_objects::{Address, Hash, U256};
use sha3::{Digest, Keccak256};

// =============================================================================
// KECCAK256 UTILITY
// =============================================================================

/// Computes keccak256 hash of data.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let hash = Keccak256::digest(data);
    Hash::new(hash.into())
}

/// EIP-191 personal message hash:
/// `keccak256("\x19Ethereum Signed Message:\n" ‖ len(message) ‖ message)`.
#[must_use]
pub fn hash_message(message: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    Hash::new(hasher.finalize().into())
}

// =============================================================================
// CONTRACT ADDRESS COMPUTATION
// =============================================================================

/// Computes the contract address for CREATE.
///
/// Address = keccak256(rlp(\[sender, nonce\]))\[12:\]
#[must_use]
pub fn compute_contract_address(sender: Address, nonce: u64) -> Address {
    let mut content = Vec::with_capacity(30);

    // 20-byte string: 0x80 + 20
    content.push(0x94);
    content.extend_from_slice(sender.as_bytes());

    if nonce == 0 {
        content.push(0x80);
    } else if nonce < 128 {
        #[allow(clippy::cast_possible_truncation)]
        content.push(nonce as u8);
    } else {
        let nonce_bytes = trimmed_be_bytes(nonce);
        #[allow(clippy::cast_possible_truncation)]
        content.push(0x80 + nonce_bytes.len() as u8);
        content.extend_from_slice(&nonce_bytes);
    }

    // Content never exceeds 30 bytes, so the short list header always applies.
    let mut rlp_data = Vec::with_capacity(content.len() + 1);
    #[allow(clippy::cast_possible_truncation)]
    rlp_data.push(0xc0 + content.len() as u8);
    rlp_data.extend_from_slice(&content);

    address_from_hash(&keccak256(&rlp_data))
}

/// Computes the contract address for CREATE2 (EIP-1014).
///
/// Address = keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))\[12:\]
#[must_use]
pub fn compute_contract_address_create2(sender: Address, salt: Hash, init_code: &[u8]) -> Address {
    let code_hash = keccak256(init_code);

    let mut data = Vec::with_capacity(85);
    data.push(0xff);
    data.extend_from_slice(sender.as_bytes());
    data.extend_from_slice(salt.as_bytes());
    data.extend_from_slice(code_hash.as_bytes());

    address_from_hash(&keccak256(&data))
}

/// Takes the low 20 bytes of a hash as an address.
#[must_use]
pub fn address_from_hash(hash: &Hash) -> Address {
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash.as_bytes()[12..]);
    Address::new(addr)
}

fn trimmed_be_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}

// =============================================================================
// ABI ENCODING
// =============================================================================

/// Encodes a `uint256` as a big-endian 32-byte word.
#[must_use]
pub fn abi_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// Appends the tail encoding of a dynamic `bytes` value:
/// length word followed by the data right-padded to a word boundary.
pub fn abi_append_bytes(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&abi_word(U256::from(data.len())));
    out.extend_from_slice(data);
    let padding = (32 - data.len() % 32) % 32;
    out.resize(out.len() + padding, 0);
}

// =============================================================================
// TESTS
// =============================================================================
