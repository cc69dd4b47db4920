//! # Adapters Layer (Outer Hexagon)
//!
//! Concrete implementations of the driven ports.
//!
//! - `recovery`: secp256k1 public-key recovery (`SignatureRecovery`)
//! - `signer`: local key producing recoverable signatures
//! - `substrate`: journaled in-memory world (`ExecutionSubstrate`)

pub mod recovery;
pub mod signer;
pub mod substrate;

pub use recovery::*;
pub use signer::*;
pub use substrate::*;
