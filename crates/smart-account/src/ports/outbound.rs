//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the account depends on:
//! - Execution substrate (value forwarding, calls, deployment, journal)
//! - Signature recovery (secp256k1 public-key recovery)
//!
//! Dependencies point INWARD: adapters implement these traits.

use crate::domain::entities::{CallFrame, DeployFrame};
use crate::domain::signature::RecoverableSignature;
use crate::domain::value_objects::{Address, Bytes, Hash, U256};
use crate::errors::{SignatureError, SubstrateError};
use async_trait::async_trait;

// =============================================================================
// EXECUTION SUBSTRATE
// =============================================================================

/// Handle to an open journal entry.
///
/// Checkpoints nest: the most recent one must be closed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct JournalCheckpoint(pub usize);

/// Environment that actually moves value, runs calls and deploys code.
///
/// ## Transactional Semantics
///
/// The account brackets each `execute` between [`checkpoint`] and either
/// [`commit`] or [`revert`]. Restoring state on `revert` is the
/// substrate's job. `call` and `deploy` are individually atomic as well.
///
/// ## Reentrancy
///
/// `call` may run arbitrary code that calls back into the account before
/// it returns. Implementations must not hold locks across that callback.
///
/// [`checkpoint`]: ExecutionSubstrate::checkpoint
/// [`commit`]: ExecutionSubstrate::commit
/// [`revert`]: ExecutionSubstrate::revert
#[async_trait]
pub trait ExecutionSubstrate: Send + Sync {
    /// Opens a journal entry.
    fn checkpoint(&self) -> JournalCheckpoint;

    /// Keeps every change made since `checkpoint`.
    fn commit(&self, checkpoint: JournalCheckpoint) -> Result<(), SubstrateError>;

    /// Discards every change made since `checkpoint`.
    fn revert(&self, checkpoint: JournalCheckpoint) -> Result<(), SubstrateError>;

    /// Native balance of `address`.
    fn balance_of(&self, address: Address) -> U256;

    /// Moves `value` from `from` to `to`.
    fn transfer(&self, from: Address, to: Address, value: U256) -> Result<(), SubstrateError>;

    /// Low-level call. Returns the callee's output bytes.
    async fn call(&self, frame: CallFrame) -> Result<Bytes, SubstrateError>;

    /// Runs init code and returns the address of the new contract.
    async fn deploy(&self, frame: DeployFrame) -> Result<Address, SubstrateError>;
}

// =============================================================================
// SIGNATURE RECOVERY
// =============================================================================

/// Standard elliptic-curve public-key recovery.
///
/// Pure: `(digest, signature) -> signer address | failure`.
pub trait SignatureRecovery: Send + Sync {
    /// Recovers the address that produced `signature` over `digest`.
    fn recover(
        &self,
        digest: &Hash,
        signature: &RecoverableSignature,
    ) -> Result<Address, SignatureError>;
}

// =============================================================================
// TESTS
// =============================================================================
