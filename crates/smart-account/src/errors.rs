//! # Error Types
//!
//! All error types for the account.

use crate::domain::entities::OperationType;
use crate::domain::value_objects::{Address, U256};
use thiserror::Error;

// =============================================================================
// ACCOUNT ERRORS
// =============================================================================

/// Failures of gated account operations.
///
/// Every variant aborts the operation with no state change and no record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// Caller is not the owner.
    #[error("unauthorized caller {caller:?} (owner is {owner:?})")]
    Unauthorized {
        /// Rejected caller.
        caller: Address,
        /// Owner at the time of the call.
        owner: Address,
    },

    /// Operation discriminant outside the supported set.
    #[error("unsupported operation type: {0}")]
    UnsupportedOperation(U256),

    /// The forwarded call or deployment failed in the substrate.
    #[error("execution reverted: {0}")]
    ExecutionReverted(#[from] SubstrateError),

    /// A gated operation was entered while an `execute` is in progress.
    #[error("reentrant call rejected")]
    ReentrantCall,

    /// A gated operation was entered from inside a STATICCALL dispatch.
    #[error("state change inside a static call")]
    WriteInStaticContext,

    /// The operation does not accept a value (STATICCALL).
    #[error("{operation} does not accept value (got {value})")]
    ValueNotAllowed {
        /// Operation that rejected the value.
        operation: OperationType,
        /// Offending value.
        value: U256,
    },

    /// Deployment without init code.
    #[error("{0} requires init code")]
    MissingInitCode(OperationType),

    /// Ownership cannot be handed to this address.
    #[error("invalid owner: {0:?}")]
    InvalidOwner(Address),

    /// Batch write with different numbers of keys and values.
    #[error("batch length mismatch: {keys} keys, {values} values")]
    LengthMismatch {
        /// Number of keys.
        keys: usize,
        /// Number of values.
        values: usize,
    },

    /// Batch write with no entries.
    #[error("empty batch")]
    EmptyBatch,
}

impl AccountError {
    /// True if the call was refused before any work was attempted.
    ///
    /// The account counts these under `rejected_calls` rather than as
    /// failed executions.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::ReentrantCall | Self::WriteInStaticContext
        )
    }
}

// =============================================================================
// SUBSTRATE ERRORS
// =============================================================================

/// Errors reported by the execution substrate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubstrateError {
    /// Callee or constructor reverted.
    #[error("revert: {0}")]
    Revert(String),

    /// Not enough native balance to move `required`.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount requested.
        required: U256,
        /// Amount held.
        available: U256,
    },

    /// Init code size exceeded limit (EIP-3860).
    #[error("init code size exceeded: {size} > {max} bytes")]
    InitCodeSizeExceeded {
        /// Actual size.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Code starts with 0xEF (reserved for EOF, EIP-3541).
    #[error("code starts with 0xEF byte (reserved for EOF)")]
    InvalidCodePrefix,

    /// Contract already exists at the derived address.
    #[error("contract already exists at address: {0:?}")]
    ContractAlreadyExists(Address),

    /// A static frame attempted a state change.
    #[error("write operation in static context")]
    WriteInStaticContext,

    /// Journal checkpoint unknown or already closed.
    #[error("invalid journal checkpoint: {0}")]
    InvalidCheckpoint(usize),

    /// Substrate cannot be reached.
    #[error("substrate unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// SIGNATURE ERRORS
// =============================================================================

/// Reasons a signature fails validation.
///
/// Internal only: `is_valid_signature` folds all of them into the failure
/// magic value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Signature blob has an unsupported length.
    #[error("invalid signature length: {0}")]
    InvalidLength(usize),

    /// R or S outside [1, n-1].
    #[error("invalid signature format")]
    InvalidFormat,

    /// High S value (EIP-2).
    #[error("malleable signature (high S value)")]
    MalleableSignature,

    /// Recovery byte not in {0, 1, 27, 28}.
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Public key recovery failed.
    #[error("failed to recover public key")]
    RecoveryFailed,

    /// Local key could not produce a signature.
    #[error("signing failed")]
    SigningFailed,

    /// Recovery produced the zero address.
    #[error("recovered zero address")]
    ZeroAddress,

    /// Well-formed signature by someone other than the owner.
    #[error("signer mismatch: expected {expected:?}, got {actual:?}")]
    SignerMismatch {
        /// Owner address.
        expected: [u8; 20],
        /// Recovered address.
        actual: [u8; 20],
    },
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Invalid account configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },

    /// Event channel must hold at least one event.
    #[error("event channel capacity must be non-zero")]
    ZeroEventCapacity,

    /// Init code limit must allow some code.
    #[error("max init code size must be non-zero")]
    ZeroInitCodeLimit,
}

// =============================================================================
// TESTS
// =============================================================================
