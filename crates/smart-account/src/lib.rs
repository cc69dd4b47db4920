//! # Smart Account - Programmable Owner-Controlled Account
//!
//! **Standards:** ERC-725X (execute), ERC-725Y (data), ERC-1271
//! (signature oracle), ERC-173 (ownership)
//!
//! ## Purpose
//!
//! An account controlled by a single owner. The owner dispatches calls and
//! deployments through it, stores arbitrary metadata on it, and lets third
//! parties verify signatures made on its behalf.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Owner Gate | `domain/authorization.rs` - `Ownership::ensure_owner()` |
//! | INVARIANT-2 | Record Fidelity | `domain/invariants.rs` - `check_record_fidelity()` |
//! | INVARIANT-3 | No Record On Failure | `service.rs` - checkpoint revert, `check_no_record_on_failure()` |
//! | INVARIANT-4 | Static Call Carries No Value | `domain/invariants.rs` - `check_request_shape()` |
//! | INVARIANT-5 | Deployments Carry Code | `domain/invariants.rs` - `check_request_shape()` |
//! | INVARIANT-6 | Signature Oracle Never Fails | `domain/signature.rs` - `validate_signature()` |
//! | INVARIANT-7 | Static Call Writes Nothing | `service.rs` - `StaticFrame`, `ensure_not_static()` |
//!
//! ## Operations
//!
//! | Operation | Access | Result |
//! |-----------|--------|--------|
//! | `execute` | owner | callee output or new contract address |
//! | `is_valid_signature` | anyone | `0x1626ba7e` or `0xffffffff` |
//! | `set_data` / `set_data_batch` | owner | unit |
//! | `get_data` / `get_data_batch` | anyone | stored bytes, empty if absent |
//! | `transfer_ownership` | owner | unit |
//!
//! ## Operation Types
//!
//! | Value | Mode | `data` |
//! |-------|------|--------|
//! | 0 | CALL | calldata |
//! | 1 | CREATE | init code |
//! | 2 | CREATE2 | init code ‖ 32-byte salt |
//! | 3 | STATICCALL | calldata (value must be zero) |
//!
//! ## Outbound Dependencies
//!
//! | Port | Purpose | Adapter |
//! |------|---------|---------|
//! | `ExecutionSubstrate` | value transfer, calls, deployment, journal | `InMemorySubstrate` |
//! | `SignatureRecovery` | secp256k1 ecrecover | `Secp256k1Recovery` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use smart_account::prelude::*;
//!
//! let account = SmartAccount::in_memory(account_address, owner, AccountConfig::default());
//!
//! let output = account
//!     .execute(CallContext::from_caller(owner), ExecuteRequest::call(target, value, data))
//!     .await?;
//!
//! assert_eq!(account.is_valid_signature(&digest, &signature), MagicValue::SUCCESS);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        CallContext, CallFrame, DeployFrame, ExecuteRequest, Log, OperationRecord, OperationType,
    };

    // Value objects
    pub use crate::domain::value_objects::{Address, Bytes, DataKey, Hash, U256};

    // Domain services
    pub use crate::domain::services::{
        compute_contract_address, compute_contract_address_create2, hash_message, keccak256,
    };

    // Signatures
    pub use crate::domain::signature::{
        validate_signature, MagicValue, RecoverableSignature, SignatureCheck,
    };

    // Ports
    pub use crate::ports::inbound::SmartAccountApi;
    pub use crate::ports::outbound::{ExecutionSubstrate, JournalCheckpoint, SignatureRecovery};

    // Events
    pub use crate::events::{topics, AccountEvent};

    // Errors
    pub use crate::errors::{AccountError, ConfigError, SignatureError, SubstrateError};

    // Configuration
    pub use crate::config::AccountConfig;

    // Adapters
    pub use crate::adapters::{
        CallHandler, EchoHandler, InMemorySubstrate, LocalSigner, RevertHandler,
        Secp256k1Recovery,
    };

    // Service
    pub use crate::service::{AccountStats, SmartAccount};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// TESTS
// =============================================================================
