//! # Core Domain Entities
//!
//! Main business entities for the account: the operation discriminant,
//! caller context, execution requests, audit records and log entries.

use crate::domain::value_objects::{Address, Bytes, Hash, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// OPERATION TYPE
// =============================================================================

/// Execution mode selected by the numeric discriminant of `execute`.
///
/// Closed set. Unknown discriminants are rejected, never defaulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperationType {
    /// Forward value and opaque data to a target.
    Call = 0,
    /// Deploy init code at a nonce-derived address.
    Create = 1,
    /// Deploy init code at a salt-derived address (EIP-1014).
    Create2 = 2,
    /// Read-only call, no value allowed.
    StaticCall = 3,
}

impl OperationType {
    /// Returns the wire discriminant.
    #[must_use]
    pub const fn discriminant(self) -> u8 {
        self as u8
    }

    /// Parses a wire discriminant.
    ///
    /// Returns `None` for anything outside the supported set, including
    /// values that do not fit in a byte.
    #[must_use]
    pub fn from_discriminant(raw: U256) -> Option<Self> {
        if raw > U256::from(u8::MAX) {
            return None;
        }
        match raw.low_u32() {
            0 => Some(Self::Call),
            1 => Some(Self::Create),
            2 => Some(Self::Create2),
            3 => Some(Self::StaticCall),
            _ => None,
        }
    }

    /// True for the deployment modes, where `target` is ignored.
    #[must_use]
    pub const fn is_deployment(self) -> bool {
        matches!(self, Self::Create | Self::Create2)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Call => "CALL",
            Self::Create => "CREATE",
            Self::Create2 => "CREATE2",
            Self::StaticCall => "STATICCALL",
        };
        f.write_str(name)
    }
}

impl From<OperationType> for U256 {
    fn from(op: OperationType) -> Self {
        U256::from(op.discriminant())
    }
}

// =============================================================================
// CALL CONTEXT
// =============================================================================

/// Identity and attached value of an incoming call, as provided by the
/// execution substrate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Immediate caller (`msg.sender`).
    pub caller: Address,
    /// Native value attached to the call (`msg.value`).
    pub value: U256,
}

impl CallContext {
    /// A call with no attached value.
    #[must_use]
    pub fn from_caller(caller: Address) -> Self {
        Self {
            caller,
            value: U256::zero(),
        }
    }

    /// A call carrying `value`.
    #[must_use]
    pub fn with_value(caller: Address, value: U256) -> Self {
        Self { caller, value }
    }
}

// =============================================================================
// EXECUTE REQUEST
// =============================================================================

/// Arguments of `execute`, exactly as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Raw operation discriminant.
    pub operation_type: U256,
    /// Call target. Ignored for deployments but echoed in the record.
    pub target: Address,
    /// Value forwarded to the target or the new contract.
    pub value: U256,
    /// Calldata, or init code for deployments (`init_code ‖ salt` for CREATE2).
    pub data: Bytes,
}

impl ExecuteRequest {
    /// Builds a request from a known operation type.
    #[must_use]
    pub fn new(operation: OperationType, target: Address, value: U256, data: Bytes) -> Self {
        Self {
            operation_type: operation.into(),
            target,
            value,
            data,
        }
    }

    /// Builds a CALL request.
    #[must_use]
    pub fn call(target: Address, value: U256, data: Bytes) -> Self {
        Self::new(OperationType::Call, target, value, data)
    }

    /// Builds a CREATE request. `target` is irrelevant and set to zero.
    #[must_use]
    pub fn create(value: U256, init_code: Bytes) -> Self {
        Self::new(OperationType::Create, Address::ZERO, value, init_code)
    }

    /// Builds a CREATE2 request, appending `salt` to the init code.
    #[must_use]
    pub fn create2(value: U256, init_code: &[u8], salt: Hash) -> Self {
        let mut data = init_code.to_vec();
        data.extend_from_slice(salt.as_bytes());
        Self::new(OperationType::Create2, Address::ZERO, value, Bytes(data))
    }

    /// Builds a STATICCALL request.
    #[must_use]
    pub fn static_call(target: Address, data: Bytes) -> Self {
        Self::new(OperationType::StaticCall, target, U256::zero(), data)
    }
}

// =============================================================================
// OPERATION RECORD
// =============================================================================

/// Immutable audit entry appended on every successful dispatch.
///
/// Fields mirror the `Executed` event, in the same order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Operation that ran.
    pub operation_type: OperationType,
    /// Target as supplied by the caller.
    pub target: Address,
    /// Forwarded value.
    pub value: U256,
    /// Calldata or init code as supplied by the caller.
    pub data: Bytes,
}

impl OperationRecord {
    /// Builds the record for a validated request.
    #[must_use]
    pub fn from_request(operation_type: OperationType, request: &ExecuteRequest) -> Self {
        Self {
            operation_type,
            target: request.target,
            value: request.value,
            data: request.data.clone(),
        }
    }
}

// =============================================================================
// CALL FRAME
// =============================================================================

/// A low-level invocation handed to the execution substrate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    /// The account issuing the call.
    pub caller: Address,
    /// Callee.
    pub target: Address,
    /// Value moved from caller to callee.
    pub value: U256,
    /// Opaque payload.
    pub data: Bytes,
    /// Callee must not modify state.
    pub is_static: bool,
}

/// A code deployment handed to the execution substrate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployFrame {
    /// The deploying account.
    pub creator: Address,
    /// Endowment of the new contract.
    pub value: U256,
    /// Initialization code.
    pub init_code: Bytes,
    /// CREATE2 salt. `None` for nonce-derived addresses.
    pub salt: Option<Hash>,
}

// =============================================================================
// LOG
// =============================================================================

/// EVM-style log entry rendered from an account event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Emitting account.
    pub address: Address,
    /// `topics[0]` is the event signature hash, followed by indexed fields.
    pub topics: Vec<Hash>,
    /// ABI-encoded non-indexed fields.
    pub data: Bytes,
}

// =============================================================================
// TESTS
// =============================================================================
