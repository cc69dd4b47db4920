//! # Domain Invariants
//!
//! Checks that MUST hold around every gated operation.
//!
//! - INVARIANT-1: Owner Gate (mutations require caller == owner)
//! - INVARIANT-2: Record Fidelity (record echoes the request verbatim)
//! - INVARIANT-3: No Record On Failure
//! - INVARIANT-4: Static Call Carries No Value
//! - INVARIANT-5: Deployments Carry Code

use crate::domain::entities::{ExecuteRequest, OperationRecord, OperationType};
use crate::errors::AccountError;

/// Length of the CREATE2 salt suffix in `data`.
pub const SALT_LENGTH: usize = 32;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// INVARIANT-2: Record Fidelity
///
/// The emitted record carries the caller's `target`, `value` and `data`
/// untouched, including for deployments where `target` is ignored.
#[must_use]
pub fn check_record_fidelity(
    operation_type: OperationType,
    request: &ExecuteRequest,
    record: &OperationRecord,
) -> bool {
    record.operation_type == operation_type
        && request.operation_type == operation_type.into()
        && record.target == request.target
        && record.value == request.value
        && record.data == request.data
}

/// INVARIANT-3: No Record On Failure
///
/// A failed operation leaves the audit log length unchanged.
#[must_use]
pub fn check_no_record_on_failure(failed: bool, len_before: usize, len_after: usize) -> bool {
    !failed || len_before == len_after
}

/// INVARIANT-4 and INVARIANT-5, evaluated before any substrate effect.
pub fn check_request_shape(
    operation_type: OperationType,
    request: &ExecuteRequest,
) -> Result<(), AccountError> {
    match operation_type {
        OperationType::Call => Ok(()),
        OperationType::StaticCall => {
            if request.value.is_zero() {
                Ok(())
            } else {
                Err(AccountError::ValueNotAllowed {
                    operation: operation_type,
                    value: request.value,
                })
            }
        }
        OperationType::Create => {
            if request.data.is_empty() {
                Err(AccountError::MissingInitCode(operation_type))
            } else {
                Ok(())
            }
        }
        OperationType::Create2 => {
            if request.data.len() <= SALT_LENGTH {
                Err(AccountError::MissingInitCode(operation_type))
            } else {
                Ok(())
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Address, Bytes, Hash, U256};

    #[test]
    fn test_record_fidelity() {
        let req = ExecuteRequest::call(
            Address::from_low_u64(1),
            U256::from(5),
            Bytes::from_slice(&[0x11]),
        );
        let record = OperationRecord::from_request(OperationType::Call, &req);
        assert!(check_record_fidelity(OperationType::Call, &req, &record));

        let mut tampered = record.clone();
        tampered.value = U256::from(6);
        assert!(!check_record_fidelity(OperationType::Call, &req, &tampered));

        assert!(!check_record_fidelity(OperationType::Create, &req, &record));
    }

    #[test]
    fn test_no_record_on_failure() {
        assert!(check_no_record_on_failure(true, 3, 3));
        assert!(!check_no_record_on_failure(true, 3, 4));
        assert!(check_no_record_on_failure(false, 3, 4));
    }

    #[test]
    fn test_static_call_with_value_rejected() {
        let mut req = ExecuteRequest::static_call(Address::from_low_u64(1), Bytes::new());
        assert!(check_request_shape(OperationType::StaticCall, &req).is_ok());

        req.value = U256::one();
        assert!(matches!(
            check_request_shape(OperationType::StaticCall, &req),
            Err(AccountError::ValueNotAllowed { .. })
        ));
    }

    #[test]
    fn test_create_requires_code() {
        let req = ExecuteRequest::create(U256::zero(), Bytes::new());
        assert_eq!(
            check_request_shape(OperationType::Create, &req),
            Err(AccountError::MissingInitCode(OperationType::Create))
        );
    }

    #[test]
    fn test_create2_requires_code_beyond_salt() {
        let salt_only = ExecuteRequest::create2(U256::zero(), &[], Hash::ZERO);
        assert_eq!(
            check_request_shape(OperationType::Create2, &salt_only),
            Err(AccountError::MissingInitCode(OperationType::Create2))
        );

        let with_code = ExecuteRequest::create2(U256::zero(), &[0x00], Hash::ZERO);
        assert!(check_request_shape(OperationType::Create2, &with_code).is_ok());
    }

    #[test]
    fn test_call_accepts_any_payload() {
        for data in [vec![], vec![0x11], vec![0xAB; 1024]] {
            let req = ExecuteRequest::call(Address::ZERO, U256::MAX, Bytes(data));
            assert!(check_request_shape(OperationType::Call, &req).is_ok());
        }
    }
}
