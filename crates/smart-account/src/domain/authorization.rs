//! # Authorization Manager
//!
//! Holds the account's single controlling identity.

use crate::domain::value_objects::Address;
use crate::errors::AccountError;

/// Single-owner access control (ERC-173 shape).
///
/// The owner field is private; it changes only through
/// [`Ownership::transfer`], which re-checks the caller itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ownership {
    owner: Address,
}

impl Ownership {
    /// Installs `creator` as the owner.
    #[must_use]
    pub const fn new(creator: Address) -> Self {
        Self { owner: creator }
    }

    /// Current owner.
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Pure predicate: is `caller` the owner?
    #[must_use]
    pub fn is_owner(&self, caller: Address) -> bool {
        caller == self.owner
    }

    /// Fails with [`AccountError::Unauthorized`] unless `caller` is the owner.
    pub fn ensure_owner(&self, caller: Address) -> Result<(), AccountError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(AccountError::Unauthorized {
                caller,
                owner: self.owner,
            })
        }
    }

    /// Hands control to `new_owner`. Returns the previous owner.
    pub fn transfer(&mut self, caller: Address, new_owner: Address) -> Result<Address, AccountError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(AccountError::InvalidOwner(new_owner));
        }
        Ok(std::mem::replace(&mut self.owner, new_owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_is_owner() {
        let creator = Address::from_low_u64(1);
        let ownership = Ownership::new(creator);
        assert!(ownership.is_owner(creator));
        assert!(!ownership.is_owner(Address::from_low_u64(2)));
        assert!(!ownership.is_owner(Address::ZERO));
    }

    #[test]
    fn test_ensure_owner_reports_both_parties() {
        let ownership = Ownership::new(Address::from_low_u64(1));
        let err = ownership.ensure_owner(Address::from_low_u64(9)).unwrap_err();
        assert_eq!(
            err,
            AccountError::Unauthorized {
                caller: Address::from_low_u64(9),
                owner: Address::from_low_u64(1),
            }
        );
    }

    #[test]
    fn test_transfer_by_owner() {
        let mut ownership = Ownership::new(Address::from_low_u64(1));
        let previous = ownership
            .transfer(Address::from_low_u64(1), Address::from_low_u64(2))
            .unwrap();
        assert_eq!(previous, Address::from_low_u64(1));
        assert!(ownership.is_owner(Address::from_low_u64(2)));
        assert!(!ownership.is_owner(Address::from_low_u64(1)));
    }

    #[test]
    fn test_transfer_by_stranger_leaves_owner() {
        let mut ownership = Ownership::new(Address::from_low_u64(1));
        let result = ownership.transfer(Address::from_low_u64(2), Address::from_low_u64(2));
        assert!(matches!(result, Err(AccountError::Unauthorized { .. })));
        assert_eq!(ownership.owner(), Address::from_low_u64(1));
    }

    #[test]
    fn test_transfer_to_zero_rejected() {
        let mut ownership = Ownership::new(Address::from_low_u64(1));
        let result = ownership.transfer(Address::from_low_u64(1), Address::ZERO);
        assert_eq!(result, Err(AccountError::InvalidOwner(Address::ZERO)));
        assert_eq!(ownership.owner(), Address::from_low_u64(1));
    }
}
