//! # Event Schema
//!
//! Notifications emitted by the account and consumed by external indexers.
//! Each event renders to an EVM-style [`Log`] with `topics[0]` set to the
//! keccak256 of its signature.
//!
//! | Event | Emitted by | Indexed |
//! |-------|------------|---------|
//! | `Executed(uint256,address,uint256,bytes)` | `execute` | none |
//! | `ContractCreated(uint256,address,uint256,bytes32)` | CREATE / CREATE2 | operation, address, value |
//! | `DataChanged(bytes32)` | `set_data`, `set_data_batch` | key |
//! | `OwnershipTransferred(address,address)` | `transfer_ownership` | both |

use crate::domain::entities::{Log, OperationRecord, OperationType};
use crate::domain::services::{abi_append_bytes, abi_word, keccak256};
use crate::domain::value_objects::{Address, DataKey, Hash, U256};
use serde::{Deserialize, Serialize};

/// Event signatures and their topic hashes.
pub mod topics {
    use super::{keccak256, Hash};

    /// `Executed` signature. Field order is fixed.
    pub const EXECUTED: &str = "Executed(uint256,address,uint256,bytes)";
    /// `ContractCreated` signature.
    pub const CONTRACT_CREATED: &str = "ContractCreated(uint256,address,uint256,bytes32)";
    /// `DataChanged` signature.
    pub const DATA_CHANGED: &str = "DataChanged(bytes32)";
    /// `OwnershipTransferred` signature.
    pub const OWNERSHIP_TRANSFERRED: &str = "OwnershipTransferred(address,address)";

    /// keccak256 of an event signature.
    #[must_use]
    pub fn topic(signature: &str) -> Hash {
        keccak256(signature.as_bytes())
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Everything the account announces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEvent {
    /// A dispatch succeeded. Carries the audit record verbatim.
    Executed(OperationRecord),

    /// A deployment produced a contract.
    ContractCreated {
        /// CREATE or CREATE2.
        operation_type: OperationType,
        /// New contract.
        contract: Address,
        /// Endowment.
        value: U256,
        /// CREATE2 salt, zero for CREATE.
        salt: Hash,
    },

    /// A metadata entry was written.
    DataChanged {
        /// Written key.
        key: DataKey,
    },

    /// Control changed hands.
    OwnershipTransferred {
        /// Previous owner.
        previous: Address,
        /// New owner.
        new: Address,
    },
}

impl AccountEvent {
    /// Event name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Executed(_) => "Executed",
            Self::ContractCreated { .. } => "ContractCreated",
            Self::DataChanged { .. } => "DataChanged",
            Self::OwnershipTransferred { .. } => "OwnershipTransferred",
        }
    }

    /// Renders the event as a log emitted by `account`.
    #[must_use]
    pub fn to_log(&self, account: Address) -> Log {
        match self {
            Self::Executed(record) => {
                let mut data = Vec::with_capacity(160 + record.data.len());
                data.extend_from_slice(&abi_word(record.operation_type.into()));
                data.extend_from_slice(&record.target.to_word());
                data.extend_from_slice(&abi_word(record.value));
                // Offset of the dynamic `bytes` tail: four head words.
                data.extend_from_slice(&abi_word(U256::from(4 * 32)));
                abi_append_bytes(&mut data, record.data.as_slice());
                Log {
                    address: account,
                    topics: vec![topics::topic(topics::EXECUTED)],
                    data: data.into(),
                }
            }
            Self::ContractCreated {
                operation_type,
                contract,
                value,
                salt,
            } => Log {
                address: account,
                topics: vec![
                    topics::topic(topics::CONTRACT_CREATED),
                    Hash::new(abi_word((*operation_type).into())),
                    Hash::new(contract.to_word()),
                    Hash::new(abi_word(*value)),
                ],
                data: salt.as_bytes().to_vec().into(),
            },
            Self::DataChanged { key } => Log {
                address: account,
                topics: vec![topics::topic(topics::DATA_CHANGED), Hash::new(key.0)],
                data: Vec::new().into(),
            },
            Self::OwnershipTransferred { previous, new } => Log {
                address: account,
                topics: vec![
                    topics::topic(topics::OWNERSHIP_TRANSFERRED),
                    Hash::new(previous.to_word()),
                    Hash::new(new.to_word()),
                ],
                data: Vec::new().into(),
            },
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Bytes;

    #[test]
    fn test_topic_hashes() {
        assert_eq!(
            hex::encode(topics::topic(topics::OWNERSHIP_TRANSFERRED).as_bytes()),
            "8be0079c531659141344cd1fd0a4f28419497f9722a3daafe3b4186f6b6457e0"
        );
        assert_eq!(
            hex::encode(topics::topic(topics::DATA_CHANGED).as_bytes()),
            "cdf4e344c0d23d4cdd0474039d176c55b19d531070dbe17856bfb993a5b5720b"
        );
        assert_eq!(
            hex::encode(topics::topic(topics::EXECUTED).as_bytes()),
            "1f920dbda597d7bf95035464170fa58d0a4b57f13a1c315ace6793b9f63688b8"
        );
    }

    #[test]
    fn test_executed_log_layout() {
        let record = OperationRecord {
            operation_type: OperationType::Call,
            target: Address::new([0xAB; 20]),
            value: U256::from(500_000),
            data: Bytes::from_slice(&[0x11]),
        };
        let account = Address::from_low_u64(1);
        let log = AccountEvent::Executed(record).to_log(account);

        assert_eq!(log.address, account);
        assert_eq!(log.topics.len(), 1);

        let data = log.data.as_slice();
        // 4 head words + length word + one padded data word
        assert_eq!(data.len(), 6 * 32);
        assert_eq!(U256::from_big_endian(&data[0..32]), U256::zero());
        assert_eq!(&data[44..64], &[0xAB; 20]);
        assert_eq!(U256::from_big_endian(&data[64..96]), U256::from(500_000));
        assert_eq!(U256::from_big_endian(&data[96..128]), U256::from(128));
        assert_eq!(U256::from_big_endian(&data[128..160]), U256::one());
        assert_eq!(data[160], 0x11);
    }

    #[test]
    fn test_data_changed_indexes_key() {
        let key = DataKey::new([5u8; 32]);
        let log = AccountEvent::DataChanged { key }.to_log(Address::ZERO);
        assert_eq!(log.topics[1].as_bytes(), key.as_bytes());
        assert!(log.data.is_empty());
    }

    #[test]
    fn test_ownership_log_topics() {
        let log = AccountEvent::OwnershipTransferred {
            previous: Address::from_low_u64(1),
            new: Address::from_low_u64(2),
        }
        .to_log(Address::ZERO);
        assert_eq!(log.topics.len(), 3);
        assert_eq!(log.topics[2].as_bytes()[31], 2);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(
            AccountEvent::DataChanged {
                key: DataKey::default()
            }
            .name(),
            "DataChanged"
        );
    }
}
