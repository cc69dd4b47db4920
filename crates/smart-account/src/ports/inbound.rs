//! # Driving Ports (API - Inbound)
//!
//! Public API of the account. Callers identify themselves through the
//! [`CallContext`] or caller address supplied by the substrate.

use crate::domain::entities::{CallContext, ExecuteRequest};
use crate::domain::signature::MagicValue;
use crate::domain::value_objects::{Address, Bytes, DataKey, Hash};
use crate::errors::AccountError;
use async_trait::async_trait;

/// The account's external surface.
///
/// ## Gated Operations
///
/// `execute`, `set_data`, `set_data_batch` and `transfer_ownership`
/// require the caller to be the owner. A failure leaves no trace.
///
/// ## Open Operations
///
/// `is_valid_signature`, `get_data`, `get_data_batch` and `owner` never
/// fail.
#[async_trait]
pub trait SmartAccountApi: Send + Sync {
    /// Address of the account itself.
    fn address(&self) -> Address;

    /// Current owner.
    fn owner(&self) -> Address;

    /// Dispatches a CALL, CREATE, CREATE2 or STATICCALL on behalf of the owner.
    ///
    /// Returns the callee output for calls, or the 20-byte address of the
    /// new contract for deployments.
    async fn execute(
        &self,
        ctx: CallContext,
        request: ExecuteRequest,
    ) -> Result<Bytes, AccountError>;

    /// ERC-1271 oracle: `0x1626ba7e` if the owner signed `digest`,
    /// `0xffffffff` otherwise.
    fn is_valid_signature(&self, digest: &Hash, signature: &[u8]) -> MagicValue;

    /// Upserts a metadata entry.
    fn set_data(&self, caller: Address, key: DataKey, value: Bytes) -> Result<(), AccountError>;

    /// Upserts several entries atomically.
    fn set_data_batch(
        &self,
        caller: Address,
        keys: &[DataKey],
        values: &[Bytes],
    ) -> Result<(), AccountError>;

    /// Reads an entry. Empty for unknown keys.
    fn get_data(&self, key: &DataKey) -> Bytes;

    /// Reads several entries in order.
    fn get_data_batch(&self, keys: &[DataKey]) -> Vec<Bytes>;

    /// Hands ownership to `new_owner`.
    fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<(), AccountError>;
}
