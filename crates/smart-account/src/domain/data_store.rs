//! # Data Store (ERC-725Y)
//!
//! Generic key-value metadata attached to the account. Authorization is
//! enforced by the service; this type only keeps the mapping consistent.

use crate::domain::value_objects::{Bytes, DataKey};
use crate::errors::AccountError;
use std::collections::HashMap;

/// Mapping from 32-byte keys to arbitrary byte strings.
///
/// An absent key reads as the empty value.
#[derive(Clone, Debug, Default)]
pub struct DataStore {
    entries: HashMap<DataKey, Bytes>,
}

impl DataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `key`, returning empty bytes when it was never set.
    #[must_use]
    pub fn get(&self, key: &DataKey) -> Bytes {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    /// Upserts `key`. Returns the previous value if any.
    pub fn set(&mut self, key: DataKey, value: Bytes) -> Option<Bytes> {
        self.entries.insert(key, value)
    }

    /// Validates a batch before any write is applied.
    pub fn check_batch(keys: &[DataKey], values: &[Bytes]) -> Result<(), AccountError> {
        if keys.is_empty() {
            return Err(AccountError::EmptyBatch);
        }
        if keys.len() != values.len() {
            return Err(AccountError::LengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        Ok(())
    }

    /// Applies a batch after [`DataStore::check_batch`]. Later duplicates win.
    pub fn set_batch(&mut self, keys: &[DataKey], values: &[Bytes]) -> Result<(), AccountError> {
        Self::check_batch(keys, values)?;
        for (key, value) in keys.iter().zip(values) {
            self.entries.insert(*key, value.clone());
        }
        Ok(())
    }

    /// Reads several keys in order.
    #[must_use]
    pub fn get_batch(&self, keys: &[DataKey]) -> Vec<Bytes> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Number of keys ever written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was ever written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
