//! # Audit Log
//!
//! Append-only list of [`OperationRecord`]s in emission order.

use crate::domain::entities::OperationRecord;

/// Write-once log of successful dispatches.
///
/// Entries are never edited. The only removal is [`AuditLog::rewind`],
/// which undoes the records of an enclosing dispatch that failed.
#[derive(Clone, Debug, Default)]
pub struct AuditLog {
    records: Vec<OperationRecord>,
}

impl AuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns its sequence number.
    pub fn append(&mut self, record: OperationRecord) -> u64 {
        self.records.push(record);
        (self.records.len() - 1) as u64
    }

    /// Drops every record past the first `len`.
    pub fn rewind(&mut self, len: usize) {
        self.records.truncate(len);
    }

    /// All records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing was dispatched yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
