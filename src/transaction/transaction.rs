// Copyright 2026 Tidepool Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A single MVCC transaction
//!
//! The transaction does not own any version node: catalog sets and segments
//! do. It keeps back-pointers to every node it created so commit can rewrite
//! their timestamps and abort can splice them back out, in order.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::catalog::catalog_set::{CatalogSet, NodeId};
use crate::storage::segment::{Segment, UpdateId, UpdateInfo};

use super::undo::UndoEntry;

/// An in-flight transaction
///
/// `transaction_id` is drawn from the range above
/// [`TRANSACTION_ID_START`](crate::core::TRANSACTION_ID_START);
/// `start_time` is the commit timestamp the next committer would receive at
/// the moment this transaction began. A version written at timestamp `t` is
/// visible to this transaction iff `t == transaction_id || t < start_time`.
pub struct Transaction {
    transaction_id: u64,
    start_time: u64,
    undo_buffer: Mutex<Vec<UndoEntry>>,
}

impl Transaction {
    pub(crate) fn new(transaction_id: u64, start_time: u64) -> Self {
        Transaction {
            transaction_id,
            start_time,
            undo_buffer: Mutex::new(Vec::new()),
        }
    }

    /// The unique id stamped on every version this transaction creates
    pub fn transaction_id(&self) -> u64 {
        self.transaction_id
    }

    /// The snapshot boundary: commits strictly below this are visible
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// The single-comparison visibility predicate
    #[inline]
    pub fn visible(&self, timestamp: u64) -> bool {
        timestamp == self.transaction_id || timestamp < self.start_time
    }

    /// True if this transaction has not written anything yet
    pub fn is_read_only(&self) -> bool {
        self.undo_buffer.lock().is_empty()
    }

    /// Allocate an [`UpdateInfo`] sized for `vector_size` rows of
    /// `type_size`-byte values, stamped with this transaction's id.
    ///
    /// Segments place the returned node into their per-vector chains; the
    /// matching undo entry is recorded when the node is linked in.
    pub fn create_update_info(&self, type_size: usize, vector_size: usize) -> UpdateInfo {
        UpdateInfo::with_capacity(self.transaction_id, type_size, vector_size)
    }

    pub(crate) fn push_catalog_entry(&self, set: Arc<CatalogSet>, node: NodeId) {
        self.undo_buffer
            .lock()
            .push(UndoEntry::CatalogEntry { set, node });
    }

    pub(crate) fn push_update(&self, segment: Arc<Segment>, node: UpdateId) {
        self.undo_buffer
            .lock()
            .push(UndoEntry::Update { segment, node });
    }

    pub(crate) fn take_undo_buffer(&self) -> Vec<UndoEntry> {
        std::mem::take(&mut *self.undo_buffer.lock())
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("transaction_id", &self.transaction_id)
            .field("start_time", &self.start_time)
            .field("undo_entries", &self.undo_buffer.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TRANSACTION_ID_START;

    #[test]
    fn test_visibility_predicate() {
        let txn = Transaction::new(TRANSACTION_ID_START + 7, 10);
        // own writes
        assert!(txn.visible(TRANSACTION_ID_START + 7));
        // committed before us
        assert!(txn.visible(9));
        assert!(txn.visible(0));
        // committed at or after our snapshot
        assert!(!txn.visible(10));
        assert!(!txn.visible(11));
        // someone else's in-flight write
        assert!(!txn.visible(TRANSACTION_ID_START + 8));
    }

    #[test]
    fn test_new_transaction_is_read_only() {
        let txn = Transaction::new(TRANSACTION_ID_START, 1);
        assert!(txn.is_read_only());
    }
}
