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

//! Transaction manager
//!
//! Assigns transaction ids from the upper timestamp range and commit
//! timestamps from the lower range, and walks undo buffers on commit and
//! abort. Begin and commit are serialized under one lock so a snapshot can
//! never observe half a commit.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::core::{Result, TRANSACTION_ID_START};

use super::transaction::Transaction;

/// Creates, commits, and aborts transactions
pub struct TransactionManager {
    /// The commit timestamp the next committer will receive; doubles as the
    /// snapshot boundary handed to new transactions
    current_start_timestamp: AtomicU64,

    /// Next transaction id to hand out
    current_transaction_id: AtomicU64,

    /// Ids of transactions that have begun but not yet committed or aborted
    active_transactions: Mutex<FxHashSet<u64>>,

    /// Serializes begin/commit/abort so timestamps and undo walks are atomic
    /// with respect to each other
    transaction_lock: Mutex<()>,
}

impl TransactionManager {
    /// Create a manager. Commit timestamp 0 is reserved for bootstrap
    /// catalog entries, so the first real commit receives timestamp 1.
    pub fn new() -> Self {
        TransactionManager {
            current_start_timestamp: AtomicU64::new(1),
            current_transaction_id: AtomicU64::new(TRANSACTION_ID_START),
            active_transactions: Mutex::new(FxHashSet::default()),
            transaction_lock: Mutex::new(()),
        }
    }

    /// Begin a new transaction with a snapshot fixed at the current commit
    /// boundary
    pub fn begin(&self) -> Transaction {
        let _guard = self.transaction_lock.lock();
        let start_time = self.current_start_timestamp.load(Ordering::Acquire);
        let transaction_id = self
            .current_transaction_id
            .fetch_add(1, Ordering::AcqRel);
        self.active_transactions.lock().insert(transaction_id);
        Transaction::new(transaction_id, start_time)
    }

    /// Commit a transaction
    ///
    /// Walks the undo buffer in creation order, rewriting every created
    /// version's timestamp to the freshly assigned commit timestamp under
    /// the owning set's or segment's lock. Read-only transactions do not
    /// consume a commit timestamp.
    pub fn commit(&self, transaction: Transaction) -> Result<()> {
        let _guard = self.transaction_lock.lock();
        let entries = transaction.take_undo_buffer();
        if !entries.is_empty() {
            let commit_ts = self
                .current_start_timestamp
                .fetch_add(1, Ordering::AcqRel);
            for entry in &entries {
                entry.commit(commit_ts)?;
            }
        }
        self.active_transactions
            .lock()
            .remove(&transaction.transaction_id());
        Ok(())
    }

    /// Abort a transaction
    ///
    /// Walks the undo buffer in reverse, splicing every created version
    /// back out and restoring segment pre-images.
    pub fn abort(&self, transaction: Transaction) -> Result<()> {
        let _guard = self.transaction_lock.lock();
        let entries = transaction.take_undo_buffer();
        for entry in entries.iter().rev() {
            entry.revert()?;
        }
        self.active_transactions
            .lock()
            .remove(&transaction.transaction_id());
        Ok(())
    }

    /// Number of transactions currently in flight
    pub fn active_transaction_count(&self) -> usize {
        self.active_transactions.lock().len()
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        TransactionManager::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_ids_monotonic_and_in_range() {
        let manager = TransactionManager::new();
        let a = manager.begin();
        let b = manager.begin();
        assert!(a.transaction_id() >= TRANSACTION_ID_START);
        assert!(b.transaction_id() > a.transaction_id());
        assert_eq!(manager.active_transaction_count(), 2);
        manager.commit(a).expect("commit");
        manager.abort(b).expect("abort");
        assert_eq!(manager.active_transaction_count(), 0);
    }

    #[test]
    fn test_read_only_commit_keeps_snapshot_boundary() {
        let manager = TransactionManager::new();
        let a = manager.begin();
        manager.commit(a).expect("commit");
        // a wrote nothing, so the next snapshot is unchanged
        let b = manager.begin();
        assert_eq!(b.start_time(), 1);
        manager.commit(b).expect("commit");
    }

    #[test]
    fn test_concurrent_transactions_share_snapshot() {
        let manager = TransactionManager::new();
        let a = manager.begin();
        let b = manager.begin();
        assert_eq!(a.start_time(), b.start_time());
        manager.commit(a).expect("commit");
        manager.commit(b).expect("commit");
    }
}
