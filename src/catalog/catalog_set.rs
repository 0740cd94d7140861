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

//! Versioned catalog sets
//!
//! A [`CatalogSet`] maps names to version chains of catalog entries. Every
//! mutation prepends a new version stamped with the writing transaction's
//! id; readers walk the chain until they hit a version their snapshot may
//! see. One mutex guards the name map, the node arena, and every traversal.
//!
//! Chains grow newest-first and always terminate in a dummy deleted node
//! with timestamp 0, so a reader that predates the key's creation observes
//! "not there" instead of walking off the end.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::core::{Error, Result, TRANSACTION_ID_START};
use crate::transaction::Transaction;

use super::entry::CatalogEntry;

/// Handle to a version node inside a set's arena
pub type NodeId = usize;

/// One version of a named entry
#[derive(Debug)]
struct VersionNode {
    /// Transaction id while uncommitted, commit timestamp afterwards
    timestamp: u64,
    /// Tombstone flag; the dummy sentinel and dropped versions set it
    deleted: bool,
    /// The immediately older version
    child: Option<NodeId>,
    /// The immediately newer version; the chain head has none
    parent: Option<NodeId>,
    name: String,
    /// Payload; `None` on the sentinel and on tombstones
    entry: Option<Arc<CatalogEntry>>,
}

#[derive(Default)]
struct CatalogSetInner {
    /// name -> head of chain
    data: FxHashMap<String, NodeId>,
    /// Node arena; freed slots are recycled through `free_list`
    nodes: Vec<Option<VersionNode>>,
    free_list: Vec<NodeId>,
}

impl CatalogSetInner {
    fn alloc(&mut self, node: VersionNode) -> NodeId {
        if let Some(id) = self.free_list.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn free(&mut self, id: NodeId) {
        self.nodes[id] = None;
        self.free_list.push(id);
    }

    fn node(&self, id: NodeId) -> Result<&VersionNode> {
        self.nodes
            .get(id)
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| Error::internal(format!("stale catalog version handle {}", id)))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut VersionNode> {
        self.nodes
            .get_mut(id)
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| Error::internal(format!("stale catalog version handle {}", id)))
    }

    /// Walk from `head` to the version `txn` is entitled to see. The chain
    /// terminates in the timestamp-0 sentinel, which every snapshot sees.
    fn walk_visible(&self, head: NodeId, txn: &Transaction) -> Result<NodeId> {
        let mut current = head;
        loop {
            let node = self.node(current)?;
            if node.timestamp == txn.transaction_id() || node.timestamp < txn.start_time() {
                return Ok(current);
            }
            match node.child {
                Some(child) => current = child,
                None => return Ok(current),
            }
        }
    }
}

/// A mutex-guarded mapping from names to version chains
pub struct CatalogSet {
    inner: Mutex<CatalogSetInner>,
    /// Back-reference handed to undo entries, which must outlive the
    /// transaction that recorded them
    self_weak: Weak<CatalogSet>,
}

impl CatalogSet {
    /// Create an empty set
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak| CatalogSet {
            inner: Mutex::new(CatalogSetInner::default()),
            self_weak: weak.clone(),
        })
    }

    fn self_arc(&self) -> Result<Arc<CatalogSet>> {
        self.self_weak
            .upgrade()
            .ok_or_else(|| Error::internal("catalog set dropped while in use"))
    }

    /// Create a new entry under `name`
    ///
    /// Returns `Ok(false)` when a version of `name` visible as live blocks
    /// the creation. Fails with [`Error::WriteWriteConflict`] when another
    /// in-flight transaction holds the head of the chain.
    pub fn create_entry(
        &self,
        txn: &Transaction,
        name: &str,
        entry: CatalogEntry,
    ) -> Result<bool> {
        let mut inner = self.inner.lock();

        let head = match inner.data.get(name).copied() {
            None => {
                // first sighting of this name: seed the chain with the
                // dummy deleted sentinel so concurrent snapshots read
                // "not yet there"
                let dummy = VersionNode {
                    timestamp: 0,
                    deleted: true,
                    child: None,
                    parent: None,
                    name: name.to_string(),
                    entry: None,
                };
                let id = inner.alloc(dummy);
                inner.data.insert(name.to_string(), id);
                id
            }
            Some(head) => {
                let node = inner.node(head)?;
                if node.timestamp >= TRANSACTION_ID_START
                    && node.timestamp != txn.transaction_id()
                {
                    return Err(Error::write_conflict(format!("catalog entry '{}'", name)));
                }
                if !node.deleted {
                    // a live version exists (committed, or created earlier
                    // by this same transaction)
                    return Ok(false);
                }
                head
            }
        };

        if inner.node(head)?.timestamp == txn.transaction_id() {
            // this transaction dropped the entry earlier; revive its own
            // node in place so the chain keeps a single in-flight version
            let node = inner.node_mut(head)?;
            node.deleted = false;
            node.entry = Some(Arc::new(entry));
            return Ok(true);
        }

        let new_id = inner.alloc(VersionNode {
            timestamp: txn.transaction_id(),
            deleted: false,
            child: Some(head),
            parent: None,
            name: name.to_string(),
            entry: Some(Arc::new(entry)),
        });
        inner.node_mut(head)?.parent = Some(new_id);
        inner.data.insert(name.to_string(), new_id);
        drop(inner);

        txn.push_catalog_entry(self.self_arc()?, head);
        Ok(true)
    }

    /// Drop the entry under `name` by prepending a tombstone version
    ///
    /// Returns `Ok(false)` when no version of `name` is visible as live.
    pub fn drop_entry(&self, txn: &Transaction, name: &str) -> Result<bool> {
        let mut inner = self.inner.lock();

        let Some(head) = inner.data.get(name).copied() else {
            return Ok(false);
        };
        let head_node = inner.node(head)?;
        if head_node.timestamp >= TRANSACTION_ID_START
            && head_node.timestamp != txn.transaction_id()
        {
            return Err(Error::write_conflict(format!("catalog entry '{}'", name)));
        }

        let visible = inner.walk_visible(head, txn)?;
        if inner.node(visible)?.deleted {
            return Ok(false);
        }

        if inner.node(head)?.timestamp == txn.transaction_id() {
            // dropping our own uncommitted version: flip it in place
            let node = inner.node_mut(head)?;
            node.deleted = true;
            node.entry = None;
            return Ok(true);
        }

        let new_id = inner.alloc(VersionNode {
            timestamp: txn.transaction_id(),
            deleted: true,
            child: Some(head),
            parent: None,
            name: name.to_string(),
            entry: None,
        });
        inner.node_mut(head)?.parent = Some(new_id);
        inner.data.insert(name.to_string(), new_id);
        drop(inner);

        txn.push_catalog_entry(self.self_arc()?, head);
        Ok(true)
    }

    /// Replace the entry under `name` with a new payload (ALTER)
    ///
    /// Returns `Ok(false)` when no version of `name` is visible as live.
    pub fn alter_entry(
        &self,
        txn: &Transaction,
        name: &str,
        entry: CatalogEntry,
    ) -> Result<bool> {
        let mut inner = self.inner.lock();

        let Some(head) = inner.data.get(name).copied() else {
            return Ok(false);
        };
        let head_node = inner.node(head)?;
        if head_node.timestamp >= TRANSACTION_ID_START
            && head_node.timestamp != txn.transaction_id()
        {
            return Err(Error::write_conflict(format!("catalog entry '{}'", name)));
        }

        let visible = inner.walk_visible(head, txn)?;
        if inner.node(visible)?.deleted {
            return Ok(false);
        }

        if inner.node(head)?.timestamp == txn.transaction_id() {
            // altering our own uncommitted version: swap the payload
            inner.node_mut(head)?.entry = Some(Arc::new(entry));
            return Ok(true);
        }

        let new_id = inner.alloc(VersionNode {
            timestamp: txn.transaction_id(),
            deleted: false,
            child: Some(head),
            parent: None,
            name: name.to_string(),
            entry: Some(Arc::new(entry)),
        });
        inner.node_mut(head)?.parent = Some(new_id);
        inner.data.insert(name.to_string(), new_id);
        drop(inner);

        txn.push_catalog_entry(self.self_arc()?, head);
        Ok(true)
    }

    /// Whether a live version of `name` is visible to `txn`
    pub fn entry_exists(&self, txn: &Transaction, name: &str) -> Result<bool> {
        let inner = self.inner.lock();
        let Some(&head) = inner.data.get(name) else {
            return Ok(false);
        };
        let visible = inner.walk_visible(head, txn)?;
        Ok(!inner.node(visible)?.deleted)
    }

    /// The entry visible to `txn` under `name`, if any
    pub fn get_entry(&self, txn: &Transaction, name: &str) -> Result<Option<Arc<CatalogEntry>>> {
        let inner = self.inner.lock();
        let Some(&head) = inner.data.get(name) else {
            return Ok(None);
        };
        let visible = inner.walk_visible(head, txn)?;
        let node = inner.node(visible)?;
        if node.deleted {
            return Ok(None);
        }
        let entry = node
            .entry
            .as_ref()
            .ok_or_else(|| Error::internal(format!("live catalog version of '{}' has no payload", name)))?;
        Ok(Some(Arc::clone(entry)))
    }

    /// All live entries visible to `txn`, ordered by name
    pub fn scan_entries(&self, txn: &Transaction) -> Result<Vec<Arc<CatalogEntry>>> {
        let inner = self.inner.lock();
        let mut entries = Vec::new();
        for &head in inner.data.values() {
            let visible = inner.walk_visible(head, txn)?;
            let node = inner.node(visible)?;
            if node.deleted {
                continue;
            }
            let entry = node.entry.as_ref().ok_or_else(|| {
                Error::internal(format!("live catalog version of '{}' has no payload", node.name))
            })?;
            entries.push(Arc::clone(entry));
        }
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(entries)
    }

    /// Bootstrap insertion of an entry committed at timestamp 0, outside
    /// any transaction. Used to seed the default schema.
    pub(crate) fn insert_bootstrap(&self, name: &str, entry: CatalogEntry) {
        let mut inner = self.inner.lock();
        let dummy = inner.alloc(VersionNode {
            timestamp: 0,
            deleted: true,
            child: None,
            parent: None,
            name: name.to_string(),
            entry: None,
        });
        let id = inner.alloc(VersionNode {
            timestamp: 0,
            deleted: false,
            child: Some(dummy),
            parent: None,
            name: name.to_string(),
            entry: Some(Arc::new(entry)),
        });
        if let Ok(node) = inner.node_mut(dummy) {
            node.parent = Some(id);
        }
        inner.data.insert(name.to_string(), id);
    }

    /// Rewrite the version above `child` to carry the commit timestamp.
    /// Invoked by the transaction manager while walking the undo buffer.
    pub(crate) fn commit_entry(&self, child: NodeId, commit_ts: u64) -> Result<()> {
        let mut inner = self.inner.lock();
        let parent = inner
            .node(child)?
            .parent
            .ok_or_else(|| Error::internal("commit of an unlinked catalog version"))?;
        inner.node_mut(parent)?.timestamp = commit_ts;
        Ok(())
    }

    /// Reverse the splice performed when the version above `child` was
    /// prepended, restoring `child` as the reachable head (or mid-chain
    /// link). The removed node's slot returns to the free list.
    pub(crate) fn undo(&self, child: NodeId) -> Result<()> {
        let mut inner = self.inner.lock();
        let parent = inner
            .node(child)?
            .parent
            .ok_or_else(|| Error::internal("undo of an unlinked catalog version"))?;
        match inner.node(parent)?.parent {
            Some(grandparent) => {
                inner.node_mut(grandparent)?.child = Some(child);
                inner.node_mut(child)?.parent = Some(grandparent);
            }
            None => {
                let name = inner.node(parent)?.name.clone();
                inner.data.insert(name, child);
                inner.node_mut(child)?.parent = None;
            }
        }
        inner.free(parent);
        Ok(())
    }

    /// Number of version nodes currently allocated. Exposed for the chain
    /// shape assertions in tests.
    pub fn version_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Verify the chain invariants for every key: a single in-flight
    /// version at most, a strict linear child/parent order, and a
    /// timestamp-0 sentinel at the tail.
    pub fn check_chain_shape(&self) -> Result<()> {
        let inner = self.inner.lock();
        for (name, &head) in &inner.data {
            let mut in_flight = 0usize;
            let mut current = head;
            let mut expected_parent = None;
            loop {
                let node = inner.node(current)?;
                if node.parent != expected_parent {
                    return Err(Error::internal(format!(
                        "broken parent link in chain of '{}'",
                        name
                    )));
                }
                if node.timestamp >= TRANSACTION_ID_START {
                    in_flight += 1;
                }
                match node.child {
                    Some(child) => {
                        expected_parent = Some(current);
                        current = child;
                    }
                    None => {
                        if node.timestamp != 0 || !node.deleted {
                            return Err(Error::internal(format!(
                                "chain of '{}' does not end in the sentinel",
                                name
                            )));
                        }
                        break;
                    }
                }
            }
            if in_flight > 1 {
                return Err(Error::internal(format!(
                    "{} in-flight versions in chain of '{}'",
                    in_flight, name
                )));
            }
        }
        Ok(())
    }
}

