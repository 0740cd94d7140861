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

//! Undo buffer entries
//!
//! Each entry is a typed back-pointer to a version node the transaction
//! created. The owning set or segment takes its own lock inside
//! `commit`/`revert`; the manager only orders the walk.

use std::sync::Arc;

use crate::catalog::catalog_set::{CatalogSet, NodeId};
use crate::core::Result;
use crate::storage::segment::{Segment, UpdateId};

/// A back-pointer into a version chain owned by a catalog set or segment
pub(crate) enum UndoEntry {
    /// The chain position *below* a catalog version this transaction
    /// prepended (the prepend pushes its `child`, mirroring the splice
    /// that undo reverses)
    CatalogEntry { set: Arc<CatalogSet>, node: NodeId },

    /// An update node this transaction linked into a per-vector chain
    Update {
        segment: Arc<Segment>,
        node: UpdateId,
    },
}

impl UndoEntry {
    /// Rewrite the created version's timestamp to the commit timestamp
    pub(crate) fn commit(&self, commit_ts: u64) -> Result<()> {
        match self {
            UndoEntry::CatalogEntry { set, node } => set.commit_entry(*node, commit_ts),
            UndoEntry::Update { segment, node } => segment.commit_update(*node, commit_ts),
        }
    }

    /// Reverse the splice: unlink the created version and restore the
    /// previous state
    pub(crate) fn revert(&self) -> Result<()> {
        match self {
            UndoEntry::CatalogEntry { set, node } => set.undo(*node),
            UndoEntry::Update { segment, node } => segment.rollback_update(*node),
        }
    }
}
