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

//! Versioned column segments
//!
//! A segment covers `max_vector_count` vectors of one column. Base data
//! lives in a block held by the buffer manager; in-flight and recently
//! committed updates live in per-vector [`UpdateInfo`] chains. An update
//! applies its new values to the block in place and keeps the *previous*
//! values in its chain node, so rollback restores them and older snapshots
//! overlay them during scans.
//!
//! Block layout per vector: `[null mask][VECTOR_SIZE * type_size bytes]`.
//! Updates against an immutable registered block first promote the segment
//! to a fresh in-memory copy (copy-on-write).

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use smallvec::SmallVec;

use crate::core::{
    Error, NullMask, PhysicalType, Result, SelectionVector, Value, Vector, NULLMASK_BYTES,
    TRANSACTION_ID_START, VECTOR_SIZE,
};
use crate::transaction::Transaction;

use super::buffer::{BlockId, BufferHandle, BufferManager, MAXIMUM_BLOCK};
use super::filter::{filter_selection, TableFilter};
use super::string_heap::StringHeap;

/// Handle to an update node inside a segment's arena
pub type UpdateId = usize;

/// One transaction's updates to one vector
///
/// `tuples` holds the affected row offsets within the vector in strictly
/// ascending order; `payload` holds the pre-image bytes row for row, and
/// `nulls` the pre-image null bit per covered offset.
pub struct UpdateInfo {
    pub(crate) version_number: u64,
    pub(crate) vector_index: usize,
    pub(crate) tuples: SmallVec<[u32; 8]>,
    pub(crate) payload: Vec<u8>,
    pub(crate) nulls: NullMask,
    pub(crate) type_size: usize,
    pub(crate) next: Option<UpdateId>,
    pub(crate) prev: Option<UpdateId>,
}

impl UpdateInfo {
    /// Allocate an empty node stamped with the writing transaction's id,
    /// with payload capacity for `vector_size` rows of `type_size` bytes
    pub(crate) fn with_capacity(transaction_id: u64, type_size: usize, vector_size: usize) -> Self {
        UpdateInfo {
            version_number: transaction_id,
            vector_index: 0,
            tuples: SmallVec::new(),
            payload: Vec::with_capacity(type_size * vector_size),
            nulls: NullMask::none(),
            type_size,
            next: None,
            prev: None,
        }
    }
}

/// Min/max bounds observed for the segment's values
///
/// Bounds only widen: rolled-back updates may leave them looser than the
/// live data, which is sound for pruning.
#[derive(Debug, Clone, Default)]
pub struct SegmentStatistics {
    pub min: Option<Value>,
    pub max: Option<Value>,
}

struct SegmentData {
    block_id: BlockId,
    /// Rows present in the segment's base data
    tuple_count: usize,
    /// Per-vector chain heads, allocated on first update
    versions: Option<Vec<Option<UpdateId>>>,
    nodes: Vec<Option<UpdateInfo>>,
    free_list: Vec<UpdateId>,
}

/// Shared-lock state threaded through an index scan; the lock taken on the
/// first vector is held until the state is dropped
#[derive(Default)]
pub struct ColumnScanState<'a> {
    locks: SmallVec<[RwLockReadGuard<'a, SegmentData>; 1]>,
}

impl ColumnScanState<'_> {
    /// Fresh state with no lock held
    pub fn new() -> Self {
        ColumnScanState {
            locks: SmallVec::new(),
        }
    }
}

/// A versioned segment of one column
pub struct Segment {
    column_type: PhysicalType,
    type_size: usize,
    /// Row id of the segment's first row
    row_start: u64,
    max_vector_count: usize,
    manager: Arc<BufferManager>,
    heap: StringHeap,
    data: RwLock<SegmentData>,
    stats: Mutex<SegmentStatistics>,
    /// Back-reference handed to undo entries, which must outlive the
    /// transaction that recorded them
    self_weak: Weak<Segment>,
}

impl Segment {
    /// Create a segment backed by a fresh zeroed in-memory block
    pub fn temporary(
        manager: Arc<BufferManager>,
        column_type: PhysicalType,
        row_start: u64,
        max_vector_count: usize,
    ) -> Arc<Self> {
        let type_size = column_type.type_size();
        let stride = NULLMASK_BYTES + VECTOR_SIZE * type_size;
        let handle = manager.allocate(stride * max_vector_count);
        Arc::new_cyclic(|weak| Segment {
            column_type,
            type_size,
            row_start,
            max_vector_count,
            manager,
            heap: StringHeap::new(),
            data: RwLock::new(SegmentData {
                block_id: handle.block_id(),
                tuple_count: 0,
                versions: None,
                nodes: Vec::new(),
                free_list: Vec::new(),
            }),
            stats: Mutex::new(SegmentStatistics::default()),
            self_weak: weak.clone(),
        })
    }

    /// Wrap an immutable registered block holding `tuple_count` rows
    pub fn persistent(
        manager: Arc<BufferManager>,
        column_type: PhysicalType,
        row_start: u64,
        max_vector_count: usize,
        block_id: BlockId,
        tuple_count: usize,
    ) -> Result<Arc<Self>> {
        if block_id >= MAXIMUM_BLOCK {
            return Err(Error::internal(
                "persistent segments require a registered block id",
            ));
        }
        let type_size = column_type.type_size();
        let stride = NULLMASK_BYTES + VECTOR_SIZE * type_size;
        let handle = manager.pin(block_id)?;
        if handle.data().len() < stride * max_vector_count {
            return Err(Error::internal("block too small for segment geometry"));
        }
        Ok(Arc::new_cyclic(|weak| Segment {
            column_type,
            type_size,
            row_start,
            max_vector_count,
            manager,
            heap: StringHeap::new(),
            data: RwLock::new(SegmentData {
                block_id,
                tuple_count,
                versions: None,
                nodes: Vec::new(),
                free_list: Vec::new(),
            }),
            stats: Mutex::new(SegmentStatistics::default()),
            self_weak: weak.clone(),
        }))
    }

    fn self_arc(&self) -> Result<Arc<Segment>> {
        self.self_weak
            .upgrade()
            .ok_or_else(|| Error::internal("segment dropped while in use"))
    }

    /// The column type this segment stores
    pub fn column_type(&self) -> PhysicalType {
        self.column_type
    }

    /// Row id of the segment's first row
    pub fn row_start(&self) -> u64 {
        self.row_start
    }

    /// Rows present in the segment
    pub fn tuple_count(&self) -> usize {
        self.data.read().tuple_count
    }

    /// The backing block's id
    pub fn block_id(&self) -> BlockId {
        self.data.read().block_id
    }

    /// Whether the segment still points at an immutable registered block
    pub fn is_persistent(&self) -> bool {
        self.data.read().block_id < MAXIMUM_BLOCK
    }

    /// Current min/max bounds
    pub fn statistics(&self) -> SegmentStatistics {
        self.stats.lock().clone()
    }

    fn stride(&self) -> usize {
        NULLMASK_BYTES + VECTOR_SIZE * self.type_size
    }

    fn byte_offset(&self, vector_index: usize) -> usize {
        vector_index * self.stride()
    }

    fn node_ref(data: &SegmentData, id: UpdateId) -> Result<&UpdateInfo> {
        data.nodes
            .get(id)
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| Error::internal(format!("stale update handle {}", id)))
    }

    fn node_mut(data: &mut SegmentData, id: UpdateId) -> Result<&mut UpdateInfo> {
        data.nodes
            .get_mut(id)
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| Error::internal(format!("stale update handle {}", id)))
    }

    fn alloc_node(data: &mut SegmentData, node: UpdateInfo) -> UpdateId {
        if let Some(id) = data.free_list.pop() {
            data.nodes[id] = Some(node);
            id
        } else {
            data.nodes.push(Some(node));
            data.nodes.len() - 1
        }
    }

    fn chain_head(data: &SegmentData, vector_index: usize) -> Option<UpdateId> {
        data.versions
            .as_ref()
            .and_then(|heads| heads.get(vector_index).copied().flatten())
    }

    fn encode_value(&self, out: &mut [u8], value: &Value) -> Result<()> {
        match (self.column_type, value) {
            (PhysicalType::Int8, Value::Int8(v)) => out.copy_from_slice(&v.to_le_bytes()),
            (PhysicalType::Int16, Value::Int16(v)) => out.copy_from_slice(&v.to_le_bytes()),
            (PhysicalType::Int32, Value::Int32(v)) => out.copy_from_slice(&v.to_le_bytes()),
            (PhysicalType::Int64, Value::Int64(v)) => out.copy_from_slice(&v.to_le_bytes()),
            (PhysicalType::Float, Value::Float(v)) => out.copy_from_slice(&v.to_le_bytes()),
            (PhysicalType::Double, Value::Double(v)) => out.copy_from_slice(&v.to_le_bytes()),
            (PhysicalType::Varchar, Value::Varchar(s)) => {
                out.copy_from_slice(&self.heap.intern(s).to_le_bytes())
            }
            (_, _) => {
                return Err(Error::InvalidType {
                    expected: self.column_type,
                    got: value.physical_type().unwrap_or(self.column_type),
                })
            }
        }
        Ok(())
    }

    fn decode_value(&self, bytes: &[u8]) -> Result<Value> {
        let value = match self.column_type {
            PhysicalType::Int8 => Value::Int8(i8::from_le_bytes([bytes[0]])),
            PhysicalType::Int16 => {
                let mut buf = [0u8; 2];
                buf.copy_from_slice(bytes);
                Value::Int16(i16::from_le_bytes(buf))
            }
            PhysicalType::Int32 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Value::Int32(i32::from_le_bytes(buf))
            }
            PhysicalType::Int64 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Value::Int64(i64::from_le_bytes(buf))
            }
            PhysicalType::Float => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Value::Float(f32::from_le_bytes(buf))
            }
            PhysicalType::Double => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Value::Double(f64::from_le_bytes(buf))
            }
            PhysicalType::Varchar => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Value::Varchar(self.heap.get(u64::from_le_bytes(buf))?)
            }
        };
        Ok(value)
    }

    fn merge_statistics(&self, value: &Value) {
        if value.is_null() {
            return;
        }
        let mut stats = self.stats.lock();
        match &stats.min {
            Some(min) if !matches!(value.partial_cmp(min), Some(std::cmp::Ordering::Less)) => {}
            _ => stats.min = Some(value.clone()),
        }
        match &stats.max {
            Some(max) if !matches!(value.partial_cmp(max), Some(std::cmp::Ordering::Greater)) => {}
            _ => stats.max = Some(value.clone()),
        }
    }

    /// Write base data for one vector. Only valid on in-memory blocks;
    /// loaders appending into registered blocks do so before registration.
    pub fn append(&self, vector_index: usize, vector: &Vector) -> Result<()> {
        if vector.physical_type() != self.column_type {
            return Err(Error::InvalidType {
                expected: self.column_type,
                got: vector.physical_type(),
            });
        }
        if vector_index >= self.max_vector_count || vector.len() > VECTOR_SIZE {
            return Err(Error::internal("append outside segment geometry"));
        }
        let mut data = self.data.write();
        if data.block_id < MAXIMUM_BLOCK {
            return Err(Error::internal("append to an immutable block"));
        }
        let handle = self.manager.pin(data.block_id)?;
        let base = self.byte_offset(vector_index);
        {
            let mut bytes = handle.data_mut();
            bytes[base..base + NULLMASK_BYTES].copy_from_slice(&vector.nulls().to_bytes());
            for i in 0..vector.len() {
                let value = vector.value(i);
                if value.is_null() {
                    continue;
                }
                let off = base + NULLMASK_BYTES + i * self.type_size;
                self.encode_value(&mut bytes[off..off + self.type_size], &value)?;
                self.merge_statistics(&value);
            }
        }
        data.tuple_count = data
            .tuple_count
            .max(vector_index * VECTOR_SIZE + vector.len());
        Ok(())
    }

    /// Promote the segment from an immutable registered block to a fresh
    /// in-memory copy. Idempotent under the exclusive lock.
    pub fn to_temporary(&self) -> Result<()> {
        let mut data = self.data.write();
        self.promote_locked(&mut data)
    }

    fn promote_locked(&self, data: &mut SegmentData) -> Result<()> {
        if data.block_id >= MAXIMUM_BLOCK {
            // another thread already promoted
            return Ok(());
        }
        let current = self.manager.pin(data.block_id)?;
        let handle = self.manager.allocate(self.stride() * self.max_vector_count);
        {
            let src = current.data();
            let mut dst = handle.data_mut();
            let len = src.len().min(dst.len());
            dst[..len].copy_from_slice(&src[..len]);
        }
        data.block_id = handle.block_id();
        Ok(())
    }

    /// Update the rows in `ids` with the values in `update`
    ///
    /// `ids` must be strictly ascending and fall inside one vector. The new
    /// values go into the mutable block in place; the previous values go
    /// into this transaction's chain node so rollback and older snapshots
    /// can reach them. A tuple already claimed by another in-flight (or
    /// later-committed) transaction fails with
    /// [`Error::WriteWriteConflict`].
    pub fn update(&self, txn: &Transaction, ids: &[u64], update: &Vector) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        if ids.len() != update.len() {
            return Err(Error::internal("update id and value counts differ"));
        }
        if update.physical_type() != self.column_type {
            return Err(Error::InvalidType {
                expected: self.column_type,
                got: update.physical_type(),
            });
        }
        for pair in ids.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::internal("update row ids must be strictly ascending"));
            }
        }
        if ids[0] < self.row_start {
            return Err(Error::internal("update row id below segment start"));
        }

        let vector_index = ((ids[0] - self.row_start) / VECTOR_SIZE as u64) as usize;
        let vector_offset = self.row_start + (vector_index * VECTOR_SIZE) as u64;
        let last = ids[ids.len() - 1];
        if vector_index >= self.max_vector_count || last >= vector_offset + VECTOR_SIZE as u64 {
            return Err(Error::internal("update ids cross a vector boundary"));
        }

        let mut data = self.data.write();
        if (last - self.row_start) as usize >= data.tuple_count {
            return Err(Error::internal("update row id beyond appended rows"));
        }
        if data.block_id < MAXIMUM_BLOCK {
            self.promote_locked(&mut data)?;
        }
        if data.versions.is_none() {
            data.versions = Some(vec![None; self.max_vector_count]);
        }

        let head = Self::chain_head(&data, vector_index);
        let own = self.check_for_conflicts(&data, head, txn, ids, vector_offset)?;

        let handle = self.manager.pin(data.block_id)?;
        match own {
            None => {
                let segment = self.self_arc()?;
                let mut node = txn.create_update_info(self.type_size, VECTOR_SIZE);
                node.vector_index = vector_index;
                {
                    let bytes = handle.data();
                    let base = self.byte_offset(vector_index);
                    let base_nulls = NullMask::from_bytes(&bytes[base..base + NULLMASK_BYTES])?;
                    for &id in ids {
                        let tuple = (id - vector_offset) as usize;
                        let off = base + NULLMASK_BYTES + tuple * self.type_size;
                        node.tuples.push(tuple as u32);
                        node.payload
                            .extend_from_slice(&bytes[off..off + self.type_size]);
                        node.nulls.set(tuple, base_nulls.is_null(tuple));
                    }
                }
                node.next = head;
                let id = Self::alloc_node(&mut data, node);
                if let Some(old_head) = head {
                    Self::node_mut(&mut data, old_head)?.prev = Some(id);
                }
                if let Some(heads) = data.versions.as_mut() {
                    heads[vector_index] = Some(id);
                }
                txn.push_update(segment, id);
            }
            Some(existing) => {
                self.merge_update_node(&mut data, &handle, existing, ids, vector_offset)?;
            }
        }

        // apply the new values in place
        {
            let base = self.byte_offset(vector_index);
            let mut bytes = handle.data_mut();
            let mut nulls = NullMask::from_bytes(&bytes[base..base + NULLMASK_BYTES])?;
            for (i, &id) in ids.iter().enumerate() {
                let tuple = (id - vector_offset) as usize;
                let value = update.value(i);
                if value.is_null() {
                    nulls.set(tuple, true);
                } else {
                    nulls.set(tuple, false);
                    let off = base + NULLMASK_BYTES + tuple * self.type_size;
                    self.encode_value(&mut bytes[off..off + self.type_size], &value)?;
                    self.merge_statistics(&value);
                }
            }
            bytes[base..base + NULLMASK_BYTES].copy_from_slice(&nulls.to_bytes());
        }
        Ok(())
    }

    /// Walk the vector's chain: remember this transaction's own node, and
    /// merge-intersect the sorted tuple lists of every concurrent writer.
    fn check_for_conflicts(
        &self,
        data: &SegmentData,
        head: Option<UpdateId>,
        txn: &Transaction,
        ids: &[u64],
        vector_offset: u64,
    ) -> Result<Option<UpdateId>> {
        let mut own = None;
        let mut current = head;
        while let Some(id) = current {
            let node = Self::node_ref(data, id)?;
            if node.version_number == txn.transaction_id() {
                own = Some(id);
            } else if node.version_number > txn.start_time() {
                let mut i = 0;
                let mut j = 0;
                while i < ids.len() && j < node.tuples.len() {
                    let tuple = (ids[i] - vector_offset) as u32;
                    match tuple.cmp(&node.tuples[j]) {
                        std::cmp::Ordering::Equal => {
                            return Err(Error::write_conflict(format!(
                                "row {} in segment at {}",
                                ids[i], self.row_start
                            )));
                        }
                        std::cmp::Ordering::Less => i += 1,
                        std::cmp::Ordering::Greater => j += 1,
                    }
                }
            }
            current = node.next;
        }
        Ok(own)
    }

    /// Fold new ids into the transaction's existing node, capturing
    /// pre-images for tuples it did not already cover
    fn merge_update_node(
        &self,
        data: &mut SegmentData,
        handle: &BufferHandle,
        existing: UpdateId,
        ids: &[u64],
        vector_offset: u64,
    ) -> Result<()> {
        let ts = self.type_size;
        let (vector_index, old_tuples, old_payload, mut nulls) = {
            let node = Self::node_ref(data, existing)?;
            (
                node.vector_index,
                node.tuples.clone(),
                node.payload.clone(),
                node.nulls,
            )
        };
        let base = self.byte_offset(vector_index);

        let mut tuples: SmallVec<[u32; 8]> = SmallVec::new();
        let mut payload: Vec<u8> = Vec::with_capacity(old_payload.len() + ids.len() * ts);
        {
            let bytes = handle.data();
            let base_nulls = NullMask::from_bytes(&bytes[base..base + NULLMASK_BYTES])?;
            let mut i = 0;
            let mut j = 0;
            while i < ids.len() || j < old_tuples.len() {
                let incoming = ids.get(i).map(|id| (id - vector_offset) as u32);
                let covered = old_tuples.get(j).copied();
                match (incoming, covered) {
                    (Some(new_tuple), Some(old_tuple)) if new_tuple == old_tuple => {
                        // already covered: the first pre-image stands
                        tuples.push(old_tuple);
                        payload.extend_from_slice(&old_payload[j * ts..(j + 1) * ts]);
                        i += 1;
                        j += 1;
                    }
                    (Some(new_tuple), old) if old.map_or(true, |o| new_tuple < o) => {
                        let tuple = new_tuple as usize;
                        let off = base + NULLMASK_BYTES + tuple * ts;
                        tuples.push(new_tuple);
                        payload.extend_from_slice(&bytes[off..off + ts]);
                        nulls.set(tuple, base_nulls.is_null(tuple));
                        i += 1;
                    }
                    (_, Some(old_tuple)) => {
                        tuples.push(old_tuple);
                        payload.extend_from_slice(&old_payload[j * ts..(j + 1) * ts]);
                        j += 1;
                    }
                    (Some(new_tuple), None) => {
                        let tuple = new_tuple as usize;
                        let off = base + NULLMASK_BYTES + tuple * ts;
                        tuples.push(new_tuple);
                        payload.extend_from_slice(&bytes[off..off + ts]);
                        nulls.set(tuple, base_nulls.is_null(tuple));
                        i += 1;
                    }
                    (None, None) => break,
                }
            }
        }

        let node = Self::node_mut(data, existing)?;
        node.tuples = tuples;
        node.payload = payload;
        node.nulls = nulls;
        Ok(())
    }

    /// Materialize the vector as `txn` is entitled to see it: base data
    /// with the pre-images of every invisible version overlaid, newest
    /// first
    pub fn scan(&self, txn: &Transaction, vector_index: usize) -> Result<Vector> {
        let data = self.data.read();
        self.scan_locked(&data, txn, vector_index)
    }

    fn scan_locked(
        &self,
        data: &SegmentData,
        txn: &Transaction,
        vector_index: usize,
    ) -> Result<Vector> {
        let (mut scratch, mut nulls, count) = self.read_base(data, vector_index)?;

        let mut current = Self::chain_head(data, vector_index);
        while let Some(id) = current {
            let node = Self::node_ref(data, id)?;
            if !txn.visible(node.version_number) {
                let ts = node.type_size;
                for (k, &tuple) in node.tuples.iter().enumerate() {
                    let t = tuple as usize;
                    scratch[t * ts..(t + 1) * ts].copy_from_slice(&node.payload[k * ts..(k + 1) * ts]);
                    nulls.set(t, node.nulls.is_null(t));
                }
            }
            current = node.next;
        }

        self.materialize(&scratch, &nulls, count)
    }

    /// Copy the base data for one vector, ignoring version chains
    pub fn fetch_base_data(&self, vector_index: usize) -> Result<Vector> {
        let data = self.data.read();
        self.fetch_base_locked(&data, vector_index)
    }

    fn fetch_base_locked(&self, data: &SegmentData, vector_index: usize) -> Result<Vector> {
        let (scratch, nulls, count) = self.read_base(data, vector_index)?;
        self.materialize(&scratch, &nulls, count)
    }

    fn read_base(
        &self,
        data: &SegmentData,
        vector_index: usize,
    ) -> Result<(Vec<u8>, NullMask, usize)> {
        if vector_index >= self.max_vector_count {
            return Err(Error::internal("vector index outside segment geometry"));
        }
        let handle = self.manager.pin(data.block_id)?;
        let bytes = handle.data();
        let base = self.byte_offset(vector_index);
        let stride = self.stride();
        if bytes.len() < base + stride {
            return Err(Error::internal("block too small for segment geometry"));
        }
        let scratch = bytes[base + NULLMASK_BYTES..base + stride].to_vec();
        let nulls = NullMask::from_bytes(&bytes[base..base + NULLMASK_BYTES])?;
        let count = VECTOR_SIZE.min(data.tuple_count.saturating_sub(vector_index * VECTOR_SIZE));
        Ok((scratch, nulls, count))
    }

    fn materialize(&self, bytes: &[u8], nulls: &NullMask, count: usize) -> Result<Vector> {
        let ts = self.type_size;
        let mut vector = Vector::new(self.column_type, count);
        for i in 0..count {
            if nulls.is_null(i) {
                vector.set_value(i, &Value::Null)?;
            } else {
                let value = self.decode_value(&bytes[i * ts..(i + 1) * ts])?;
                vector.set_value(i, &value)?;
            }
        }
        Ok(vector)
    }

    /// Scan one vector and refine `filters` over it
    ///
    /// When the vector has no version chain the filters run directly over
    /// the base data; otherwise the snapshot is materialized first so the
    /// filters observe it rather than raw base data.
    pub fn select(
        &self,
        txn: &Transaction,
        vector_index: usize,
        filters: &[TableFilter],
    ) -> Result<(Vector, SelectionVector)> {
        let data = self.data.read();
        let has_versions = Self::chain_head(&data, vector_index).is_some();
        let result = if has_versions {
            self.scan_locked(&data, txn, vector_index)?
        } else {
            self.fetch_base_locked(&data, vector_index)?
        };
        drop(data);

        let mut sel = SelectionVector::identity(result.len());
        for filter in filters {
            filter_selection(&result, filter, &mut sel)?;
        }
        Ok((result, sel))
    }

    /// Read base data for an index build. The shared lock taken on the
    /// first vector stays in `state` for the whole scan; any outstanding
    /// version chain rejects the scan, since indexes are only built over
    /// quiescent segments.
    pub fn index_scan<'a>(
        &'a self,
        state: &mut ColumnScanState<'a>,
        vector_index: usize,
    ) -> Result<Vector> {
        if vector_index == 0 {
            state.locks.push(self.data.read());
        }
        let data = state
            .locks
            .last()
            .ok_or_else(|| Error::internal("index scan without a held segment lock"))?;
        if let Some(heads) = &data.versions {
            if heads.iter().any(|head| head.is_some()) {
                return Err(Error::OutstandingUpdates);
            }
        }
        self.fetch_base_locked(data, vector_index)
    }

    /// Point lookup of one row under the transaction's snapshot
    pub fn fetch_row(&self, txn: &Transaction, row_id: u64) -> Result<Value> {
        let data = self.data.read();
        if row_id < self.row_start {
            return Err(Error::internal("row id below segment start"));
        }
        let rel = (row_id - self.row_start) as usize;
        if rel >= data.tuple_count {
            return Err(Error::internal("row id beyond appended rows"));
        }
        let vector_index = rel / VECTOR_SIZE;
        let tuple = rel % VECTOR_SIZE;
        let ts = self.type_size;

        let handle = self.manager.pin(data.block_id)?;
        let base = self.byte_offset(vector_index);
        let (mut row, mut null) = {
            let bytes = handle.data();
            let off = base + NULLMASK_BYTES + tuple * ts;
            let row = bytes[off..off + ts].to_vec();
            let null = NullMask::from_bytes(&bytes[base..base + NULLMASK_BYTES])?.is_null(tuple);
            (row, null)
        };

        let mut current = Self::chain_head(&data, vector_index);
        while let Some(id) = current {
            let node = Self::node_ref(&data, id)?;
            if !txn.visible(node.version_number) {
                if let Ok(k) = node.tuples.binary_search(&(tuple as u32)) {
                    row.copy_from_slice(&node.payload[k * ts..(k + 1) * ts]);
                    null = node.nulls.is_null(tuple);
                }
            }
            current = node.next;
        }

        if null {
            Ok(Value::Null)
        } else {
            self.decode_value(&row)
        }
    }

    /// Whether any chain holds a version written by an in-flight
    /// transaction
    pub fn has_uncommitted_updates(&self) -> bool {
        let data = self.data.read();
        data.nodes
            .iter()
            .flatten()
            .any(|node| node.version_number >= TRANSACTION_ID_START)
    }

    /// Number of live update nodes across all vectors
    pub fn version_count(&self) -> usize {
        let data = self.data.read();
        data.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Rewrite an update node's version to the commit timestamp. Invoked
    /// by the transaction manager from the undo buffer.
    pub(crate) fn commit_update(&self, node: UpdateId, commit_ts: u64) -> Result<()> {
        let mut data = self.data.write();
        Self::node_mut(&mut data, node)?.version_number = commit_ts;
        Ok(())
    }

    /// Restore the node's pre-images into the base block and unlink it
    /// from its chain. Invoked by the transaction manager on abort.
    pub(crate) fn rollback_update(&self, node_id: UpdateId) -> Result<()> {
        let mut data = self.data.write();
        let handle = self.manager.pin(data.block_id)?;
        {
            let node = Self::node_ref(&data, node_id)?;
            let ts = node.type_size;
            let base = self.byte_offset(node.vector_index);
            let mut bytes = handle.data_mut();
            let mut nulls = NullMask::from_bytes(&bytes[base..base + NULLMASK_BYTES])?;
            for (k, &tuple) in node.tuples.iter().enumerate() {
                let t = tuple as usize;
                let off = base + NULLMASK_BYTES + t * ts;
                bytes[off..off + ts].copy_from_slice(&node.payload[k * ts..(k + 1) * ts]);
                nulls.set(t, node.nulls.is_null(t));
            }
            bytes[base..base + NULLMASK_BYTES].copy_from_slice(&nulls.to_bytes());
        }

        let (vector_index, prev, next) = {
            let node = Self::node_ref(&data, node_id)?;
            (node.vector_index, node.prev, node.next)
        };
        match prev {
            Some(prev_id) => Self::node_mut(&mut data, prev_id)?.next = next,
            None => {
                if let Some(heads) = data.versions.as_mut() {
                    heads[vector_index] = next;
                }
            }
        }
        if let Some(next_id) = next {
            Self::node_mut(&mut data, next_id)?.prev = prev;
        }
        data.nodes[node_id] = None;
        data.free_list.push(node_id);
        Ok(())
    }
}
