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

//! Buffer manager
//!
//! The storage core treats block contents as opaque bytes: segments pin
//! blocks, read or write their buffers, and never interpret a physical
//! encoding beyond their own fixed-width layout. Block ids below
//! [`MAXIMUM_BLOCK`] identify immutable registered blocks ("disk"); ids at
//! or above it identify mutable in-memory blocks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;

use crate::core::{Error, Result};

/// Identifier of a block held by the buffer manager
pub type BlockId = u64;

/// First block id of the in-memory (mutable) range
pub const MAXIMUM_BLOCK: BlockId = 1 << 62;

/// A pinned block exposing its raw byte buffer
#[derive(Clone, Debug)]
pub struct BufferHandle {
    block_id: BlockId,
    buffer: Arc<RwLock<Vec<u8>>>,
}

impl BufferHandle {
    /// The id of the pinned block
    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    /// Read access to the block's bytes
    pub fn data(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.buffer.read()
    }

    /// Write access to the block's bytes
    pub fn data_mut(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.buffer.write()
    }
}

/// Hands out pinned handles over registered and allocated blocks
pub struct BufferManager {
    blocks: Mutex<FxHashMap<BlockId, Arc<RwLock<Vec<u8>>>>>,
    next_persistent_id: AtomicU64,
    next_temporary_id: AtomicU64,
}

impl BufferManager {
    /// Create an empty buffer manager
    pub fn new() -> Self {
        BufferManager {
            blocks: Mutex::new(FxHashMap::default()),
            next_persistent_id: AtomicU64::new(0),
            next_temporary_id: AtomicU64::new(MAXIMUM_BLOCK),
        }
    }

    /// Pin a block, returning a handle over its buffer
    pub fn pin(&self, block_id: BlockId) -> Result<BufferHandle> {
        let blocks = self.blocks.lock();
        let buffer = blocks
            .get(&block_id)
            .ok_or(Error::BlockNotFound(block_id))?;
        Ok(BufferHandle {
            block_id,
            buffer: Arc::clone(buffer),
        })
    }

    /// Allocate a zeroed in-memory block of `size` bytes
    pub fn allocate(&self, size: usize) -> BufferHandle {
        let block_id = self.next_temporary_id.fetch_add(1, Ordering::AcqRel);
        let buffer = Arc::new(RwLock::new(vec![0u8; size]));
        self.blocks.lock().insert(block_id, Arc::clone(&buffer));
        BufferHandle { block_id, buffer }
    }

    /// Register pre-built block contents under a persistent-range id.
    /// Collaborators use this to hand the core its immutable base blocks.
    pub fn register_block(&self, data: Vec<u8>) -> BlockId {
        let block_id = self.next_persistent_id.fetch_add(1, Ordering::AcqRel);
        self.blocks
            .lock()
            .insert(block_id, Arc::new(RwLock::new(data)));
        block_id
    }

    /// Number of blocks currently held
    pub fn block_count(&self) -> usize {
        self.blocks.lock().len()
    }
}

impl Default for BufferManager {
    fn default() -> Self {
        BufferManager::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_in_temporary_range() {
        let manager = BufferManager::new();
        let handle = manager.allocate(64);
        assert!(handle.block_id() >= MAXIMUM_BLOCK);
        assert_eq!(handle.data().len(), 64);
    }

    #[test]
    fn test_register_in_persistent_range() {
        let manager = BufferManager::new();
        let id = manager.register_block(vec![1, 2, 3]);
        assert!(id < MAXIMUM_BLOCK);
        let handle = manager.pin(id).expect("pin");
        assert_eq!(&*handle.data(), &[1, 2, 3]);
    }

    #[test]
    fn test_pin_unknown_block() {
        let manager = BufferManager::new();
        assert_eq!(manager.pin(42).unwrap_err(), Error::BlockNotFound(42));
    }
}
