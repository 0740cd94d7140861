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

//! Per-segment string heap
//!
//! Varchar blocks keep their payload fixed-width by storing 8-byte ids into
//! this heap instead of inline bytes. The heap interns: equal strings share
//! one id, and an id stays valid for the life of the segment, so pre-images
//! in update chains can reference strings long after they were overwritten.
//!
//! Id 0 is the empty string, which makes a zero-filled block decode cleanly.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::core::{Error, Result};

struct StringHeapInner {
    strings: Vec<Arc<str>>,
    ids: FxHashMap<Arc<str>, u64>,
}

/// Append-only interning store for one segment's varchar data
pub(crate) struct StringHeap {
    inner: Mutex<StringHeapInner>,
}

impl StringHeap {
    pub(crate) fn new() -> Self {
        let empty: Arc<str> = Arc::from("");
        let mut ids = FxHashMap::default();
        ids.insert(Arc::clone(&empty), 0u64);
        StringHeap {
            inner: Mutex::new(StringHeapInner {
                strings: vec![empty],
                ids,
            }),
        }
    }

    /// Intern a string, returning its id
    pub(crate) fn intern(&self, s: &str) -> u64 {
        let mut inner = self.inner.lock();
        if let Some(&id) = inner.ids.get(s) {
            return id;
        }
        let arc: Arc<str> = Arc::from(s);
        let id = inner.strings.len() as u64;
        inner.strings.push(Arc::clone(&arc));
        inner.ids.insert(arc, id);
        id
    }

    /// Resolve an id back to its string
    pub(crate) fn get(&self, id: u64) -> Result<Arc<str>> {
        let inner = self.inner.lock();
        inner
            .strings
            .get(id as usize)
            .cloned()
            .ok_or_else(|| Error::internal(format!("string heap id {} out of range", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedups() {
        let heap = StringHeap::new();
        let a = heap.intern("hello");
        let b = heap.intern("hello");
        let c = heap.intern("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(&*heap.get(a).expect("get"), "hello");
    }

    #[test]
    fn test_zeroed_block_decodes_to_empty() {
        let heap = StringHeap::new();
        assert_eq!(&*heap.get(0).expect("get"), "");
    }

    #[test]
    fn test_out_of_range_id() {
        let heap = StringHeap::new();
        assert!(heap.get(99).is_err());
    }
}
