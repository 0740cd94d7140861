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

//! Storage layer for Tidepool
//!
//! This module contains the versioned columnar storage components:
//!
//! - [`BufferManager`] - pinned byte blocks, registered (immutable) and
//!   allocated (in-memory)
//! - [`Segment`] - per-column storage with per-vector update chains
//! - [`TableFilter`] / [`filter_selection`] - pushed-down comparisons

pub mod buffer;
pub mod filter;
pub mod segment;
pub(crate) mod string_heap;

pub use buffer::{BlockId, BufferHandle, BufferManager, MAXIMUM_BLOCK};
pub use filter::{filter_selection, TableFilter};
pub use segment::{ColumnScanState, Segment, SegmentStatistics, UpdateId, UpdateInfo};
