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

//! # Tidepool - embedded analytical database core
//!
//! Tidepool is the transactional heart of an embedded analytical database:
//! multi-version concurrency control over both schema objects and columnar
//! row data, plus the bind-time name resolution that turns SQL identifiers
//! into references to those objects. The SQL parser, planner, execution
//! kernels, and durability layers are collaborators that plug in around it.
//!
//! ## Key Pieces
//!
//! - **Catalog MVCC** - schemas, tables, views, and functions live in
//!   versioned catalog sets; create/drop/alter prepend versions and roll
//!   back cleanly
//! - **Segment MVCC** - column segments keep per-vector update chains with
//!   pre-images, so readers scan their snapshot while writers update in
//!   place
//! - **Copy-on-write promotion** - updates against immutable registered
//!   blocks transparently promote to in-memory blocks
//! - **Filter pushdown** - typed comparisons refine selection vectors
//!   directly over scan results
//! - **Bind context** - alias and column resolution with `*` expansion,
//!   hidden columns, CTE sharing, and similar-name hints
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tidepool::catalog::Catalog;
//! use tidepool::core::{ColumnDefinition, PhysicalType, TableSchema, Value, Vector};
//! use tidepool::storage::{BufferManager, Segment};
//! use tidepool::transaction::TransactionManager;
//!
//! fn main() -> tidepool::Result<()> {
//!     let manager = TransactionManager::new();
//!     let catalog = Catalog::new();
//!
//!     // create a table in the default schema
//!     let txn = manager.begin();
//!     let columns = vec![ColumnDefinition::new("id", PhysicalType::Int64)];
//!     catalog.create_table(&txn, "main", "users", TableSchema::new(columns)?)?;
//!     manager.commit(txn)?;
//!
//!     // seed one column segment and update it transactionally
//!     let buffers = Arc::new(BufferManager::new());
//!     let segment = Segment::temporary(buffers, PhysicalType::Int64, 0, 4);
//!     let base = Vector::from_values(
//!         PhysicalType::Int64,
//!         &[Value::Int64(1), Value::Int64(2)],
//!     )?;
//!     segment.append(0, &base)?;
//!
//!     let writer = manager.begin();
//!     let update = Vector::from_values(PhysicalType::Int64, &[Value::Int64(42)])?;
//!     segment.update(&writer, &[1], &update)?;
//!     manager.commit(writer)?;
//!
//!     let reader = manager.begin();
//!     assert_eq!(segment.fetch_row(&reader, 1)?, Value::Int64(42));
//!     manager.commit(reader)?;
//!     Ok(())
//! }
//! ```

pub mod binder;
pub mod catalog;
pub mod core;
pub mod storage;
pub mod transaction;

pub use crate::core::{Error, Result};
