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

//! Core types for Tidepool
//!
//! This module defines the fundamental vocabulary of the storage core:
//!
//! - [`Error`] / [`Result`] - crate-wide error handling
//! - [`PhysicalType`] / [`ComparisonOp`] - column types and filter operators
//! - [`Value`] - typed runtime values
//! - [`Vector`] / [`SelectionVector`] - columnar scan results
//! - [`TableSchema`] - table payloads for catalog entries

pub mod error;
pub mod schema;
pub mod types;
pub mod value;
pub mod vector;

pub use error::{Error, Result};
pub use schema::{ColumnDefinition, TableSchema};
pub use types::{ComparisonOp, PhysicalType, TRANSACTION_ID_START, VECTOR_SIZE};
pub use value::Value;
pub use vector::{NullMask, SelectionVector, Vector, VectorBuffer, NULLMASK_BYTES};
