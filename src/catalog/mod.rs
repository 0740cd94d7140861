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

//! Transactional catalog
//!
//! Schema objects live in versioned [`CatalogSet`]s: every create, drop,
//! and alter prepends a new version onto the entry's chain, and readers see
//! the version their snapshot allows. The [`Catalog`] ties the sets into a
//! schema hierarchy.

#[allow(clippy::module_inception)]
pub mod catalog;
pub mod catalog_set;
pub mod entry;

pub use catalog::{Catalog, DEFAULT_SCHEMA};
pub use catalog_set::{CatalogSet, NodeId};
pub use entry::{
    CatalogEntry, CatalogKind, IndexEntry, ScalarFunctionEntry, SchemaEntry, SequenceEntry,
    TableEntry, TableFunctionEntry, ViewEntry,
};
