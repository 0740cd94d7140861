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

//! Catalog entry kinds
//!
//! Entries are a tagged enum rather than an inheritance tree: the only
//! state the version machinery shares is carried by the chain node itself,
//! and each payload is read by its kind-specific consumer.

use std::fmt;
use std::sync::Arc;

use crate::core::{PhysicalType, TableSchema};

use super::catalog_set::CatalogSet;

/// The kind tag of a catalog entry, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Schema,
    Table,
    View,
    Sequence,
    ScalarFunction,
    TableFunction,
    Index,
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::Schema => write!(f, "schema"),
            CatalogKind::Table => write!(f, "table"),
            CatalogKind::View => write!(f, "view"),
            CatalogKind::Sequence => write!(f, "sequence"),
            CatalogKind::ScalarFunction => write!(f, "scalar function"),
            CatalogKind::TableFunction => write!(f, "table function"),
            CatalogKind::Index => write!(f, "index"),
        }
    }
}

/// A schema groups tables and functions, each in its own versioned set
#[derive(Clone)]
pub struct SchemaEntry {
    pub name: String,
    tables: Arc<CatalogSet>,
    functions: Arc<CatalogSet>,
}

impl SchemaEntry {
    /// Create a schema with empty child sets
    pub fn new(name: impl Into<String>) -> Self {
        SchemaEntry {
            name: name.into(),
            tables: CatalogSet::new(),
            functions: CatalogSet::new(),
        }
    }

    /// The set holding tables, views, sequences, and indexes
    pub fn tables(&self) -> &Arc<CatalogSet> {
        &self.tables
    }

    /// The set holding scalar and table functions
    pub fn functions(&self) -> &Arc<CatalogSet> {
        &self.functions
    }
}

impl fmt::Debug for SchemaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaEntry").field("name", &self.name).finish()
    }
}

/// A base table definition
#[derive(Debug, Clone)]
pub struct TableEntry {
    pub name: String,
    pub schema: TableSchema,
}

/// A view definition
#[derive(Debug, Clone)]
pub struct ViewEntry {
    pub name: String,
    /// The view's defining query text, reparsed by the binder collaborator
    pub sql: String,
    pub names: Vec<String>,
    pub types: Vec<PhysicalType>,
}

/// A sequence generator definition
#[derive(Debug, Clone)]
pub struct SequenceEntry {
    pub name: String,
    pub start: i64,
    pub increment: i64,
}

/// A scalar function signature
#[derive(Debug, Clone)]
pub struct ScalarFunctionEntry {
    pub name: String,
    pub arguments: Vec<PhysicalType>,
    pub return_type: PhysicalType,
}

/// A table-producing function signature
#[derive(Debug, Clone)]
pub struct TableFunctionEntry {
    pub name: String,
    pub arguments: Vec<PhysicalType>,
    /// Names of the columns the function produces
    pub names: Vec<String>,
    /// Types of the columns the function produces
    pub types: Vec<PhysicalType>,
}

/// An index over a table's columns. The index structure itself lives with
/// the execution collaborator; the catalog tracks the definition.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
}

/// A named schema object, polymorphic over the catalog kinds
#[derive(Debug, Clone)]
pub enum CatalogEntry {
    Schema(SchemaEntry),
    Table(TableEntry),
    View(ViewEntry),
    Sequence(SequenceEntry),
    ScalarFunction(ScalarFunctionEntry),
    TableFunction(TableFunctionEntry),
    Index(IndexEntry),
}

impl CatalogEntry {
    /// The entry's name
    pub fn name(&self) -> &str {
        match self {
            CatalogEntry::Schema(e) => &e.name,
            CatalogEntry::Table(e) => &e.name,
            CatalogEntry::View(e) => &e.name,
            CatalogEntry::Sequence(e) => &e.name,
            CatalogEntry::ScalarFunction(e) => &e.name,
            CatalogEntry::TableFunction(e) => &e.name,
            CatalogEntry::Index(e) => &e.name,
        }
    }

    /// The entry's kind tag
    pub fn kind(&self) -> CatalogKind {
        match self {
            CatalogEntry::Schema(_) => CatalogKind::Schema,
            CatalogEntry::Table(_) => CatalogKind::Table,
            CatalogEntry::View(_) => CatalogKind::View,
            CatalogEntry::Sequence(_) => CatalogKind::Sequence,
            CatalogEntry::ScalarFunction(_) => CatalogKind::ScalarFunction,
            CatalogEntry::TableFunction(_) => CatalogKind::TableFunction,
            CatalogEntry::Index(_) => CatalogKind::Index,
        }
    }

    /// The schema payload, if this is a schema entry
    pub fn as_schema(&self) -> Option<&SchemaEntry> {
        match self {
            CatalogEntry::Schema(e) => Some(e),
            _ => None,
        }
    }

    /// The table schema, if this is a table entry
    pub fn table_schema(&self) -> Option<&TableSchema> {
        match self {
            CatalogEntry::Table(e) => Some(&e.schema),
            _ => None,
        }
    }
}
