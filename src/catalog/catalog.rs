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

//! The catalog
//!
//! Hosts the top-level schema set; each schema entry carries its own tables
//! and functions sets. All operations resolve the schema under the caller's
//! snapshot first, then delegate to the owning [`CatalogSet`].
//!
//! Cross-set dependencies (a table referencing its schema) are logical
//! keys only; the dependency manager collaborator is expected to clear
//! dependents before a parent is dropped.

use std::sync::Arc;

use crate::core::{Error, Result, TableSchema};
use crate::transaction::Transaction;

use super::catalog_set::CatalogSet;
use super::entry::{CatalogEntry, CatalogKind, TableEntry};

/// Name of the schema seeded at catalog construction
pub const DEFAULT_SCHEMA: &str = "main";

/// The root of the schema object hierarchy
pub struct Catalog {
    schemas: Arc<CatalogSet>,
}

impl Catalog {
    /// Create a catalog with the default schema committed at timestamp 0,
    /// visible to every transaction
    pub fn new() -> Self {
        let schemas = CatalogSet::new();
        schemas.insert_bootstrap(
            DEFAULT_SCHEMA,
            CatalogEntry::Schema(super::entry::SchemaEntry::new(DEFAULT_SCHEMA)),
        );
        Catalog { schemas }
    }

    /// The top-level schema set
    pub fn schemas(&self) -> &Arc<CatalogSet> {
        &self.schemas
    }

    /// Create a schema. Returns `false` when a live schema of that name
    /// already exists.
    pub fn create_schema(&self, txn: &Transaction, name: &str) -> Result<bool> {
        self.schemas.create_entry(
            txn,
            name,
            CatalogEntry::Schema(super::entry::SchemaEntry::new(name)),
        )
    }

    /// Drop a schema. The dependency manager collaborator must already have
    /// cleared its dependents.
    pub fn drop_schema(&self, txn: &Transaction, name: &str) -> Result<bool> {
        self.schemas.drop_entry(txn, name)
    }

    /// The tables set of a schema visible to `txn`
    pub fn tables_set(&self, txn: &Transaction, schema: &str) -> Result<Arc<CatalogSet>> {
        let entry = self
            .schemas
            .get_entry(txn, schema)?
            .ok_or_else(|| Error::UnknownSchema(schema.to_string()))?;
        let schema_entry = entry
            .as_schema()
            .ok_or_else(|| Error::UnknownSchema(schema.to_string()))?;
        Ok(Arc::clone(schema_entry.tables()))
    }

    /// The functions set of a schema visible to `txn`
    pub fn functions_set(&self, txn: &Transaction, schema: &str) -> Result<Arc<CatalogSet>> {
        let entry = self
            .schemas
            .get_entry(txn, schema)?
            .ok_or_else(|| Error::UnknownSchema(schema.to_string()))?;
        let schema_entry = entry
            .as_schema()
            .ok_or_else(|| Error::UnknownSchema(schema.to_string()))?;
        Ok(Arc::clone(schema_entry.functions()))
    }

    /// Create an entry in the schema's set for its kind. Schemas themselves
    /// go through [`Catalog::create_schema`].
    pub fn create_entry(
        &self,
        txn: &Transaction,
        schema: &str,
        entry: CatalogEntry,
    ) -> Result<bool> {
        let set = match entry.kind() {
            CatalogKind::Schema => {
                return Err(Error::internal(
                    "schemas are created through create_schema",
                ))
            }
            CatalogKind::ScalarFunction | CatalogKind::TableFunction => {
                self.functions_set(txn, schema)?
            }
            _ => self.tables_set(txn, schema)?,
        };
        let name = entry.name().to_string();
        set.create_entry(txn, &name, entry)
    }

    /// Create a table. Returns `false` when a live entry of that name
    /// already exists in the schema.
    pub fn create_table(
        &self,
        txn: &Transaction,
        schema: &str,
        name: &str,
        table_schema: TableSchema,
    ) -> Result<bool> {
        let tables = self.tables_set(txn, schema)?;
        tables.create_entry(
            txn,
            name,
            CatalogEntry::Table(TableEntry {
                name: name.to_string(),
                schema: table_schema,
            }),
        )
    }

    /// Drop a table. Returns `false` when no live entry is visible.
    pub fn drop_table(&self, txn: &Transaction, schema: &str, name: &str) -> Result<bool> {
        let tables = self.tables_set(txn, schema)?;
        tables.drop_entry(txn, name)
    }

    /// The table entry visible to `txn`
    pub fn get_table(
        &self,
        txn: &Transaction,
        schema: &str,
        name: &str,
    ) -> Result<Arc<CatalogEntry>> {
        let tables = self.tables_set(txn, schema)?;
        let entry = tables
            .get_entry(txn, name)?
            .ok_or_else(|| Error::UnknownTable(name.to_string()))?;
        if entry.kind() != CatalogKind::Table {
            return Err(Error::UnknownTable(name.to_string()));
        }
        Ok(entry)
    }

    /// Apply an edit to the visible table schema and prepend the result as
    /// a new version (ALTER TABLE). Returns `false` when the table is not
    /// visible.
    pub fn alter_table(
        &self,
        txn: &Transaction,
        schema: &str,
        name: &str,
        edit: impl FnOnce(&mut TableSchema) -> Result<()>,
    ) -> Result<bool> {
        let tables = self.tables_set(txn, schema)?;
        let Some(entry) = tables.get_entry(txn, name)? else {
            return Ok(false);
        };
        let Some(current) = entry.table_schema() else {
            return Ok(false);
        };
        let mut edited = current.clone();
        edit(&mut edited)?;
        tables.alter_entry(
            txn,
            name,
            CatalogEntry::Table(TableEntry {
                name: name.to_string(),
                schema: edited,
            }),
        )
    }

    /// All live entries in the schema's tables set, ordered by name
    pub fn scan_tables(&self, txn: &Transaction, schema: &str) -> Result<Vec<Arc<CatalogEntry>>> {
        let tables = self.tables_set(txn, schema)?;
        tables.scan_entries(txn)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new()
    }
}
