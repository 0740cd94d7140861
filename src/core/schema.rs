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

//! Table schema definitions
//!
//! [`TableSchema`] is the payload a table catalog entry carries. ALTER
//! operations build an edited copy; the catalog prepends it as a new
//! version, so every historical snapshot keeps seeing its own column list.

use rustc_hash::FxHashMap;

use super::error::{Error, Result};
use super::types::PhysicalType;
use super::value::Value;

/// A column definition in a table schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,

    /// Physical type of the column
    pub column_type: PhysicalType,

    /// Whether the column can contain NULL values
    pub nullable: bool,

    /// Default value applied to rows that predate the column
    pub default: Option<Value>,
}

impl ColumnDefinition {
    /// Create a nullable column without a default
    pub fn new(name: impl Into<String>, column_type: PhysicalType) -> Self {
        ColumnDefinition {
            name: name.into(),
            column_type,
            nullable: true,
            default: None,
        }
    }

    /// Create a nullable column with a default value
    pub fn with_default(
        name: impl Into<String>,
        column_type: PhysicalType,
        default: Value,
    ) -> Self {
        ColumnDefinition {
            name: name.into(),
            column_type,
            nullable: true,
            default: Some(default),
        }
    }
}

/// An ordered list of column definitions with name lookup
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    columns: Vec<ColumnDefinition>,
    name_map: FxHashMap<String, usize>,
}

impl TableSchema {
    /// Create a schema from column definitions
    ///
    /// Fails with [`Error::DuplicateColumn`] when two columns share a name.
    pub fn new(columns: Vec<ColumnDefinition>) -> Result<Self> {
        let mut name_map = FxHashMap::with_capacity_and_hasher(columns.len(), Default::default());
        for (index, column) in columns.iter().enumerate() {
            if name_map.insert(column.name.clone(), index).is_some() {
                return Err(Error::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(TableSchema { columns, name_map })
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// All columns in definition order
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Index of the named column
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.name_map.get(name).copied()
    }

    /// The column definition at `index`
    pub fn column(&self, index: usize) -> Option<&ColumnDefinition> {
        self.columns.get(index)
    }

    /// Append a column (ALTER TABLE ADD COLUMN)
    pub fn add_column(&mut self, column: ColumnDefinition) -> Result<()> {
        if self.name_map.contains_key(&column.name) {
            return Err(Error::DuplicateColumn(column.name));
        }
        self.name_map.insert(column.name.clone(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    /// Remove a column by name (ALTER TABLE DROP COLUMN)
    pub fn remove_column(&mut self, name: &str) -> Result<ColumnDefinition> {
        let index = self
            .find_column(name)
            .ok_or_else(|| Error::UnknownColumn {
                column: name.to_string(),
                similar: Vec::new(),
            })?;
        let removed = self.columns.remove(index);
        self.rebuild_name_map();
        Ok(removed)
    }

    /// Rename a column (ALTER TABLE RENAME COLUMN)
    pub fn rename_column(&mut self, old_name: &str, new_name: impl Into<String>) -> Result<()> {
        let new_name = new_name.into();
        if self.name_map.contains_key(&new_name) {
            return Err(Error::DuplicateColumn(new_name));
        }
        let index = self
            .find_column(old_name)
            .ok_or_else(|| Error::UnknownColumn {
                column: old_name.to_string(),
                similar: Vec::new(),
            })?;
        self.columns[index].name = new_name;
        self.rebuild_name_map();
        Ok(())
    }

    fn rebuild_name_map(&mut self) {
        self.name_map.clear();
        for (index, column) in self.columns.iter().enumerate() {
            self.name_map.insert(column.name.clone(), index);
        }
    }
}
