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

//! Table bindings
//!
//! A binding is a named reference inside one query scope: a base table, a
//! table function call, a subquery, a CTE, or a generic column set. It
//! exposes column names and types under an alias.

use rustc_hash::FxHashMap;

use crate::core::{Error, PhysicalType, Result};

/// What a binding refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    BaseTable,
    TableFunction,
    Subquery,
    Generic,
    Cte,
}

/// A named column set visible during binding
#[derive(Debug, Clone)]
pub struct Binding {
    kind: BindingKind,
    /// The plan-level table index bound references resolve to
    index: usize,
    alias: String,
    names: Vec<String>,
    types: Vec<PhysicalType>,
    /// First occurrence wins on duplicate column names, so an unqualified
    /// reference resolves to the leftmost column as SQL expects
    name_map: FxHashMap<String, usize>,
}

impl Binding {
    /// Create a binding over `names` and `types`
    pub fn new(
        kind: BindingKind,
        index: usize,
        alias: impl Into<String>,
        names: Vec<String>,
        types: Vec<PhysicalType>,
    ) -> Result<Self> {
        if names.len() != types.len() {
            return Err(Error::internal(
                "binding column names and types differ in length",
            ));
        }
        let mut name_map = FxHashMap::with_capacity_and_hasher(names.len(), Default::default());
        for (column_index, name) in names.iter().enumerate() {
            name_map.entry(name.clone()).or_insert(column_index);
        }
        Ok(Binding {
            kind,
            index,
            alias: alias.into(),
            names,
            types,
            name_map,
        })
    }

    /// The binding's kind
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// The plan-level table index
    pub fn index(&self) -> usize {
        self.index
    }

    /// The alias this binding is registered under
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Column names in declaration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column types in declaration order
    pub fn types(&self) -> &[PhysicalType] {
        &self.types
    }

    /// Whether the binding exposes a column of this name
    pub fn has_column(&self, column: &str) -> bool {
        self.name_map.contains_key(column)
    }

    /// Index of the named column
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.name_map.get(column).copied()
    }
}
