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

//! Bind context
//!
//! Tracks every table and column encountered while binding one query
//! scope. Aliases own their bindings; CTE bindings live in a separate
//! shared map because the same CTE may be referenced from parallel sibling
//! scopes during recursive expansion.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::{Error, PhysicalType, Result};

use super::binding::{Binding, BindingKind};

/// An unresolved column reference as the parser delivers it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Qualifying table alias, if any
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    /// An unqualified reference
    pub fn new(column: impl Into<String>) -> Self {
        ColumnRef {
            table: None,
            column: column.into(),
        }
    }

    /// A qualified reference `table.column`
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        ColumnRef {
            table: Some(table.into()),
            column: column.into(),
        }
    }
}

/// A successfully resolved column reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundColumnRef {
    /// The owning binding's plan-level table index
    pub binding_index: usize,
    pub column_index: usize,
    pub column_type: PhysicalType,
    /// 0 for the local scope; positive values mark a correlated reference
    /// the binder resolves against an outer context
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QualifiedColumn {
    binding: String,
    column: String,
}

/// Per-query resolver mapping aliases and column names to bindings
#[derive(Default)]
pub struct BindContext {
    /// Owned bindings by alias
    bindings: FxHashMap<String, Binding>,
    /// Aliases in insertion order, driving `*` expansion order
    bindings_list: Vec<String>,
    /// Columns suppressed from `*` expansion (`USING` / `NATURAL JOIN`)
    hidden_columns: FxHashSet<QualifiedColumn>,
    /// Shared CTE bindings, outliving any single subquery scope
    cte_bindings: FxHashMap<String, Arc<Binding>>,
}

impl BindContext {
    /// Create an empty context
    pub fn new() -> Self {
        BindContext::default()
    }

    fn add_binding(&mut self, binding: Binding) -> Result<()> {
        let alias = binding.alias().to_string();
        if self.bindings.contains_key(&alias) {
            return Err(Error::DuplicateAlias(alias));
        }
        self.bindings_list.push(alias.clone());
        self.bindings.insert(alias, binding);
        Ok(())
    }

    /// Register a base table under `alias`
    pub fn add_base_table(
        &mut self,
        index: usize,
        alias: impl Into<String>,
        names: Vec<String>,
        types: Vec<PhysicalType>,
    ) -> Result<()> {
        self.add_binding(Binding::new(
            BindingKind::BaseTable,
            index,
            alias,
            names,
            types,
        )?)
    }

    /// Register a table function call under `alias`
    pub fn add_table_function(
        &mut self,
        index: usize,
        alias: impl Into<String>,
        names: Vec<String>,
        types: Vec<PhysicalType>,
    ) -> Result<()> {
        self.add_binding(Binding::new(
            BindingKind::TableFunction,
            index,
            alias,
            names,
            types,
        )?)
    }

    /// Register a subquery under `alias`
    pub fn add_subquery(
        &mut self,
        index: usize,
        alias: impl Into<String>,
        names: Vec<String>,
        types: Vec<PhysicalType>,
    ) -> Result<()> {
        self.add_binding(Binding::new(
            BindingKind::Subquery,
            index,
            alias,
            names,
            types,
        )?)
    }

    /// Register a generic column set under `alias`
    pub fn add_generic_binding(
        &mut self,
        index: usize,
        alias: impl Into<String>,
        names: Vec<String>,
        types: Vec<PhysicalType>,
    ) -> Result<()> {
        self.add_binding(Binding::new(
            BindingKind::Generic,
            index,
            alias,
            names,
            types,
        )?)
    }

    /// Register a CTE in the shared map so recursive references across
    /// sibling scopes resolve to the same binding
    pub fn add_cte_binding(
        &mut self,
        index: usize,
        alias: impl Into<String>,
        names: Vec<String>,
        types: Vec<PhysicalType>,
    ) -> Result<()> {
        let binding = Binding::new(BindingKind::Cte, index, alias, names, types)?;
        let alias = binding.alias().to_string();
        if self.cte_bindings.contains_key(&alias) {
            return Err(Error::DuplicateAlias(alias));
        }
        self.cte_bindings.insert(alias, Arc::new(binding));
        Ok(())
    }

    /// The shared CTE binding under `name`, if any
    pub fn get_cte_binding(&self, name: &str) -> Option<Arc<Binding>> {
        self.cte_bindings.get(name).cloned()
    }

    /// Snapshot of the shared CTE map, for handing to a sibling scope
    pub fn get_cte_bindings(&self) -> FxHashMap<String, Arc<Binding>> {
        self.cte_bindings.clone()
    }

    /// Replace the shared CTE map, used when entering a sibling scope
    pub fn set_cte_bindings(&mut self, bindings: FxHashMap<String, Arc<Binding>>) {
        self.cte_bindings = bindings;
    }

    /// Aliases in insertion order
    pub fn bindings_list(&self) -> impl Iterator<Item = &Binding> {
        self.bindings_list
            .iter()
            .filter_map(move |alias| self.bindings.get(alias))
    }

    /// The binding registered under `alias`
    pub fn get_binding(&self, alias: &str) -> Result<&Binding> {
        self.bindings
            .get(alias)
            .ok_or_else(|| Error::UnknownTable(alias.to_string()))
    }

    /// Every alias whose binding exposes a non-hidden column of this name
    pub fn get_matching_bindings(&self, column: &str) -> Vec<&Binding> {
        self.bindings_list()
            .filter(|binding| {
                binding.has_column(column) && !self.is_hidden(binding.alias(), column)
            })
            .collect()
    }

    /// The unique binding owning `column`
    ///
    /// Ambiguity lists every candidate alias; a miss carries the closest
    /// column names by edit distance.
    pub fn get_matching_binding(&self, column: &str) -> Result<&Binding> {
        let matches = self.get_matching_bindings(column);
        match matches.len() {
            0 => Err(Error::UnknownColumn {
                column: column.to_string(),
                similar: self.get_similar_bindings(column),
            }),
            1 => Ok(matches[0]),
            _ => Err(Error::AmbiguousColumn {
                column: column.to_string(),
                candidates: matches
                    .iter()
                    .map(|binding| binding.alias().to_string())
                    .collect(),
            }),
        }
    }

    /// The three column names closest to `column` by Levenshtein distance,
    /// qualified by their binding's alias
    pub fn get_similar_bindings(&self, column: &str) -> Vec<String> {
        let mut scored: Vec<(usize, String)> = Vec::new();
        for binding in self.bindings_list() {
            for name in binding.names() {
                let distance = levenshtein(column, name);
                scored.push((distance, format!("{}.{}", binding.alias(), name)));
            }
        }
        scored.sort();
        scored.into_iter().take(3).map(|(_, name)| name).collect()
    }

    /// Resolve a column reference against this context
    ///
    /// Qualified references look up the alias directly and may reach
    /// hidden columns; unqualified references go through
    /// [`BindContext::get_matching_binding`]. `depth > 0` marks the result
    /// as correlated; walking outer contexts is the binder's job.
    pub fn bind_column(&self, column_ref: &ColumnRef, depth: usize) -> Result<BoundColumnRef> {
        let (binding, column_index) = match &column_ref.table {
            Some(table) => {
                let binding = self.get_binding(table)?;
                let column_index =
                    binding
                        .column_index(&column_ref.column)
                        .ok_or_else(|| Error::UnknownColumn {
                            column: format!("{}.{}", table, column_ref.column),
                            similar: self.get_similar_bindings(&column_ref.column),
                        })?;
                (binding, column_index)
            }
            None => {
                let binding = self.get_matching_binding(&column_ref.column)?;
                let column_index = binding
                    .column_index(&column_ref.column)
                    .ok_or_else(|| Error::internal("matched binding lost the column"))?;
                (binding, column_index)
            }
        };
        Ok(BoundColumnRef {
            binding_index: binding.index(),
            column_index,
            column_type: binding.types()[column_index],
            depth,
        })
    }

    /// Expand `*` (or `alias.*`) into qualified references over the
    /// non-hidden columns of the matching bindings, in insertion order
    pub fn generate_all_column_expressions(
        &self,
        relation: Option<&str>,
    ) -> Result<Vec<ColumnRef>> {
        let mut expressions = Vec::new();
        match relation {
            Some(alias) => {
                let binding = self.get_binding(alias)?;
                self.expand_binding(binding, &mut expressions);
            }
            None => {
                for binding in self.bindings_list() {
                    self.expand_binding(binding, &mut expressions);
                }
            }
        }
        Ok(expressions)
    }

    fn expand_binding(&self, binding: &Binding, out: &mut Vec<ColumnRef>) {
        for name in binding.names() {
            if self.is_hidden(binding.alias(), name) {
                continue;
            }
            out.push(ColumnRef::qualified(binding.alias(), name.clone()));
        }
    }

    /// Suppress `binding.column` from `*` expansion
    pub fn hide_binding(&mut self, binding: impl Into<String>, column: impl Into<String>) {
        self.hidden_columns.insert(QualifiedColumn {
            binding: binding.into(),
            column: column.into(),
        });
    }

    /// Whether `binding.column` is suppressed from `*` expansion
    pub fn binding_is_hidden(&self, binding: &str, column: &str) -> bool {
        self.is_hidden(binding, column)
    }

    fn is_hidden(&self, binding: &str, column: &str) -> bool {
        self.hidden_columns.contains(&QualifiedColumn {
            binding: binding.to_string(),
            column: column.to_string(),
        })
    }

    /// Merge all bindings from a sibling context (e.g. the right side of a
    /// join), consuming it. Duplicate aliases fail; hidden columns and CTE
    /// bindings carry over.
    pub fn add_context(&mut self, other: BindContext) -> Result<()> {
        for alias in &other.bindings_list {
            if self.bindings.contains_key(alias) {
                return Err(Error::DuplicateAlias(alias.clone()));
            }
        }
        let mut other = other;
        for alias in other.bindings_list.drain(..) {
            if let Some(binding) = other.bindings.remove(&alias) {
                self.bindings_list.push(alias.clone());
                self.bindings.insert(alias, binding);
            }
        }
        self.hidden_columns.extend(other.hidden_columns);
        for (alias, binding) in other.cte_bindings {
            self.cte_bindings.entry(alias).or_insert(binding);
        }
        Ok(())
    }

    /// Apply a column alias list to a relation's column names, keeping the
    /// original names where the list runs short
    pub fn alias_column_names(
        table_name: &str,
        names: &[String],
        aliases: &[String],
    ) -> Result<Vec<String>> {
        if aliases.len() > names.len() {
            return Err(Error::AliasCountMismatch {
                table: table_name.to_string(),
                columns: names.len(),
                aliases: aliases.len(),
            });
        }
        Ok(names
            .iter()
            .enumerate()
            .map(|(i, name)| aliases.get(i).unwrap_or(name).clone())
            .collect())
    }
}

/// Edit distance between two strings, used for similar-name hints
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
