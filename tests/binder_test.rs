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

//! Bind context tests
//!
//! Alias registration, column resolution, `*` expansion with hidden
//! columns, context merging, and similar-name diagnostics.

use tidepool::binder::{BindContext, ColumnRef};
use tidepool::core::{Error, PhysicalType};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// `a(x, y)` joined with `b(y, z)`
fn join_context() -> BindContext {
    let mut context = BindContext::new();
    context
        .add_base_table(
            0,
            "a",
            names(&["x", "y"]),
            vec![PhysicalType::Int32, PhysicalType::Int64],
        )
        .expect("add a");
    context
        .add_base_table(
            1,
            "b",
            names(&["y", "z"]),
            vec![PhysicalType::Int64, PhysicalType::Varchar],
        )
        .expect("add b");
    context
}

#[test]
fn test_ambiguous_column_lists_candidates() {
    let context = join_context();
    let err = context
        .bind_column(&ColumnRef::new("y"), 0)
        .unwrap_err();
    match &err {
        Error::AmbiguousColumn { column, candidates } => {
            assert_eq!(column, "y");
            assert_eq!(candidates, &vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected ambiguity, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains('a') && message.contains('b'));
}

#[test]
fn test_qualified_references_resolve() {
    let context = join_context();
    let bound = context
        .bind_column(&ColumnRef::qualified("b", "y"), 0)
        .expect("bind");
    assert_eq!(bound.binding_index, 1);
    assert_eq!(bound.column_index, 0);
    assert_eq!(bound.column_type, PhysicalType::Int64);
    assert_eq!(bound.depth, 0);
}

#[test]
fn test_unqualified_unique_column_resolves() {
    let context = join_context();
    let bound = context.bind_column(&ColumnRef::new("z"), 0).expect("bind");
    assert_eq!(bound.binding_index, 1);
    assert_eq!(bound.column_index, 1);
    assert_eq!(bound.column_type, PhysicalType::Varchar);
}

#[test]
fn test_correlated_depth_is_preserved() {
    let context = join_context();
    let bound = context.bind_column(&ColumnRef::new("x"), 2).expect("bind");
    assert_eq!(bound.depth, 2);
}

#[test]
fn test_unknown_column_suggests_similar_names() {
    let mut context = BindContext::new();
    context
        .add_base_table(
            0,
            "t",
            names(&["name", "age"]),
            vec![PhysicalType::Varchar, PhysicalType::Int32],
        )
        .expect("add");
    let err = context.bind_column(&ColumnRef::new("nmae"), 0).unwrap_err();
    match err {
        Error::UnknownColumn { column, similar } => {
            assert_eq!(column, "nmae");
            assert_eq!(similar.first().map(String::as_str), Some("t.name"));
        }
        other => panic!("expected unknown column, got {:?}", other),
    }
}

#[test]
fn test_star_expansion_respects_hidden_columns() {
    let mut context = join_context();
    // USING(y) hides the right side's copy
    context.hide_binding("b", "y");
    assert!(context.binding_is_hidden("b", "y"));

    let expanded = context
        .generate_all_column_expressions(None)
        .expect("expand");
    assert_eq!(
        expanded,
        vec![
            ColumnRef::qualified("a", "x"),
            ColumnRef::qualified("a", "y"),
            ColumnRef::qualified("b", "z"),
        ]
    );

    // the hidden column still binds when qualified explicitly
    assert!(context
        .bind_column(&ColumnRef::qualified("b", "y"), 0)
        .is_ok());
    // and the unqualified reference is no longer ambiguous
    let bound = context.bind_column(&ColumnRef::new("y"), 0).expect("bind");
    assert_eq!(bound.binding_index, 0);
}

#[test]
fn test_star_expansion_for_one_relation() {
    let context = join_context();
    let expanded = context
        .generate_all_column_expressions(Some("b"))
        .expect("expand");
    assert_eq!(
        expanded,
        vec![
            ColumnRef::qualified("b", "y"),
            ColumnRef::qualified("b", "z"),
        ]
    );
    let err = context
        .generate_all_column_expressions(Some("missing"))
        .unwrap_err();
    assert_eq!(err, Error::UnknownTable("missing".to_string()));
}

#[test]
fn test_add_context_merges_sibling() {
    let mut left = BindContext::new();
    left.add_base_table(0, "l", names(&["a"]), vec![PhysicalType::Int32])
        .expect("add l");

    let mut right = BindContext::new();
    right
        .add_base_table(1, "r", names(&["b"]), vec![PhysicalType::Int32])
        .expect("add r");
    right.hide_binding("r", "b");

    left.add_context(right).expect("merge");
    assert!(left.bind_column(&ColumnRef::qualified("r", "b"), 0).is_ok());
    // hidden columns carry over with the merge
    let expanded = left.generate_all_column_expressions(None).expect("expand");
    assert_eq!(expanded, vec![ColumnRef::qualified("l", "a")]);
}

#[test]
fn test_add_context_duplicate_alias_fails() {
    let mut left = BindContext::new();
    left.add_base_table(0, "t", names(&["a"]), vec![PhysicalType::Int32])
        .expect("add");
    let mut right = BindContext::new();
    right
        .add_base_table(1, "t", names(&["b"]), vec![PhysicalType::Int32])
        .expect("add");
    let err = left.add_context(right).unwrap_err();
    assert_eq!(err, Error::DuplicateAlias("t".to_string()));
}

#[test]
fn test_subquery_and_table_function_bindings() {
    let mut context = BindContext::new();
    context
        .add_subquery(2, "sq", names(&["total"]), vec![PhysicalType::Int64])
        .expect("subquery");
    context
        .add_table_function(
            3,
            "range",
            names(&["value"]),
            vec![PhysicalType::Int64],
        )
        .expect("table function");

    let bound = context
        .bind_column(&ColumnRef::new("total"), 0)
        .expect("bind");
    assert_eq!(bound.binding_index, 2);
    let bound = context
        .bind_column(&ColumnRef::qualified("range", "value"), 0)
        .expect("bind");
    assert_eq!(bound.binding_index, 3);
}

#[test]
fn test_unknown_table_alias() {
    let context = join_context();
    let err = context
        .bind_column(&ColumnRef::qualified("missing", "x"), 0)
        .unwrap_err();
    assert_eq!(err, Error::UnknownTable("missing".to_string()));
}
