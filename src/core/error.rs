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

//! Error types for Tidepool
//!
//! This module defines all error types surfaced by the storage core.

use thiserror::Error;

use super::types::PhysicalType;

/// Result type alias for Tidepool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Tidepool storage core
///
/// Catalog existence checks are deliberately *not* errors: `create_entry`
/// and `drop_entry` report them as `bool` returns, matching the
/// long-standing catalog API. Everything here is either fatal to the
/// transaction or a binder/filter diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Transaction errors
    // =========================================================================
    /// Concurrent uncommitted write to the same catalog key or the same
    /// row inside a vector. Fatal: the caller must abort.
    #[error("write-write conflict on {object}")]
    WriteWriteConflict { object: String },

    // =========================================================================
    // Catalog errors
    // =========================================================================
    /// Schema not found under the transaction's snapshot
    #[error("schema '{0}' does not exist")]
    UnknownSchema(String),

    /// Duplicate column name in a table schema
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    // =========================================================================
    // Binder errors
    // =========================================================================
    /// Two bindings registered under the same alias
    #[error("duplicate alias '{0}' in query")]
    DuplicateAlias(String),

    /// Unqualified column owned by more than one binding
    #[error("ambiguous reference to column '{column}' (candidates: {})", .candidates.join(", "))]
    AmbiguousColumn {
        column: String,
        candidates: Vec<String>,
    },

    /// Column not found in any binding; carries the closest matches by
    /// edit distance as a hint
    #[error("column '{column}' not found{}", similar_hint(.similar))]
    UnknownColumn {
        column: String,
        similar: Vec<String>,
    },

    /// Table or alias not found in the bind context
    #[error("table '{0}' not found in FROM clause")]
    UnknownTable(String),

    /// More column aliases supplied than the relation has columns
    #[error("table '{table}' has {columns} columns, but {aliases} column aliases were provided")]
    AliasCountMismatch {
        table: String,
        columns: usize,
        aliases: usize,
    },

    // =========================================================================
    // Storage errors
    // =========================================================================
    /// Filter pushed down with a constant whose type does not match the
    /// column's physical type
    #[error("invalid type for pushed-down filter: column is {expected}, constant is {got}")]
    InvalidType {
        expected: PhysicalType,
        got: PhysicalType,
    },

    /// Filter pushed down with a comparison the segment cannot evaluate
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Block id not known to the buffer manager
    #[error("block {0} not found in buffer manager")]
    BlockNotFound(u64),

    /// Index scans require a quiescent segment
    #[error("cannot index scan a segment with outstanding updates")]
    OutstandingUpdates,

    // =========================================================================
    // Internal errors
    // =========================================================================
    /// Internal invariant violation. Indicates a bug, not a user error.
    #[error("internal error: {0}")]
    Internal(String),
}

fn similar_hint(similar: &[String]) -> String {
    if similar.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", similar.join(", "))
    }
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// Create a write-write conflict error naming the contended object
    pub fn write_conflict(object: impl Into<String>) -> Self {
        Error::WriteWriteConflict {
            object: object.into(),
        }
    }

    /// Returns true for conflicts that must abort the transaction
    pub fn is_write_conflict(&self) -> bool {
        matches!(self, Error::WriteWriteConflict { .. })
    }

    /// Returns true for binder diagnostics (ambiguous, unknown, or
    /// misqualified references)
    pub fn is_binder_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicateAlias(_)
                | Error::AmbiguousColumn { .. }
                | Error::UnknownColumn { .. }
                | Error::UnknownTable(_)
                | Error::AliasCountMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_conflict_classification() {
        let err = Error::write_conflict("catalog entry 'users'");
        assert!(err.is_write_conflict());
        assert!(!err.is_binder_error());
        assert_eq!(
            err.to_string(),
            "write-write conflict on catalog entry 'users'"
        );
    }

    #[test]
    fn test_ambiguous_column_message_lists_candidates() {
        let err = Error::AmbiguousColumn {
            column: "y".to_string(),
            candidates: vec!["a".to_string(), "b".to_string()],
        };
        assert!(err.is_binder_error());
        assert_eq!(
            err.to_string(),
            "ambiguous reference to column 'y' (candidates: a, b)"
        );
    }

    #[test]
    fn test_unknown_column_hint_formatting() {
        let bare = Error::UnknownColumn {
            column: "zz".to_string(),
            similar: vec![],
        };
        assert_eq!(bare.to_string(), "column 'zz' not found");

        let hinted = Error::UnknownColumn {
            column: "nmae".to_string(),
            similar: vec!["t.name".to_string()],
        };
        assert_eq!(
            hinted.to_string(),
            "column 'nmae' not found (did you mean: t.name?)"
        );
    }
}
