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

//! Core type definitions for Tidepool
//!
//! This module defines the fundamental types: PhysicalType, ComparisonOp,
//! and the engine-wide MVCC constants.

use std::fmt;

/// Start of the transaction-id range.
///
/// A version timestamp is either a transaction id (`>= TRANSACTION_ID_START`,
/// meaning the version is uncommitted) or a commit timestamp
/// (`< TRANSACTION_ID_START`). Keeping both in one field makes the
/// visibility check a single comparison.
pub const TRANSACTION_ID_START: u64 = 1 << 62;

/// Number of rows in one vector, the unit at which segment updates are
/// grouped and version chains are maintained.
pub const VECTOR_SIZE: usize = 1024;

/// Physical column types the storage core can hold and filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PhysicalType {
    /// 8-bit signed integer
    Int8 = 0,
    /// 16-bit signed integer
    Int16 = 1,
    /// 32-bit signed integer
    Int32 = 2,
    /// 64-bit signed integer
    Int64 = 3,
    /// 32-bit floating point
    Float = 4,
    /// 64-bit floating point
    Double = 5,
    /// UTF-8 string, stored in blocks as an 8-byte string-heap id
    Varchar = 6,
}

impl PhysicalType {
    /// Width in bytes of one value of this type inside a block
    pub fn type_size(&self) -> usize {
        match self {
            PhysicalType::Int8 => 1,
            PhysicalType::Int16 => 2,
            PhysicalType::Int32 => 4,
            PhysicalType::Int64 => 8,
            PhysicalType::Float => 4,
            PhysicalType::Double => 8,
            PhysicalType::Varchar => 8,
        }
    }

    /// Returns true for the integer and floating point types
    pub fn is_numeric(&self) -> bool {
        !matches!(self, PhysicalType::Varchar)
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalType::Int8 => write!(f, "INT8"),
            PhysicalType::Int16 => write!(f, "INT16"),
            PhysicalType::Int32 => write!(f, "INT32"),
            PhysicalType::Int64 => write!(f, "INT64"),
            PhysicalType::Float => write!(f, "FLOAT"),
            PhysicalType::Double => write!(f, "DOUBLE"),
            PhysicalType::Varchar => write!(f, "VARCHAR"),
        }
    }
}

/// Comparison operators a pushed-down filter may carry
///
/// The segment evaluates the five ordering comparisons; anything else is
/// rejected with `NotImplemented` at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Equals,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOp::Equals => write!(f, "="),
            ComparisonOp::NotEquals => write!(f, "<>"),
            ComparisonOp::LessThan => write!(f, "<"),
            ComparisonOp::LessThanEquals => write!(f, "<="),
            ComparisonOp::GreaterThan => write!(f, ">"),
            ComparisonOp::GreaterThanEquals => write!(f, ">="),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_sizes() {
        assert_eq!(PhysicalType::Int8.type_size(), 1);
        assert_eq!(PhysicalType::Int16.type_size(), 2);
        assert_eq!(PhysicalType::Int32.type_size(), 4);
        assert_eq!(PhysicalType::Int64.type_size(), 8);
        assert_eq!(PhysicalType::Float.type_size(), 4);
        assert_eq!(PhysicalType::Double.type_size(), 8);
        assert_eq!(PhysicalType::Varchar.type_size(), 8);
    }

    #[test]
    fn test_timestamp_ranges_are_disjoint() {
        // Any commit timestamp the manager can assign stays below the
        // transaction id range.
        assert!(TRANSACTION_ID_START > u64::MAX / 4);
        assert!(1 < TRANSACTION_ID_START);
    }

    #[test]
    fn test_display() {
        assert_eq!(PhysicalType::Varchar.to_string(), "VARCHAR");
        assert_eq!(ComparisonOp::LessThanEquals.to_string(), "<=");
    }
}
