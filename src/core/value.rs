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

//! Value type for Tidepool - typed runtime values
//!
//! A [`Value`] is the unit the core exchanges with its collaborators:
//! filter constants pushed into segments, column defaults in the catalog,
//! and materialized cells read back out of scans.
//!
//! Note: Varchar uses `Arc<str>` for cheap cloning during scans.

use std::fmt;
use std::sync::Arc;

use super::types::PhysicalType;

/// A runtime value with type information
#[derive(Debug, Clone)]
pub enum Value {
    /// NULL value
    Null,

    /// 8-bit signed integer
    Int8(i8),

    /// 16-bit signed integer
    Int16(i16),

    /// 32-bit signed integer
    Int32(i32),

    /// 64-bit signed integer
    Int64(i64),

    /// 32-bit floating point
    Float(f32),

    /// 64-bit floating point
    Double(f64),

    /// UTF-8 string (Arc for cheap cloning)
    Varchar(Arc<str>),
}

impl Value {
    /// Create a varchar value from anything string-like
    pub fn varchar(s: impl AsRef<str>) -> Self {
        Value::Varchar(Arc::from(s.as_ref()))
    }

    /// The physical type of this value, or `None` for NULL
    pub fn physical_type(&self) -> Option<PhysicalType> {
        match self {
            Value::Null => None,
            Value::Int8(_) => Some(PhysicalType::Int8),
            Value::Int16(_) => Some(PhysicalType::Int16),
            Value::Int32(_) => Some(PhysicalType::Int32),
            Value::Int64(_) => Some(PhysicalType::Int64),
            Value::Float(_) => Some(PhysicalType::Float),
            Value::Double(_) => Some(PhysicalType::Double),
            Value::Varchar(_) => Some(PhysicalType::Varchar),
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Varchar(a), Value::Varchar(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Int8(a), Value::Int8(b)) => a.partial_cmp(b),
            (Value::Int16(a), Value::Int16(b)) => a.partial_cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.partial_cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Varchar(a), Value::Varchar(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Varchar(v) => write!(f, "'{}'", v),
        }
    }
}
