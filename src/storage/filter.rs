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

//! Pushed-down table filters
//!
//! The cross product of physical type, comparison operator, and null
//! presence is evaluated by monomorphizing one generic inner loop over
//! `(T, OP, HAS_NULL)` rather than hand-writing each case. The null-free
//! fast path skips the mask probe entirely.

use crate::core::{
    ComparisonOp, Error, NullMask, Result, SelectionVector, Value, Vector, VectorBuffer,
};

/// A comparison against a typed constant, pushed into a segment scan
#[derive(Debug, Clone)]
pub struct TableFilter {
    pub comparison: ComparisonOp,
    pub constant: Value,
}

impl TableFilter {
    /// Create a filter
    pub fn new(comparison: ComparisonOp, constant: Value) -> Self {
        TableFilter {
            comparison,
            constant,
        }
    }
}

trait CompareOperator {
    fn compare<T: PartialOrd + ?Sized>(left: &T, right: &T) -> bool;
}

struct Equals;
struct LessThan;
struct LessThanEquals;
struct GreaterThan;
struct GreaterThanEquals;

impl CompareOperator for Equals {
    #[inline]
    fn compare<T: PartialOrd + ?Sized>(left: &T, right: &T) -> bool {
        left == right
    }
}

impl CompareOperator for LessThan {
    #[inline]
    fn compare<T: PartialOrd + ?Sized>(left: &T, right: &T) -> bool {
        left < right
    }
}

impl CompareOperator for LessThanEquals {
    #[inline]
    fn compare<T: PartialOrd + ?Sized>(left: &T, right: &T) -> bool {
        left <= right
    }
}

impl CompareOperator for GreaterThan {
    #[inline]
    fn compare<T: PartialOrd + ?Sized>(left: &T, right: &T) -> bool {
        left > right
    }
}

impl CompareOperator for GreaterThanEquals {
    #[inline]
    fn compare<T: PartialOrd + ?Sized>(left: &T, right: &T) -> bool {
        left >= right
    }
}

fn filter_selection_loop<T: PartialOrd, OP: CompareOperator, const HAS_NULL: bool>(
    values: &[T],
    predicate: &T,
    nulls: &NullMask,
    sel: &SelectionVector,
) -> SelectionVector {
    let mut result = SelectionVector::with_capacity(sel.len());
    for i in 0..sel.len() {
        let index = sel.selected(i);
        if (!HAS_NULL || !nulls.is_null(index)) && OP::compare(&values[index], predicate) {
            result.push(index as u32);
        }
    }
    result
}

fn filter_typed<T: PartialOrd, OP: CompareOperator>(
    values: &[T],
    predicate: &T,
    nulls: &NullMask,
    sel: &mut SelectionVector,
) {
    let refined = if nulls.any() {
        filter_selection_loop::<T, OP, true>(values, predicate, nulls, sel)
    } else {
        filter_selection_loop::<T, OP, false>(values, predicate, nulls, sel)
    };
    *sel = refined;
}

fn dispatch_comparison<T: PartialOrd>(
    values: &[T],
    predicate: &T,
    comparison: ComparisonOp,
    nulls: &NullMask,
    sel: &mut SelectionVector,
) -> Result<()> {
    match comparison {
        ComparisonOp::Equals => filter_typed::<T, Equals>(values, predicate, nulls, sel),
        ComparisonOp::LessThan => filter_typed::<T, LessThan>(values, predicate, nulls, sel),
        ComparisonOp::LessThanEquals => {
            filter_typed::<T, LessThanEquals>(values, predicate, nulls, sel)
        }
        ComparisonOp::GreaterThan => filter_typed::<T, GreaterThan>(values, predicate, nulls, sel),
        ComparisonOp::GreaterThanEquals => {
            filter_typed::<T, GreaterThanEquals>(values, predicate, nulls, sel)
        }
        other => {
            return Err(Error::NotImplemented(format!(
                "comparison {} pushed down to a segment scan",
                other
            )))
        }
    }
    Ok(())
}

/// Refine `sel` to the slots of `result` that satisfy the filter
///
/// A NULL constant never qualifies any row. A constant of the wrong type
/// fails with [`Error::InvalidType`].
pub fn filter_selection(
    result: &Vector,
    filter: &TableFilter,
    sel: &mut SelectionVector,
) -> Result<()> {
    let Some(constant_type) = filter.constant.physical_type() else {
        sel.clear();
        return Ok(());
    };
    let nulls = result.nulls();
    match (&result.buffer, &filter.constant) {
        (VectorBuffer::Int8(values), Value::Int8(c)) => {
            dispatch_comparison(values, c, filter.comparison, nulls, sel)
        }
        (VectorBuffer::Int16(values), Value::Int16(c)) => {
            dispatch_comparison(values, c, filter.comparison, nulls, sel)
        }
        (VectorBuffer::Int32(values), Value::Int32(c)) => {
            dispatch_comparison(values, c, filter.comparison, nulls, sel)
        }
        (VectorBuffer::Int64(values), Value::Int64(c)) => {
            dispatch_comparison(values, c, filter.comparison, nulls, sel)
        }
        (VectorBuffer::Float(values), Value::Float(c)) => {
            dispatch_comparison(values, c, filter.comparison, nulls, sel)
        }
        (VectorBuffer::Double(values), Value::Double(c)) => {
            dispatch_comparison(values, c, filter.comparison, nulls, sel)
        }
        (VectorBuffer::Varchar(values), Value::Varchar(c)) => {
            dispatch_comparison(values, c, filter.comparison, nulls, sel)
        }
        (_, _) => Err(Error::InvalidType {
            expected: result.physical_type(),
            got: constant_type,
        }),
    }
}
