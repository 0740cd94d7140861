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

//! Bind-time name resolution
//!
//! The binder collaborator drives a [`BindContext`] per query scope: it
//! registers bindings for everything in the FROM clause, then resolves
//! column references and `*` expansions against them.

pub mod bind_context;
pub mod binding;

pub use bind_context::{BindContext, BoundColumnRef, ColumnRef};
pub use binding::{Binding, BindingKind};
