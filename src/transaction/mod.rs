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

//! Transaction management for Tidepool
//!
//! - [`TransactionManager`] - assigns transaction ids and commit timestamps,
//!   drives commit and abort over the undo buffer
//! - [`Transaction`] - a snapshot (`start_time`) plus a private undo buffer
//!   of back-pointers into version chains
//!
//! # Transaction Lifecycle
//!
//! ```text
//! begin -> active -> commit (rewrite timestamps in undo order)
//!                \-> abort  (revert in reverse undo order)
//! ```

pub mod manager;
pub mod transaction;
pub(crate) mod undo;

pub use manager::TransactionManager;
pub use transaction::Transaction;
