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

//! Concurrency and randomized workload tests
//!
//! Checks the quantified MVCC properties under parallel writers and random
//! update/commit/abort sequences: write-write detection, snapshot
//! isolation, undo correctness, and version chain shape.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tidepool::catalog::{Catalog, DEFAULT_SCHEMA};
use tidepool::core::{ColumnDefinition, PhysicalType, TableSchema, Value, Vector, VECTOR_SIZE};
use tidepool::storage::{BufferManager, Segment};
use tidepool::transaction::TransactionManager;

fn int_values(values: &[i32]) -> Vector {
    let values: Vec<Value> = values.iter().map(|v| Value::Int32(*v)).collect();
    Vector::from_values(PhysicalType::Int32, &values).expect("vector")
}

#[test]
fn test_concurrent_catalog_create_single_winner() {
    let manager = Arc::new(TransactionManager::new());
    let catalog = Arc::new(Catalog::new());
    let barrier = Arc::new(Barrier::new(8));
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let catalog = Arc::clone(&catalog);
            let barrier = Arc::clone(&barrier);
            let winners = Arc::clone(&winners);
            thread::spawn(move || {
                let schema = TableSchema::new(vec![ColumnDefinition::new(
                    "i",
                    PhysicalType::Int32,
                )])
                .expect("schema");
                barrier.wait();
                let txn = manager.begin();
                match catalog.create_table(&txn, DEFAULT_SCHEMA, "contended", schema) {
                    Ok(true) => {
                        winners.fetch_add(1, Ordering::SeqCst);
                        manager.commit(txn).expect("commit winner");
                    }
                    Ok(false) => manager.commit(txn).expect("commit no-op"),
                    Err(err) => {
                        assert!(err.is_write_conflict(), "unexpected error: {:?}", err);
                        manager.abort(txn).expect("abort loser");
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    let fresh = manager.begin();
    assert!(catalog
        .get_table(&fresh, DEFAULT_SCHEMA, "contended")
        .is_ok());
    let tables = catalog.tables_set(&fresh, DEFAULT_SCHEMA).expect("set");
    manager.commit(fresh).expect("commit");
    tables.check_chain_shape().expect("well-formed chains");
    assert_eq!(manager.active_transaction_count(), 0);
}

#[test]
fn test_concurrent_disjoint_row_updates_all_commit() {
    let manager = Arc::new(TransactionManager::new());
    let buffers = Arc::new(BufferManager::new());
    let segment = Segment::temporary(Arc::clone(&buffers), PhysicalType::Int32, 0, 1);
    let base: Vec<i32> = (0..VECTOR_SIZE as i32).collect();
    segment.append(0, &int_values(&base)).expect("append");

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8u64)
        .map(|worker| {
            let manager = Arc::clone(&manager);
            let segment = Arc::clone(&segment);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let txn = manager.begin();
                let ids: Vec<u64> = (0..4).map(|k| worker * 4 + k).collect();
                let values: Vec<i32> = ids.iter().map(|id| 1000 + *id as i32).collect();
                segment
                    .update(&txn, &ids, &int_values(&values))
                    .expect("disjoint update");
                manager.commit(txn).expect("commit");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    let fresh = manager.begin();
    for id in 0..32u64 {
        assert_eq!(
            segment.fetch_row(&fresh, id).expect("fetch"),
            Value::Int32(1000 + id as i32)
        );
    }
    // untouched rows keep their base values
    assert_eq!(
        segment.fetch_row(&fresh, 40).expect("fetch"),
        Value::Int32(40)
    );
    manager.commit(fresh).expect("commit");
    assert!(!segment.has_uncommitted_updates());
}

#[test]
fn test_concurrent_same_row_serializes_writers() {
    let manager = Arc::new(TransactionManager::new());
    let buffers = Arc::new(BufferManager::new());
    let segment = Segment::temporary(Arc::clone(&buffers), PhysicalType::Int32, 0, 1);
    segment.append(0, &int_values(&[0, 0, 0, 0])).expect("append");

    let barrier = Arc::new(Barrier::new(8));
    let winners = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let manager = Arc::clone(&manager);
            let segment = Arc::clone(&segment);
            let barrier = Arc::clone(&barrier);
            let winners = Arc::clone(&winners);
            thread::spawn(move || {
                barrier.wait();
                let txn = manager.begin();
                match segment.update(&txn, &[0], &int_values(&[worker])) {
                    Ok(()) => {
                        winners.fetch_add(1, Ordering::SeqCst);
                        manager.commit(txn).expect("commit");
                    }
                    Err(err) => {
                        assert!(err.is_write_conflict(), "unexpected error: {:?}", err);
                        manager.abort(txn).expect("abort");
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    // at least one writer made it; losers left no trace
    assert!(winners.load(Ordering::SeqCst) >= 1);
    assert!(!segment.has_uncommitted_updates());
    let fresh = manager.begin();
    let value = segment.fetch_row(&fresh, 0).expect("fetch");
    match value {
        Value::Int32(v) => assert!((0..8).contains(&v)),
        other => panic!("unexpected value {:?}", other),
    }
    manager.commit(fresh).expect("commit");
}

#[test]
fn test_randomized_commit_abort_matches_model() {
    const ROWS: usize = 64;
    let manager = TransactionManager::new();
    let buffers = Arc::new(BufferManager::new());
    let segment = Segment::temporary(Arc::clone(&buffers), PhysicalType::Int32, 0, 1);
    let mut model: Vec<i32> = (0..ROWS as i32).collect();
    segment.append(0, &int_values(&model)).expect("append");

    let mut rng = StdRng::seed_from_u64(0x7143);
    let mut pinned_reader = None;

    for round in 0..200 {
        if round == 50 {
            pinned_reader = Some((manager.begin(), model.clone()));
        }

        let txn = manager.begin();
        let mut ids: Vec<u64> = (0..ROWS as u64).collect();
        for i in (1..ids.len()).rev() {
            ids.swap(i, rng.gen_range(0..=i));
        }
        let picked = rng.gen_range(1..8usize);
        let mut ids: Vec<u64> = ids.into_iter().take(picked).collect();
        ids.sort_unstable();
        let values: Vec<i32> = ids.iter().map(|_| rng.gen_range(-1000..1000)).collect();
        segment
            .update(&txn, &ids, &int_values(&values))
            .expect("update");

        if rng.gen_bool(0.5) {
            manager.commit(txn).expect("commit");
            for (id, value) in ids.iter().zip(&values) {
                model[*id as usize] = *value;
            }
        } else {
            manager.abort(txn).expect("abort");
        }

        // a fresh snapshot always equals the committed model
        let check = manager.begin();
        let result = segment.scan(&check, 0).expect("scan");
        for (id, expected) in model.iter().enumerate() {
            assert_eq!(
                result.value(id),
                Value::Int32(*expected),
                "round {} row {}",
                round,
                id
            );
        }
        manager.commit(check).expect("commit");
    }

    // the reader pinned at round 50 still sees that round's state
    let (reader, frozen) = pinned_reader.expect("pinned reader");
    let result = segment.scan(&reader, 0).expect("scan");
    for (id, expected) in frozen.iter().enumerate() {
        assert_eq!(result.value(id), Value::Int32(*expected), "row {}", id);
    }
    manager.commit(reader).expect("commit");
    assert!(!segment.has_uncommitted_updates());
}

#[test]
fn test_randomized_catalog_churn_preserves_chains() {
    let manager = TransactionManager::new();
    let catalog = Catalog::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let names = ["t0", "t1", "t2", "t3"];
    let mut live = [false; 4];

    for _ in 0..200 {
        let pick = rng.gen_range(0..names.len());
        let name = names[pick];
        let schema =
            TableSchema::new(vec![ColumnDefinition::new("i", PhysicalType::Int32)])
                .expect("schema");

        let txn = manager.begin();
        let created = rng.gen_bool(0.5);
        let applied = if created {
            catalog
                .create_table(&txn, DEFAULT_SCHEMA, name, schema)
                .expect("create")
        } else {
            catalog.drop_table(&txn, DEFAULT_SCHEMA, name).expect("drop")
        };
        if rng.gen_bool(0.5) {
            manager.commit(txn).expect("commit");
            if applied {
                live[pick] = created;
            }
        } else {
            manager.abort(txn).expect("abort");
        }

        let check = manager.begin();
        for (i, name) in names.iter().enumerate() {
            assert_eq!(
                catalog.get_table(&check, DEFAULT_SCHEMA, name).is_ok(),
                live[i],
                "table {}",
                name
            );
        }
        let tables = catalog.tables_set(&check, DEFAULT_SCHEMA).expect("set");
        manager.commit(check).expect("commit");
        tables.check_chain_shape().expect("well-formed chains");
    }
}
