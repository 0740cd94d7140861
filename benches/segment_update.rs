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

//! Segment update and scan throughput
//!
//! Run with: cargo bench --bench segment_update

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tidepool::core::{PhysicalType, Value, Vector, VECTOR_SIZE};
use tidepool::storage::{BufferManager, Segment};
use tidepool::transaction::TransactionManager;

fn int_values(values: &[i32]) -> Vector {
    let values: Vec<Value> = values.iter().map(|v| Value::Int32(*v)).collect();
    Vector::from_values(PhysicalType::Int32, &values).expect("vector")
}

fn seeded_segment(buffers: &Arc<BufferManager>) -> Arc<Segment> {
    let segment = Segment::temporary(Arc::clone(buffers), PhysicalType::Int32, 0, 1);
    let base: Vec<i32> = (0..VECTOR_SIZE as i32).collect();
    segment.append(0, &int_values(&base)).expect("append");
    segment
}

fn bench_single_row_update(c: &mut Criterion) {
    let manager = TransactionManager::new();
    let buffers = Arc::new(BufferManager::new());
    let segment = seeded_segment(&buffers);
    let update = int_values(&[12345]);

    c.bench_function("update_single_row_commit", |b| {
        b.iter(|| {
            let txn = manager.begin();
            segment
                .update(&txn, black_box(&[17]), &update)
                .expect("update");
            manager.commit(txn).expect("commit");
        })
    });
}

fn bench_scan_with_version_chain(c: &mut Criterion) {
    let manager = TransactionManager::new();
    let buffers = Arc::new(BufferManager::new());
    let segment = seeded_segment(&buffers);

    // build up a committed version chain over the vector
    for round in 0..32 {
        let txn = manager.begin();
        segment
            .update(&txn, &[round], &int_values(&[round as i32 * 10]))
            .expect("update");
        manager.commit(txn).expect("commit");
    }

    c.bench_function("scan_with_32_versions", |b| {
        b.iter(|| {
            let txn = manager.begin();
            let result = segment.scan(&txn, black_box(0)).expect("scan");
            manager.commit(txn).expect("commit");
            black_box(result.len())
        })
    });
}

fn bench_filtered_select(c: &mut Criterion) {
    use tidepool::core::ComparisonOp;
    use tidepool::storage::TableFilter;

    let manager = TransactionManager::new();
    let buffers = Arc::new(BufferManager::new());
    let segment = seeded_segment(&buffers);
    let filters = [TableFilter::new(
        ComparisonOp::GreaterThan,
        Value::Int32(VECTOR_SIZE as i32 / 2),
    )];

    c.bench_function("select_base_path_filtered", |b| {
        b.iter(|| {
            let txn = manager.begin();
            let (_, sel) = segment.select(&txn, black_box(0), &filters).expect("select");
            manager.commit(txn).expect("commit");
            black_box(sel.len())
        })
    });
}

criterion_group!(
    benches,
    bench_single_row_update,
    bench_scan_with_version_chain,
    bench_filtered_select
);
criterion_main!(benches);
