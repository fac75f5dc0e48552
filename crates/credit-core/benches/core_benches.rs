//! Criterion benchmarks for credit-core hot paths.
//!
//! Covers: wallet aggregation over a synthetic ledger and heuristic labelling.

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use credit_core::features::aggregate;
use credit_core::heuristic::labels;
use credit_core::{Transaction, TransactionType};

/// 50 000 transactions spread over 1 000 wallets and one year.
fn synthetic_ledger() -> Vec<Transaction> {
    (0..50_000u64)
        .map(|i| {
            let wallet = format!("0x{:040x}", i % 1_000);
            let kind = TransactionType::ALL[(i % 5) as usize];
            let ts = Utc.timestamp_opt(1_600_000_000 + (i as i64 * 631) % 31_536_000, 0).unwrap();
            Transaction::new(wallet, kind, 1.0 + (i % 97) as f64, ts).unwrap()
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let ledger = synthetic_ledger();
    c.bench_function("aggregate_50k_transactions", |b| {
        b.iter(|| aggregate(black_box(&ledger)))
    });
}

fn bench_labels(c: &mut Criterion) {
    let features = aggregate(&synthetic_ledger()).unwrap();
    c.bench_function("heuristic_labels_1k_wallets", |b| {
        b.iter(|| labels(black_box(&features)))
    });
}

criterion_group!(benches, bench_aggregate, bench_labels);
criterion_main!(benches);
