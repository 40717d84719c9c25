use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use stockledger_core::ProductId;
use stockledger_infra::{InMemoryCatalog, InMemoryLedgerStore, LedgerConfig, LedgerScan, StockAggregator, StockLedger};
use stockledger_inventory::MovementLine;
use stockledger_products::CreateProduct;
use std::sync::Arc;

type Ledger = StockLedger<Arc<InMemoryLedgerStore>, Arc<InMemoryCatalog>>;

/// A ledger with `products` products and `history` inbound entries spread over them.
fn setup_ledger(products: usize, history: usize) -> (Ledger, Arc<InMemoryLedgerStore>, Vec<ProductId>) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let catalog = Arc::new(InMemoryCatalog::new());

    let ids: Vec<ProductId> = (0..products)
        .map(|i| {
            catalog
                .create(CreateProduct {
                    product_id: ProductId::new(),
                    name: format!("Product {i}"),
                    unit_price: 100,
                    description: None,
                    occurred_at: Utc::now(),
                })
                .unwrap()
                .id_typed()
        })
        .collect();

    let ledger = StockLedger::new(store.clone(), catalog, &LedgerConfig::default()).unwrap();
    for i in 0..history {
        let line = MovementLine::new(ids[i % ids.len()], 3).unwrap();
        ledger.record_inbound(&[line]).unwrap();
    }

    (ledger, store, ids)
}

fn bench_balance_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance_lookup");

    for history in [100usize, 1_000, 10_000] {
        let (ledger, store, ids) = setup_ledger(10, history);
        let scan = LedgerScan::new(store);
        let target = ids[0];

        group.bench_with_input(BenchmarkId::new("ledger_scan", history), &history, |b, _| {
            b.iter(|| scan.balance_of(black_box(target)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("projection", history), &history, |b, _| {
            b.iter(|| ledger.stock_of(black_box(target)).unwrap());
        });
    }

    group.finish();
}

fn bench_all_balances(c: &mut Criterion) {
    let mut group = c.benchmark_group("all_balances");

    for products in [10usize, 100] {
        let (ledger, store, ids) = setup_ledger(products, 5_000);
        let scan = LedgerScan::new(store);

        group.bench_with_input(BenchmarkId::new("ledger_scan", products), &products, |b, _| {
            b.iter(|| scan.balances_for_all(black_box(&ids)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("projection", products), &products, |b, _| {
            b.iter(|| ledger.stock_for_all().unwrap());
        });
    }

    group.finish();
}

fn bench_receipt_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("receipt_write");
    group.throughput(Throughput::Elements(1));

    group.bench_function("inbound", |b| {
        let (ledger, _, ids) = setup_ledger(10, 0);
        let line = [MovementLine::new(ids[0], 1).unwrap()];
        b.iter(|| ledger.record_inbound(black_box(&line)).unwrap());
    });

    group.bench_function("outbound_with_validation", |b| {
        let (ledger, _, ids) = setup_ledger(10, 0);
        let big = MovementLine::new(ids[0], i64::MAX as u64 / 2).unwrap();
        ledger.record_inbound(&[big]).unwrap();
        let line = [MovementLine::new(ids[0], 1).unwrap()];
        b.iter(|| ledger.record_outbound(black_box(&line)).unwrap());
    });

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    group.sample_size(20);

    for history in [1_000usize, 10_000] {
        let (ledger, _, _) = setup_ledger(50, history);
        group.throughput(Throughput::Elements(history as u64));
        group.bench_with_input(BenchmarkId::from_parameter(history), &history, |b, _| {
            b.iter(|| ledger.reconcile().unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_balance_lookup,
    bench_all_balances,
    bench_receipt_write,
    bench_reconcile
);
criterion_main!(benches);
