use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use chrono::{Duration, Utc};

use kegtrail_assets::{Asset, AssetKind, AssetStatus, FillState, Location};
use kegtrail_core::{AssetId, CustomerId, MovementId, UserId};
use kegtrail_ledger::{Movement, MovementKind, NewMovement};
use kegtrail_store::{MemoryStore, default_indexes};
use kegtrail_tracking::{
    AssetRegistry, CustomerDirectory, HistoryFilter, HistoryQuery, MovementRecorder, NewCustomer,
    historical_distinct_assets, holdings_by_customer,
};

const CUSTOMER_COUNT: usize = 20;

/// Synthetic fleet: `asset_count` kegs cycled through deliveries and pickups
/// across a fixed pool of customers.
fn synthetic_fleet(asset_count: usize, movements_per_asset: usize) -> (Vec<Asset>, Vec<Movement>) {
    let start = Utc::now() - Duration::days(365);
    let customers: Vec<CustomerId> = (0..CUSTOMER_COUNT).map(|_| CustomerId::new()).collect();

    let mut assets = Vec::with_capacity(asset_count);
    let mut movements = Vec::new();
    for i in 0..asset_count {
        let id = AssetId::new();
        let code = format!("KEG-{:03}", i + 1);
        let mut at_customer = None;
        let mut recorded_at = start;
        for step in 0..movements_per_asset {
            recorded_at += Duration::hours(6);
            let (kind, customer_id) = if at_customer.is_none() {
                let target = customers[(i + step) % customers.len()];
                at_customer = Some(target);
                (MovementKind::EntregaACliente, target)
            } else {
                let target = at_customer.take().unwrap();
                (MovementKind::RecoleccionDeCliente, target)
            };
            movements.push(Movement {
                id: MovementId::new(),
                asset_id: id,
                asset_code: code.clone(),
                asset_kind: AssetKind::Barril,
                kind,
                customer_id,
                customer_name: format!("Cliente {}", customer_id),
                user_id: UserId::new(),
                recorded_at,
                variety: None,
            });
        }
        let effect = movements.last().map(|m| m.kind.effect());
        let location = effect.map_or(Location::EnPlanta, |e| e.location);
        assets.push(Asset {
            id,
            code,
            kind: AssetKind::Barril,
            format: "50L".to_string(),
            status: AssetStatus {
                fill: FillState::Lleno,
                location,
            },
            holder_id: at_customer,
            holder_name: at_customer.map(|c| format!("Cliente {c}")),
            last_movement_at: recorded_at,
            variety: None,
            created_at: start,
        });
    }
    (assets, movements)
}

fn bench_holdings_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("holdings_projection");

    for asset_count in [100, 1000, 5000].iter() {
        let (assets, movements) = synthetic_fleet(*asset_count, 20);
        group.throughput(Throughput::Elements(movements.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("rebuild", asset_count),
            asset_count,
            |b, _| {
                b.iter(|| black_box(holdings_by_customer(&assets, &movements)));
            },
        );
    }

    group.finish();
}

fn bench_historical_distinct_assets(c: &mut Criterion) {
    let mut group = c.benchmark_group("historical_distinct_assets");

    let (assets, movements) = synthetic_fleet(1000, 20);
    let customer_id = assets
        .iter()
        .find_map(|a| a.holder_id)
        .expect("fleet has at least one delivered asset");

    group.throughput(Throughput::Elements(movements.len() as u64));
    group.bench_function("scan", |b| {
        b.iter(|| black_box(historical_distinct_assets(&movements, customer_id)));
    });

    group.finish();
}

fn bench_record_and_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_and_page");
    group.sample_size(50);

    // Benchmark: one recorded movement against a populated store.
    group.bench_function("record_movement", |b| {
        let store = Arc::new(MemoryStore::with_indexes(default_indexes()));
        let customer = CustomerDirectory::new(Arc::clone(&store))
            .create(&NewCustomer {
                name: "Cliente Uno".to_string(),
                address: "Calle 1".to_string(),
                contact: "Ana".to_string(),
                phone: "123456789".to_string(),
                kind: kegtrail_customers::CustomerType::Bar,
            })
            .unwrap();
        let asset = AssetRegistry::new(Arc::clone(&store))
            .create(AssetKind::Barril, "50L")
            .unwrap();
        let recorder = MovementRecorder::new(Arc::clone(&store));
        let actor = UserId::new();

        b.iter(|| {
            recorder
                .record(
                    &NewMovement {
                        asset_id: asset.id,
                        kind: black_box(MovementKind::EntregaACliente),
                        customer_id: customer.id,
                        variety: None,
                    },
                    actor,
                )
                .unwrap();
        });
    });

    // Benchmark: first history page over a few thousand movements.
    group.bench_function("movements_first_page", |b| {
        let store = Arc::new(MemoryStore::with_indexes(default_indexes()));
        let customer = CustomerDirectory::new(Arc::clone(&store))
            .create(&NewCustomer {
                name: "Cliente Uno".to_string(),
                address: "Calle 1".to_string(),
                contact: "Ana".to_string(),
                phone: "123456789".to_string(),
                kind: kegtrail_customers::CustomerType::Bar,
            })
            .unwrap();
        let asset = AssetRegistry::new(Arc::clone(&store))
            .create(AssetKind::Barril, "50L")
            .unwrap();
        let recorder = MovementRecorder::new(Arc::clone(&store));
        let actor = UserId::new();
        for _ in 0..2000 {
            recorder
                .record(
                    &NewMovement {
                        asset_id: asset.id,
                        kind: MovementKind::EntregaACliente,
                        customer_id: customer.id,
                        variety: None,
                    },
                    actor,
                )
                .unwrap();
        }
        let history = HistoryQuery::new(Arc::clone(&store));
        let filter = HistoryFilter::default();

        b.iter(|| {
            black_box(
                history
                    .movements_page(&filter, None, Utc::now())
                    .unwrap(),
            );
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_holdings_projection,
    bench_historical_distinct_assets,
    bench_record_and_page
);
criterion_main!(benches);
