/// Player Store Benchmarks
///
/// Compares the three layers a catch touches:
/// 1. Cached read (RAM, per-player lock)
/// 2. Catch resolution + in-memory commit + write-behind enqueue
/// 3. LMDB read-merge-write of one patch (what the writer task pays)
use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use catch_core::{Catalog, PipelineConfig, WorldState};
use catch_server::store::lmdb::LmdbBackend;
use catch_server::store::memory::MemoryBackend;
use catch_server::store::writer::PersistConfig;
use catch_server::{CatchService, PlayerId, PlayerStore};

fn bench_store_layers(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("player_store");

    let store = runtime.block_on(async {
        Arc::new(
            PlayerStore::hydrate(
                Arc::new(MemoryBackend::new()),
                Arc::new(Catalog::builtin()),
                Arc::new(PipelineConfig::default()),
                PersistConfig::default(),
            )
            .await
            .unwrap(),
        )
    });
    let player = PlayerId::from("bench");
    store.add_currency(&player, 1_000).unwrap();

    group.bench_function("1_cached_read", |b| {
        b.iter(|| store.read_currency(&player));
    });

    group.bench_function("2_resolve_and_commit", |b| {
        let service = CatchService::new(store.clone(), Some(7));
        let world = WorldState::clear();
        b.iter(|| {
            service.resolve_catch(&player, &world).unwrap();
            store.sell_all(&player, 0)
        });
    });

    group.bench_function("3_lmdb_upsert", |b| {
        let dir = tempfile::tempdir().unwrap();
        let backend = LmdbBackend::new(dir.path(), 64 * 1024 * 1024).expect("Failed to open LMDB");
        let mut patch = serde_json::Map::new();
        let mut currency = 0u64;

        b.iter(|| {
            currency += 1;
            patch.insert("currency".into(), serde_json::json!(currency));
            backend.upsert_sync("players", "bench", &patch).unwrap();
        });
    });

    group.finish();
    runtime.block_on(store.flush());
}

criterion_group!(benches, bench_store_layers);
criterion_main!(benches);
