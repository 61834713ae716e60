//! # Connector Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | shared-types | Error codec serialize / deserialize |
//! | shared-types | Network archive hex encoding |
//! | lc-01 → lc-04 | Query round trip over the in-process transport |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use connector_runtime::{build_registry, ConnectorConfig};
use lc_01_proxy_connector::{ProxyConfig, ProxyConnectionManager};
use lc_04_connector_server::ConnectorServer;
use serde_json::json;
use shared_bus::memory_transport;
use shared_types::{
    wire_error, Connection, ConnectorError, LifecycleError, NetworkDefinition,
};
use std::sync::Arc;

fn bench_error_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("error-codec");

    let local = ConnectorError::from(LifecycleError::AlreadyStarted("net@1.0".to_string()));
    group.bench_function("serialize_local", |b| {
        b.iter(|| black_box(wire_error::serialize(black_box(&local))))
    });

    let wire = wire_error::serialize(&ConnectorError::InvalidArgument("bad".to_string()));
    group.bench_function("deserialize", |b| {
        b.iter(|| black_box(wire_error::deserialize(black_box(wire.clone()))))
    });

    group.finish();
}

fn bench_archive(c: &mut Criterion) {
    let mut group = c.benchmark_group("network-archive");

    for files in [1usize, 16, 128] {
        let definition = (0..files).fold(NetworkDefinition::new("net", "1.0"), |def, i| {
            def.with_file(format!("models/m{i}.cto"), "namespace org.acme\nasset A identified by id { o String id }")
        });
        let encoded = definition.to_archive_hex().unwrap_or_default();

        group.throughput(Throughput::Elements(files as u64));
        group.bench_with_input(BenchmarkId::new("to_hex", files), &definition, |b, def| {
            b.iter(|| black_box(def.to_archive_hex()))
        });
        group.bench_with_input(BenchmarkId::new("from_hex", files), &encoded, |b, hex| {
            b.iter(|| black_box(NetworkDefinition::from_archive_hex(hex)))
        });
    }

    group.finish();
}

fn bench_proxy_round_trip(c: &mut Criterion) {
    let Ok(runtime) = tokio::runtime::Runtime::new() else {
        return;
    };

    let (connection, ctx) = runtime.block_on(async {
        let server = ConnectorServer::new(Arc::new(build_registry(&ConnectorConfig::default())));
        let (dialer, listener) = memory_transport();
        tokio::spawn(async move { server.serve_memory(listener).await });
        let manager = ProxyConnectionManager::with_dialer(ProxyConfig::default(), Arc::new(dialer));

        let connection = manager
            .connect_proxy("bench", None, &json!({ "type": "web" }))
            .await
            .ok()?;
        let ctx = connection.login("admin", "adminpw").await.ok()?;
        Some((connection, ctx))
    })
    .unzip();
    let (Some(connection), Some(ctx)) = (connection, ctx) else {
        return;
    };

    c.bench_function("proxy-list-round-trip", |b| {
        b.iter(|| runtime.block_on(async { black_box(connection.list(&*ctx).await) }))
    });
}

criterion_group!(benches, bench_error_codec, bench_archive, bench_proxy_round_trip);
criterion_main!(benches);
