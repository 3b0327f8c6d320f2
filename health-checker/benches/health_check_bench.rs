use criterion::{black_box, criterion_group, criterion_main, Criterion};
use health_checker::{
    apply_results, classify, HealthCheckerConfig, HealthMonitor, HealthStatus, MockHttpClient,
    RegistryEntry, Target,
};
use std::sync::Arc;

fn bench_config() -> HealthCheckerConfig {
    HealthCheckerConfig {
        batch_size: 5,
        ..Default::default()
    }
}

fn bench_targets(n: usize) -> Vec<Target> {
    (0..n)
        .map(|i| Target::new(format!("api-{i}"), format!("https://api-{i}.example.com")))
        .collect()
}

fn bench_classifier(c: &mut Criterion) {
    c.bench_function("classify", |b| {
        b.iter(|| {
            for code in [200u16, 301, 401, 404, 503] {
                for elapsed in [50u64, 3500, 6000] {
                    black_box(classify(black_box(code), black_box(elapsed)));
                }
            }
        })
    });
}

fn bench_bulk_check(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let monitor = HealthMonitor::new(Arc::new(MockHttpClient::new()), &bench_config());
    let targets = bench_targets(50);

    c.bench_function("bulk_check_50_targets", |b| {
        b.iter(|| {
            rt.block_on(async {
                let results = monitor.check_bulk(&targets).await;
                black_box(results)
            })
        })
    });
}

fn bench_apply_results(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let monitor = HealthMonitor::new(Arc::new(MockHttpClient::new()), &bench_config());
    let targets = bench_targets(200);
    let results = rt.block_on(monitor.check_bulk(&targets));

    let entries: Vec<RegistryEntry> = targets
        .iter()
        .map(|t| {
            let mut entry = RegistryEntry::new(t.id.clone(), t.base_url.clone());
            entry.health_status = HealthStatus::Operational;
            entry.uptime = Some(99.0);
            entry
        })
        .collect();

    c.bench_function("apply_results_200_entries", |b| {
        b.iter(|| black_box(apply_results(entries.clone(), &results)))
    });
}

criterion_group!(benches, bench_classifier, bench_bulk_check, bench_apply_results);
criterion_main!(benches);
