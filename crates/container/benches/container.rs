use cachet_container::prelude::*;
use chrono::Utc;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::time::Duration;

fn bench_save_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("secretbox_save_load");

    let factory = ContainerFactory::new(
        ContainerSettings::secret_box(b"bench-key-bench-key-bench-key-32".as_slice()),
        OsRandom::shared(),
    )
    .unwrap();

    let sizes = [("64B", 64usize), ("1KB", 1024), ("16KB", 16 * 1024)];

    for (label, size) in sizes {
        let mut value = vec![0u8; size];
        OsRandom.fill(&mut value).expect("System RNG unavailable for benchmark data");

        let container =
            factory.create(Utc::now(), Duration::from_secs(3_600), Payload::new()).unwrap();
        container.set(1, value);

        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("save", label), &container, |b, c| {
            b.iter(|| c.save().unwrap());
        });

        let token = container.save().expect("save failed");
        let target =
            factory.create(Utc::now(), Duration::from_secs(3_600), Payload::new()).unwrap();

        group.bench_with_input(BenchmarkId::new("load", label), &token, |b, t| {
            b.iter(|| target.load(t).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_save_load);
criterion_main!(benches);
