//! Benchmarks for the CPU tick and shader generation.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use myxo::{shaders, CpuPipeline, SimConfig};

fn bench_cpu_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_tick");
    group.sample_size(20);

    for agent_count in [1024u32, 4096] {
        group.bench_with_input(
            BenchmarkId::from_parameter(agent_count),
            &agent_count,
            |b, &count| {
                let config = SimConfig::new().with_agent_count(count);
                let mut sim = CpuPipeline::new(config, 256, 256, 7);
                b.iter(|| {
                    sim.tick();
                    black_box(sim.generation());
                });
            },
        );
    }

    group.finish();
}

fn bench_shader_gen(c: &mut Criterion) {
    let mut group = c.benchmark_group("shader_gen");
    let config = SimConfig::new();

    group.bench_function("motion", |b| {
        b.iter(|| black_box(shaders::motion(&config, 1280, 720)))
    });
    group.bench_function("deposit", |b| {
        b.iter(|| black_box(shaders::deposit(&config, 1280, 720)))
    });
    group.bench_function("decay", |b| {
        b.iter(|| black_box(shaders::decay(&config, 1280, 720)))
    });

    group.finish();
}

criterion_group!(benches, bench_cpu_tick, bench_shader_gen);
criterion_main!(benches);
