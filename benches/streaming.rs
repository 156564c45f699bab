//! Streaming hot-path benchmarks: queue churn, mesh building, heightmap
//! assembly.

use std::collections::HashSet;

use criterion::{criterion_group, criterion_main, Criterion, black_box};

use terrastream::heightmap::{HeightField, HeightmapConfig, HeightmapProvider};
use terrastream::streaming::GenerationQueue;
use terrastream::terrain::{ChunkCoord, build_grid_mesh};

fn bench_queue_churn(c: &mut Criterion) {
    c.bench_function("queue_enqueue_drain_9x9", |b| {
        let loaded = HashSet::new();
        b.iter(|| {
            let mut queue = GenerationQueue::new();
            queue.enqueue_area(black_box(ChunkCoord::new(0, 0)), 4, &loaded);
            let mut total = 0;
            while !queue.is_empty() {
                total += queue.drain(8, &loaded).len();
            }
            black_box(total)
        });
    });
}

fn bench_mesh_build(c: &mut Criterion) {
    let size = 32u32;
    let res = size as usize + 1;
    let mut field = HeightField::flat(res);
    for z in 0..res {
        for x in 0..res {
            field.set(x, z, ((x * 7 + z * 13) % 11) as f32);
        }
    }

    c.bench_function("build_grid_mesh_33x33", |b| {
        b.iter(|| build_grid_mesh(black_box(&field), size));
    });
}

fn bench_heightmap_assemble(c: &mut Criterion) {
    let config = HeightmapConfig::default();
    let full = {
        let provider = HeightmapProvider::new(config.clone());
        provider.full_resolution()
    };
    let samples: Vec<f32> = (0..full * full).map(|i| 100.0 + (i % 23) as f32).collect();

    c.bench_function("heightmap_assemble_with_blend", |b| {
        b.iter(|| {
            let mut provider = HeightmapProvider::new(config.clone());
            // Second chunk blends against the first's cached edge
            provider.assemble(ChunkCoord::new(0, 0), black_box(&samples));
            provider.assemble(ChunkCoord::new(1, 0), black_box(&samples))
        });
    });
}

criterion_group!(benches, bench_queue_churn, bench_mesh_build, bench_heightmap_assemble);
criterion_main!(benches);
