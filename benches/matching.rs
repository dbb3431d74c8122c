// this_file: benches/matching.rs
//! Benchmarks for block scoring and per-frame matching

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glyphgrid::dispatcher::DispatcherOptions;
use glyphgrid::pipeline::slice_blocks;
use glyphgrid::{
    Bitmap, CharRange, CharacterSet, DedupCache, Dispatcher, Engine, Error, GlyphSource, Grid,
    Result,
};
use std::sync::Arc;

/// Synthetic glyphs so benchmarks do not depend on installed fonts.
struct StripeSource;

impl GlyphSource for StripeSource {
    fn rasterize(&self, ch: char) -> Result<Option<Bitmap>> {
        let code = ch as u32;
        if !(33..=126).contains(&code) {
            return Err(Error::UnsupportedCharacter { ch });
        }
        let pixels = (0..10 * 20)
            .map(|i| if (code >> (i % 7)) & 1 == 1 { 255 } else { 0 })
            .collect();
        Bitmap::new(10, 20, pixels).map(Some)
    }
}

fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_add(1);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

fn bench_engines(c: &mut Criterion) {
    let a = Bitmap::new(12, 24, noise(12 * 24, 1)).unwrap();
    let b = Bitmap::new(12, 24, noise(12 * 24, 2)).unwrap();

    let mut group = c.benchmark_group("similarity");
    for engine in Engine::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(engine), &engine, |bench, &e| {
            bench.iter(|| black_box(e.similarity(black_box(&a), black_box(&b))));
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let (width, height) = (320u32, 240u32);
    let plane = noise((width * height) as usize, 7);
    let grid = Grid::compute(width, height, 2.0, 1.0, 64).unwrap();
    let blocks = slice_blocks(&plane, &grid).unwrap();
    let charset = Arc::new(CharacterSet::from_range(CharRange::ASCII).unwrap());

    let mut group = c.benchmark_group("resolve_frame");
    group.sample_size(10);
    for (name, single_threaded) in [("sequential", true), ("parallel", false)] {
        group.bench_function(name, |bench| {
            let mut dispatcher = Dispatcher::new(
                Arc::clone(&charset),
                Engine::Diff,
                Arc::new(StripeSource),
                DispatcherOptions {
                    workers: 4,
                    single_threaded,
                    chars_dir: None,
                },
            )
            .unwrap();
            bench.iter(|| {
                // Fresh cache each pass so every block is scored.
                let mut cache = DedupCache::new(blocks.len());
                black_box(dispatcher.resolve(&blocks, &mut cache).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let blocks: Vec<Bitmap> = (0..1024)
        .map(|i| Bitmap::new(8, 16, noise(128, i)).unwrap())
        .collect();

    c.bench_function("cache_put_get", |bench| {
        bench.iter(|| {
            let mut cache = DedupCache::new(512);
            for block in &blocks {
                cache.put(block.clone(), 'x');
            }
            for block in &blocks {
                black_box(cache.get(block));
            }
        });
    });
}

criterion_group!(benches, bench_engines, bench_resolve, bench_cache);
criterion_main!(benches);
