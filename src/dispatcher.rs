// this_file: src/dispatcher.rs
//! Block resolution across worker contexts
//!
//! For every frame the dispatcher:
//! - Deduplicates blocks by content, keeping first-seen order
//! - Serves repeats of earlier frames from the [`DedupCache`]
//! - Splits the remaining unique blocks into one contiguous chunk per worker
//! - Runs the chunks on a dedicated rayon pool and merges the keyed results
//! - Records new matches in the cache and reassembles block order

use crate::bitmap::PixelBlock;
use crate::cache::DedupCache;
use crate::charset::CharacterSet;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::glyph::GlyphRenderer;
use crate::matcher::WorkerContext;
use crate::rasterize::GlyphSource;
use camino::Utf8PathBuf;
use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Counters for one resolved frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub blocks: usize,
    pub unique: usize,
    pub cache_hits: usize,
    pub computed: usize,
    pub parallel: bool,
}

/// Settings for building a [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    pub workers: usize,
    pub single_threaded: bool,
    pub chars_dir: Option<Utf8PathBuf>,
}

/// Resolves the characters of a frame's blocks, reusing worker state across frames.
pub struct Dispatcher {
    contexts: Vec<WorkerContext>,
    pool: Option<ThreadPool>,
    single_threaded: bool,
}

impl Dispatcher {
    /// Create one worker context per worker and, if parallel, a pool of that size.
    pub fn new(
        charset: Arc<CharacterSet>,
        engine: Engine,
        source: Arc<dyn GlyphSource>,
        options: DispatcherOptions,
    ) -> Result<Self> {
        let workers = if options.single_threaded {
            1
        } else {
            options.workers.max(1)
        };

        let contexts = (0..workers)
            .map(|_| {
                let renderer =
                    GlyphRenderer::new(Arc::clone(&source)).with_chars_dir(options.chars_dir.clone());
                WorkerContext::new(Arc::clone(&charset), engine, renderer)
            })
            .collect();

        let pool = if workers > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("glyphgrid-worker-{}", i))
                .build()
                .map_err(|e| Error::Internal(format!("Failed to build worker pool: {}", e)))?;
            Some(pool)
        } else {
            None
        };

        debug!(
            "Dispatcher ready: {} worker(s), engine {}, {} characters",
            workers,
            engine,
            charset.len()
        );

        Ok(Self {
            contexts,
            pool,
            single_threaded: options.single_threaded,
        })
    }

    pub fn workers(&self) -> usize {
        self.contexts.len()
    }

    /// Copy the glyphs of `warm` into every worker's renderer.
    pub fn seed_workers(&mut self, warm: &GlyphRenderer) {
        for ctx in &mut self.contexts {
            ctx.renderer_mut().seed_from(warm);
        }
    }

    /// Sized glyphs rendered by all workers so far.
    pub fn glyphs_rendered(&self) -> usize {
        self.contexts.iter().map(|c| c.renderer().rendered()).sum()
    }

    /// Resolve one character per block, in block order.
    pub fn resolve(
        &mut self,
        blocks: &[PixelBlock],
        cache: &mut DedupCache,
    ) -> Result<(Vec<char>, FrameStats)> {
        let start = Instant::now();

        // First-seen order over distinct block contents.
        let mut seen: HashSet<&PixelBlock> = HashSet::with_capacity(blocks.len());
        let unique: Vec<&PixelBlock> = blocks.iter().filter(|b| seen.insert(*b)).collect();

        let mut resolved: HashMap<&PixelBlock, char> = HashMap::with_capacity(unique.len());
        let mut to_compute: Vec<&PixelBlock> = Vec::new();
        for &block in &unique {
            match cache.get(block) {
                Some(ch) => {
                    resolved.insert(block, ch);
                }
                None => to_compute.push(block),
            }
        }
        let cache_hits = unique.len() - to_compute.len();

        let parallel = !self.single_threaded && self.contexts.len() > 1 && to_compute.len() > 1;
        let computed = if parallel {
            self.compute_parallel(&to_compute)?
        } else {
            self.compute_sequential(&to_compute)?
        };

        for (idx, ch) in computed {
            let block = to_compute[idx];
            cache.put(block.clone(), ch);
            resolved.insert(block, ch);
        }

        let chars = blocks
            .iter()
            .map(|block| {
                resolved.get(block).copied().ok_or_else(|| {
                    Error::Internal("block left unresolved after matching".to_string())
                })
            })
            .collect::<Result<Vec<char>>>()?;

        let stats = FrameStats {
            blocks: blocks.len(),
            unique: unique.len(),
            cache_hits,
            computed: to_compute.len(),
            parallel,
        };
        debug!(
            "Resolved {} blocks ({} unique, {} cached, {} computed, parallel: {}) in {:.2}ms",
            stats.blocks,
            stats.unique,
            stats.cache_hits,
            stats.computed,
            stats.parallel,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok((chars, stats))
    }

    fn compute_sequential(&mut self, blocks: &[&PixelBlock]) -> Result<Vec<(usize, char)>> {
        let ctx = &mut self.contexts[0];
        blocks
            .iter()
            .enumerate()
            .map(|(idx, block)| ctx.best_match(block).map(|ch| (idx, ch)))
            .collect()
    }

    fn compute_parallel(&mut self, blocks: &[&PixelBlock]) -> Result<Vec<(usize, char)>> {
        let chunks = chunk_ranges(blocks.len(), self.contexts.len());
        let cancel = AtomicBool::new(false);
        let contexts = &mut self.contexts;

        let results = match &self.pool {
            Some(pool) => pool.install(|| run_chunks(contexts, &chunks, blocks, &cancel)),
            None => run_chunks(contexts, &chunks, blocks, &cancel),
        };

        merge_chunk_results(results)
    }
}

/// Run chunk `i` on context `i`; a failing chunk raises `cancel` for the rest.
fn run_chunks(
    contexts: &mut [WorkerContext],
    chunks: &[Range<usize>],
    blocks: &[&PixelBlock],
    cancel: &AtomicBool,
) -> Vec<Result<Vec<(usize, char)>>> {
    contexts
        .par_iter_mut()
        .zip(chunks.par_iter())
        .map(|(ctx, range)| {
            let mut out = Vec::with_capacity(range.len());
            for idx in range.clone() {
                if cancel.load(Ordering::Relaxed) {
                    return Err(Error::Cancelled);
                }
                match ctx.best_match(blocks[idx]) {
                    Ok(ch) => out.push((idx, ch)),
                    Err(e) => {
                        cancel.store(true, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }
            Ok(out)
        })
        .collect()
}

/// Merge per-chunk results, reporting the first real failure over `Cancelled`.
fn merge_chunk_results(results: Vec<Result<Vec<(usize, char)>>>) -> Result<Vec<(usize, char)>> {
    let mut merged = Vec::new();
    let mut cancelled = false;
    for result in results {
        match result {
            Ok(chunk) => merged.extend(chunk),
            Err(Error::Cancelled) => cancelled = true,
            Err(e) => return Err(e),
        }
    }
    if cancelled {
        return Err(Error::Cancelled);
    }
    Ok(merged)
}

/// Split `len` items into `parts` contiguous ranges whose sizes differ by at most one.
pub fn chunk_ranges(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let base = len / parts;
    let extra = len % parts;
    let mut start = 0;
    (0..parts)
        .map(|i| {
            let size = base + usize::from(i < extra);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}
