// this_file: src/lib.rs
//! glyphgrid - turn images into grids of best-matching characters
//!
//! This library provides:
//! - Partitioning of an image into variable-size character cells
//! - Glyph rasterization from memory-mapped fonts (skrifa + zeno)
//! - Seven similarity engines scoring a glyph against an image block
//! - Content-addressed deduplication with a bounded LRU cache
//! - Parallel block matching on per-worker contexts
//! - Sequence conversion for animated images with cross-frame reuse

pub mod artifacts;
pub mod bitmap;
pub mod cache;
pub mod charset;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod fonts;
pub mod glyph;
pub mod grid;
pub mod image_ops;
pub mod logging;
pub mod matcher;
pub mod output;
pub mod pipeline;
pub mod rasterize;
pub mod source;

// Re-export commonly used types
pub use bitmap::{Bitmap, PixelBlock};
pub use cache::DedupCache;
pub use charset::{CharRange, CharacterSet};
pub use config::RunConfig;
pub use dispatcher::{Dispatcher, FrameStats};
pub use engine::Engine;
pub use error::{Error, Result};
pub use glyph::{Glyph, GlyphRenderer};
pub use grid::Grid;
pub use matcher::WorkerContext;
pub use pipeline::{CharGrid, RunStats, Unifier};
pub use rasterize::{FontGlyphSource, GlyphSource};
pub use source::{load_frames, Frame};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
