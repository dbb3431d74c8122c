// this_file: src/main.rs
//! glyphgrid CLI - render an image or animated GIF as text

use anyhow::{bail, Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use glyphgrid::config::{DEFAULT_CACHE_CAPACITY, DEFAULT_CHAR_ASPECT, DEFAULT_GLYPH_PX};
use glyphgrid::{fonts, logging, output};
use glyphgrid::{CharRange, CharacterSet, Engine, FontGlyphSource, RunConfig, Unifier};
use log::info;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// glyphgrid - approximate images with the characters of a font
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Image or animated GIF to convert
    file: PathBuf,

    /// Character height-to-width ratio (for aspect-correct output)
    #[arg(long, default_value_t = DEFAULT_CHAR_ASPECT)]
    char_aspect: f64,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,

    /// Enable quiet mode (only errors)
    #[arg(short = 'q', long, conflicts_with = "log_level")]
    quiet: bool,

    /// Save each image block as a PNG under <artifacts-dir>/blocks
    #[arg(long)]
    save_blocks: bool,

    /// Save rendered characters as PNGs under <artifacts-dir>/chars
    #[arg(long)]
    save_chars: bool,

    /// Directory for --save-blocks and --save-chars output
    #[arg(long, default_value = ".")]
    artifacts_dir: Utf8PathBuf,

    /// Similarity metric: brightness, ssim, diff, mse, ncc, hist or cosine
    #[arg(short = 'e', long, default_value = "diff")]
    engine: Engine,

    /// Font file to render characters with; repeat to add fallbacks
    #[arg(long = "font", value_name = "PATH")]
    fonts: Vec<Utf8PathBuf>,

    /// Unicode range of candidate characters, as start-end
    #[arg(long, default_value = "32-126")]
    char_range: CharRange,

    /// Stretch image contrast to use the full brightness range
    #[arg(long)]
    stretch_contrast: bool,

    /// Fraction of the terminal width to use (capped at 1)
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Invert the image before processing
    #[arg(long)]
    invert: bool,

    /// Match every block on the main thread
    #[arg(long)]
    single_threaded: bool,

    /// Number of matching workers (defaults to available parallelism)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Colour each character with its block's mean colour
    #[arg(long)]
    color: bool,

    /// Colour mode using only U+2588 FULL BLOCK; fastest, best for animations
    #[arg(long)]
    fast_color: bool,

    /// Output width in columns (defaults to the terminal width)
    #[arg(long)]
    columns: Option<u32>,

    /// Pixel size used to rasterize characters
    #[arg(long, default_value_t = DEFAULT_GLYPH_PX)]
    glyph_size: f32,

    /// Maximum number of matched blocks kept between frames
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    /// Loop animations until interrupted
    #[arg(long)]
    repeat: bool,

    /// Print run statistics as JSON to stderr
    #[arg(long)]
    stats: bool,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        let (color, char_range) = if self.fast_color {
            (true, CharRange::FULL_BLOCK)
        } else {
            (self.color, self.char_range)
        };
        RunConfig {
            char_aspect: self.char_aspect,
            scale: self.scale,
            engine: self.engine,
            char_range,
            single_threaded: self.single_threaded,
            workers: self.jobs,
            save_chars: self.save_chars,
            save_blocks: self.save_blocks,
            artifacts_dir: self.artifacts_dir.clone(),
            color,
            invert: self.invert,
            stretch_contrast: self.stretch_contrast,
            glyph_px: self.glyph_size,
            cache_capacity: self.cache_capacity,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.quiet, false);

    // Configuration problems surface before any decoding or font work.
    let config = cli.run_config();
    config.validate()?;
    let charset = CharacterSet::from_range(config.char_range)?;
    if config.scale > 1.0 {
        log::warn!("Scale {} is larger than 1, using 1", config.scale);
    }

    let frames = glyphgrid::load_frames(&cli.file, config.color)
        .with_context(|| format!("Failed to read image {}", cli.file.display()))?;
    info!("{} has {} frame(s)", cli.file.display(), frames.len());

    let font_paths = if cli.fonts.is_empty() {
        fonts::default_font_paths()
    } else {
        cli.fonts.clone()
    };
    if font_paths.is_empty() {
        bail!("No usable font found; pass one with --font <PATH>");
    }
    let source = FontGlyphSource::open(&font_paths, config.glyph_px)
        .with_context(|| format!("Failed to load font {}", font_paths[0]))?;
    info!("Using font {}", font_paths[0]);

    let columns = cli.columns.unwrap_or_else(output::terminal_columns);
    let color = config.color;
    let mut unifier = Unifier::with_charset(config, charset, Arc::new(source))?;
    let grids = unifier.convert_sequence(&frames, columns)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if grids.len() == 1 {
        output::write_grid(&mut out, &grids[0], color)?;
    } else {
        let loops = if cli.repeat { None } else { Some(1) };
        output::play(&mut out, &grids, color, loops)?;
    }
    out.flush()?;

    if cli.stats {
        let report = serde_json::json!({
            "config": unifier.config(),
            "stats": unifier.stats(),
            "cache": unifier.cache().stats(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
