// this_file: src/error.rs
//! Error types for the glyphgrid library

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for glyphgrid operations
#[derive(Debug, Error)]
pub enum Error {
    /// Similarity engine name not recognized
    #[error("Unknown similarity engine '{name}', expected one of: {expected}")]
    UnknownEngine { name: String, expected: String },

    /// Character range could not be parsed or is out of bounds
    #[error("Invalid character range '{spec}': {reason}")]
    InvalidCharRange { spec: String, reason: String },

    /// Character range produced no usable characters
    #[error("Character set is empty for range {start}-{end}")]
    EmptyCharacterSet { start: u32, end: u32 },

    /// Blocks cannot hold the structural-similarity window
    #[error(
        "Image blocks are too small for SSIM: smallest block is {min_dim}px (need more than 7px); use another engine"
    )]
    BlockTooSmall { min_dim: u32 },

    /// Configuration value outside its allowed range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Image or bitmap with unusable dimensions
    #[error("Invalid dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        reason: String,
    },

    /// No font in the chain covers the character
    #[error(
        "No available font can render {ch:?} ({}); supply a different font or character range",
        codepoint(.ch)
    )]
    UnsupportedCharacter { ch: char },

    /// Font file does not exist
    #[error("Font not found: {path}")]
    FontNotFound { path: PathBuf },

    /// Font file exists but cannot be used
    #[error("Invalid font {path}: {reason}")]
    InvalidFont { path: PathBuf, reason: String },

    /// Memory-mapping a font file failed
    #[error("Failed to map font {path}: {source}")]
    Mmap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Outline extraction failed for a covered character
    #[error("Failed to rasterize {ch:?}: {reason}")]
    RasterizationFailed { ch: char, reason: String },

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Work stopped because another worker failed
    #[error("Matching cancelled after a worker failure")]
    Cancelled,

    /// Broken internal invariant
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors caused by user configuration rather than input data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownEngine { .. }
                | Error::InvalidCharRange { .. }
                | Error::EmptyCharacterSet { .. }
                | Error::BlockTooSmall { .. }
                | Error::InvalidConfig { .. }
        )
    }
}

fn codepoint(ch: &char) -> String {
    format!("U+{:04X}", *ch as u32)
}

/// Result type alias for glyphgrid operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_character_message_names_code_point() {
        let err = Error::UnsupportedCharacter { ch: 'Ж' };
        let msg = err.to_string();
        assert!(msg.contains("U+0416"), "{msg}");
        assert!(msg.contains("different font"), "{msg}");
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(Error::BlockTooSmall { min_dim: 5 }.is_configuration());
        assert!(Error::EmptyCharacterSet { start: 100, end: 90 }.is_configuration());
        assert!(!Error::Cancelled.is_configuration());
        assert!(!Error::UnsupportedCharacter { ch: 'a' }.is_configuration());
    }
}
