// this_file: src/charset.rs

//! Candidate character sets.
//!
//! A character set is an ordered, duplicate-free list of printable,
//! non-whitespace characters. Order only matters for tie-breaking during
//! matching: the earliest character with the strictly highest score wins.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_general_category::{get_general_category, GeneralCategory};

/// First code point considered by [`CharacterSet::first_printable`].
pub const FIRST_PRINTABLE: u32 = 32;

/// Highest valid Unicode scalar value.
pub const MAX_CODE_POINT: u32 = 0x10FFFF;

/// Inclusive code-point range, written `start-end` (e.g. `32-126`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharRange {
    pub start: u32,
    pub end: u32,
}

impl CharRange {
    /// Printable ASCII.
    pub const ASCII: CharRange = CharRange { start: 32, end: 126 };

    /// U+2588 FULL BLOCK only, used for fast colour output.
    pub const FULL_BLOCK: CharRange = CharRange {
        start: 0x2588,
        end: 0x2588,
    };

    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of code points spanned (0 when `start > end`).
    pub fn span(&self) -> u32 {
        if self.start > self.end {
            0
        } else {
            self.end - self.start + 1
        }
    }
}

impl Default for CharRange {
    fn default() -> Self {
        Self::ASCII
    }
}

impl fmt::Display for CharRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for CharRange {
    type Err = Error;

    fn from_str(spec: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidCharRange {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let (start, end) = spec
            .trim()
            .split_once('-')
            .ok_or_else(|| invalid("expected the form start-end, e.g. 32-126"))?;

        let parse = |part: &str| -> Result<u32> {
            let part = part.trim();
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid("bounds must be decimal code points"));
            }
            part.parse::<u32>()
                .map_err(|_| invalid("code point does not fit in 32 bits"))
        };

        let range = CharRange::new(parse(start)?, parse(end)?);
        if range.start > MAX_CODE_POINT || range.end > MAX_CODE_POINT {
            return Err(invalid("code points must not exceed 1114111 (U+10FFFF)"));
        }
        Ok(range)
    }
}

/// Ordered candidate characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSet {
    chars: Vec<char>,
}

impl CharacterSet {
    /// Printable characters of `range`, in code-point order.
    ///
    /// Fails with [`Error::EmptyCharacterSet`] when nothing printable remains
    /// (including the `start > end` case).
    pub fn from_range(range: CharRange) -> Result<Self> {
        let chars: Vec<char> = if range.start > range.end {
            Vec::new()
        } else {
            (range.start..=range.end)
                .filter_map(char::from_u32)
                .filter(|&c| is_printable(c))
                .collect()
        };

        if chars.is_empty() {
            return Err(Error::EmptyCharacterSet {
                start: range.start,
                end: range.end,
            });
        }
        Ok(Self { chars })
    }

    /// The first `amount` printable characters starting at U+0020.
    pub fn first_printable(amount: usize) -> Result<Self> {
        let chars: Vec<char> = (FIRST_PRINTABLE..=MAX_CODE_POINT)
            .filter_map(char::from_u32)
            .filter(|&c| is_printable(c))
            .take(amount)
            .collect();
        if chars.is_empty() {
            return Err(Error::InvalidConfig {
                reason: "character amount must be at least 1".to_string(),
            });
        }
        Ok(Self { chars })
    }

    /// Explicit list; order is kept, later duplicates and non-printables dropped.
    pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        let chars: Vec<char> = chars
            .into_iter()
            .filter(|&c| is_printable(c) && seen.insert(c))
            .collect();
        if chars.is_empty() {
            return Err(Error::InvalidConfig {
                reason: "character set contains no printable characters".to_string(),
            });
        }
        Ok(Self { chars })
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The only character when the set has exactly one entry.
    pub fn single(&self) -> Option<char> {
        match self.chars.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }
}

/// Printable and visible: anything outside the control, format, surrogate,
/// private-use, unassigned and separator categories.
pub fn is_printable(c: char) -> bool {
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
            | GeneralCategory::SpaceSeparator
    )
}
