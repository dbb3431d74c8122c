// this_file: src/output.rs

//! Text rendering of character grids and in-place animation playback.

use crate::pipeline::CharGrid;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::thread;

/// Column count used when no terminal is attached.
pub const FALLBACK_COLUMNS: u32 = 80;

/// Width of the attached terminal, or [`FALLBACK_COLUMNS`].
pub fn terminal_columns() -> u32 {
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => cols as u32,
        _ => FALLBACK_COLUMNS,
    }
}

/// Rows joined by `\n`, without a trailing newline.
pub fn render_plain(grid: &CharGrid) -> String {
    grid.to_string()
}

/// Each cell wrapped in a 24-bit foreground colour escape.
///
/// Falls back to plain text when the grid carries no colours.
pub fn render_ansi(grid: &CharGrid) -> String {
    let Some(colors) = &grid.colors else {
        return render_plain(grid);
    };
    let mut out = String::with_capacity(grid.chars.len() * 20);
    for (row, (chars, colors)) in grid
        .chars
        .chunks(grid.columns.max(1))
        .zip(colors.chunks(grid.columns.max(1)))
        .enumerate()
    {
        if row > 0 {
            out.push('\n');
        }
        for (ch, [r, g, b]) in chars.iter().zip(colors) {
            let _ = write!(out, "\x1b[38;2;{};{};{}m{}\x1b[0m", r, g, b, ch);
        }
    }
    out
}

pub fn render(grid: &CharGrid, color: bool) -> String {
    if color {
        render_ansi(grid)
    } else {
        render_plain(grid)
    }
}

/// Write one grid followed by a newline.
pub fn write_grid<W: Write>(out: &mut W, grid: &CharGrid, color: bool) -> io::Result<()> {
    writeln!(out, "{}", render(grid, color))
}

/// Show `grids` in sequence, redrawing in place and waiting each frame's delay.
///
/// `loops` limits the number of passes; `None` repeats until interrupted.
pub fn play<W: Write>(
    out: &mut W,
    grids: &[CharGrid],
    color: bool,
    loops: Option<usize>,
) -> io::Result<()> {
    if grids.is_empty() {
        return Ok(());
    }
    let mut pass = 0usize;
    let mut drawn_rows: Option<usize> = None;
    loop {
        for grid in grids {
            if let Some(rows) = drawn_rows {
                if rows > 0 {
                    queue!(
                        out,
                        MoveUp(rows.min(u16::MAX as usize) as u16),
                        MoveToColumn(0),
                        Clear(ClearType::FromCursorDown)
                    )?;
                }
            }
            write_grid(out, grid, color)?;
            out.flush()?;
            drawn_rows = Some(grid.rows);
            if grids.len() > 1 && !grid.delay.is_zero() {
                thread::sleep(grid.delay);
            }
        }
        pass += 1;
        if loops.is_some_and(|limit| pass >= limit) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn grid(text: &str, columns: usize, colors: Option<Vec<[u8; 3]>>) -> CharGrid {
        let chars: Vec<char> = text.chars().collect();
        CharGrid {
            columns,
            rows: chars.len() / columns,
            chars,
            colors,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn plain_rows_are_newline_separated() {
        assert_eq!(render_plain(&grid("abcd", 2, None)), "ab\ncd");
    }

    #[test]
    fn ansi_wraps_each_cell() {
        let g = grid("xy", 2, Some(vec![[1, 2, 3], [255, 0, 10]]));
        assert_eq!(
            render_ansi(&g),
            "\x1b[38;2;1;2;3mx\x1b[0m\x1b[38;2;255;0;10my\x1b[0m"
        );
        assert_eq!(render(&grid("xy", 2, None), true), "xy");
    }

    #[test]
    fn playback_redraws_in_place() {
        let frames = vec![grid("ab", 1, None), grid("cd", 1, None)];
        let mut out = Vec::new();
        play(&mut out, &frames, false, Some(1)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("a\nb\n"));
        // Cursor up two rows before the second frame.
        assert!(text.contains("\x1b[2A"), "{text:?}");
        assert!(text.ends_with("c\nd\n"));
    }

    #[test]
    fn playback_clears_the_previous_frame() {
        // A shorter second frame must not leave rows of the first behind.
        let frames = vec![grid("abc", 1, None), grid("d", 1, None)];
        let mut out = Vec::new();
        play(&mut out, &frames, false, Some(1)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let up = text.find("\x1b[3A").unwrap();
        let clear = text.find("\x1b[J").unwrap();
        let second = text.rfind("d\n").unwrap();
        assert!(up < clear && clear < second, "{text:?}");
    }

    #[test]
    fn single_frame_is_written_once() {
        let mut out = Vec::new();
        play(&mut out, &[grid("ab", 2, None)], false, Some(1)).unwrap();
        assert_eq!(out, b"ab\n");
    }
}
