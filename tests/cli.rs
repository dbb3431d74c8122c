// this_file: tests/cli.rs
//! CLI integration tests for the glyphgrid binary

use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to run the `glyphgrid` binary
fn bin() -> Command {
    let mut cmd = Command::cargo_bin("glyphgrid").expect("binary exists");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_gradient(dir: &Path) -> PathBuf {
    let path = dir.join("gradient.png");
    GrayImage::from_fn(120, 80, |x, _| Luma([(x * 2) as u8]))
        .save(&path)
        .unwrap();
    path
}

fn system_font() -> Option<String> {
    let font = glyphgrid::fonts::default_font_paths().into_iter().next();
    if font.is_none() {
        eprintln!("Skipping: no system monospace font found");
    }
    font.map(|p| p.to_string())
}

#[test]
fn version_prints() {
    bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("glyphgrid"));
}

#[test]
fn unknown_engine_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let image = write_gradient(tmp.path());
    bin()
        .arg(&image)
        .args(["--engine", "psnr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown similarity engine"));
}

#[test]
fn malformed_char_range_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let image = write_gradient(tmp.path());
    bin()
        .arg(&image)
        .args(["--char-range", "a-z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid character range"));
}

#[test]
fn reversed_char_range_is_a_configuration_error() {
    // Reported before the (missing) image is even opened.
    bin()
        .arg("does-not-exist.png")
        .args(["--char-range", "100-90"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn missing_image_fails_with_context() {
    bin()
        .arg("does-not-exist.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read image"));
}

#[test]
fn missing_font_fails() {
    let tmp = TempDir::new().unwrap();
    let image = write_gradient(tmp.path());
    bin()
        .arg(&image)
        .args(["--font", "/nonexistent/font.ttf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Font not found"));
}

#[test]
fn converts_image_to_text() {
    let Some(font) = system_font() else {
        return;
    };
    let tmp = TempDir::new().unwrap();
    let image = write_gradient(tmp.path());

    let assert = bin()
        .arg(&image)
        .args(["--font", &font, "--columns", "12", "--single-threaded"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    // 120x80 at 12 columns: 12 cells of 10px, 80 * 12 / 120 / 2 = 4 rows.
    assert_eq!(lines.len(), 4, "{stdout}");
    assert!(lines.iter().all(|l| l.chars().count() == 12));
}

#[test]
fn fast_color_emits_full_blocks_with_stats() {
    let Some(font) = system_font() else {
        return;
    };
    let tmp = TempDir::new().unwrap();
    let image = write_gradient(tmp.path());

    bin()
        .arg(&image)
        .args(["--font", &font, "--columns", "6", "--fast-color", "--stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\u{1b}[38;2;"))
        .stdout(predicate::str::contains("\u{2588}"))
        .stderr(predicate::str::contains("\"frames\": 1"));
}

#[test]
fn save_blocks_writes_pngs() {
    let Some(font) = system_font() else {
        return;
    };
    let tmp = TempDir::new().unwrap();
    let image = write_gradient(tmp.path());
    let artifacts = tmp.path().join("out");

    bin()
        .arg(&image)
        .args(["--font", &font, "--columns", "6", "--save-blocks"])
        .arg("--artifacts-dir")
        .arg(&artifacts)
        .assert()
        .success();

    let saved = std::fs::read_dir(artifacts.join("blocks")).unwrap().count();
    // 6 columns x 2 rows
    assert_eq!(saved, 12);
    assert!(artifacts.join("blocks/f0000_b00000.png").is_file());
}
