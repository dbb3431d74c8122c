// this_file: tests/font_rendering.rs
//! Glyph rendering against a real system font (skipped when none is installed)

use glyphgrid::fonts::default_font_paths;
use glyphgrid::{Engine, Error, FontGlyphSource, Frame, GlyphRenderer, GlyphSource, RunConfig, Unifier};
use std::sync::Arc;

fn system_source() -> Option<FontGlyphSource> {
    let paths = default_font_paths();
    if paths.is_empty() {
        eprintln!("Skipping: no system monospace font found");
        return None;
    }
    Some(FontGlyphSource::open(&paths[..1], 20.0).expect("system font should load"))
}

#[test]
fn letters_have_ink_and_space_does_not() {
    let Some(source) = system_source() else {
        return;
    };
    let a = source.rasterize('A').unwrap().expect("'A' has an outline");
    assert!(a.width() > 0 && a.height() > 0);
    assert!(!a.is_blank());

    assert!(source.rasterize(' ').unwrap().is_none());
}

#[test]
fn rendering_is_deterministic() {
    let Some(source) = system_source() else {
        return;
    };
    let source: Arc<dyn GlyphSource> = Arc::new(source);
    let mut first = GlyphRenderer::new(Arc::clone(&source));
    let mut second = GlyphRenderer::new(source);
    for ch in ['#', 'g', 'W', '.'] {
        let a = first.glyph(ch, 7, 13).unwrap().unwrap();
        let b = second.glyph(ch, 7, 13).unwrap().unwrap();
        assert_eq!(a.shape(), (7, 13));
        assert_eq!(a, b, "{ch:?}");
    }
}

#[test]
fn unmapped_character_is_unsupported() {
    let Some(source) = system_source() else {
        return;
    };
    let err = source.rasterize('\u{10FFFD}').unwrap_err();
    assert!(matches!(err, Error::UnsupportedCharacter { ch: '\u{10FFFD}' }));
    assert!(err.to_string().contains("U+10FFFD"));
}

#[test]
fn dark_image_maps_to_sparse_glyph() {
    let Some(source) = system_source() else {
        return;
    };
    let config = RunConfig {
        engine: Engine::Brightness,
        single_threaded: true,
        ..RunConfig::default()
    };
    let mut unifier = Unifier::new(config, Arc::new(source)).unwrap();
    let black = Frame::from_luma(40, 40, vec![0; 1600]).unwrap();
    let white = Frame::from_luma(40, 40, vec![255; 1600]).unwrap();

    let dark = unifier.convert_frame(&black, 80).unwrap();
    let light = unifier.convert_frame(&white, 80).unwrap();
    assert_ne!(dark.chars[0], light.chars[0]);
}
