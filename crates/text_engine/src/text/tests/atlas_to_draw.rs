//! Atlas construction feeding the draw engine

use approx::assert_relative_eq;

use super::support::{synthetic_atlas, FakeAtlas, RecordingBackend, SyntheticFont};
use crate::foundation::math::{glyph_transform, Vec3};
use crate::text::{AtlasConfig, GlyphAtlasBuilder, LayoutConfig, TextRenderer};

fn renderer() -> TextRenderer<FakeAtlas> {
    let (metrics, _image) = synthetic_atlas().into_parts();
    TextRenderer::new(FakeAtlas(7), metrics, LayoutConfig::default())
}

#[test]
fn test_atlas_has_one_record_per_ascii_code() {
    let atlas = synthetic_atlas();

    assert_eq!(atlas.metrics().len(), 128);
    let codes: Vec<u32> = atlas.metrics().iter().map(|(ch, _)| u32::from(ch)).collect();
    assert_eq!(codes, (0..128).collect::<Vec<_>>());
    for (ch, glyph) in atlas.metrics().iter() {
        assert_eq!(glyph.layer_id, u32::from(ch));
    }
    assert_eq!(atlas.image().layer_count(), 128);
    assert_eq!(atlas.image().pixels().len(), 128 * 256 * 256);
}

#[test]
fn test_failed_glyph_keeps_table_complete() {
    let mut font = SyntheticFont::new();
    font.failing = vec![b'x', b'y'];
    let (atlas, stats) = GlyphAtlasBuilder::new(AtlasConfig::default()).build(&mut font).unwrap();

    assert_eq!(font.pixel_size, 256);
    assert_eq!(stats.skipped, 2);
    assert_eq!(atlas.metrics().len(), 128);
    assert!(atlas.metrics().get('x').unwrap().is_blank());
    assert_eq!(atlas.metrics().get('y').unwrap().advance, 0);
}

#[test]
fn test_single_glyph_single_draw() {
    let mut text = renderer();
    let mut backend = RecordingBackend::default();

    text.render_text(&mut backend, "A", 0.0, 0.0, 1.0, Vec3::new(1.0, 0.0, 0.0)).unwrap();

    assert_eq!(backend.instance_counts(), vec![1]);
    assert_eq!(backend.bound_atlas, vec![7]);
    assert_eq!(backend.colors, vec![Vec3::new(1.0, 0.0, 0.0)]);

    let glyph = *text.metrics().get('A').unwrap();
    let es = 48.0 / 256.0;
    let expected = glyph_transform(
        glyph.bearing.x as f32 * es,
        -(256.0 - glyph.bearing.y as f32) * es,
        256.0 * es,
    );
    assert_relative_eq!(backend.draws[0].transforms[0], expected);
    assert_eq!(backend.draws[0].layers, vec![u32::from(b'A')]);
}

#[test]
fn test_newline_returns_to_line_start() {
    let (metrics, _) = synthetic_atlas().into_parts();
    let config = LayoutConfig::default();
    let placements: Vec<_> =
        crate::text::layout_text(&metrics, &config, "AB\nCD", crate::foundation::math::Vec2::new(0.0, 100.0), 1.0)
            .collect();

    assert_eq!(placements.len(), 4);
    let (a, c) = (&placements[0], &placements[2]);
    assert_eq!(a.ch, 'A');
    assert_eq!(c.ch, 'C');
    assert_relative_eq!(c.pen.x, a.pen.x);
    assert_relative_eq!(a.pen.y, 100.0);
    assert_relative_eq!(c.pen.y, 100.0 - 1.3 * (256.0 * (48.0 / 256.0)));
}

#[test]
fn test_whitespace_only_text_draws_nothing() {
    let mut text = renderer();
    let mut backend = RecordingBackend::default();

    let stats = text.render_text(&mut backend, "  \n \n\n   ", 0.0, 0.0, 1.0, Vec3::zeros()).unwrap();

    assert_eq!(stats.glyphs, 0);
    assert_eq!(stats.draw_calls, 0);
    assert!(backend.draws.is_empty());
}

#[test]
fn test_identical_calls_produce_identical_batches() {
    let mut text = renderer();
    let mut first = RecordingBackend::default();
    let mut second = RecordingBackend::default();
    let sample = "The quick brown fox\njumps over the lazy dog.";

    text.render_text(&mut first, sample, 12.5, 900.0, 1.5, Vec3::new(0.5, 0.8, 0.2)).unwrap();
    text.render_text(&mut second, sample, 12.5, 900.0, 1.5, Vec3::new(0.5, 0.8, 0.2)).unwrap();

    assert_eq!(first.draws, second.draws);
}

#[test]
fn test_space_advances_by_space_glyph() {
    let mut text = renderer();
    let mut backend = RecordingBackend::default();

    text.render_text(&mut backend, "A A", 0.0, 0.0, 1.0, Vec3::zeros()).unwrap();

    let a = *text.metrics().get('A').unwrap();
    let space = *text.metrics().get(' ').unwrap();
    let es = 48.0 / 256.0;
    let shift = (a.advance_pixels() + space.advance_pixels()) as f32 * es;

    let first = backend.draws[0].transforms[0];
    let second = backend.draws[0].transforms[1];
    assert_relative_eq!(second[(0, 3)] - first[(0, 3)], shift, epsilon = 1e-4);
    assert_relative_eq!(second[(1, 3)], first[(1, 3)]);
}
