//! Flush behaviour of the draw engine at the default batch capacity

use super::support::{synthetic_atlas, FakeAtlas, RecordingBackend};
use crate::foundation::math::Vec3;
use crate::text::{LayoutConfig, TextRenderer, DEFAULT_BATCH_CAPACITY};

fn renderer() -> TextRenderer<FakeAtlas> {
    let (metrics, _) = synthetic_atlas().into_parts();
    TextRenderer::new(FakeAtlas(0), metrics, LayoutConfig::default())
}

fn render(count: usize) -> RecordingBackend {
    let text: String = "abcdefghij".chars().cycle().take(count).collect();
    let mut renderer = renderer();
    let mut backend = RecordingBackend::default();
    let stats = renderer.render_text(&mut backend, &text, 0.0, 1040.0, 1.0, Vec3::zeros()).unwrap();
    assert_eq!(stats.glyphs, count);
    assert_eq!(stats.draw_calls, backend.draws.len());
    backend
}

#[test]
fn test_default_capacity() {
    assert_eq!(DEFAULT_BATCH_CAPACITY, 400);
    assert_eq!(LayoutConfig::default().batch_capacity, 400);
}

#[test]
fn test_exact_multiple_has_no_trailing_draw() {
    let backend = render(800);
    assert_eq!(backend.instance_counts(), vec![400, 400]);
}

#[test]
fn test_partial_final_batch() {
    let backend = render(1001);
    assert_eq!(backend.instance_counts(), vec![400, 400, 201]);
}

#[test]
fn test_under_capacity_is_one_draw() {
    let backend = render(399);
    assert_eq!(backend.instance_counts(), vec![399]);
}

#[test]
fn test_layers_follow_text_across_flushes() {
    let backend = render(405);
    let layers = backend.all_layers();
    assert_eq!(layers.len(), 405);
    let expected: Vec<u32> = "abcdefghij".bytes().cycle().take(405).map(u32::from).collect();
    assert_eq!(layers, expected);
}

#[test]
fn test_spaces_do_not_count_toward_capacity() {
    let text: String = std::iter::repeat("ab ").take(250).collect();
    let mut renderer = renderer();
    let mut backend = RecordingBackend::default();
    renderer.render_text(&mut backend, &text, 0.0, 0.0, 1.0, Vec3::zeros()).unwrap();

    assert_eq!(backend.instance_counts(), vec![400, 100]);
}
