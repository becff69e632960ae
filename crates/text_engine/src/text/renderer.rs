//! Batched text draw engine
//!
//! [`TextRenderer`] owns the metrics table, the uploaded atlas handle and the
//! instance batch. It lays text out and hands full batches to a
//! [`GlyphDrawBackend`], which records the actual instanced draws.

use serde::{Deserialize, Serialize};

use super::batch::InstanceBatch;
use super::glyph::GlyphMetricsTable;
use super::layout::{layout_text, LayoutConfig};
use crate::foundation::math::{Mat4, Vec2, Vec3};

/// Receiver of instanced glyph draws
///
/// Implemented by the GPU backend and by test doubles.
pub trait GlyphDrawBackend {
    /// Backend handle of an uploaded atlas
    type Atlas;

    /// Error raised by draw calls
    type Error;

    /// Bind `atlas` and set the text color; called once per text run
    fn begin_text(&mut self, atlas: &Self::Atlas, color: Vec3) -> Result<(), Self::Error>;

    /// Draw one unit quad per entry, `transforms[i]` sampling layer `layers[i]`
    ///
    /// Both slices have the same, non-zero length.
    fn draw_glyph_instances(&mut self, transforms: &[Mat4], layers: &[u32]) -> Result<(), Self::Error>;

    /// Called after the last draw of a text run
    fn end_text(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Per-call counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Glyph instances drawn
    pub glyphs: usize,
    /// Instanced draw calls issued
    pub draw_calls: usize,
}

/// Placement, scale and color of a text run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Pen origin in screen pixels, +Y up
    pub origin: [f32; 2],
    /// Requested scale (1.0 = reference pixel height)
    pub scale: f32,
    /// Linear RGB color
    pub color: [f32; 3],
}

impl TextStyle {
    /// Pen origin as a vector
    pub fn origin(&self) -> Vec2 {
        Vec2::from(self.origin)
    }

    /// Color as a vector
    pub fn color(&self) -> Vec3 {
        Vec3::from(self.color)
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            origin: [0.0, 1040.0],
            scale: 1.0,
            color: [0.5, 0.8, 0.2],
        }
    }
}

/// Lays out text and draws it in fixed-size instanced batches
pub struct TextRenderer<A> {
    atlas: A,
    metrics: GlyphMetricsTable,
    config: LayoutConfig,
    batch: InstanceBatch,
}

impl<A> TextRenderer<A> {
    /// Create a renderer over an uploaded atlas and its metrics
    pub fn new(atlas: A, metrics: GlyphMetricsTable, config: LayoutConfig) -> Self {
        let batch = InstanceBatch::with_capacity(config.batch_capacity);
        log::debug!(
            "Text renderer ready: {} glyphs, batch capacity {}",
            metrics.len(),
            batch.capacity()
        );
        Self {
            atlas,
            metrics,
            config,
            batch,
        }
    }

    /// Metrics table in use
    pub fn metrics(&self) -> &GlyphMetricsTable {
        &self.metrics
    }

    /// Layout constants in use
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Backend atlas handle
    pub fn atlas(&self) -> &A {
        &self.atlas
    }

    /// Render `text` with its pen starting at `(x, y)`
    ///
    /// Issues one instanced draw per full batch plus one for the final
    /// partial batch; text with no visible characters issues no draws.
    pub fn render_text<B>(
        &mut self,
        backend: &mut B,
        text: &str,
        x: f32,
        y: f32,
        scale: f32,
        color: Vec3,
    ) -> Result<RenderStats, B::Error>
    where
        B: GlyphDrawBackend<Atlas = A>,
    {
        let Self { atlas, metrics, config, batch } = self;
        let mut stats = RenderStats::default();
        batch.clear();

        backend.begin_text(atlas, color)?;

        let mut draw = |transforms: &[Mat4], layers: &[u32]| {
            stats.glyphs += transforms.len();
            stats.draw_calls += 1;
            backend.draw_glyph_instances(transforms, layers)
        };

        for placement in layout_text(metrics, config, text, Vec2::new(x, y), scale) {
            batch.push(placement.transform, placement.layer, &mut draw)?;
        }
        batch.flush(&mut draw)?;

        backend.end_text()?;

        log::trace!(
            "Rendered {} glyphs in {} draw call(s)",
            stats.glyphs, stats.draw_calls
        );
        Ok(stats)
    }

    /// Render `text` with a [`TextStyle`]
    pub fn render_styled<B>(&mut self, backend: &mut B, text: &str, style: &TextStyle) -> Result<RenderStats, B::Error>
    where
        B: GlyphDrawBackend<Atlas = A>,
    {
        let origin = style.origin();
        self.render_text(backend, text, origin.x, origin.y, style.scale, style.color())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vector2;
    use crate::text::glyph::Glyph;

    #[derive(Default)]
    struct CountingBackend {
        begins: usize,
        ends: usize,
        draws: Vec<usize>,
    }

    impl GlyphDrawBackend for CountingBackend {
        type Atlas = ();
        type Error = String;

        fn begin_text(&mut self, _atlas: &(), _color: Vec3) -> Result<(), String> {
            self.begins += 1;
            Ok(())
        }

        fn draw_glyph_instances(&mut self, transforms: &[Mat4], _layers: &[u32]) -> Result<(), String> {
            if transforms.len() > 2 {
                return Err("too many".to_string());
            }
            self.draws.push(transforms.len());
            Ok(())
        }

        fn end_text(&mut self) -> Result<(), String> {
            self.ends += 1;
            Ok(())
        }
    }

    fn renderer(capacity: usize) -> TextRenderer<()> {
        let glyphs = (0..128u8)
            .map(|code| Glyph {
                layer_id: u32::from(code),
                size: Vector2::new(10, 10),
                bearing: Vector2::new(0, 10),
                advance: 12 << 6,
            })
            .collect();
        let config = LayoutConfig { batch_capacity: capacity, ..LayoutConfig::default() };
        TextRenderer::new((), GlyphMetricsTable::from_glyphs(glyphs), config)
    }

    #[test]
    fn test_stats_and_bracketing() {
        let mut text = renderer(2);
        let mut backend = CountingBackend::default();

        let stats = text.render_text(&mut backend, "abc de", 0.0, 0.0, 1.0, Vec3::zeros()).unwrap();

        assert_eq!(stats, RenderStats { glyphs: 5, draw_calls: 3 });
        assert_eq!(backend.draws, vec![2, 2, 1]);
        assert_eq!((backend.begins, backend.ends), (1, 1));
    }

    #[test]
    fn test_backend_error_propagates() {
        let mut text = renderer(3);
        let mut backend = CountingBackend::default();

        let result = text.render_text(&mut backend, "abc", 0.0, 0.0, 1.0, Vec3::zeros());
        assert_eq!(result, Err("too many".to_string()));
        assert_eq!(backend.ends, 0);

        // a failed call leaves nothing behind for the next one
        let stats = text.render_text(&mut backend, "ab", 0.0, 0.0, 1.0, Vec3::zeros()).unwrap();
        assert_eq!(stats.glyphs, 2);
    }

    #[test]
    fn test_render_styled_uses_style_origin() {
        let mut text = renderer(4);
        let mut backend = CountingBackend::default();
        let style = TextStyle { origin: [3.0, 4.0], scale: 2.0, color: [1.0, 1.0, 1.0] };

        let stats = text.render_styled(&mut backend, "hi", &style).unwrap();
        assert_eq!(stats.draw_calls, 1);
    }

    #[test]
    fn test_default_style() {
        let style = TextStyle::default();
        assert_eq!(style.origin(), Vec2::new(0.0, 1040.0));
        assert_eq!(style.color(), Vec3::new(0.5, 0.8, 0.2));
    }
}
