//! Text layout
//!
//! Walks a string and yields one [`GlyphPlacement`] per visible character.
//! Pen movement follows fixed advances only: no kerning, no wrapping beyond
//! literal newlines.

use serde::{Deserialize, Serialize};

use super::batch::DEFAULT_BATCH_CAPACITY;
use super::glyph::{Glyph, GlyphMetricsTable};
use crate::config::{Config, ConfigError};
use crate::foundation::math::{glyph_transform, Mat4, Vec2};

/// Layout constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// On-screen pixel height a scale of 1.0 corresponds to
    pub reference_pixel_height: f32,
    /// Size of one atlas cell (glyph quad) in pixels at effective scale 1.0
    pub cell_size: f32,
    /// Line advance as a multiple of the scaled cell size
    pub line_height: f32,
    /// Instances per draw call
    pub batch_capacity: usize,
    /// Drawn in place of characters missing from the metrics table
    pub placeholder: char,
}

impl LayoutConfig {
    /// Atlas-to-screen factor for a requested scale
    pub fn effective_scale(&self, scale: f32) -> f32 {
        scale * (self.reference_pixel_height / self.cell_size)
    }

    /// Vertical distance between baselines at `scale`
    pub fn line_advance(&self, scale: f32) -> f32 {
        self.line_height * (self.cell_size * self.effective_scale(scale))
    }

    /// Check for values that would break layout
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.reference_pixel_height.is_finite() && self.reference_pixel_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "reference_pixel_height must be positive, got {}",
                self.reference_pixel_height
            )));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if !self.line_height.is_finite() {
            return Err(ConfigError::Invalid("line_height must be finite".to_string()));
        }
        if self.batch_capacity == 0 {
            return Err(ConfigError::Invalid("batch_capacity must be non-zero".to_string()));
        }
        if !self.placeholder.is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "placeholder {:?} is outside 7-bit ASCII",
                self.placeholder
            )));
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            reference_pixel_height: 48.0,
            cell_size: 256.0,
            line_height: 1.3,
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            placeholder: '?',
        }
    }
}

impl Config for LayoutConfig {}

/// Screen placement of one visible character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPlacement {
    /// Character as it appeared in the text
    pub ch: char,
    /// Pen position (baseline origin) before this character
    pub pen: Vec2,
    /// Model matrix for the unit quad
    pub transform: Mat4,
    /// Atlas layer to sample
    pub layer: u32,
}

/// Iterator over the placements of a string
///
/// Spaces and newlines move the pen without yielding anything.
pub struct TextLayout<'a> {
    metrics: &'a GlyphMetricsTable,
    chars: std::str::Chars<'a>,
    placeholder: Option<&'a Glyph>,
    pen: Vec2,
    line_start_x: f32,
    effective_scale: f32,
    cell_size: f32,
    line_advance: f32,
}

impl<'a> TextLayout<'a> {
    /// Start laying out `text` with the pen at `origin`
    pub fn new(
        metrics: &'a GlyphMetricsTable,
        config: &LayoutConfig,
        text: &'a str,
        origin: Vec2,
        scale: f32,
    ) -> Self {
        Self {
            metrics,
            chars: text.chars(),
            placeholder: metrics.get(config.placeholder),
            pen: origin,
            line_start_x: origin.x,
            effective_scale: config.effective_scale(scale),
            cell_size: config.cell_size,
            line_advance: config.line_advance(scale),
        }
    }

    /// Current pen position
    pub fn pen(&self) -> Vec2 {
        self.pen
    }

    fn advance_pen(&mut self, glyph: &Glyph) {
        self.pen.x += glyph.advance_pixels() as f32 * self.effective_scale;
    }
}

impl Iterator for TextLayout<'_> {
    type Item = GlyphPlacement;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ch = self.chars.next()?;

            match ch {
                '\n' => {
                    self.pen.y -= self.line_advance;
                    self.pen.x = self.line_start_x;
                }
                ' ' => {
                    if let Some(space) = self.metrics.get(' ') {
                        self.advance_pen(space);
                    }
                }
                _ => {
                    let Some(glyph) = self.metrics.get(ch).or(self.placeholder) else {
                        log::trace!("No glyph or placeholder for {:?}, skipping", ch);
                        continue;
                    };
                    let es = self.effective_scale;
                    let pen = self.pen;
                    let xpos = pen.x + glyph.bearing.x as f32 * es;
                    let ypos = pen.y - (self.cell_size - glyph.bearing.y as f32) * es;

                    let placement = GlyphPlacement {
                        ch,
                        pen,
                        transform: glyph_transform(xpos, ypos, self.cell_size * es),
                        layer: glyph.layer_id,
                    };
                    self.advance_pen(glyph);
                    return Some(placement);
                }
            }
        }
    }
}

/// Lay out `text` starting at `origin`
pub fn layout_text<'a>(
    metrics: &'a GlyphMetricsTable,
    config: &LayoutConfig,
    text: &'a str,
    origin: Vec2,
    scale: f32,
) -> TextLayout<'a> {
    TextLayout::new(metrics, config, text, origin, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vector2;
    use approx::assert_relative_eq;

    fn glyph(code: u8, advance_px: u32) -> Glyph {
        Glyph {
            layer_id: u32::from(code),
            size: Vector2::new(100, 150),
            bearing: Vector2::new(10, 200),
            advance: advance_px << 6,
        }
    }

    fn table() -> GlyphMetricsTable {
        GlyphMetricsTable::from_glyphs((0..128u8).map(|code| glyph(code, 128)).collect())
    }

    #[test]
    fn test_default_effective_scale() {
        let config = LayoutConfig::default();
        assert_relative_eq!(config.effective_scale(1.0), 0.1875);
        assert_relative_eq!(config.effective_scale(2.0), 0.375);
        assert_relative_eq!(config.line_advance(1.0), 1.3 * 48.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(LayoutConfig::default().validate().is_ok());

        let zero_capacity = LayoutConfig { batch_capacity: 0, ..LayoutConfig::default() };
        assert!(zero_capacity.validate().is_err());

        let bad_cell = LayoutConfig { cell_size: 0.0, ..LayoutConfig::default() };
        assert!(bad_cell.validate().is_err());

        let wide_placeholder = LayoutConfig { placeholder: '\u{fffd}', ..LayoutConfig::default() };
        assert!(wide_placeholder.validate().is_err());
    }

    #[test]
    fn test_glyph_position_and_size() {
        let metrics = table();
        let config = LayoutConfig::default();
        let placements: Vec<_> = layout_text(&metrics, &config, "A", Vec2::new(0.0, 0.0), 1.0).collect();

        assert_eq!(placements.len(), 1);
        let es = 0.1875;
        let expected = glyph_transform(10.0 * es, -(256.0 - 200.0) * es, 256.0 * es);
        assert_relative_eq!(placements[0].transform, expected);
        assert_eq!(placements[0].layer, u32::from(b'A'));
    }

    #[test]
    fn test_pen_advances_by_whole_pixels() {
        let mut glyphs: Vec<_> = (0..128u8).map(|code| glyph(code, 128)).collect();
        // 100.75px advance: the fractional part is dropped
        glyphs[usize::from(b'A')].advance = (100 << 6) + 48;
        let metrics = GlyphMetricsTable::from_glyphs(glyphs);
        let config = LayoutConfig::default();

        let mut layout = layout_text(&metrics, &config, "AB", Vec2::new(5.0, 0.0), 1.0);
        layout.next();
        assert_relative_eq!(layout.pen().x, 5.0 + 100.0 * 0.1875);
        let b = layout.next().unwrap();
        assert_relative_eq!(b.pen.x, 5.0 + 100.0 * 0.1875);
    }

    #[test]
    fn test_space_moves_pen_without_placement() {
        let metrics = table();
        let config = LayoutConfig::default();
        let mut layout = layout_text(&metrics, &config, "  ", Vec2::zeros(), 1.0);

        assert!(layout.next().is_none());
        assert_relative_eq!(layout.pen().x, 2.0 * 128.0 * 0.1875);
    }

    #[test]
    fn test_custom_line_height() {
        let metrics = table();
        let config = LayoutConfig { line_height: 2.0, ..LayoutConfig::default() };
        let mut layout = layout_text(&metrics, &config, "\n\n", Vec2::new(0.0, 500.0), 1.0);

        assert!(layout.next().is_none());
        assert_relative_eq!(layout.pen().y, 500.0 - 2.0 * 2.0 * 48.0);
    }

    #[test]
    fn test_unknown_character_uses_placeholder() {
        let metrics = table();
        let config = LayoutConfig::default();
        let placements: Vec<_> = layout_text(&metrics, &config, "é", Vec2::zeros(), 1.0).collect();

        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].ch, 'é');
        assert_eq!(placements[0].layer, u32::from(b'?'));
    }

    #[test]
    fn test_unknown_character_without_placeholder_is_skipped() {
        // table covering only codes 0..63, so '?' (63) is missing too
        let metrics = GlyphMetricsTable::from_glyphs((0..63u8).map(|code| glyph(code, 128)).collect());
        let config = LayoutConfig::default();
        let mut layout = layout_text(&metrics, &config, "Z", Vec2::new(7.0, 0.0), 1.0);

        assert!(layout.next().is_none());
        assert_relative_eq!(layout.pen().x, 7.0);
    }
}
