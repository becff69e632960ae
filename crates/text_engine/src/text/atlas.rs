//! Glyph atlas construction
//!
//! Rasterizes every 7-bit ASCII code into its own layer of a layered,
//! single-channel image and records each code's metrics. Layer `i` holds the
//! bitmap of character code `i`, placed at the layer origin. The image is
//! built on the CPU; a render backend uploads it once as a texture array.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::font::{FontError, FontLibrary, GlyphSource, RasterizedGlyph};
use super::glyph::{Glyph, GlyphMetricsTable, ASCII_GLYPH_COUNT};
use crate::config::{Config, ConfigError};
use crate::foundation::math::Vector2;

/// Result type for atlas operations
pub type AtlasResult<T> = Result<T, AtlasError>;

/// Errors that abort atlas construction
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    /// The font library or face could not be set up
    #[error(transparent)]
    Font(#[from] FontError),

    /// Atlas configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Atlas dimensions and rasterization size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Pixel size glyphs are rasterized at
    pub pixel_size: u32,
    /// Width and height of each atlas layer
    pub layer_size: u32,
    /// Number of character codes (and layers), starting at code 0
    pub glyph_count: u32,
}

impl AtlasConfig {
    /// Check that the atlas can be allocated and indexed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pixel_size == 0 {
            return Err(ConfigError::Invalid("atlas pixel_size must be non-zero".to_string()));
        }
        if self.layer_size == 0 {
            return Err(ConfigError::Invalid("atlas layer_size must be non-zero".to_string()));
        }
        if self.glyph_count == 0 || self.glyph_count as usize > ASCII_GLYPH_COUNT {
            return Err(ConfigError::Invalid(format!(
                "atlas glyph_count must be in 1..={}, got {}",
                ASCII_GLYPH_COUNT, self.glyph_count
            )));
        }
        Ok(())
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            pixel_size: 256,
            layer_size: 256,
            glyph_count: ASCII_GLYPH_COUNT as u32,
        }
    }
}

impl Config for AtlasConfig {}

/// Layered 8-bit image, one square layer per character code
///
/// Rows are tightly packed (no row alignment padding); layers are stored
/// back to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasImage {
    layer_size: u32,
    layer_count: u32,
    pixels: Vec<u8>,
}

impl AtlasImage {
    /// Allocate a zeroed image
    pub fn new(layer_size: u32, layer_count: u32) -> Self {
        let len = layer_size as usize * layer_size as usize * layer_count as usize;
        Self {
            layer_size,
            layer_count,
            pixels: vec![0; len],
        }
    }

    /// Width and height of every layer
    pub fn layer_size(&self) -> u32 {
        self.layer_size
    }

    /// Number of layers
    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }

    /// Bytes in one layer
    pub fn layer_len(&self) -> usize {
        self.layer_size as usize * self.layer_size as usize
    }

    /// All layers, back to back
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixels of one layer, `None` past the last layer
    pub fn layer(&self, index: u32) -> Option<&[u8]> {
        if index >= self.layer_count {
            return None;
        }
        let start = index as usize * self.layer_len();
        self.pixels.get(start..start + self.layer_len())
    }

    /// Copy a glyph bitmap into `layer` at the layer origin
    ///
    /// Rows and columns beyond the layer edge are dropped. Returns `true` when
    /// the bitmap had to be clipped.
    fn blit(&mut self, layer: u32, glyph: &RasterizedGlyph) -> bool {
        let layer_len = self.layer_len();
        let stride = self.layer_size as usize;
        let start = layer as usize * layer_len;
        let Some(dst) = self.pixels.get_mut(start..start + layer_len) else {
            return true;
        };

        let src_width = glyph.width as usize;
        let copy_width = src_width.min(stride);
        let copy_rows = (glyph.height as usize).min(stride);

        if src_width > 0 {
            for (row, src_row) in glyph.bitmap.chunks_exact(src_width).take(copy_rows).enumerate() {
                let dst_start = row * stride;
                dst[dst_start..dst_start + copy_width].copy_from_slice(&src_row[..copy_width]);
            }
        }

        copy_width < src_width || copy_rows < glyph.height as usize
    }
}

/// Built atlas: metrics table plus the layered image
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    metrics: GlyphMetricsTable,
    image: AtlasImage,
}

impl GlyphAtlas {
    /// Per-character metrics
    pub fn metrics(&self) -> &GlyphMetricsTable {
        &self.metrics
    }

    /// Layered coverage image
    pub fn image(&self) -> &AtlasImage {
        &self.image
    }

    /// Split into the metrics table and the image
    pub fn into_parts(self) -> (GlyphMetricsTable, AtlasImage) {
        (self.metrics, self.image)
    }
}

/// Counters reported after a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtlasBuildStats {
    /// Glyphs rasterized and stored
    pub rasterized: usize,
    /// Codes whose rasterization failed; their layers stay blank
    pub skipped: usize,
    /// Glyphs whose bitmap exceeded the layer and was clipped
    pub clipped: usize,
    /// Codes the font has no glyph for; they hold the fallback glyph
    pub missing: usize,
}

/// Builds a [`GlyphAtlas`] from a font
#[derive(Debug, Clone, Default)]
pub struct GlyphAtlasBuilder {
    config: AtlasConfig,
}

impl GlyphAtlasBuilder {
    /// Create a builder with the given dimensions
    pub fn new(config: AtlasConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Open the font at `path` and build the atlas from it
    ///
    /// The font library and face are released before this returns, whether
    /// or not the build succeeded.
    pub fn build_from_file<P: AsRef<Path>>(&self, path: P) -> AtlasResult<GlyphAtlas> {
        self.config.validate()?;

        let library = FontLibrary::init(self.config.pixel_size)?;
        let mut face = library.open_face(path)?;
        let (atlas, _) = self.build(&mut face)?;
        Ok(atlas)
    }

    /// Build the atlas from any glyph source
    ///
    /// A glyph that fails to rasterize is logged and left with a blank record
    /// and a blank layer; every other code is still processed.
    pub fn build<S: GlyphSource>(&self, source: &mut S) -> AtlasResult<(GlyphAtlas, AtlasBuildStats)> {
        self.config.validate()?;

        source.set_pixel_size(self.config.pixel_size);

        let glyph_count = self.config.glyph_count;
        log::info!(
            "Rasterizing {} glyphs at {}px into {}x{} layers",
            glyph_count, self.config.pixel_size, self.config.layer_size, self.config.layer_size
        );

        let mut image = AtlasImage::new(self.config.layer_size, glyph_count);
        let mut glyphs = Vec::with_capacity(glyph_count as usize);
        let mut stats = AtlasBuildStats::default();

        for code in 0..glyph_count {
            // validate() bounds glyph_count to 7-bit ASCII
            let Ok(code_u8) = u8::try_from(code) else { break };

            if !source.has_glyph(code_u8) {
                log::debug!("No glyph for {:#04x}, storing the font's fallback glyph", code);
                stats.missing += 1;
            }

            let rasterized = match source.rasterize(code_u8) {
                Ok(rasterized) => rasterized,
                Err(e) => {
                    log::warn!("Skipping glyph {:#04x}: {}", code, e);
                    glyphs.push(Glyph::blank(code));
                    stats.skipped += 1;
                    continue;
                }
            };

            if image.blit(code, &rasterized) {
                log::warn!(
                    "Glyph {:#04x} is {}x{}, clipped to the {}px layer",
                    code, rasterized.width, rasterized.height, self.config.layer_size
                );
                stats.clipped += 1;
            }

            glyphs.push(Glyph {
                layer_id: code,
                size: Vector2::new(
                    i32::try_from(rasterized.width).unwrap_or(i32::MAX),
                    i32::try_from(rasterized.height).unwrap_or(i32::MAX),
                ),
                bearing: Vector2::new(rasterized.left, rasterized.top),
                advance: rasterized.advance,
            });
            stats.rasterized += 1;
        }

        log::info!(
            "Glyph atlas built: {} rasterized, {} skipped, {} clipped, {} without a glyph",
            stats.rasterized, stats.skipped, stats.clipped, stats.missing
        );

        let atlas = GlyphAtlas {
            metrics: GlyphMetricsTable::from_glyphs(glyphs),
            image,
        };
        Ok((atlas, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::font::FontResult;

    /// Synthetic font: every code is a solid `code % 7 + 1` square
    struct BlockFont {
        pixel_size: u32,
        failing: Vec<u8>,
        missing: Vec<u8>,
    }

    impl BlockFont {
        fn new() -> Self {
            Self { pixel_size: 0, failing: Vec::new(), missing: Vec::new() }
        }
    }

    impl GlyphSource for BlockFont {
        fn set_pixel_size(&mut self, pixel_size: u32) {
            self.pixel_size = pixel_size;
        }

        fn rasterize(&self, code: u8) -> FontResult<RasterizedGlyph> {
            if self.failing.contains(&code) {
                return Err(FontError::Rasterize { code, reason: "unsupported".to_string() });
            }
            let side = u32::from(code % 7) + 1;
            Ok(RasterizedGlyph {
                width: side,
                height: side,
                left: 1,
                top: i32::try_from(side).unwrap(),
                advance: (side + 2) * 64,
                bitmap: vec![code; (side * side) as usize],
            })
        }

        fn has_glyph(&self, code: u8) -> bool {
            !self.missing.contains(&code)
        }
    }

    fn small_config() -> AtlasConfig {
        AtlasConfig { pixel_size: 8, layer_size: 8, glyph_count: 128 }
    }

    #[test]
    fn test_default_config() {
        let config = AtlasConfig::default();
        assert_eq!(config.pixel_size, 256);
        assert_eq!(config.layer_size, 256);
        assert_eq!(config.glyph_count, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let zero_size = AtlasConfig { pixel_size: 0, ..AtlasConfig::default() };
        assert!(zero_size.validate().is_err());

        let too_many = AtlasConfig { glyph_count: 129, ..AtlasConfig::default() };
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn test_every_code_gets_one_record_on_its_own_layer() {
        let mut font = BlockFont::new();
        let (atlas, stats) = GlyphAtlasBuilder::new(small_config()).build(&mut font).unwrap();

        assert_eq!(font.pixel_size, 8);
        assert_eq!(stats.rasterized, 128);
        assert_eq!(atlas.metrics().len(), 128);
        for (ch, glyph) in atlas.metrics().iter() {
            assert_eq!(glyph.layer_id, u32::from(ch));
        }
        assert_eq!(atlas.image().layer_count(), 128);
    }

    #[test]
    fn test_bitmap_lands_at_layer_origin() {
        let mut font = BlockFont::new();
        let (atlas, _) = GlyphAtlasBuilder::new(small_config()).build(&mut font).unwrap();

        // 'A' = 65, 65 % 7 + 1 = 3: a 3x3 block of 65s in the top-left corner
        let layer = atlas.image().layer(65).unwrap();
        for row in 0..8 {
            for col in 0..8 {
                let expected = if row < 3 && col < 3 { 65 } else { 0 };
                assert_eq!(layer[row * 8 + col], expected, "row {} col {}", row, col);
            }
        }

        let glyph = atlas.metrics().get('A').unwrap();
        assert_eq!(glyph.size, Vector2::new(3, 3));
        assert_eq!(glyph.bearing, Vector2::new(1, 3));
        assert_eq!(glyph.advance, 5 * 64);
    }

    #[test]
    fn test_failed_glyph_is_skipped_and_blank() {
        let mut font = BlockFont::new();
        font.failing = vec![b'B'];
        let (atlas, stats) = GlyphAtlasBuilder::new(small_config()).build(&mut font).unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.rasterized, 127);
        assert_eq!(atlas.metrics().len(), 128);

        let glyph = atlas.metrics().get('B').unwrap();
        assert!(glyph.is_blank());
        assert_eq!(glyph.layer_id, u32::from(b'B'));
        assert!(atlas.image().layer(u32::from(b'B')).unwrap().iter().all(|&p| p == 0));

        // neighbours still rasterized
        assert!(!atlas.metrics().get('C').unwrap().is_blank());
    }

    #[test]
    fn test_codes_without_glyph_are_counted_but_kept() {
        let mut font = BlockFont::new();
        font.missing = (0..32).collect();
        let (atlas, stats) = GlyphAtlasBuilder::new(small_config()).build(&mut font).unwrap();

        assert_eq!(stats.missing, 32);
        assert_eq!(stats.rasterized, 128);
        assert!(!atlas.metrics().get('\u{1}').unwrap().is_blank());
    }

    #[test]
    fn test_oversized_glyph_is_clipped() {
        let mut font = BlockFont::new();
        let config = AtlasConfig { pixel_size: 4, layer_size: 4, glyph_count: 8 };
        let (atlas, stats) = GlyphAtlasBuilder::new(config).build(&mut font).unwrap();

        // codes 4..=6 produce 5x5..7x7 blocks, larger than the 4px layer
        assert_eq!(stats.clipped, 3);
        let layer = atlas.image().layer(6).unwrap();
        assert!(layer.iter().all(|&p| p == 6));
        assert_eq!(atlas.metrics().get('\u{6}').unwrap().size, Vector2::new(7, 7));
    }

    #[test]
    fn test_build_from_missing_file_fails_with_font_load() {
        let builder = GlyphAtlasBuilder::new(AtlasConfig::default());
        let result = builder.build_from_file("");
        assert!(matches!(result, Err(AtlasError::Font(FontError::FontLoad(_)))));
    }

    #[test]
    fn test_layer_out_of_range() {
        let image = AtlasImage::new(4, 2);
        assert!(image.layer(1).is_some());
        assert!(image.layer(2).is_none());
        assert_eq!(image.pixels().len(), 32);
    }
}
