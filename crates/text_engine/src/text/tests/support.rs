//! Test doubles: a font that needs no file and a backend that needs no GPU

use crate::foundation::math::{Mat4, Vec3};
use crate::text::{
    AtlasConfig, FontError, FontResult, GlyphAtlas, GlyphAtlasBuilder, GlyphDrawBackend,
    GlyphSource, RasterizedGlyph,
};

/// Glyph metrics derived from the character code
///
/// Width and bearing vary per code so placements are distinguishable.
pub struct SyntheticFont {
    pub pixel_size: u32,
    pub failing: Vec<u8>,
}

impl SyntheticFont {
    pub fn new() -> Self {
        Self { pixel_size: 0, failing: Vec::new() }
    }
}

impl GlyphSource for SyntheticFont {
    fn set_pixel_size(&mut self, pixel_size: u32) {
        self.pixel_size = pixel_size;
    }

    fn rasterize(&self, code: u8) -> FontResult<RasterizedGlyph> {
        if self.failing.contains(&code) {
            return Err(FontError::Rasterize { code, reason: "synthetic failure".to_string() });
        }
        if code == b' ' {
            return Ok(RasterizedGlyph {
                width: 0,
                height: 0,
                left: 0,
                top: 0,
                advance: 60 << 6,
                bitmap: Vec::new(),
            });
        }
        let width = 20 + u32::from(code % 10);
        let height = 30;
        Ok(RasterizedGlyph {
            width,
            height,
            left: i32::from(code % 3),
            top: 180 + i32::from(code % 5),
            advance: ((width + 10) << 6) + 17,
            bitmap: vec![0xff; (width * height) as usize],
        })
    }
}

/// Atlas built from [`SyntheticFont`] with the default dimensions
pub fn synthetic_atlas() -> GlyphAtlas {
    let mut font = SyntheticFont::new();
    let (atlas, _) = GlyphAtlasBuilder::new(AtlasConfig::default())
        .build(&mut font)
        .unwrap();
    atlas
}

/// One recorded instanced draw
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub transforms: Vec<Mat4>,
    pub layers: Vec<u32>,
}

/// Backend that records every call instead of touching a GPU
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub bound_atlas: Vec<u32>,
    pub colors: Vec<Vec3>,
    pub draws: Vec<RecordedDraw>,
}

/// Stand-in atlas handle
#[derive(Debug)]
pub struct FakeAtlas(pub u32);

impl GlyphDrawBackend for RecordingBackend {
    type Atlas = FakeAtlas;
    type Error = std::convert::Infallible;

    fn begin_text(&mut self, atlas: &FakeAtlas, color: Vec3) -> Result<(), Self::Error> {
        self.bound_atlas.push(atlas.0);
        self.colors.push(color);
        Ok(())
    }

    fn draw_glyph_instances(&mut self, transforms: &[Mat4], layers: &[u32]) -> Result<(), Self::Error> {
        self.draws.push(RecordedDraw {
            transforms: transforms.to_vec(),
            layers: layers.to_vec(),
        });
        Ok(())
    }
}

impl RecordingBackend {
    pub fn instance_counts(&self) -> Vec<usize> {
        self.draws.iter().map(|draw| draw.layers.len()).collect()
    }

    pub fn all_layers(&self) -> Vec<u32> {
        self.draws.iter().flat_map(|draw| draw.layers.iter().copied()).collect()
    }
}
