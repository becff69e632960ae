//! Font library and face handles
//!
//! Glyph rasterization goes through the [`GlyphSource`] trait. The production
//! source is a [`FontFace`] opened from a [`FontLibrary`], both backed by the
//! pure-Rust `fontdue` rasterizer. The face borrows its library, so a face can
//! never outlive the library that opened it, and both are released when they
//! go out of scope on every exit path.

use std::marker::PhantomData;
use std::path::Path;

use fontdue::{Font, FontSettings};

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors that can occur during font operations
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// The rasterizer could not be initialized
    #[error("Could not init font library: {0}")]
    FontInit(String),

    /// The font face could not be located, read or parsed
    #[error("Failed to load font: {0}")]
    FontLoad(String),

    /// A single glyph could not be rasterized
    #[error("Failed to rasterize glyph {code:#04x}: {reason}")]
    Rasterize {
        /// Character code that failed
        code: u8,
        /// Description of the failure
        reason: String,
    },
}

/// Coverage bitmap and placement of one character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterizedGlyph {
    /// Bitmap width in pixels
    pub width: u32,
    /// Bitmap height in pixels
    pub height: u32,
    /// Distance from the pen position to the bitmap's left edge
    pub left: i32,
    /// Distance from the baseline up to the bitmap's top row
    pub top: i32,
    /// Horizontal pen advance in 1/64 pixel units
    pub advance: u32,
    /// 8-bit coverage, `width * height` bytes, top row first, rows tightly packed
    pub bitmap: Vec<u8>,
}

/// Anything that can rasterize 7-bit character codes at a pixel size
pub trait GlyphSource {
    /// Set the pixel size subsequent glyphs are rasterized at
    fn set_pixel_size(&mut self, pixel_size: u32);

    /// Rasterize one character code
    fn rasterize(&self, code: u8) -> FontResult<RasterizedGlyph>;

    /// Whether `code` maps to a real glyph rather than the fallback one
    fn has_glyph(&self, _code: u8) -> bool {
        true
    }
}

/// Rasterizer library instance
///
/// Holds the settings every face opened from it shares.
#[derive(Debug)]
pub struct FontLibrary {
    pixel_size: u32,
}

impl FontLibrary {
    /// Initialize the library for glyphs of `pixel_size` pixels
    pub fn init(pixel_size: u32) -> FontResult<Self> {
        if pixel_size == 0 {
            return Err(FontError::FontInit("pixel size must be non-zero".to_string()));
        }

        log::debug!("Font library initialized at {}px", pixel_size);
        Ok(Self { pixel_size })
    }

    /// Open the font face stored at `path`
    pub fn open_face<P: AsRef<Path>>(&self, path: P) -> FontResult<FontFace<'_>> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(FontError::FontLoad("font path is empty".to_string()));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| FontError::FontLoad(format!("{}: {}", path.display(), e)))?;

        let face = self.open_face_from_bytes(&bytes)?;
        log::info!("Loaded font face from {}", path.display());
        Ok(face)
    }

    /// Open a font face from TrueType/OpenType bytes already in memory
    pub fn open_face_from_bytes(&self, bytes: &[u8]) -> FontResult<FontFace<'_>> {
        let settings = FontSettings {
            scale: self.pixel_size as f32,
            ..FontSettings::default()
        };

        let font = Font::from_bytes(bytes, settings)
            .map_err(|e| FontError::FontLoad(format!("fontdue error: {}", e)))?;

        Ok(FontFace {
            font,
            pixel_size: self.pixel_size as f32,
            _library: PhantomData,
        })
    }

    /// Pixel size faces are opened at
    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }
}

impl Drop for FontLibrary {
    fn drop(&mut self) {
        log::debug!("Font library released");
    }
}

/// One font face opened from a [`FontLibrary`]
pub struct FontFace<'lib> {
    font: Font,
    pixel_size: f32,
    _library: PhantomData<&'lib FontLibrary>,
}

impl GlyphSource for FontFace<'_> {
    fn set_pixel_size(&mut self, pixel_size: u32) {
        self.pixel_size = pixel_size as f32;
    }

    // Glyph index 0 is `.notdef`
    fn has_glyph(&self, code: u8) -> bool {
        self.font.lookup_glyph_index(char::from(code)) != 0
    }

    fn rasterize(&self, code: u8) -> FontResult<RasterizedGlyph> {
        let (metrics, bitmap) = self.font.rasterize(char::from(code), self.pixel_size);

        if bitmap.len() != metrics.width * metrics.height {
            return Err(FontError::Rasterize {
                code,
                reason: format!(
                    "bitmap holds {} bytes for a {}x{} glyph",
                    bitmap.len(), metrics.width, metrics.height
                ),
            });
        }

        let advance = (metrics.advance_width * 64.0).round();
        if !advance.is_finite() || advance < 0.0 {
            return Err(FontError::Rasterize {
                code,
                reason: format!("invalid advance width {}", metrics.advance_width),
            });
        }

        let too_large = |what: &str| FontError::Rasterize {
            code,
            reason: format!("{} does not fit in 32 bits", what),
        };
        let width = u32::try_from(metrics.width).map_err(|_| too_large("width"))?;
        let height = u32::try_from(metrics.height).map_err(|_| too_large("height"))?;
        let top = i32::try_from(metrics.height)
            .ok()
            .and_then(|h| metrics.ymin.checked_add(h))
            .ok_or_else(|| too_large("top bearing"))?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let advance = advance as u32;

        Ok(RasterizedGlyph {
            width,
            height,
            left: metrics.xmin,
            top,
            advance,
            bitmap,
        })
    }
}

impl Drop for FontFace<'_> {
    fn drop(&mut self) {
        log::debug!("Font face released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_pixel_size_fails_init() {
        assert!(matches!(FontLibrary::init(0), Err(FontError::FontInit(_))));
    }

    #[test]
    fn test_empty_path_fails_load() {
        let library = FontLibrary::init(256).unwrap();
        let result = library.open_face("");
        assert!(matches!(result, Err(FontError::FontLoad(_))));
    }

    #[test]
    fn test_missing_file_fails_load() {
        let library = FontLibrary::init(256).unwrap();
        let result = library.open_face("resources/fonts/does-not-exist.ttf");
        assert!(matches!(result, Err(FontError::FontLoad(_))));
    }

    #[test]
    fn test_garbage_bytes_fail_load() {
        let library = FontLibrary::init(256).unwrap();
        let result = library.open_face_from_bytes(b"definitely not a font");
        assert!(matches!(result, Err(FontError::FontLoad(_))));
    }

    #[test]
    fn test_error_messages() {
        let err = FontError::Rasterize { code: 0x41, reason: "boom".to_string() };
        assert_eq!(err.to_string(), "Failed to rasterize glyph 0x41: boom");
    }
}
