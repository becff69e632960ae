//! Glyph records and the per-character metrics table

use crate::foundation::math::Vector2;

/// Number of character codes covered by a full table (7-bit ASCII)
pub const ASCII_GLYPH_COUNT: usize = 128;

/// Metrics of one rasterized character
///
/// Immutable once built; owned by a [`GlyphMetricsTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    /// Atlas layer holding this glyph's bitmap
    pub layer_id: u32,
    /// Bitmap size in pixels
    pub size: Vector2<i32>,
    /// Offset from the pen's baseline origin to the bitmap's left/top edge
    pub bearing: Vector2<i32>,
    /// Horizontal pen advance in 1/64 pixel units
    pub advance: u32,
}

impl Glyph {
    /// Record for a code whose rasterization failed: empty bitmap, no advance
    pub fn blank(layer_id: u32) -> Self {
        Self {
            layer_id,
            size: Vector2::zeros(),
            bearing: Vector2::zeros(),
            advance: 0,
        }
    }

    /// Advance in whole pixels (26.6 fixed point shifted down)
    pub fn advance_pixels(&self) -> u32 {
        self.advance >> 6
    }

    /// Whether the glyph has no bitmap
    pub fn is_blank(&self) -> bool {
        self.size.x == 0 || self.size.y == 0
    }
}

/// Character code to [`Glyph`] mapping
///
/// Index `i` holds the record for character code `i`. Built once by the atlas
/// builder and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphMetricsTable {
    glyphs: Vec<Glyph>,
}

impl GlyphMetricsTable {
    /// Build a table from records ordered by character code
    pub fn from_glyphs(glyphs: Vec<Glyph>) -> Self {
        debug_assert!(glyphs.len() <= ASCII_GLYPH_COUNT, "table covers at most 7-bit ASCII");
        Self { glyphs }
    }

    /// Look up the record for `ch`
    ///
    /// Returns `None` for characters outside the loaded codes; never reads out
    /// of bounds.
    pub fn get(&self, ch: char) -> Option<&Glyph> {
        usize::try_from(u32::from(ch))
            .ok()
            .and_then(|code| self.glyphs.get(code))
    }

    /// Number of character codes covered
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether no codes are covered
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Records in character-code order
    pub fn iter(&self) -> impl Iterator<Item = (char, &Glyph)> {
        self.glyphs
            .iter()
            .enumerate()
            .filter_map(|(code, glyph)| {
                u8::try_from(code).ok().map(|code| (char::from(code), glyph))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_glyph(layer_id: u32) -> Glyph {
        Glyph {
            layer_id,
            size: Vector2::new(20, 30),
            bearing: Vector2::new(2, 28),
            advance: 24 * 64 + 17,
        }
    }

    #[test]
    fn test_advance_pixels_truncates_fraction() {
        assert_eq!(sample_glyph(65).advance_pixels(), 24);
    }

    #[test]
    fn test_blank_glyph() {
        let glyph = Glyph::blank(7);
        assert!(glyph.is_blank());
        assert_eq!(glyph.layer_id, 7);
        assert_eq!(glyph.advance_pixels(), 0);
    }

    #[test]
    fn test_lookup_in_and_out_of_range() {
        let table = GlyphMetricsTable::from_glyphs((0..128).map(sample_glyph).collect());

        assert_eq!(table.get('A').map(|g| g.layer_id), Some(65));
        assert_eq!(table.get('\u{7f}').map(|g| g.layer_id), Some(127));
        assert!(table.get('\u{80}').is_none());
        assert!(table.get('é').is_none());
    }

    #[test]
    fn test_partial_table_lookup() {
        let table = GlyphMetricsTable::from_glyphs((0..40).map(sample_glyph).collect());

        assert_eq!(table.len(), 40);
        assert!(table.get(' ').is_some());
        assert!(table.get('A').is_none());
    }

    #[test]
    fn test_iter_in_code_order() {
        let table = GlyphMetricsTable::from_glyphs((0..3).map(sample_glyph).collect());
        let codes: Vec<char> = table.iter().map(|(ch, _)| ch).collect();
        assert_eq!(codes, vec!['\0', '\u{1}', '\u{2}']);
    }
}
