//! Math utilities and types
//!
//! Screen-space matrices for placing glyph quads and projecting them.

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Place a unit quad at `(x, y)` and stretch it to `size` pixels
///
/// Translation is applied after scaling, so the quad's `(0, 0)` corner lands
/// on `(x, y)`. Depth is flattened to zero.
pub fn glyph_transform(x: f32, y: f32, size: f32) -> Mat4 {
    Mat4::new_translation(&Vec3::new(x, y, 0.0))
        * Mat4::new_nonuniform_scaling(&Vec3::new(size, size, 0.0))
}

/// Orthographic projection over `[0, width] x [0, height]` with +Y up
///
/// Uses the OpenGL clip-space convention (depth in `[-1, 1]`); combine with
/// [`vulkan_clip_correction`] before handing it to a Vulkan pipeline.
pub fn screen_orthographic(width: f32, height: f32) -> Mat4 {
    Mat4::new_orthographic(0.0, width, 0.0, height, -1.0, 1.0)
}

/// Maps OpenGL clip space onto Vulkan's (Y down, depth in `[0, 1]`)
pub fn vulkan_clip_correction() -> Mat4 {
    Mat4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, -1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_glyph_transform_places_unit_quad() {
        let transform = glyph_transform(10.0, 20.0, 48.0);

        let origin = transform * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin, Vec4::new(10.0, 20.0, 0.0, 1.0));

        let far_corner = transform * Vec4::new(1.0, 1.0, 0.0, 1.0);
        assert_relative_eq!(far_corner, Vec4::new(58.0, 68.0, 0.0, 1.0));
    }

    #[test]
    fn test_glyph_transform_flattens_depth() {
        let transform = glyph_transform(0.0, 0.0, 2.0);
        let point = transform * Vec4::new(0.5, 0.5, 7.0, 1.0);
        assert_relative_eq!(point.z, 0.0);
    }

    #[test]
    fn test_screen_orthographic_corners() {
        let projection = screen_orthographic(1920.0, 1080.0);

        let bottom_left = projection * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(bottom_left.x, -1.0);
        assert_relative_eq!(bottom_left.y, -1.0);

        let top_right = projection * Vec4::new(1920.0, 1080.0, 0.0, 1.0);
        assert_relative_eq!(top_right.x, 1.0);
        assert_relative_eq!(top_right.y, 1.0);
    }

    #[test]
    fn test_vulkan_clip_correction_flips_y_and_remaps_depth() {
        let corrected = vulkan_clip_correction() * Vec4::new(0.25, 0.5, -1.0, 1.0);
        assert_relative_eq!(corrected, Vec4::new(0.25, -0.5, 0.0, 1.0));

        let far = vulkan_clip_correction() * Vec4::new(0.0, 0.0, 1.0, 1.0);
        assert_relative_eq!(far.z, 1.0);
    }
}
