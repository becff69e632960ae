//! # Text Engine
//!
//! Instanced, texture-array based text rendering on Vulkan.
//!
//! ## Features
//!
//! - **Glyph Atlas**: every ASCII glyph rasterized into its own layer of one
//!   layered R8 texture
//! - **Batched Layout**: glyph placements accumulated into a fixed-capacity
//!   instance batch, one instanced draw per full batch
//! - **Backend Seam**: the draw engine talks to a [`text::GlyphDrawBackend`],
//!   so layout and batching run without a GPU
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use text_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut window = Window::new("Instanced Text", 1920, 1080)?;
//!     let mut backend = VulkanTextBackend::new(&mut window, VulkanRendererConfig::default())?;
//!
//!     let atlas = GlyphAtlasBuilder::new(AtlasConfig::default())
//!         .build_from_file("resources/fonts/Antonio-Bold.ttf")?;
//!     let (metrics, image) = atlas.into_parts();
//!     let texture = backend.upload_atlas(&image)?;
//!     let mut text = TextRenderer::new(texture, metrics, LayoutConfig::default());
//!
//!     while !window.should_close() {
//!         window.poll_events();
//!         if backend.begin_frame(&mut window)? {
//!             text.render_text(&mut backend, "Hello", 0.0, 1040.0, 1.0, Vec3::new(0.5, 0.8, 0.2))?;
//!             backend.end_frame(&mut window)?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod assets;
pub mod text;
pub mod render;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::ResourceLocator,
        config::{Config, ConfigError},
        foundation::math::{Mat4, Vec2, Vec3},
        render::vulkan::{
            AtlasTexture, ShaderConfig, VulkanError, VulkanRendererConfig, VulkanTextBackend,
            Window, WindowConfig, WindowError,
        },
        text::{
            AtlasConfig, GlyphAtlas, GlyphAtlasBuilder, GlyphDrawBackend, GlyphMetricsTable,
            LayoutConfig, RenderStats, TextRenderer, TextStyle,
        },
    };
}
