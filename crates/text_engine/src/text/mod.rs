//! Text rendering system
//!
//! Glyph atlas construction, text layout, and batched instanced drawing.

pub mod glyph;
pub mod font;
pub mod atlas;
pub mod batch;
pub mod layout;
pub mod renderer;

#[cfg(test)]
mod tests;

pub use glyph::*;
pub use font::*;
pub use atlas::*;
pub use batch::*;
pub use layout::*;
pub use renderer::*;
