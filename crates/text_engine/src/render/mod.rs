//! Rendering backends
//!
//! The text engine draws through [`crate::text::GlyphDrawBackend`]; this
//! module provides the Vulkan implementation and its host scaffolding.

pub mod vulkan;
