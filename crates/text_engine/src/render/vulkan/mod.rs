//! Vulkan backend
//!
//! GLFW window, Vulkan context, the instanced text pipeline and the
//! [`VulkanTextBackend`] that records glyph draws.

pub mod buffer;
pub mod commands;
pub mod config;
pub mod context;
pub mod descriptor_set;
pub mod framebuffer;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod text_backend;
pub mod texture;
pub mod window;

pub use config::{ShaderConfig, VulkanRendererConfig};
pub use context::{VulkanContext, VulkanError, VulkanResult};
pub use shader::{GlyphInstance, TextPushConstants};
pub use text_backend::VulkanTextBackend;
pub use texture::AtlasTexture;
pub use window::{Window, WindowConfig, WindowError, WindowResult};
