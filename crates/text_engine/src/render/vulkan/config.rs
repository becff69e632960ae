//! Vulkan backend configuration

use serde::{Deserialize, Serialize};

use crate::assets::ResourceLocator;
use crate::config::{Config, ConfigError};

/// Locations of the compiled text shaders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Path to the vertex shader SPIR-V file
    pub vertex_shader_path: String,
    /// Path to the fragment shader SPIR-V file
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Directories searched for compiled shaders
    pub const SEARCH_ROOTS: [&'static str; 5] = [
        "target/shaders",
        "../target/shaders",
        "../../target/shaders",
        "shaders",
        "resources/shaders",
    ];

    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }

    /// Create shader config with automatic path resolution
    ///
    /// Tries the common output locations so the binary works from different
    /// working directories. Unresolved names fall back to `target/shaders/`.
    pub fn with_path_resolution(base_vertex: &str, base_fragment: &str) -> Self {
        let locator = ResourceLocator::new(Self::SEARCH_ROOTS);
        let resolve = |name: &str| {
            locator
                .resolve(name)
                .map_or_else(|| format!("target/shaders/{}", name), |path| path.display().to_string())
        };

        Self {
            vertex_shader_path: resolve(base_vertex),
            fragment_shader_path: resolve(base_fragment),
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::with_path_resolution("text.vert.spv", "text.frag.spv")
    }
}

/// Configuration of the Vulkan text backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulkanRendererConfig {
    /// Application name for Vulkan instance creation
    pub application_name: String,
    /// Application version (major, minor, patch)
    pub application_version: (u32, u32, u32),
    /// Shader configuration
    pub shaders: ShaderConfig,
    /// Frames recorded ahead of the GPU
    pub max_frames_in_flight: usize,
    /// Glyph instances each frame may draw across all text runs
    pub max_instances_per_frame: usize,
    /// Logical surface size the orthographic projection covers
    pub surface_size: (u32, u32),
    /// Background color
    pub clear_color: [f32; 3],
    /// Whether to enable Vulkan validation layers
    pub enable_validation: Option<bool>,
}

impl VulkanRendererConfig {
    /// Create a new renderer configuration
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            application_version: (1, 0, 0),
            shaders: ShaderConfig::default(),
            max_frames_in_flight: 2,
            max_instances_per_frame: 4096,
            surface_size: (1920, 1080),
            clear_color: [0.2, 0.3, 0.3],
            enable_validation: None,
        }
    }

    /// Set custom shader configuration
    pub fn with_shaders(mut self, shaders: ShaderConfig) -> Self {
        self.shaders = shaders;
        self
    }

    /// Set maximum frames in flight
    pub fn with_max_frames_in_flight(mut self, frames: usize) -> Self {
        self.max_frames_in_flight = frames;
        self
    }

    /// Set the per-frame instance budget
    pub fn with_max_instances_per_frame(mut self, instances: usize) -> Self {
        self.max_instances_per_frame = instances;
        self
    }

    /// Set the projected surface size
    pub fn with_surface_size(mut self, width: u32, height: u32) -> Self {
        self.surface_size = (width, height);
        self
    }

    /// Set the background color
    pub fn with_clear_color(mut self, color: [f32; 3]) -> Self {
        self.clear_color = color;
        self
    }

    /// Enable or disable validation layers
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = Some(enabled);
        self
    }

    /// Whether validation ends up enabled; defaults to debug builds only
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Invalid("application name cannot be empty".to_string()));
        }
        if self.max_frames_in_flight == 0 {
            return Err(ConfigError::Invalid("max_frames_in_flight must be at least 1".to_string()));
        }
        if self.max_instances_per_frame == 0 {
            return Err(ConfigError::Invalid("max_instances_per_frame must be at least 1".to_string()));
        }
        if self.surface_size.0 == 0 || self.surface_size.1 == 0 {
            return Err(ConfigError::Invalid(format!(
                "surface size must be non-zero, got {:?}",
                self.surface_size
            )));
        }
        Ok(())
    }
}

impl Default for VulkanRendererConfig {
    fn default() -> Self {
        Self::new("Instanced Text")
    }
}

impl Config for VulkanRendererConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = VulkanRendererConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_frames_in_flight, 2);
        assert_eq!(config.surface_size, (1920, 1080));
    }

    #[test]
    fn test_builder_methods() {
        let config = VulkanRendererConfig::new("Test")
            .with_max_frames_in_flight(3)
            .with_surface_size(800, 600)
            .with_validation(false);

        assert_eq!(config.max_frames_in_flight, 3);
        assert_eq!(config.surface_size, (800, 600));
        assert!(!config.validation_enabled());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(VulkanRendererConfig::new("").validate().is_err());
        assert!(VulkanRendererConfig::default().with_max_frames_in_flight(0).validate().is_err());
        assert!(VulkanRendererConfig::default().with_surface_size(0, 10).validate().is_err());
    }

    #[test]
    fn test_unresolved_shader_falls_back_to_target_dir() {
        let shaders = ShaderConfig::with_path_resolution("no_such_shader.vert.spv", "no_such_shader.frag.spv");
        assert_eq!(shaders.vertex_shader_path, "target/shaders/no_such_shader.vert.spv");
        assert_eq!(shaders.fragment_shader_path, "target/shaders/no_such_shader.frag.spv");
    }
}
