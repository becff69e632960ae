//! Window management using GLFW
//!
//! Cross-platform window creation and event handling for Vulkan

use ash::vk;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, ConfigError};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Any other GLFW failure
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Window title, size and background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Title bar text
    pub title: String,
    /// Initial width in screen coordinates
    pub width: u32,
    /// Initial height in screen coordinates
    pub height: u32,
    /// Background color the frame is cleared to
    pub clear_color: [f32; 3],
}

impl WindowConfig {
    /// Check that the window can be created
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Instanced Text".to_string(),
            width: 1920,
            height: 1080,
            clear_color: [0.2, 0.3, 0.3],
        }
    }
}

impl Config for WindowConfig {}

/// GLFW window wrapper with proper resource management
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    resized: bool,
}

impl Window {
    /// Create a resizable window with no client API attached
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|_| WindowError::InitializationFailed)?;

        if !glfw.vulkan_supported() {
            return Err(WindowError::GlfwError("Vulkan loader not found".to_string()));
        }

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        log::info!("Created {}x{} window {:?}", width, height, title);

        Ok(Self {
            glfw,
            window,
            events,
            resized: false,
        })
    }

    /// Create a window from a [`WindowConfig`]
    pub fn from_config(config: &WindowConfig) -> WindowResult<Self> {
        Self::new(&config.title, config.width, config.height)
    }

    /// Whether a close was requested
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Request or cancel a close
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Poll GLFW and handle pending events
    ///
    /// Escape requests a close; framebuffer size changes mark the window as
    /// resized until [`Self::take_resized`] is called.
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
        self.handle_events();
    }

    /// Block until at least one event arrives, then handle it like
    /// [`Self::poll_events`]
    ///
    /// Used while minimized, when there is nothing to draw.
    pub fn wait_events(&mut self) {
        self.glfw.wait_events();
        self.handle_events();
    }

    fn handle_events(&mut self) {
        for (_, event) in glfw::flush_messages(&self.events) {
            match respond_to(&event) {
                EventResponse::Close => self.window.set_should_close(true),
                EventResponse::Resized => self.resized = true,
                EventResponse::Ignore => {}
            }
        }
    }

    /// Return and clear the resized flag
    pub fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    /// Framebuffer size in pixels
    pub fn get_framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (
            u32::try_from(width).unwrap_or(0),
            u32::try_from(height).unwrap_or(0),
        )
    }

    /// Framebuffer size as a Vulkan extent
    pub fn framebuffer_extent(&self) -> vk::Extent2D {
        let (width, height) = self.get_framebuffer_size();
        vk::Extent2D { width, height }
    }

    /// Whether the framebuffer has no area (minimized)
    pub fn is_minimized(&self) -> bool {
        let (width, height) = self.get_framebuffer_size();
        width == 0 || height == 0
    }

    /// Get required Vulkan instance extensions from GLFW
    pub fn get_required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("Failed to get required extensions".to_string()))
    }

    /// Create Vulkan surface using GLFW's built-in functionality
    pub fn create_vulkan_surface(&mut self, instance: vk::Instance) -> WindowResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        let result = self.window.create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::GlfwError(format!("Failed to create Vulkan surface: {:?}", result)))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventResponse {
    Close,
    Resized,
    Ignore,
}

fn respond_to(event: &glfw::WindowEvent) -> EventResponse {
    match event {
        glfw::WindowEvent::Key(glfw::Key::Escape, _, glfw::Action::Press, _) => {
            log::info!("Escape pressed, closing window");
            EventResponse::Close
        }
        glfw::WindowEvent::Close => EventResponse::Close,
        glfw::WindowEvent::FramebufferSize(width, height) => {
            log::debug!("Framebuffer resized to {}x{}", width, height);
            EventResponse::Resized
        }
        _ => EventResponse::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_config() {
        let config = WindowConfig::default();
        assert_eq!(config.title, "Instanced Text");
        assert_eq!((config.width, config.height), (1920, 1080));
        assert_eq!(config.clear_color, [0.2, 0.3, 0.3]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_escape_press_closes() {
        let press = glfw::WindowEvent::Key(glfw::Key::Escape, 9, glfw::Action::Press, glfw::Modifiers::empty());
        assert_eq!(respond_to(&press), EventResponse::Close);

        let release = glfw::WindowEvent::Key(glfw::Key::Escape, 9, glfw::Action::Release, glfw::Modifiers::empty());
        assert_eq!(respond_to(&release), EventResponse::Ignore);

        let other = glfw::WindowEvent::Key(glfw::Key::A, 38, glfw::Action::Press, glfw::Modifiers::empty());
        assert_eq!(respond_to(&other), EventResponse::Ignore);
    }

    #[test]
    fn test_close_and_resize_events() {
        assert_eq!(respond_to(&glfw::WindowEvent::Close), EventResponse::Close);
        // minimizing reports a zero-sized framebuffer
        assert_eq!(respond_to(&glfw::WindowEvent::FramebufferSize(0, 0)), EventResponse::Resized);
        assert_eq!(respond_to(&glfw::WindowEvent::FramebufferSize(1280, 720)), EventResponse::Resized);
    }

    #[test]
    fn test_zero_size_is_invalid() {
        let config = WindowConfig { width: 0, ..WindowConfig::default() };
        assert!(config.validate().is_err());
    }
}
