//! Demo configuration
//!
//! Compiled-in defaults, optionally overridden by `text_demo.toml` or
//! `text_demo.ron` in the working directory.

use serde::{Deserialize, Serialize};
use text_engine::config::{Config, ConfigError};
use text_engine::render::vulkan::WindowConfig;
use text_engine::text::{AtlasConfig, LayoutConfig, TextStyle};

/// Files checked for overrides, first match wins
pub const CONFIG_CANDIDATES: [&str; 2] = ["text_demo.toml", "text_demo.ron"];

/// Paragraphs drawn by default
pub const DEFAULT_TEXT: &str = concat!(
    "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Praesent sollicitudin est elit, a semper sem\n",
    "viverra venenatis. Morbi facilisis sollicitudin tortor non feugiat. Maecenas orci lorem, lobortis nec\n",
    "auctor vel, venenatis ac sem. Phasellus eu mauris viverra, efficitur lorem ut, tempor libero. Sed eu\n",
    "risus et sem fermentum tincidunt. Curabitur semper semper dui ut tristique. Etiam mattis\n",
    "condimentum quam non aliquet. Cras lacinia, tortor eget vulputate maximus, tortor est condimentum\n",
    "quam, eget convallis elit leo ut dui. Ut viverra fringilla nisl et dapibus.\n",
    "\n",
    "Vivamus id sapien varius, luctus quam porttitor, tempor magna.Ut accumsan, lorem et suscipit\n",
    "scelerisque, lacus neque interdum ex, et maximus risus ligula vitae velit.In hac habitasse platea\n",
    "dictumst.Curabitur eleifend rutrum diam vel bibendum.Aliquam id dolor metus.Fusce molestie gravida\n",
    "molestie.Fusce varius id leo non malesuada.Cras quis est eu quam luctus imperdiet.Quisque efficitur\n",
    "ut lectus condimentum consequat.\n",
    "\n",
    "Donec eget diam venenatis enim placerat efficitur ac eget urna.Ut dictum, dui ut luctus ornare, velit\n",
    "justo tristique odio, ac pharetra augue purus sit amet urna.Etiam rutrum blandit metus.Pellentesque\n",
    "dapibus augue dolor, quis malesuada est suscipit a.Praesent faucibus augue a dolor consectetur, vitae\n",
    "vehicula ex aliquam.Praesent vitae odio mollis, ultricies augue in, interdum magna.Cras pretium purus\n",
    "vel ligula varius cursus.Proin blandit nec massa eget accumsan.Sed massa augue, finibus sed purus\n",
    "non, cursus eleifend neque.Proin id tincidunt massa, id suscipit ante.\n",
    "\n",
    "Cras aliquet augue eu tellus placerat ornare.Nam aliquam tempus augue, non tempus ex tempor a.\n",
    "Praesent placerat pretium faucibus.Suspendisse vestibulum mollis iaculis.Nulla facilisi.Sed non\n",
    "malesuada massa, ut fermentum purus.Duis lobortis lobortis enim, sed maximus nisi pulvinar aliquet.\n",
    "Sed viverra pulvinar velit sed porta.Aliquam a quam eu augue egestas ultrices.",
);

/// Everything the demo needs to open a window and draw its text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Window title, size and background
    pub window: WindowConfig,
    /// Glyph atlas dimensions
    pub atlas: AtlasConfig,
    /// Layout constants
    pub layout: LayoutConfig,
    /// Font file, relative to the resource roots
    pub font_path: String,
    /// Where and how the text is drawn
    pub style: TextStyle,
    /// Text to draw
    pub text: String,
}

impl DemoConfig {
    /// Load overrides from the working directory, or fall back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_or_default(&CONFIG_CANDIDATES[..])?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate()?;
        self.atlas.validate()?;
        self.layout.validate()?;
        if self.font_path.is_empty() {
            return Err(ConfigError::Invalid("font_path cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            atlas: AtlasConfig::default(),
            layout: LayoutConfig::default(),
            font_path: "fonts/Antonio-Bold.ttf".to_string(),
            style: TextStyle::default(),
            text: DEFAULT_TEXT.to_string(),
        }
    }
}

impl Config for DemoConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DemoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.style.origin, [0.0, 1040.0]);
        assert_eq!(config.style.scale, 1.0);
        assert_eq!(config.style.color, [0.5, 0.8, 0.2]);
        assert!(config.text.starts_with("Lorem ipsum"));
        assert!(config.text.ends_with("egestas ultrices."));
    }

    #[test]
    fn test_empty_font_path_is_invalid() {
        let config = DemoConfig { font_path: String::new(), ..DemoConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DemoConfig = toml::from_str(
            "text = \"Hello\"\n[style]\nscale = 2.0\n",
        )
        .unwrap();
        assert_eq!(config.text, "Hello");
        assert_eq!(config.style.scale, 2.0);
        assert_eq!(config.style.origin, [0.0, 1040.0]);
        assert_eq!(config.window.width, 1920);
    }
}
