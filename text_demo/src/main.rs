//! Instanced text demo application
//!
//! Builds a glyph atlas from a TrueType font, uploads it once, and draws a
//! block of text every frame until Escape is pressed or the window closes.

mod config;

use config::DemoConfig;
use text_engine::assets::ResourceLocator;
use text_engine::foundation::logging;
use text_engine::render::vulkan::{AtlasTexture, VulkanRendererConfig, VulkanTextBackend, Window};
use text_engine::text::{GlyphAtlasBuilder, TextRenderer};

pub struct TextDemo {
    // Field order is drop order: the atlas texture and backend must go before
    // the window their surface belongs to.
    text: TextRenderer<AtlasTexture>,
    backend: VulkanTextBackend,
    window: Window,
    config: DemoConfig,
}

impl TextDemo {
    pub fn new(config: DemoConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let locator = ResourceLocator::default();
        let font_path = locator.resolve(&config.font_path).ok_or_else(|| {
            format!(
                "Font {} not found under {:?}",
                config.font_path,
                locator.roots()
            )
        })?;

        // Rasterize before opening the window so a bad font fails fast
        let atlas = GlyphAtlasBuilder::new(config.atlas.clone()).build_from_file(&font_path)?;
        let (metrics, image) = atlas.into_parts();

        log::info!("Creating window...");
        let mut window = Window::from_config(&config.window)?;

        let renderer_config = VulkanRendererConfig::new(config.window.title.clone())
            .with_surface_size(config.window.width, config.window.height)
            .with_clear_color(config.window.clear_color);
        let backend = VulkanTextBackend::new(&mut window, renderer_config)?;

        let texture = backend.upload_atlas(&image)?;
        let text = TextRenderer::new(texture, metrics, config.layout.clone());

        Ok(Self {
            text,
            backend,
            window,
            config,
        })
    }

    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        log::info!("Entering render loop");
        let mut frames: u64 = 0;

        while !self.window.should_close() {
            if self.window.is_minimized() {
                self.window.wait_events();
                continue;
            }
            self.window.poll_events();

            if !self.backend.begin_frame(&mut self.window)? {
                continue;
            }

            let stats = self.text.render_styled(&mut self.backend, &self.config.text, &self.config.style)?;
            self.backend.end_frame(&mut self.window)?;

            if frames == 0 {
                log::info!(
                    "First frame: {} glyphs in {} draw call(s)",
                    stats.glyphs, stats.draw_calls
                );
            }
            frames += 1;
        }

        log::info!("Render loop finished after {} frames", frames);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level(log::LevelFilter::Info);

    log::info!("Starting instanced text demo");

    let config = DemoConfig::load()?;
    let mut app = match TextDemo::new(config) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Initialization failed: {}", e);
            return Err(e);
        }
    };

    if let Err(e) = app.run() {
        log::error!("Application error: {}", e);
        return Err(e);
    }

    log::info!("Text demo finished successfully");
    Ok(())
}
