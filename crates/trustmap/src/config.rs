//! Configuration types for Trustmap rendering.
//!
//! This module provides configuration structures that control how threat
//! models are styled and rasterized. All types implement
//! [`serde::Deserialize`] for loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining style and render settings.
//! - [`StyleConfig`] - Font and background color.
//! - [`RenderConfig`] - Canvas size, crop padding and raster scale.
//!
//! # Example
//!
//! ```
//! # use trustmap::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.style().background_color().is_ok());
//! assert_eq!(config.render().padding(), 10.0);
//! ```

use serde::Deserialize;

use trustmap_core::{
    color::Color,
    draw::{EMBEDDED_FONT_FAMILY, TextDefinition},
};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,

    /// Render configuration section.
    #[serde(default)]
    render: RenderConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified style and render configurations.
    pub fn new(style: StyleConfig, render: RenderConfig) -> Self {
        Self { style, render }
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the render configuration.
    pub fn render(&self) -> &RenderConfig {
        &self.render
    }
}

/// Visual styling configuration for rendered diagrams.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    font_family: String,
    font_size: u16,
    /// Background color of the raster image, as a CSS color string.
    background_color: Option<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_family: EMBEDDED_FONT_FAMILY.to_string(),
            font_size: 11,
            background_color: None,
        }
    }
}

impl StyleConfig {
    pub fn new(
        font_family: impl Into<String>,
        font_size: u16,
        background_color: Option<String>,
    ) -> Self {
        Self {
            font_family: font_family.into(),
            font_size,
            background_color,
        }
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed
    /// into a valid [`Color`].
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }

    /// The text definition shared by every label of a diagram.
    pub fn text_definition(&self) -> TextDefinition {
        let mut text = TextDefinition::new();
        text.set_font_family(&self.font_family);
        text.set_font_size(self.font_size);
        text
    }
}

/// Canvas and raster configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    canvas_width: f32,
    canvas_height: f32,
    /// Margin added around the drawn content when cropping.
    padding: f32,
    raster_scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas_width: 2000.0,
            canvas_height: 2000.0,
            padding: 10.0,
            raster_scale: 1.0,
        }
    }
}

impl RenderConfig {
    pub fn new(canvas_width: f32, canvas_height: f32, padding: f32, raster_scale: f32) -> Self {
        Self {
            canvas_width,
            canvas_height,
            padding,
            raster_scale,
        }
    }

    pub fn canvas_width(&self) -> f32 {
        self.canvas_width
    }

    pub fn canvas_height(&self) -> f32 {
        self.canvas_height
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    pub fn raster_scale(&self) -> f32 {
        self.raster_scale
    }
}
