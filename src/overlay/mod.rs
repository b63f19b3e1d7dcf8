mod bounds;
mod fit;
mod font;
mod loader;
mod placement;
mod render;
mod style;

use futures_util::future::try_join_all;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{OverlayError, OverlayResult};
use crate::settings::Settings;

pub use bounds::{ContentBounds, detect_content_bounds};
pub use fit::{FittedText, MARGIN_RATIO, fit_text, max_text_width, optimal_font_size};
pub use font::{FontBook, FontMetrics, measure_text_width_px};
pub use loader::{ImageSource, decode_image, load_image};
pub use placement::{Anchor, plan_position};
pub use render::{
    build_overlay_svg, composite, encode_png, outline_color, outline_width, to_data_url,
};
pub use style::{
    ImageBrightness, STYLE_FONTS, classify_brightness, style_font, suggest_text_color,
};

const DEFAULT_BACKGROUND_PADDING: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Position {
    Top,
    Center,
    #[default]
    Bottom,
    Custom,
}

impl Position {
    /// Unrecognised names fall back to `Bottom`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Self::Top,
            "center" | "centre" | "middle" => Self::Center,
            "custom" => Self::Custom,
            _ => Self::Bottom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
            Self::Custom => "custom",
        }
    }
}

impl From<String> for Position {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// Everything one overlay call needs to know about the text to draw.
///
/// Field names serialise in camelCase so the struct accepts the same JSON the
/// web editor already produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    pub color: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_padding: Option<f32>,
}

impl OverlayConfig {
    pub fn new(
        text: impl Into<String>,
        font_family: impl Into<String>,
        font_size: f32,
        color: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            font_family: font_family.into(),
            font_size,
            color: color.into(),
            position: Position::Bottom,
            custom_x: None,
            custom_y: None,
            stroke_color: None,
            stroke_width: None,
            background_color: None,
            background_padding: None,
        }
    }

    pub fn validate(&self) -> OverlayResult<()> {
        if self.text.trim().is_empty() {
            return Err(OverlayError::InvalidConfig("text is empty".to_string()));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(OverlayError::InvalidConfig(format!(
                "font size must be positive (got {})",
                self.font_size
            )));
        }
        Ok(())
    }

    /// Both coordinates, only when the position asks for them.
    pub fn custom_anchor(&self) -> Option<Anchor> {
        if self.position != Position::Custom {
            return None;
        }
        match (self.custom_x, self.custom_y) {
            (Some(x), Some(y)) => Some(Anchor { x, y }),
            _ => None,
        }
    }

    /// The outline colour, when an outline pass should be drawn at all.
    /// `stroke_width` is only a presence flag.
    pub fn outline(&self) -> Option<&str> {
        let color = self.stroke_color.as_deref().map(str::trim)?;
        let width = self.stroke_width?;
        if color.is_empty() || !(width > 0.0) {
            return None;
        }
        Some(color)
    }

    pub fn background(&self) -> Option<(&str, f32)> {
        let color = self.background_color.as_deref().map(str::trim)?;
        if color.is_empty() {
            return None;
        }
        // Zero counts as unset.
        let padding = self
            .background_padding
            .filter(|padding| padding.is_finite() && *padding > 0.0)
            .unwrap_or(DEFAULT_BACKGROUND_PADDING);
        Some((color, padding))
    }
}

/// Where the text ended up and why, for one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayLayout {
    pub width: u32,
    pub height: u32,
    pub bounds: ContentBounds,
    pub font_size: f32,
    pub text_width: f32,
    pub anchor: Anchor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline_width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_family: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OverlayOutput {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub layout: OverlayLayout,
}

impl OverlayOutput {
    pub fn to_data_url(&self) -> String {
        to_data_url(&self.png)
    }
}

/// Runs the load → detect → fit → plan → composite pipeline.
///
/// The font database and HTTP client are built once and only read afterwards,
/// so one engine can serve concurrent calls.
#[derive(Clone)]
pub struct OverlayEngine {
    fonts: FontBook,
    client: reqwest::Client,
}

impl OverlayEngine {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let font_path = settings.font_path.as_deref().map(std::path::Path::new);
        let fonts = FontBook::load(settings.load_system_fonts, font_path)?;
        Ok(Self::with_fonts(fonts))
    }

    pub fn with_fonts(fonts: FontBook) -> Self {
        Self {
            fonts,
            client: reqwest::Client::new(),
        }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub async fn load(&self, source: &ImageSource) -> OverlayResult<RgbaImage> {
        load_image(&self.client, source).await
    }

    /// Detection, fitting and planning without touching any pixels.
    pub fn layout(&self, image: &RgbaImage, config: &OverlayConfig) -> OverlayResult<OverlayLayout> {
        config.validate()?;
        let (width, height) = image.dimensions();
        let font = self.fonts.resolve(&config.font_family);
        let fitted = fit_text(&config.text, font.as_ref(), config.font_size, width);
        let bounds = detect_content_bounds(image);
        debug!(
            "content bounds: top={} bottom={} left={} right={}",
            bounds.top, bounds.bottom, bounds.left, bounds.right
        );
        let anchor = plan_position(
            &bounds,
            config.position,
            config.custom_anchor(),
            fitted.font_size,
            width,
            height,
        );
        debug!(
            "anchor ({:.1}, {:.1}) for position {} at {:.1}px",
            anchor.x,
            anchor.y,
            config.position.as_str(),
            fitted.font_size
        );
        Ok(OverlayLayout {
            width,
            height,
            bounds,
            font_size: fitted.font_size,
            text_width: fitted.width,
            anchor,
            outline_width: config.outline().map(|_| outline_width(fitted.font_size)),
            resolved_family: font.and_then(|font| font.family().map(|name| name.to_string())),
        })
    }

    /// The synchronous half of the pipeline, for an already loaded image.
    pub fn render(&self, image: RgbaImage, config: &OverlayConfig) -> OverlayResult<OverlayOutput> {
        let layout = self.layout(&image, config)?;
        let composed = composite(image, config, &layout, &self.fonts)?;
        let png = encode_png(&composed)?;
        Ok(OverlayOutput {
            png,
            width: composed.width(),
            height: composed.height(),
            layout,
        })
    }

    pub async fn apply_text_to_image(
        &self,
        source: &ImageSource,
        config: &OverlayConfig,
    ) -> OverlayResult<OverlayOutput> {
        config.validate()?;
        let image = self.load(source).await?;
        info!(
            "overlay: {} ({}x{})",
            source.describe(),
            image.width(),
            image.height()
        );
        self.render(image, config)
    }

    /// Same pipeline as [`apply_text_to_image`](Self::apply_text_to_image);
    /// kept separate so preview callers can be tuned independently.
    pub async fn generate_text_preview(
        &self,
        source: &ImageSource,
        config: &OverlayConfig,
    ) -> OverlayResult<OverlayOutput> {
        self.apply_text_to_image(source, config).await
    }

    /// Applies one config to several images. Loads run concurrently; results
    /// keep the input order and the first failure fails the batch.
    pub async fn apply_text_to_variations(
        &self,
        sources: &[ImageSource],
        config: &OverlayConfig,
    ) -> OverlayResult<Vec<OverlayOutput>> {
        config.validate()?;
        let images = try_join_all(sources.iter().map(|source| self.load(source))).await?;
        info!("overlay: {} variations", images.len());
        images
            .into_iter()
            .map(|image| self.render(image, config))
            .collect()
    }
}
