use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Default font family per visual style.
pub const STYLE_FONTS: &[(&str, &str)] = &[
    ("modern", "Inter, system-ui, sans-serif"),
    ("corporate", "Georgia, serif"),
    ("creative", "Montserrat, sans-serif"),
    ("minimalist", "Helvetica Neue, Arial, sans-serif"),
    ("vibrant", "Poppins, sans-serif"),
    ("elegant", "Playfair Display, serif"),
];

pub fn style_font(style: &str) -> Option<&'static str> {
    let style = style.trim();
    STYLE_FONTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(style))
        .map(|(_, family)| *family)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageBrightness {
    Light,
    Dark,
    Mixed,
}

/// Fill colour with the best contrast against an image of this brightness.
/// Mixed images get white, which reads well with an outline.
pub fn suggest_text_color(brightness: ImageBrightness) -> &'static str {
    match brightness {
        ImageBrightness::Light => "#000000",
        ImageBrightness::Dark | ImageBrightness::Mixed => "#FFFFFF",
    }
}

/// Mean luma, with transparency composited over white.
pub fn classify_brightness(image: &RgbaImage) -> ImageBrightness {
    let mut total = 0.0f64;
    let mut count = 0u64;
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let over_white = |channel: u8| channel as f32 * alpha + 255.0 * (1.0 - alpha);
        let luma = 0.299 * over_white(r) + 0.587 * over_white(g) + 0.114 * over_white(b);
        total += luma as f64;
        count += 1;
    }
    if count == 0 {
        return ImageBrightness::Mixed;
    }
    let mean = total / count as f64;
    if mean >= 170.0 {
        ImageBrightness::Light
    } else if mean <= 85.0 {
        ImageBrightness::Dark
    } else {
        ImageBrightness::Mixed
    }
}
