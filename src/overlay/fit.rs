use serde::Serialize;
use tracing::debug;

use super::font::{FontMetrics, measure_text_width_px};

/// Share of the canvas kept clear at each edge.
pub const MARGIN_RATIO: f32 = 0.12;
const FIT_SAFETY: f32 = 0.95;
const MIN_OPTIMAL_FONT_SIZE: f32 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FittedText {
    pub font_size: f32,
    pub width: f32,
}

pub fn max_text_width(canvas_width: u32) -> f32 {
    let width = canvas_width as f32;
    width - 2.0 * width * MARGIN_RATIO
}

/// Shrinks `font_size` until `text` fits between the side margins.
///
/// Advance widths scale linearly with size, so one proportional correction
/// lands inside the limit; the 5% slack absorbs rasteriser differences.
pub fn fit_text(
    text: &str,
    font: Option<&FontMetrics>,
    font_size: f32,
    canvas_width: u32,
) -> FittedText {
    let max_width = max_text_width(canvas_width);
    let width = measure_text_width_px(text, font_size, font);
    if width <= max_width || width <= 0.0 {
        return FittedText { font_size, width };
    }
    let fitted_size = font_size * (max_width / width) * FIT_SAFETY;
    let fitted_width = measure_text_width_px(text, fitted_size, font);
    debug!(
        "text {:.1}px wider than {:.1}px; font {:.1} -> {:.1}",
        width, max_width, font_size, fitted_size
    );
    FittedText {
        font_size: fitted_size,
        width: fitted_width,
    }
}

/// Starting size for brand text: about 12% of the image height, smaller for
/// long strings, kept between 28px and 15% of the height.
pub fn optimal_font_size(image_height: u32, text_len: usize) -> f32 {
    let height = image_height as f32;
    let base = height * 0.12;
    let length_factor = if text_len > 12 {
        0.7
    } else if text_len > 8 {
        0.85
    } else if text_len > 5 {
        0.95
    } else {
        1.0
    };
    (base * length_factor)
        .min(height * 0.15)
        .max(MIN_OPTIMAL_FONT_SIZE)
}
