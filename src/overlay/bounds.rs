use image::RgbaImage;
use serde::Serialize;

const MIN_ALPHA: u8 = 50;
const NEAR_WHITE: u8 = 240;
const NEAR_BLACK: u8 = 20;

/// Smallest box containing every foreground pixel, in source pixel
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBounds {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
    pub center_y: f32,
}

impl ContentBounds {
    pub fn full_canvas(width: u32, height: u32) -> Self {
        Self {
            top: 0,
            bottom: height,
            left: 0,
            right: width,
            center_y: height as f32 / 2.0,
        }
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

// Generated icons usually sit on a flat white or black backdrop, often fully
// opaque, so the backdrop extremes are excluded alongside transparent pixels.
fn is_foreground([r, g, b, a]: [u8; 4]) -> bool {
    if a <= MIN_ALPHA {
        return false;
    }
    let near_white = r > NEAR_WHITE && g > NEAR_WHITE && b > NEAR_WHITE;
    let near_black = r < NEAR_BLACK && g < NEAR_BLACK && b < NEAR_BLACK;
    !(near_white || near_black)
}

pub fn detect_content_bounds(image: &RgbaImage) -> ContentBounds {
    let (width, height) = image.dimensions();
    let mut min_x = u32::MAX;
    let mut max_x = 0u32;
    let mut min_y = u32::MAX;
    let mut max_y = 0u32;

    for (x, y, pixel) in image.enumerate_pixels() {
        if !is_foreground(pixel.0) {
            continue;
        }
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_x > max_x || min_y > max_y {
        return ContentBounds::full_canvas(width, height);
    }

    ContentBounds {
        top: min_y,
        bottom: max_y,
        left: min_x,
        right: max_x,
        center_y: (min_y + max_y) as f32 / 2.0,
    }
}
