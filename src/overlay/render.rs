use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{Rgba, RgbaImage};
use std::io::Cursor;
use std::str::FromStr;
use tiny_skia::{ColorU8, Pixmap};
use tracing::debug;
use usvg::{Options, Tree};

use super::font::FontBook;
use super::{OverlayConfig, OverlayLayout};
use crate::error::{OverlayError, OverlayResult};

const OUTLINE_ON_WHITE: &str = "rgba(0, 0, 0, 0.4)";
const OUTLINE_ON_OTHER: &str = "rgba(255, 255, 255, 0.4)";

/// Outline thickness follows the font size; the caller's stroke width only
/// switches the pass on.
pub fn outline_width(font_size: f32) -> f32 {
    (font_size / 25.0).max(0.5)
}

/// The outline is there for contrast, so anything other than an explicit
/// `rgba(...)` becomes a 40% black or white halo.
pub fn outline_color(stroke_color: &str) -> String {
    let trimmed = stroke_color.trim();
    if trimmed.to_ascii_lowercase().starts_with("rgba") {
        return trimmed.to_string();
    }
    if is_white(trimmed) {
        OUTLINE_ON_WHITE.to_string()
    } else {
        OUTLINE_ON_OTHER.to_string()
    }
}

/// SVG document holding only the overlay layers (background box, outline,
/// fill), sized to the canvas.
pub fn build_overlay_svg(config: &OverlayConfig, layout: &OverlayLayout) -> String {
    let OverlayLayout {
        width,
        height,
        font_size,
        text_width,
        anchor,
        ..
    } = layout;
    let family = match layout.resolved_family.as_deref() {
        Some(resolved) => format!("'{}', {}", resolved, config.font_family),
        None => config.font_family.clone(),
    };
    let text = escape_xml(&config.text);

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    ));

    if let Some((color, padding)) = config.background() {
        let box_w = text_width + padding * 2.0;
        let box_h = font_size + padding * 2.0;
        svg.push_str(&format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" {fill}/>"#,
            x = anchor.x - box_w / 2.0,
            y = anchor.y - box_h / 2.0,
            w = box_w,
            h = box_h,
            fill = paint_attrs("fill", color)
        ));
    }

    let text_attrs = format!(
        r#"x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="bold" text-anchor="middle" dominant-baseline="central" xml:space="preserve""#,
        x = anchor.x,
        y = anchor.y,
        family = escape_xml(&family),
        size = font_size
    );

    if let Some(stroke) = config.outline() {
        svg.push_str(&format!(
            r#"<text {attrs} fill="none" {stroke} stroke-width="{width}" stroke-linejoin="round" stroke-miterlimit="2">{text}</text>"#,
            attrs = text_attrs,
            stroke = paint_attrs("stroke", &outline_color(stroke)),
            width = outline_width(*font_size),
            text = text
        ));
    }

    svg.push_str(&format!(
        r#"<text {attrs} {fill}>{text}</text>"#,
        attrs = text_attrs,
        fill = paint_attrs("fill", &config.color),
        text = text
    ));
    svg.push_str("</svg>");
    svg
}

/// Paints the overlay layers over `image`. The source pixels are the base
/// layer and the canvas keeps the source dimensions.
pub fn composite(
    image: RgbaImage,
    config: &OverlayConfig,
    layout: &OverlayLayout,
    fonts: &FontBook,
) -> OverlayResult<RgbaImage> {
    if !fonts.is_empty() && layout.resolved_family.is_none() {
        return Err(OverlayError::render(format!(
            "no installed font matches '{}'",
            config.font_family
        )));
    }
    let svg = build_overlay_svg(config, layout);
    let mut options = Options {
        fontdb: fonts.database(),
        ..Options::default()
    };
    if let Some(family) = fonts.default_family() {
        options.font_family = family.to_string();
    }
    let tree = Tree::from_str(&svg, &options).map_err(OverlayError::render)?;

    let mut pixmap = pixmap_from_image(&image)?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    debug!(
        "composited '{}' at {:.1}px onto {}x{}",
        config.text,
        layout.font_size,
        image.width(),
        image.height()
    );
    Ok(image_from_pixmap(&pixmap))
}

pub fn encode_png(image: &RgbaImage) -> OverlayResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(OverlayError::render)?;
    Ok(bytes)
}

pub fn to_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

fn pixmap_from_image(image: &RgbaImage) -> OverlayResult<Pixmap> {
    let (width, height) = image.dimensions();
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        OverlayError::render(format!("cannot allocate {}x{} surface", width, height))
    })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

fn image_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    image
}

fn paint_attrs(name: &str, color: &str) -> String {
    format!(r#"{}="{}""#, name, escape_xml(color.trim()))
}

/// Opaque white in any CSS spelling (`#fff`, `white`, `rgb(255,255,255)`).
fn is_white(color: &str) -> bool {
    svgtypes::Color::from_str(color)
        .map(|color| {
            color.red == 255 && color.green == 255 && color.blue == 255 && color.alpha == 255
        })
        .unwrap_or(false)
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
