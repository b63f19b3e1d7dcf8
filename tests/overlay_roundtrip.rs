use image::{Rgba, RgbaImage};
use pixova_overlay::overlay::{FontBook, encode_png, max_text_width, optimal_font_size};
use pixova_overlay::{ImageSource, OverlayConfig, OverlayEngine, Position};

fn logo(width: u32, height: u32) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    for y in height / 5..height / 2 {
        for x in width / 3..width * 2 / 3 {
            image.put_pixel(x, y, Rgba([220, 40, 90, 255]));
        }
    }
    image
}

#[tokio::test]
async fn output_keeps_source_dimensions() {
    let engine = OverlayEngine::with_fonts(FontBook::empty());
    for (width, height) in [(1536, 1536), (640, 360), (90, 300)] {
        let png = encode_png(&logo(width, height)).expect("encode source");
        let mut config = OverlayConfig::new("Northwind Traders", "sans-serif", 96.0, "#FFFFFF");
        config.stroke_color = Some("#FFFFFF".to_string());
        config.stroke_width = Some(1.0);
        config.background_color = Some("rgba(0,0,0,0.5)".to_string());

        let output = engine
            .apply_text_to_image(&ImageSource::Bytes(png), &config)
            .await
            .expect("overlay");
        let decoded = image::load_from_memory(&output.png).expect("decode output");
        assert_eq!((decoded.width(), decoded.height()), (width, height));
        assert_eq!((output.width, output.height), (width, height));
        assert!(output.layout.text_width <= width as f32 * 0.76 + 0.01);
    }
}

#[tokio::test]
async fn preview_matches_full_render() {
    let engine = OverlayEngine::with_fonts(FontBook::empty());
    let png = encode_png(&logo(400, 400)).expect("encode source");
    let mut config = OverlayConfig::new("ACME", "sans-serif", 40.0, "#222222");
    config.position = Position::Top;

    let full = engine
        .apply_text_to_image(&ImageSource::Bytes(png.clone()), &config)
        .await
        .expect("overlay");
    let preview = engine
        .generate_text_preview(&ImageSource::Bytes(png), &config)
        .await
        .expect("preview");
    assert_eq!(full.png, preview.png);
    assert_eq!(full.layout, preview.layout);
}

#[tokio::test]
async fn missing_file_is_a_load_error() {
    let engine = OverlayEngine::with_fonts(FontBook::empty());
    let dir = tempfile::tempdir().expect("tempdir");
    let source = ImageSource::parse(&dir.path().join("missing.png").display().to_string());
    let config = OverlayConfig::new("ACME", "sans-serif", 40.0, "#222222");
    let err = engine
        .apply_text_to_image(&source, &config)
        .await
        .expect_err("missing file");
    assert!(matches!(err, pixova_overlay::OverlayError::Load { .. }));
}

fn system_engine() -> Option<OverlayEngine> {
    FontBook::load(true, None).ok().map(OverlayEngine::with_fonts)
}

fn painted(image: &RgbaImage, matches: impl Fn([u8; 4]) -> bool) -> Vec<(u32, u32)> {
    image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| matches(pixel.0))
        .map(|(x, y, _)| (x, y))
        .collect()
}

#[tokio::test]
async fn default_families_draw_fill_glyphs() {
    let Some(engine) = system_engine() else {
        return;
    };
    let text = "ENTERPRISE SOLUTIONS";
    let canvas = RgbaImage::from_pixel(1536, 1536, Rgba([255, 255, 255, 255]));
    let png = encode_png(&canvas).expect("encode source");

    for family in ["sans-serif", "Inter, system-ui, sans-serif", "Georgia, serif"] {
        let size = optimal_font_size(1536, text.chars().count());
        let config = OverlayConfig::new(text, family, size, "#ff0000");
        let output = engine
            .apply_text_to_image(&ImageSource::Bytes(png.clone()), &config)
            .await
            .expect("overlay");
        assert!(output.layout.resolved_family.is_some(), "{} unresolved", family);

        let decoded = image::load_from_memory(&output.png).expect("decode").to_rgba8();
        let red = painted(&decoded, |[r, g, b, _]| r >= 200 && g <= 60 && b <= 60);
        assert!(!red.is_empty(), "{} drew no glyphs", family);

        let min_x = red.iter().map(|(x, _)| *x).min().unwrap_or(0);
        let max_x = red.iter().map(|(x, _)| *x).max().unwrap_or(0);
        assert!((max_x - min_x + 1) as f32 <= max_text_width(1536) + 2.0);

        let anchor = output.layout.anchor;
        let font_size = output.layout.font_size;
        assert!(
            red.iter()
                .all(|(_, y)| (*y as f32 - anchor.y).abs() <= font_size),
            "{} glyphs strayed from the anchor row",
            family
        );
    }
}

#[tokio::test]
async fn outline_is_drawn_under_the_fill() {
    let Some(engine) = system_engine() else {
        return;
    };
    let canvas = RgbaImage::from_pixel(800, 400, Rgba([0, 0, 255, 255]));
    let png = encode_png(&canvas).expect("encode source");
    let mut config = OverlayConfig::new("ACME", "sans-serif", 100.0, "#ff0000");
    config.stroke_color = Some("#FFFFFF".to_string());
    config.stroke_width = Some(1.0);

    let output = engine
        .apply_text_to_image(&ImageSource::Bytes(png), &config)
        .await
        .expect("overlay");
    assert_eq!(output.layout.outline_width, Some(4.0));

    let decoded = image::load_from_memory(&output.png).expect("decode").to_rgba8();
    // 40% black over pure blue.
    let halo = painted(&decoded, |[r, g, b, _]| {
        r <= 10 && g <= 10 && (130..=175).contains(&b)
    });
    let fill = painted(&decoded, |[r, g, b, _]| r >= 200 && g <= 60 && b <= 60);
    assert!(!halo.is_empty());
    assert!(!fill.is_empty());
}
