use anyhow::{Context, Result, anyhow};
use futures_util::future::try_join_all;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod error;
pub mod logging;
pub mod overlay;
pub mod server;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use error::{OverlayError, OverlayResult};
pub use overlay::{
    ContentBounds, ImageSource, OverlayConfig, OverlayEngine, OverlayLayout, OverlayOutput,
    Position,
};
pub use settings::Settings;

const DEFAULT_OUTPUT_SUFFIX: &str = "-with-text.png";

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub images: Vec<String>,
    pub text: Option<String>,
    pub style: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<String>,
    pub position: Option<String>,
    pub custom_x: Option<f32>,
    pub custom_y: Option<f32>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f32>,
    pub background_color: Option<String>,
    pub background_padding: Option<f32>,
    pub output: Option<String>,
    pub data_url: bool,
    pub explain: bool,
    pub show_styles: bool,
    pub settings_path: Option<String>,
}

pub async fn run(config: Config) -> Result<String> {
    if config.show_styles {
        return Ok(format_styles());
    }

    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    let text = config.text.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(anyhow!("--text is empty"));
    }
    if config.images.is_empty() {
        return Err(anyhow!("no --image given"));
    }

    let engine = OverlayEngine::new(&settings).with_context(|| "failed to load fonts")?;
    let sources: Vec<ImageSource> = config
        .images
        .iter()
        .map(|value| ImageSource::parse(value))
        .collect();
    let images = try_join_all(sources.iter().map(|source| engine.load(source))).await?;

    let mut prepared = Vec::with_capacity(images.len());
    for image in images {
        let overlay_config = build_overlay_config(&config, &settings, text, &image)?;
        prepared.push((image, overlay_config));
    }

    if config.explain {
        let layouts = prepared
            .iter()
            .map(|(image, overlay_config)| engine.layout(image, overlay_config))
            .collect::<OverlayResult<Vec<OverlayLayout>>>()?;
        return Ok(serde_json::to_string_pretty(&layouts)?);
    }

    let outputs = prepared
        .into_iter()
        .map(|(image, overlay_config)| engine.render(image, &overlay_config))
        .collect::<OverlayResult<Vec<OverlayOutput>>>()?;
    if config.data_url {
        return Ok(outputs
            .iter()
            .map(|output| output.to_data_url())
            .collect::<Vec<_>>()
            .join("\n"));
    }

    let paths = output_paths(&sources, config.output.as_deref())?;
    let mut lines = Vec::with_capacity(outputs.len());
    for (output, path) in outputs.iter().zip(paths) {
        std::fs::write(&path, &output.png)
            .with_context(|| format!("failed to write image: {}", path.display()))?;
        info!("wrote {}", path.display());
        lines.push(format!(
            "{} ({}x{}, {:.1}px)",
            path.display(),
            output.width,
            output.height,
            output.layout.font_size
        ));
    }
    Ok(lines.join("\n"))
}

/// Fills whatever the command line left open from the settings and the image
/// itself: size from the image height, colour from its brightness.
pub fn build_overlay_config(
    config: &Config,
    settings: &Settings,
    text: &str,
    image: &RgbaImage,
) -> Result<OverlayConfig> {
    let font_family = resolve_font_family(config, settings)?;
    let font_size = config
        .font_size
        .unwrap_or_else(|| overlay::optimal_font_size(image.height(), text.chars().count()));
    let color = config
        .color
        .clone()
        .or_else(|| settings.color.clone())
        .unwrap_or_else(|| {
            overlay::suggest_text_color(overlay::classify_brightness(image)).to_string()
        });
    let position = config
        .position
        .as_deref()
        .map(Position::parse)
        .unwrap_or(settings.position);

    let mut overlay = OverlayConfig::new(text, font_family, font_size, color);
    overlay.position = position;
    overlay.custom_x = config.custom_x;
    overlay.custom_y = config.custom_y;
    overlay.stroke_color = config
        .stroke_color
        .clone()
        .or_else(|| settings.stroke_color.clone());
    overlay.stroke_width = config.stroke_width.or(settings.stroke_width);
    overlay.background_color = config.background_color.clone();
    overlay.background_padding = config.background_padding.or(settings.background_padding);
    Ok(overlay)
}

fn resolve_font_family(config: &Config, settings: &Settings) -> Result<String> {
    if let Some(family) = config
        .font_family
        .as_deref()
        .filter(|value| !value.trim().is_empty())
    {
        return Ok(family.to_string());
    }
    if let Some(style) = config.style.as_deref() {
        return overlay::style_font(style)
            .map(|family| family.to_string())
            .ok_or_else(|| {
                let known: Vec<&str> = overlay::STYLE_FONTS.iter().map(|(name, _)| *name).collect();
                anyhow!("unknown style '{}' (expected one of: {})", style, known.join(", "))
            });
    }
    Ok(settings.font_family.clone())
}

/// One path per source. A single image writes to `output` verbatim; several
/// images go into `output` when it is a directory, otherwise get a numbered
/// suffix on its stem.
fn output_paths(sources: &[ImageSource], output: Option<&str>) -> Result<Vec<PathBuf>> {
    let Some(output) = output.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(sources
            .iter()
            .map(|source| PathBuf::from(format!("{}{}", source_stem(source), DEFAULT_OUTPUT_SUFFIX)))
            .collect());
    };
    let output = PathBuf::from(output);
    if output.is_dir() {
        return Ok(sources
            .iter()
            .map(|source| output.join(format!("{}{}", source_stem(source), DEFAULT_OUTPUT_SUFFIX)))
            .collect());
    }
    if sources.len() == 1 {
        return Ok(vec![output]);
    }
    let stem = output
        .file_stem()
        .and_then(|value| value.to_str())
        .ok_or_else(|| anyhow!("invalid output path: {}", output.display()))?
        .to_string();
    Ok((1..=sources.len())
        .map(|index| output.with_file_name(format!("{}-{}.png", stem, index)))
        .collect())
}

fn source_stem(source: &ImageSource) -> String {
    let stem = match source {
        ImageSource::Path(path) => path
            .file_stem()
            .and_then(|value| value.to_str())
            .map(|value| value.to_string()),
        ImageSource::Url(url) => url
            .split(['?', '#'])
            .next()
            .and_then(|value| value.rsplit('/').next())
            .and_then(|name| Path::new(name).file_stem())
            .and_then(|value| value.to_str())
            .map(|value| value.to_string()),
        ImageSource::DataUrl(_) | ImageSource::Bytes(_) => None,
    };
    stem.filter(|value| !value.is_empty())
        .unwrap_or_else(|| "logo".to_string())
}

fn format_styles() -> String {
    overlay::STYLE_FONTS
        .iter()
        .map(|(name, family)| format!("{}: {}", name, family))
        .collect::<Vec<_>>()
        .join("\n")
}
