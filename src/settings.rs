use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::overlay::Position;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub font_family: String,
    pub color: Option<String>,
    pub position: Position,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f32>,
    pub background_padding: Option<f32>,
    pub font_path: Option<String>,
    pub load_system_fonts: bool,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_family: "Inter, system-ui, sans-serif".to_string(),
            color: None,
            position: Position::Bottom,
            stroke_color: None,
            stroke_width: None,
            background_padding: None,
            font_path: None,
            load_system_fonts: true,
            server_addr: "127.0.0.1:8787".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    overlay: Option<OverlaySettings>,
    fonts: Option<FontSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OverlaySettings {
    font_family: Option<String>,
    color: Option<String>,
    position: Option<String>,
    stroke_color: Option<String>,
    stroke_width: Option<f32>,
    background_padding: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    font_path: Option<String>,
    load_system_fonts: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

/// Embedded defaults, then `./settings.toml`, `./settings.local.toml`, the
/// same pair under `~/.pixova-overlay`, then `extra_path`. Later files win.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults);

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(overlay) = incoming.overlay {
            if let Some(family) = non_blank(overlay.font_family) {
                self.font_family = family;
            }
            if let Some(color) = non_blank(overlay.color) {
                self.color = Some(color);
            }
            if let Some(position) = non_blank(overlay.position) {
                self.position = Position::parse(&position);
            }
            if let Some(color) = non_blank(overlay.stroke_color) {
                self.stroke_color = Some(color);
            }
            if let Some(width) = overlay.stroke_width {
                if width > 0.0 {
                    self.stroke_width = Some(width);
                }
            }
            if let Some(padding) = overlay.background_padding {
                if padding >= 0.0 {
                    self.background_padding = Some(padding);
                }
            }
        }
        if let Some(fonts) = incoming.fonts {
            if let Some(path) = non_blank(fonts.font_path) {
                self.font_path = Some(path);
            }
            if let Some(load) = fonts.load_system_fonts {
                self.load_system_fonts = load;
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = non_blank(server.addr) {
                self.server_addr = addr;
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".pixova-overlay"))
        }
    })
}
