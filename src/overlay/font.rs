use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use ttf_parser::Face;
use usvg::fontdb;

const SANS_SERIF_CANDIDATES: &[&str] = &[
    "Inter",
    "Arial",
    "Helvetica",
    "Liberation Sans",
    "DejaVu Sans",
    "Noto Sans",
    "Roboto",
    "Open Sans",
    "FreeSans",
];
const SERIF_CANDIDATES: &[&str] = &[
    "Times New Roman",
    "Georgia",
    "Liberation Serif",
    "DejaVu Serif",
    "Noto Serif",
    "FreeSerif",
];
const MONOSPACE_CANDIDATES: &[&str] = &[
    "Courier New",
    "Liberation Mono",
    "DejaVu Sans Mono",
    "Noto Sans Mono",
    "FreeMono",
];

/// The font database shared by measurement and rasterisation.
#[derive(Clone)]
pub struct FontBook {
    db: Arc<fontdb::Database>,
    default_family: Option<String>,
}

impl FontBook {
    pub fn load(load_system_fonts: bool, font_path: Option<&Path>) -> Result<Self> {
        let mut db = fontdb::Database::new();
        if load_system_fonts {
            db.load_system_fonts();
        }
        if let Some(path) = font_path {
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read font: {}", path.display()))?;
            let before = db.len();
            db.load_font_data(data);
            if db.len() == before {
                return Err(anyhow!("failed to parse font: {}", path.display()));
            }
        }
        if db.is_empty() {
            return Err(anyhow!(
                "no font faces available; set [fonts] font_path or enable load_system_fonts"
            ));
        }
        let default_family = bind_generic_families(&mut db);
        debug!(
            "font database: {} faces, default family {:?}",
            db.len(),
            default_family
        );
        Ok(Self {
            db: Arc::new(db),
            default_family,
        })
    }

    /// No faces at all. Layout falls back to per-character estimates and
    /// rendering draws no glyphs.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(fontdb::Database::new()),
            default_family: None,
        }
    }

    /// Family used when nothing in a requested list is installed.
    pub fn default_family(&self) -> Option<&str> {
        self.default_family.as_deref()
    }

    pub fn database(&self) -> Arc<fontdb::Database> {
        self.db.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Resolves a CSS-style family list (`"Inter, system-ui, sans-serif"`) to
    /// the bold face the text will be drawn with.
    pub fn resolve(&self, family_list: &str) -> Option<FontMetrics> {
        if self.db.is_empty() {
            return None;
        }
        let names = split_family_list(family_list);
        let mut families: Vec<fontdb::Family<'_>> =
            names.iter().map(|name| to_family(name)).collect();
        if families.is_empty() {
            families.push(fontdb::Family::SansSerif);
        }
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight::BOLD,
            ..Default::default()
        };
        let fallback_families = match self.default_family.as_deref() {
            Some(name) => vec![fontdb::Family::Name(name), fontdb::Family::SansSerif],
            None => vec![fontdb::Family::SansSerif],
        };
        let fallback = fontdb::Query {
            families: &fallback_families,
            weight: fontdb::Weight::BOLD,
            ..Default::default()
        };
        let Some(id) = self.db.query(&query).or_else(|| self.db.query(&fallback)) else {
            warn!("no font found for '{}'", family_list);
            return None;
        };
        let family = self
            .db
            .face(id)
            .and_then(|info| info.families.first().map(|(name, _)| name.clone()));
        let units = self
            .db
            .with_face_data(id, |data, index| {
                Face::parse(data, index).ok().map(|face| face.units_per_em())
            })
            .flatten()?;
        Some(FontMetrics {
            db: self.db.clone(),
            id,
            units_per_em: units.max(1),
            family,
        })
    }
}

#[derive(Clone)]
pub struct FontMetrics {
    db: Arc<fontdb::Database>,
    id: fontdb::ID,
    units_per_em: u16,
    family: Option<String>,
}

impl FontMetrics {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    fn advance_em(&self, text: &str) -> Option<f32> {
        self.db
            .with_face_data(self.id, |data, index| {
                let face = Face::parse(data, index).ok()?;
                let space_advance = face
                    .glyph_index(' ')
                    .and_then(|id| face.glyph_hor_advance(id))
                    .unwrap_or(self.units_per_em / 2);
                let mut advance = 0u32;
                for ch in text.chars() {
                    if ch == '\n' {
                        continue;
                    }
                    let glyph_advance = face
                        .glyph_index(ch)
                        .and_then(|glyph| face.glyph_hor_advance(glyph))
                        .unwrap_or(space_advance);
                    advance = advance.saturating_add(glyph_advance as u32);
                }
                Some(advance as f32 / self.units_per_em as f32)
            })
            .flatten()
    }
}

/// Rendered width of a single line in pixels. Advance widths only, without
/// kerning or shaping.
pub fn measure_text_width_px(text: &str, font_size: f32, font: Option<&FontMetrics>) -> f32 {
    if let Some(em) = font.and_then(|font| font.advance_em(text)) {
        return em * font_size;
    }
    estimate_text_width_units(text) * font_size
}

// Bold sans proportions.
fn estimate_char_units_for_width(ch: char) -> f32 {
    if ch.is_whitespace() {
        0.25
    } else if ch.is_ascii_uppercase() {
        0.625
    } else if ch.is_ascii_alphanumeric() {
        0.5625
    } else if ch.is_ascii() {
        0.375
    } else if matches!(
        ch as u32,
        0x4E00..=0x9FFF | 0x3040..=0x30FF | 0x31F0..=0x31FF | 0xAC00..=0xD7AF
    ) {
        1.0
    } else {
        0.875
    }
}

fn estimate_text_width_units(text: &str) -> f32 {
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(estimate_char_units_for_width)
        .sum()
}

/// Points the generic CSS families at installed faces. fontdb's built-in
/// defaults name fonts that are often missing on Linux, in which case
/// `sans-serif` would match nothing. Returns the sans-serif choice.
fn bind_generic_families(db: &mut fontdb::Database) -> Option<String> {
    let any_family = db
        .faces()
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
    let sans = installed_family(db, SANS_SERIF_CANDIDATES).or(any_family);
    let serif = installed_family(db, SERIF_CANDIDATES).or_else(|| sans.clone());
    let mono = installed_family(db, MONOSPACE_CANDIDATES).or_else(|| sans.clone());
    if let Some(name) = &sans {
        db.set_sans_serif_family(name.clone());
        db.set_cursive_family(name.clone());
        db.set_fantasy_family(name.clone());
    }
    if let Some(name) = serif {
        db.set_serif_family(name);
    }
    if let Some(name) = mono {
        db.set_monospace_family(name);
    }
    sans
}

fn installed_family(db: &fontdb::Database, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|candidate| {
        db.faces().find_map(|face| {
            face.families
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(candidate))
                .map(|(name, _)| name.clone())
        })
    })
}

fn split_family_list(family_list: &str) -> Vec<String> {
    family_list
        .split(',')
        .map(|name| name.trim().trim_matches(|ch| ch == '"' || ch == '\'').trim())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .collect()
}

fn to_family(name: &str) -> fontdb::Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "sans-serif" | "system-ui" | "-apple-system" => fontdb::Family::SansSerif,
        "serif" => fontdb::Family::Serif,
        "monospace" => fontdb::Family::Monospace,
        "cursive" => fontdb::Family::Cursive,
        "fantasy" => fontdb::Family::Fantasy,
        _ => fontdb::Family::Name(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_css_family_lists() {
        assert_eq!(
            split_family_list("'Playfair Display', serif"),
            vec!["Playfair Display".to_string(), "serif".to_string()]
        );
        assert!(split_family_list(" , ").is_empty());
    }

    #[test]
    fn generic_names_map_to_generic_families() {
        assert_eq!(to_family("System-UI"), fontdb::Family::SansSerif);
        assert_eq!(to_family("serif"), fontdb::Family::Serif);
        assert_eq!(to_family("Inter"), fontdb::Family::Name("Inter"));
    }

    #[test]
    fn empty_book_resolves_nothing() {
        assert!(FontBook::empty().resolve("Inter, sans-serif").is_none());
    }

    #[test]
    fn estimate_scales_linearly_with_size() {
        let small = measure_text_width_px("Brand Co", 10.0, None);
        let large = measure_text_width_px("Brand Co", 40.0, None);
        assert_eq!(large, small * 4.0);
        assert_eq!(measure_text_width_px("ACME", 50.0, None), 125.0);
    }

    #[test]
    fn generic_families_resolve_to_installed_faces() {
        let Ok(book) = FontBook::load(true, None) else {
            return;
        };
        assert!(book.default_family().is_some());
        for list in [
            "sans-serif",
            "Inter, system-ui, sans-serif",
            "Playfair Display, serif",
            "No Such Family",
        ] {
            let metrics = book.resolve(list).expect("resolved face");
            assert!(metrics.family().is_some(), "{} has no family name", list);
        }
        let sans = book.resolve("sans-serif").expect("sans-serif");
        assert!(measure_text_width_px("ACME", 50.0, Some(&sans)) > 0.0);
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.ttf");
        assert!(FontBook::load(false, Some(&path)).is_err());
    }

    #[test]
    fn loading_nothing_is_an_error() {
        assert!(FontBook::load(false, None).is_err());
    }
}
