use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbaImage;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{OverlayError, OverlayResult};

/// Anything that resolves to encoded image bytes.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Url(String),
    Path(PathBuf),
    DataUrl(String),
    Bytes(Vec<u8>),
}

impl ImageSource {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else if lower.starts_with("data:") {
            Self::DataUrl(trimmed.to_string())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }

    /// Short label for logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Path(path) => path.display().to_string(),
            Self::DataUrl(url) => {
                let header = url.split(',').next().unwrap_or("data:");
                format!("{},...", header)
            }
            Self::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

/// Fetches and decodes `source` at its native resolution.
pub async fn load_image(client: &reqwest::Client, source: &ImageSource) -> OverlayResult<RgbaImage> {
    let label = source.describe();
    let bytes = match source {
        ImageSource::Url(url) => fetch_url(client, url).await?,
        ImageSource::Path(path) => tokio::fs::read(path)
            .await
            .map_err(|err| OverlayError::load(&label, err))?,
        ImageSource::DataUrl(url) => {
            decode_data_url(url).map_err(|reason| OverlayError::load(&label, reason))?
        }
        ImageSource::Bytes(bytes) => return decode_image(bytes, &label),
    };
    decode_image(&bytes, &label)
}

pub fn decode_image(bytes: &[u8], label: &str) -> OverlayResult<RgbaImage> {
    let image = image::load_from_memory(bytes).map_err(|err| OverlayError::load(label, err))?;
    let image = image.to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(OverlayError::load(label, "image has no pixels"));
    }
    debug!("decoded {} ({}x{})", label, image.width(), image.height());
    Ok(image)
}

async fn fetch_url(client: &reqwest::Client, url: &str) -> OverlayResult<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| OverlayError::load(url, err))?;
    if !response.status().is_success() {
        return Err(OverlayError::load(
            url,
            format!("status {}", response.status()),
        ));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|err| OverlayError::load(url, err))?;
    Ok(bytes.to_vec())
}

fn decode_data_url(url: &str) -> Result<Vec<u8>, String> {
    let rest = url
        .get(5..)
        .ok_or_else(|| "truncated data URL".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "data URL has no payload".to_string())?;
    if !header
        .split(';')
        .any(|part| part.trim().eq_ignore_ascii_case("base64"))
    {
        return Err("data URL is not base64-encoded".to_string());
    }
    let compact: String = payload.chars().filter(|ch| !ch.is_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|err| format!("invalid base64 payload: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode");
        bytes
    }

    #[test]
    fn parse_recognises_source_kinds() {
        assert!(matches!(
            ImageSource::parse("https://cdn.example.com/logo.png"),
            ImageSource::Url(_)
        ));
        assert!(matches!(
            ImageSource::parse("data:image/png;base64,AAAA"),
            ImageSource::DataUrl(_)
        ));
        assert!(matches!(
            ImageSource::parse("./logo.png"),
            ImageSource::Path(_)
        ));
    }

    #[tokio::test]
    async fn loads_data_url_at_native_size() {
        let url = format!("data:image/png;base64,{}", BASE64.encode(png_bytes(37, 21)));
        let image = load_image(&reqwest::Client::new(), &ImageSource::DataUrl(url))
            .await
            .expect("load");
        assert_eq!(image.dimensions(), (37, 21));
    }

    #[tokio::test]
    async fn loads_file_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("icon.png");
        std::fs::write(&path, png_bytes(12, 9)).expect("write");
        let image = load_image(&reqwest::Client::new(), &ImageSource::Path(path))
            .await
            .expect("load");
        assert_eq!(image.get_pixel(0, 0).0, [10, 120, 200, 255]);
    }

    #[tokio::test]
    async fn undecodable_bytes_are_a_load_error() {
        let err = load_image(
            &reqwest::Client::new(),
            &ImageSource::Bytes(b"<html>denied</html>".to_vec()),
        )
        .await
        .expect_err("should fail");
        assert!(matches!(err, OverlayError::Load { .. }));
    }

    #[test]
    fn rejects_non_base64_data_urls() {
        assert!(decode_data_url("data:image/png,abcd").is_err());
        assert!(decode_data_url("data:image/png;base64").is_err());
    }
}
