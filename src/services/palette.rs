//! Color palette extraction
//!
//! Extracts a dominant-color palette from a pattern image using median-cut
//! quantization and persists it as `<stem>_palette.json` next to the image.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Quantization quality: every Nth pixel is sampled (10 is the library's
/// recommended tradeoff).
const QUALITY: u8 = 10;

/// Default number of colors to extract
pub const DEFAULT_PALETTE_SIZE: u8 = 5;

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Image not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to quantize image: {0}")]
    Quantize(#[from] color_thief::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize palette: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Palette file shape: `{"palette": ["#rrggbb", ...]}`
#[derive(Debug, Serialize, Deserialize)]
pub struct PaletteFile {
    pub palette: Vec<String>,
}

/// Extract a palette of hex colors from image bytes already in memory
pub fn palette_from_bytes(bytes: &[u8], palette_size: u8) -> Result<Vec<String>, PaletteError> {
    let img = image::load_from_memory(bytes)?.to_rgb8();
    quantize(img.as_raw(), palette_size)
}

/// Extract a palette from an image file and save it as JSON beside the image.
///
/// Returns the hex colors and the path of the palette JSON.
pub fn extract_palette(
    image_path: &Path,
    palette_size: u8,
) -> Result<(Vec<String>, PathBuf), PaletteError> {
    if !image_path.exists() {
        return Err(PaletteError::NotFound(image_path.to_path_buf()));
    }

    let img = image::open(image_path)?.to_rgb8();
    let colors = quantize(img.as_raw(), palette_size)?;

    let output_path = palette_json_path(image_path);
    let file = PaletteFile {
        palette: colors.clone(),
    };
    std::fs::write(&output_path, serde_json::to_string_pretty(&file)?)?;

    tracing::info!(
        image = %image_path.display(),
        palette = ?colors,
        output = %output_path.display(),
        "Extracted palette"
    );

    Ok((colors, output_path))
}

/// `foo/bar.png` -> `foo/bar_palette.json`
pub fn palette_json_path(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("palette");
    image_path.with_file_name(format!("{}_palette.json", stem))
}

fn quantize(rgb_pixels: &[u8], palette_size: u8) -> Result<Vec<String>, PaletteError> {
    let colors = color_thief::get_palette(
        rgb_pixels,
        color_thief::ColorFormat::Rgb,
        QUALITY,
        // The quantizer needs at least 2 buckets
        palette_size.max(2),
    )?;

    Ok(colors
        .iter()
        .map(|c| format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn checkerboard_png() -> Vec<u8> {
        let mut img = RgbImage::new(32, 32);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = if (x / 8 + y / 8) % 2 == 0 {
                Rgb([200, 40, 40])
            } else {
                Rgb([40, 40, 200])
            };
        }
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        bytes
    }

    #[test]
    fn test_palette_from_bytes() {
        let png = checkerboard_png();
        let colors = palette_from_bytes(&png, 4).unwrap();
        assert!(!colors.is_empty());
        for color in &colors {
            assert!(color.starts_with('#'));
            assert_eq!(color.len(), 7);
        }
    }

    #[test]
    fn test_extract_palette_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("test_pattern.png");
        std::fs::write(&image_path, checkerboard_png()).unwrap();

        let (colors, json_path) = extract_palette(&image_path, 4).unwrap();
        assert!(!colors.is_empty());
        assert_eq!(json_path, dir.path().join("test_pattern_palette.json"));

        let contents = std::fs::read_to_string(&json_path).unwrap();
        let file: PaletteFile = serde_json::from_str(&contents).unwrap();
        assert_eq!(file.palette, colors);
    }

    #[test]
    fn test_missing_image_errors() {
        let result = extract_palette(Path::new("/nonexistent/image.png"), 5);
        assert!(matches!(result, Err(PaletteError::NotFound(_))));
    }

    #[test]
    fn test_palette_json_path() {
        assert_eq!(
            palette_json_path(Path::new("assets/yoruba_pattern_1.png")),
            PathBuf::from("assets/yoruba_pattern_1_palette.json")
        );
    }
}
