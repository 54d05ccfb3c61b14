//! Kit export formats
//!
//! Serializes a kit's metadata into the payloads design tools consume:
//! CSS variables, plain JSON, Figma plugin data, and Canva template data.
//! Pure passthrough of already-generated data; no model calls.

use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schemas::kit::{KitMetadata, PaletteEntry};

use super::analysis::{fallback_elements, fallback_fonts};
use super::gemini::client::title_case;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Render a palette as CSS custom properties
pub fn export_to_css(palette: &PaletteEntry) -> String {
    let mut css = format!("/* {} */\n:root {{\n", palette.note);
    for (i, color) in palette.colors.iter().enumerate() {
        css.push_str(&format!("  --color-{}: {};\n", i + 1, color));
    }
    css.push_str("}\n");
    css
}

/// Figma plugin payload for a kit
pub fn create_figma_data(metadata: &KitMetadata, kit_dir: &Path) -> serde_json::Value {
    let culture_title = title_case(&metadata.culture);
    let (fonts, elements) = fonts_and_elements(metadata);

    let images: Vec<serde_json::Value> = metadata
        .assets
        .patterns
        .iter()
        .filter_map(|name| {
            let path = kit_dir.join(name);
            let size = std::fs::metadata(&path).ok()?.len();
            Some(json!({
                "name": name,
                "path": name,
                "type": "pattern",
                "size": size,
            }))
        })
        .collect();

    json!({
        "name": format!("{} Cultural Design Kit", culture_title),
        "description": format!(
            "AI-generated design assets inspired by {} culture",
            metadata.culture
        ),
        "colors": collect_unique_colors(metadata),
        "images": images,
        "fonts": fonts,
        "elements": elements,
        "ai_analysis": &metadata.ai_analysis,
        "metadata": metadata,
    })
}

/// Canva template payload for a kit
pub fn create_canva_data(metadata: &KitMetadata) -> serde_json::Value {
    let culture_title = title_case(&metadata.culture);
    let (fonts, elements) = fonts_and_elements(metadata);

    json!({
        "template_name": format!("{} Cultural Template", culture_title),
        "brand_kit": {
            "colors": collect_unique_colors(metadata),
            "fonts": fonts,
            "elements": elements,
        },
        "assets": &metadata.assets,
        "ai_analysis": &metadata.ai_analysis,
        "usage_guidelines": format!(
            "Use these {} cultural elements respectfully and authentically",
            metadata.culture
        ),
        "generated_at": metadata.generated_at,
        "version": &metadata.version,
    })
}

/// Write all export formats into the kit directory.
///
/// Returns a map of format name to written path.
pub fn export_kit_formats(
    kit_dir: &Path,
    metadata: &KitMetadata,
) -> Result<BTreeMap<String, PathBuf>, ExportError> {
    let mut exports = BTreeMap::new();

    if let Some(palette) = metadata.assets.palettes.first() {
        let css_path = kit_dir.join("palette.css");
        std::fs::write(&css_path, export_to_css(palette))?;
        exports.insert("css".to_string(), css_path);
    }

    let json_path = kit_dir.join("kit_data.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(metadata)?)?;
    exports.insert("json".to_string(), json_path);

    let figma_path = kit_dir.join("figma_plugin.json");
    let figma = create_figma_data(metadata, kit_dir);
    std::fs::write(&figma_path, serde_json::to_string_pretty(&figma)?)?;
    exports.insert("figma".to_string(), figma_path);

    let canva_path = kit_dir.join("canva_template.json");
    let canva = create_canva_data(metadata);
    std::fs::write(&canva_path, serde_json::to_string_pretty(&canva)?)?;
    exports.insert("canva".to_string(), canva_path);

    Ok(exports)
}

/// Extracted palette colors plus AI colors, deduplicated in first-seen order
fn collect_unique_colors(metadata: &KitMetadata) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut colors = Vec::new();

    let palette_colors = metadata
        .assets
        .palettes
        .iter()
        .flat_map(|p| p.colors.iter());
    let ai_colors = metadata
        .ai_analysis
        .iter()
        .flat_map(|a| a.colors.value.iter());

    for color in palette_colors.chain(ai_colors) {
        if seen.insert(color.clone()) {
            colors.push(color.clone());
        }
    }

    colors
}

/// Fonts and elements from AI analysis, or static defaults when no
/// analysis was produced
fn fonts_and_elements(metadata: &KitMetadata) -> (serde_json::Value, serde_json::Value) {
    match &metadata.ai_analysis {
        Some(analysis) => (
            json!(&analysis.fonts.value),
            json!(&analysis.elements.value),
        ),
        None => (json!(fallback_fonts()), json!(fallback_elements())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::kit::{Derived, KitAssets, PatternRecord};
    use chrono::Utc;

    fn test_metadata() -> KitMetadata {
        KitMetadata {
            culture: "yoruba".to_string(),
            generated_at: Utc::now(),
            generated_by: "AI Image Analysis + Pattern Generation".to_string(),
            version: "2.0".to_string(),
            assets: KitAssets {
                patterns: vec!["yoruba_pattern_1.png".to_string()],
                palettes: vec![
                    PaletteEntry {
                        colors: vec!["#112233".to_string(), "#445566".to_string()],
                        source_image: "yoruba_pattern_1.png".to_string(),
                        note: "Color palette extracted from yoruba pattern 1".to_string(),
                    },
                    PaletteEntry {
                        colors: vec!["#445566".to_string(), "#778899".to_string()],
                        source_image: "yoruba_pattern_2.png".to_string(),
                        note: "Color palette extracted from yoruba pattern 2".to_string(),
                    },
                ],
                briefs: vec![Derived::fallback("a note".to_string())],
                pattern_metadata: vec![PatternRecord {
                    image: "yoruba_pattern_1.png".to_string(),
                    score: Some(0.8),
                    score_prompt: "Yoruba textile".to_string(),
                }],
            },
            ai_analysis: None,
            export_formats: vec!["CSS".to_string()],
            compatible_platforms: vec!["Figma".to_string()],
        }
    }

    #[test]
    fn test_css_export() {
        let metadata = test_metadata();
        let css = export_to_css(&metadata.assets.palettes[0]);
        assert!(css.starts_with("/* Color palette extracted from yoruba pattern 1 */"));
        assert!(css.contains("--color-1: #112233;"));
        assert!(css.contains("--color-2: #445566;"));
        assert!(css.ends_with("}\n"));
    }

    #[test]
    fn test_colors_deduplicated_in_order() {
        let metadata = test_metadata();
        let colors = collect_unique_colors(&metadata);
        assert_eq!(
            colors,
            vec![
                "#112233".to_string(),
                "#445566".to_string(),
                "#778899".to_string()
            ]
        );
    }

    #[test]
    fn test_canva_payload_uses_fallback_fonts_without_analysis() {
        let metadata = test_metadata();
        let canva = create_canva_data(&metadata);
        assert_eq!(canva["template_name"], "Yoruba Cultural Template");
        assert!(canva["brand_kit"]["fonts"]
            .as_array()
            .unwrap()
            .contains(&json!("Nunito")));
    }

    #[test]
    fn test_export_kit_formats_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = test_metadata();

        let exports = export_kit_formats(dir.path(), &metadata).unwrap();
        assert_eq!(exports.len(), 4);
        for path in exports.values() {
            assert!(path.exists(), "missing export: {}", path.display());
        }

        let kit_data = std::fs::read_to_string(dir.path().join("kit_data.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&kit_data).unwrap();
        assert_eq!(parsed["culture"], "yoruba");
    }
}
