//! Full design-kit assembly
//!
//! Orchestrates the other services into a complete kit for a culture:
//! pattern batches, per-image palettes and relevance scores, AI metadata
//! from the first pattern, a cultural note, and the tool export formats.

use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::Settings;
use crate::schemas::kit::{KitAssets, KitMetadata, PaletteEntry, PatternRecord};

use super::analysis::CultureAnalyzer;
use super::export::{export_kit_formats, ExportError};
use super::gemini::{client::title_case, AspectRatio, ClientError, GeminiClient};
use super::generator::{build_pattern_prompt, PatternGenerator};
use super::notes;
use super::palette::{self, PaletteError};
use super::scoring::{mime_type_for, score_image};

/// Image batches requested per kit
pub const KIT_BATCHES: u32 = 3;
/// Samples requested per batch
pub const SAMPLES_PER_BATCH: u32 = 4;
/// Colors extracted per pattern palette
const KIT_PALETTE_SIZE: u8 = 6;

#[derive(Error, Debug)]
pub enum KitError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Palette(#[from] PaletteError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("No pattern images could be generated")]
    NoPatterns,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize kit metadata: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result of a kit build
pub struct KitSummary {
    pub kit_dir: PathBuf,
    pub metadata: KitMetadata,
    pub exports: BTreeMap<String, PathBuf>,
}

/// Assembles complete design kits
pub struct KitBuilder {
    client: Arc<GeminiClient>,
    generator: Arc<PatternGenerator>,
    settings: Arc<Settings>,
}

impl KitBuilder {
    pub fn new(
        client: Arc<GeminiClient>,
        generator: Arc<PatternGenerator>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            client,
            generator,
            settings,
        }
    }

    /// Build a complete kit for a culture into `<assets>/<culture>_kit`
    pub async fn build_kit(&self, culture: &str) -> Result<KitSummary, KitError> {
        let culture = culture.to_lowercase();
        let kit_dir = self.settings.kit_dir(&culture);
        std::fs::create_dir_all(&kit_dir)?;

        // Details enrich the image prompt but their absence never blocks a
        // kit; the generator's per-process cache answers repeat builds
        let details = match self.generator.culture_details(&culture).await {
            Ok(details) => details,
            Err(err) => {
                tracing::warn!(culture, error = %err, "Could not fetch culture details");
                String::new()
            }
        };

        let pattern_paths = self.generate_pattern_batches(&culture, &details, &kit_dir).await?;
        let score_prompt = self.score_prompt(&culture).await;

        let mut patterns = Vec::with_capacity(pattern_paths.len());
        let mut palettes = Vec::with_capacity(pattern_paths.len());
        let mut pattern_metadata = Vec::with_capacity(pattern_paths.len());

        for path in &pattern_paths {
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            match palette::extract_palette(path, KIT_PALETTE_SIZE) {
                Ok((colors, _)) => palettes.push(PaletteEntry {
                    colors,
                    source_image: filename.clone(),
                    note: palette_note(&filename),
                }),
                Err(err) => {
                    tracing::warn!(image = %filename, error = %err, "Palette extraction failed");
                }
            }

            let score = match std::fs::read(path) {
                Ok(bytes) => {
                    match score_image(&self.client, &bytes, mime_type_for(path), &score_prompt)
                        .await
                    {
                        Ok(score) => Some(score),
                        Err(err) => {
                            tracing::warn!(image = %filename, error = %err, "Scoring failed");
                            None
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(image = %filename, error = %err, "Could not read image");
                    None
                }
            };

            pattern_metadata.push(PatternRecord {
                image: filename.clone(),
                score,
                score_prompt: score_prompt.clone(),
            });
            patterns.push(filename);
        }

        // Metadata analysis runs against the first pattern only
        let analyzer = CultureAnalyzer::new(self.client.clone());
        let ai_analysis = match analyzer.generate_metadata(&culture, &pattern_paths[0]).await {
            Ok(analysis) => Some(analysis),
            Err(err) => {
                tracing::warn!(culture, error = %err, "Culture analysis failed");
                None
            }
        };

        let briefs = vec![notes::cultural_note(&self.client, &culture).await];

        let metadata = KitMetadata {
            culture: culture.clone(),
            generated_at: chrono::Utc::now(),
            generated_by: "AI Image Analysis + Pattern Generation".to_string(),
            version: "2.0".to_string(),
            assets: KitAssets {
                patterns,
                palettes,
                briefs,
                pattern_metadata,
            },
            ai_analysis,
            export_formats: ["SVG", "PNG", "CSS", "JSON", "Figma", "Canva"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            compatible_platforms: ["Figma", "Canva", "Webflow", "Adobe Creative Suite"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        std::fs::write(
            kit_dir.join("kit_metadata.json"),
            serde_json::to_string_pretty(&metadata)?,
        )?;
        if let Some(analysis) = &metadata.ai_analysis {
            std::fs::write(
                kit_dir.join(format!("{}_ai_analysis.json", culture)),
                serde_json::to_string_pretty(analysis)?,
            )?;
        }

        let exports = export_kit_formats(&kit_dir, &metadata)?;
        tracing::info!(culture, kit_dir = %kit_dir.display(), "Kit assembled");

        Ok(KitSummary {
            kit_dir,
            metadata,
            exports,
        })
    }

    /// Generate the image batches, numbering files across batches.
    ///
    /// Later batches may fail without sinking the kit; a kit with zero
    /// images is an error.
    async fn generate_pattern_batches(
        &self,
        culture: &str,
        details: &str,
        kit_dir: &Path,
    ) -> Result<Vec<PathBuf>, KitError> {
        let prompt = build_pattern_prompt(culture, details);
        let mut paths = Vec::new();
        let mut index = 0u32;

        for batch in 1..=KIT_BATCHES {
            match self
                .client
                .generate_image(&prompt, SAMPLES_PER_BATCH, AspectRatio::Square)
                .await
            {
                Ok(images) => {
                    for bytes in images {
                        index += 1;
                        let path = kit_dir.join(format!("{}_pattern_{}.png", culture, index));
                        std::fs::write(&path, &bytes)?;
                        paths.push(path);
                    }
                }
                Err(err) => {
                    tracing::warn!(culture, batch, error = %err, "Pattern batch failed");
                }
            }
        }

        if paths.is_empty() {
            return Err(KitError::NoPatterns);
        }
        Ok(paths)
    }

    /// Description the patterns are scored against
    async fn score_prompt(&self, culture: &str) -> String {
        let prompt = format!(
            "In one short sentence, describe an authentic {} textile pattern for use as an \
             image-matching description. Respond with only the sentence.",
            title_case(culture)
        );
        match self.client.generate_text(&prompt).await {
            Ok(description) => description,
            Err(err) => {
                tracing::warn!(culture, error = %err, "Score prompt generation failed");
                fallback_score_prompt(culture)
            }
        }
    }
}

/// Build a standalone bundle for one image: palette plus cultural note,
/// written as `<stem>_bundle.json` next to the image.
pub async fn build_bundle(
    client: &GeminiClient,
    image_path: &Path,
    culture: &str,
) -> Result<PathBuf, KitError> {
    let (colors, _) = palette::extract_palette(image_path, KIT_PALETTE_SIZE)?;
    let note = notes::cultural_note(client, culture).await;

    let filename = image_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let bundle = json!({
        "image": filename,
        "culture": culture,
        "palette": colors,
        "note": note,
    });

    let bundle_path = image_path.with_file_name(format!(
        "{}_bundle.json",
        image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
    ));
    std::fs::write(&bundle_path, serde_json::to_string_pretty(&bundle)?)?;
    Ok(bundle_path)
}

/// Static fallback description when the model cannot supply one
pub fn fallback_score_prompt(culture: &str) -> String {
    format!(
        "{} textile pattern, authentic cultural motifs",
        title_case(culture)
    )
}

/// Human-readable provenance note for an extracted palette
fn palette_note(filename: &str) -> String {
    let stem = filename.rsplit_once('.').map_or(filename, |(stem, _)| stem);
    format!("Color palette extracted from {}", stem.replace('_', " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_note_from_filename() {
        assert_eq!(
            palette_note("yoruba_pattern_1.png"),
            "Color palette extracted from yoruba pattern 1"
        );
    }

    #[test]
    fn test_fallback_score_prompt() {
        assert_eq!(
            fallback_score_prompt("maori"),
            "Maori textile pattern, authentic cultural motifs"
        );
    }
}
