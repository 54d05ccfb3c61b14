//! AI-driven culture metadata from image analysis
//!
//! Derives fonts, design elements, colors, pattern descriptions, and a
//! design brief from a generated pattern image. Every field degrades
//! independently to a static default when its model call or JSON parse
//! fails; the `Derived` marker records which happened.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::schemas::kit::{CultureMetadata, Derived, DesignBrief, DesignElement, PatternStyle};

use super::gemini::GeminiClient;
use super::palette;
use super::scoring::mime_type_for;

/// Colors requested from the quantizer for the analysis palette
const ANALYSIS_PALETTE_SIZE: u8 = 8;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Generates culture-specific design metadata by analyzing pattern images
pub struct CultureAnalyzer {
    client: Arc<GeminiClient>,
}

impl CultureAnalyzer {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }

    /// Complete metadata for one culture from one image
    pub async fn generate_metadata(
        &self,
        culture: &str,
        image_path: &Path,
    ) -> Result<CultureMetadata, AnalysisError> {
        if !image_path.exists() {
            return Err(AnalysisError::ImageNotFound(image_path.to_path_buf()));
        }
        let image = std::fs::read(image_path)?;
        let mime_type = mime_type_for(image_path);

        Ok(self
            .analyze_bytes(culture, &image, mime_type, image_path.display().to_string())
            .await)
    }

    /// Complete metadata from already-loaded image bytes
    pub async fn analyze_bytes(
        &self,
        culture: &str,
        image: &[u8],
        mime_type: &str,
        source_image: String,
    ) -> CultureMetadata {
        CultureMetadata {
            culture: culture.to_string(),
            source_image,
            fonts: self.generate_fonts(culture, image, mime_type).await,
            elements: self.generate_elements(culture, image, mime_type).await,
            colors: self.generate_colors(culture, image).await,
            patterns: self.generate_patterns(culture, image, mime_type).await,
            brief: self.generate_brief(culture, image, mime_type, "modern").await,
            generated_by: "AI Image Analysis".to_string(),
            version: "2.0".to_string(),
        }
    }

    /// Fonts complementing the image's visual style
    pub async fn generate_fonts(
        &self,
        culture: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Derived<Vec<String>> {
        let prompt = format!(
            "Analyze this {culture} cultural design image and identify 4-6 appropriate fonts \
             that would complement the visual style.\n\n\
             Consider:\n\
             - The overall aesthetic and mood of the design\n\
             - Cultural authenticity and respect\n\
             - Readability and modern usability\n\
             - Font availability on common platforms\n\n\
             Return ONLY a JSON array of font names, like:\n\
             [\"Font Name 1\", \"Font Name 2\", \"Font Name 3\"]\n\n\
             Focus on fonts that would work well with this specific design style."
        );

        self.analyze_list(culture, image, mime_type, &prompt, "fonts", fallback_fonts)
            .await
    }

    /// Design elements visible in the image
    pub async fn generate_elements(
        &self,
        culture: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Derived<Vec<DesignElement>> {
        let prompt = format!(
            "Analyze this {culture} cultural design image and identify 3-5 key design elements \
             present.\n\n\
             For each element you see, provide:\n\
             - type: \"symbol\", \"pattern\", \"motif\", \"shape\", \"texture\", or \"element\"\n\
             - name: A descriptive name for what you see\n\
             - description: Brief explanation of what the element is and its visual characteristics\n\n\
             Return ONLY a JSON array like:\n\
             [\n\
                 {{\"type\": \"symbol\", \"name\": \"Element Name\", \"description\": \"Description of what you see\"}},\n\
                 {{\"type\": \"pattern\", \"name\": \"Pattern Name\", \"description\": \"Description of the pattern\"}}\n\
             ]\n\n\
             Focus on actual elements visible in the image, not general cultural knowledge."
        );

        self.analyze_list(culture, image, mime_type, &prompt, "elements", fallback_elements)
            .await
    }

    /// Dominant colors, extracted locally rather than asked of the model
    pub async fn generate_colors(&self, culture: &str, image: &[u8]) -> Derived<Vec<String>> {
        match palette::palette_from_bytes(image, ANALYSIS_PALETTE_SIZE) {
            Ok(colors) => Derived::ai(colors),
            Err(err) => {
                tracing::warn!(culture, error = %err, "Color extraction failed, using defaults");
                Derived::fallback(fallback_colors())
            }
        }
    }

    /// Pattern descriptions from the image
    pub async fn generate_patterns(
        &self,
        culture: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Derived<Vec<PatternStyle>> {
        let prompt = format!(
            "Analyze this {culture} cultural design image and describe the patterns you see.\n\n\
             For each pattern visible in the image, provide:\n\
             - name: Pattern name based on what you see\n\
             - description: Detailed description of the pattern's visual characteristics\n\
             - style: Visual style (geometric, organic, abstract, etc.)\n\
             - usage: How this pattern appears to be used in the design\n\n\
             Return ONLY a JSON array like:\n\
             [\n\
                 {{\n\
                     \"name\": \"Pattern Name\",\n\
                     \"description\": \"Detailed description of what you see\",\n\
                     \"style\": \"geometric\",\n\
                     \"usage\": \"How it's used in the design\"\n\
                 }}\n\
             ]\n\n\
             Focus on actual patterns visible in the image, not general cultural patterns."
        );

        self.analyze_list(culture, image, mime_type, &prompt, "patterns", fallback_patterns)
            .await
    }

    /// Comprehensive design brief from the image
    pub async fn generate_brief(
        &self,
        culture: &str,
        image: &[u8],
        mime_type: &str,
        style: &str,
    ) -> Derived<DesignBrief> {
        let prompt = format!(
            "Analyze this {culture} cultural design image and create a comprehensive design \
             brief.\n\n\
             Based on what you see in the image, provide:\n\
             - cultural_context: What cultural elements or style you observe\n\
             - design_principles: Key design principles evident in this image\n\
             - color_philosophy: How colors are used and their visual impact\n\
             - typography_approach: What typography would complement this style\n\
             - pattern_usage: How patterns are used in this design\n\
             - modern_adaptation: How this style could be adapted to {style} design\n\
             - cultural_sensitivity: Guidelines for respectful use of this style\n\n\
             Return ONLY a JSON object with these fields.\n\
             Focus on what you actually see in the image, not general cultural knowledge."
        );

        match self.client.analyze_image(image, mime_type, &prompt).await {
            Ok(response) => match extract_json::<DesignBrief>(&response, '{', '}') {
                Some(brief) => Derived::ai(brief),
                None => {
                    tracing::warn!(culture, "Brief response had no parseable JSON object");
                    Derived::fallback(fallback_brief(culture, style))
                }
            },
            Err(err) => {
                tracing::warn!(culture, error = %err, "Brief generation failed, using default");
                Derived::fallback(fallback_brief(culture, style))
            }
        }
    }

    /// Shared flow for the JSON-array-returning analyses
    async fn analyze_list<T: DeserializeOwned>(
        &self,
        culture: &str,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
        field: &'static str,
        fallback: fn() -> Vec<T>,
    ) -> Derived<Vec<T>> {
        match self.client.analyze_image(image, mime_type, prompt).await {
            Ok(response) => match extract_json::<Vec<T>>(&response, '[', ']') {
                Some(values) if !values.is_empty() => Derived::ai(values),
                _ => {
                    tracing::warn!(culture, field, "Response had no parseable JSON array");
                    Derived::fallback(fallback())
                }
            },
            Err(err) => {
                tracing::warn!(culture, field, error = %err, "Analysis failed, using defaults");
                Derived::fallback(fallback())
            }
        }
    }
}

/// Extract the outermost JSON value delimited by `open`/`close` from model
/// response text (models wrap JSON in prose and code fences).
fn extract_json<T: DeserializeOwned>(text: &str, open: char, close: char) -> Option<T> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

pub(crate) fn fallback_fonts() -> Vec<String> {
    ["Nunito", "Open Sans", "Roboto", "Lato"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub(crate) fn fallback_elements() -> Vec<DesignElement> {
    vec![
        DesignElement {
            kind: "symbol".to_string(),
            name: "Cultural Motif".to_string(),
            description: "Traditional cultural symbols".to_string(),
        },
        DesignElement {
            kind: "pattern".to_string(),
            name: "Geometric".to_string(),
            description: "Geometric design patterns".to_string(),
        },
        DesignElement {
            kind: "color".to_string(),
            name: "Traditional".to_string(),
            description: "Culture-specific color palette".to_string(),
        },
    ]
}

fn fallback_colors() -> Vec<String> {
    ["#8b4513", "#d2691e", "#cd853f", "#f4a460", "#deb887"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn fallback_patterns() -> Vec<PatternStyle> {
    vec![PatternStyle {
        name: "Traditional Pattern".to_string(),
        description: "Traditional geometric pattern".to_string(),
        style: "geometric".to_string(),
        usage: "Decorative elements".to_string(),
    }]
}

fn fallback_brief(culture: &str, style: &str) -> DesignBrief {
    DesignBrief {
        cultural_context: format!("Design inspired by {} culture", culture),
        design_principles: "Respect cultural authenticity while creating modern designs"
            .to_string(),
        color_philosophy: "Use colors that reflect traditional materials and symbolism"
            .to_string(),
        typography_approach: "Choose fonts that complement cultural aesthetics".to_string(),
        pattern_usage: "Incorporate traditional patterns thoughtfully".to_string(),
        modern_adaptation: format!("Adapt traditional elements to {} style", style),
        cultural_sensitivity: "Ensure respectful and accurate representation".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_array_from_prose() {
        let text = "Here are the fonts:\n[\"Nunito\", \"Lato\"]\nHope that helps!";
        let fonts: Vec<String> = extract_json(text, '[', ']').unwrap();
        assert_eq!(fonts, vec!["Nunito".to_string(), "Lato".to_string()]);
    }

    #[test]
    fn test_extract_json_object_from_code_fence() {
        let text = "```json\n{\"cultural_context\": \"c\", \"design_principles\": \"d\", \
                    \"color_philosophy\": \"c\", \"typography_approach\": \"t\", \
                    \"pattern_usage\": \"p\", \"modern_adaptation\": \"m\", \
                    \"cultural_sensitivity\": \"s\"}\n```";
        let brief: DesignBrief = extract_json(text, '{', '}').unwrap();
        assert_eq!(brief.cultural_context, "c");
    }

    #[test]
    fn test_extract_json_rejects_garbage() {
        assert!(extract_json::<Vec<String>>("no json here", '[', ']').is_none());
        assert!(extract_json::<Vec<String>>("] backwards [", '[', ']').is_none());
    }

    #[test]
    fn test_fallbacks_nonempty() {
        assert!(!fallback_fonts().is_empty());
        assert_eq!(fallback_elements().len(), 3);
        assert_eq!(fallback_colors().len(), 5);
        assert_eq!(fallback_patterns().len(), 1);
    }

    #[tokio::test]
    async fn test_metadata_requires_existing_image() {
        let settings = crate::config::GeminiSettings {
            api_keys: vec!["k".to_string()],
            ..Default::default()
        };
        let client = Arc::new(GeminiClient::new(&settings).unwrap());
        let analyzer = CultureAnalyzer::new(client);

        let result = analyzer
            .generate_metadata("yoruba", Path::new("/nonexistent/pattern.png"))
            .await;
        assert!(matches!(result, Err(AnalysisError::ImageNotFound(_))));
    }
}
