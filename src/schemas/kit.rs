//! Kit and culture metadata models
//!
//! These are the shapes written to `kit_metadata.json`, the AI analysis
//! file, and the export payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a derived value came from: the model, or a static default used
/// because the model call failed.
///
/// Callers and tests can tell authoritative data from fallback data instead
/// of silently mixing the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Ai,
    Fallback,
}

/// A value that is either AI-derived or a static fallback, with the origin
/// recorded alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Derived<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> Derived<T> {
    pub fn ai(value: T) -> Self {
        Self {
            value,
            source: DataSource::Ai,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            source: DataSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }
}

/// A single design element identified in a pattern image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignElement {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub description: String,
}

/// A pattern style description derived from image analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternStyle {
    pub name: String,
    pub description: String,
    pub style: String,
    pub usage: String,
}

/// A designer-facing brief for working with the culture's visual language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignBrief {
    pub cultural_context: String,
    pub design_principles: String,
    pub color_philosophy: String,
    pub typography_approach: String,
    pub pattern_usage: String,
    pub modern_adaptation: String,
    pub cultural_sensitivity: String,
}

/// Complete AI-derived culture metadata, one file per analyzed image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CultureMetadata {
    pub culture: String,
    pub source_image: String,
    pub fonts: Derived<Vec<String>>,
    pub elements: Derived<Vec<DesignElement>>,
    pub colors: Derived<Vec<String>>,
    pub patterns: Derived<Vec<PatternStyle>>,
    pub brief: Derived<DesignBrief>,
    pub generated_by: String,
    pub version: String,
}

/// Palette extracted from one generated pattern image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub colors: Vec<String>,
    pub source_image: String,
    pub note: String,
}

/// Per-image scoring record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRecord {
    pub image: String,
    pub score: Option<f32>,
    pub score_prompt: String,
}

/// Asset inventory inside a kit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitAssets {
    pub patterns: Vec<String>,
    pub palettes: Vec<PaletteEntry>,
    pub briefs: Vec<Derived<String>>,
    pub pattern_metadata: Vec<PatternRecord>,
}

/// Top-level kit metadata written to `kit_metadata.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitMetadata {
    pub culture: String,
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
    pub version: String,
    pub assets: KitAssets,
    pub ai_analysis: Option<CultureMetadata>,
    pub export_formats: Vec<String>,
    pub compatible_platforms: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_markers() {
        let ai = Derived::ai(vec!["Nunito".to_string()]);
        assert!(!ai.is_fallback());

        let fallback = Derived::fallback(vec!["Roboto".to_string()]);
        assert!(fallback.is_fallback());
    }

    #[test]
    fn test_derived_serialization() {
        let derived = Derived::fallback("placeholder".to_string());
        let json = serde_json::to_value(&derived).unwrap();
        assert_eq!(json["value"], "placeholder");
        assert_eq!(json["source"], "fallback");
    }

    #[test]
    fn test_design_element_field_rename() {
        let body = r#"{"type": "symbol", "name": "Koru", "description": "spiral"}"#;
        let element: DesignElement = serde_json::from_str(body).unwrap();
        assert_eq!(element.kind, "symbol");
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["type"], "symbol");
    }
}
