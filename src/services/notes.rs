//! Cultural note generation
//!
//! Short, designer-facing notes about a culture's visual language. A failed
//! model call degrades to a static placeholder, marked as fallback data so
//! callers can tell the two apart.

use crate::schemas::kit::Derived;

use super::gemini::{client::title_case, GeminiClient};

/// Generate a cultural note for a culture
pub async fn cultural_note(client: &GeminiClient, culture: &str) -> Derived<String> {
    let prompt = format!(
        "Provide a short, respectful cultural note (2-3 sentences) about the {} culture, \
         focusing on its visual art, patterns, or symbolism. The note should be suitable \
         for designers using generated assets.",
        title_case(culture)
    );

    match client.generate_text(&prompt).await {
        Ok(note) => Derived::ai(note),
        Err(err) => {
            tracing::warn!(culture, error = %err, "Note generation failed, using placeholder");
            Derived::fallback(fallback_note(culture))
        }
    }
}

/// Static placeholder used when note generation fails
pub fn fallback_note(culture: &str) -> String {
    format!("Placeholder note for {}.", title_case(culture))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_note_mentions_culture() {
        assert_eq!(fallback_note("yoruba"), "Placeholder note for Yoruba.");
    }
}
