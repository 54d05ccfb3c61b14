//! Image/prompt relevance scoring
//!
//! Rates how well a pattern image matches a text description. The rating
//! comes from the vision model as a number in [0, 1]; there is no
//! in-process inference.

use std::path::Path;

use super::gemini::{ClientError, GeminiClient};

/// Score an image against a prompt; returns a value in [0, 1]
pub async fn score_image(
    client: &GeminiClient,
    image: &[u8],
    mime_type: &str,
    prompt: &str,
) -> Result<f32, ClientError> {
    let instruction = format!(
        "On a scale from 0.0 to 1.0, rate how well this image matches the following \
         description. Respond with only the number.\n\nDescription: {}",
        prompt
    );

    let response = client.analyze_image(image, mime_type, &instruction).await?;

    parse_score(&response).ok_or_else(|| {
        ClientError::Parse(format!("no numeric score in model response: {}", response))
    })
}

/// First numeric token in the response, clamped to [0, 1]
pub fn parse_score(text: &str) -> Option<f32> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|token| !token.is_empty())
        .find_map(|token| token.parse::<f32>().ok())
        .map(|score| score.clamp(0.0, 1.0))
}

/// MIME type by file extension, defaulting to JPEG like common viewers do
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_score("0.85"), Some(0.85));
    }

    #[test]
    fn test_parse_number_in_sentence() {
        assert_eq!(parse_score("The score is 0.42 out of 1."), Some(0.42));
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        assert_eq!(parse_score("95"), Some(1.0));
    }

    #[test]
    fn test_parse_without_number() {
        assert_eq!(parse_score("no digits here"), None);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for(Path::new("a.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_type_for(Path::new("a")), "image/jpeg");
    }
}
