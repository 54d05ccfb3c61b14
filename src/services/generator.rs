//! Pattern image generation
//!
//! Builds the textile-pattern prompt for a culture, enriched with cached
//! AI-generated culture details, and saves the resulting images under the
//! asset directory.

use moka::future::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::gemini::{client::title_case, AspectRatio, ClientError, GeminiClient};

/// Upper bound on distinct cultures whose details are cached per process
const DETAILS_CACHE_CAPACITY: u64 = 64;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Generates pattern images for cultures
pub struct PatternGenerator {
    client: Arc<GeminiClient>,
    assets_dir: PathBuf,
    /// Culture details are stable per process run; one text call per culture
    details_cache: Cache<String, String>,
}

impl PatternGenerator {
    pub fn new(client: Arc<GeminiClient>, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            assets_dir: assets_dir.into(),
            details_cache: Cache::new(DETAILS_CACHE_CAPACITY),
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Culture details paragraph, cached per lowercased culture name
    pub async fn culture_details(&self, culture: &str) -> Result<String, ClientError> {
        let key = culture.to_lowercase();
        if let Some(details) = self.details_cache.get(&key).await {
            return Ok(details);
        }

        let details = self.client.culture_details(culture).await?;
        self.details_cache.insert(key, details.clone()).await;
        Ok(details)
    }

    /// Generate pattern images and save them into the asset directory.
    ///
    /// `file_stem` names the output files: a single sample saves as
    /// `<stem>.png`, multiple samples as `<stem>_1.png`, `<stem>_2.png`, ...
    /// Returns the saved paths.
    pub async fn generate_patterns(
        &self,
        culture: &str,
        file_stem: Option<&str>,
        sample_count: u32,
        aspect_ratio: AspectRatio,
    ) -> Result<Vec<PathBuf>, GeneratorError> {
        // Details enrich the prompt but their absence never blocks generation
        let details = match self.culture_details(culture).await {
            Ok(details) => details,
            Err(err) => {
                tracing::warn!(culture, error = %err, "Could not fetch culture details");
                String::new()
            }
        };

        let prompt = build_pattern_prompt(culture, &details);
        let images = self
            .client
            .generate_image(&prompt, sample_count, aspect_ratio)
            .await?;

        std::fs::create_dir_all(&self.assets_dir)?;

        let stem = match file_stem {
            Some(stem) => stem.to_string(),
            None => format!(
                "{}_pattern_{}",
                culture.to_lowercase(),
                chrono::Utc::now().timestamp()
            ),
        };

        let mut paths = Vec::with_capacity(images.len());
        for (idx, bytes) in images.iter().enumerate() {
            let filename = if images.len() == 1 {
                format!("{}.png", stem)
            } else {
                format!("{}_{}.png", stem, idx + 1)
            };
            let path = self.assets_dir.join(filename);
            std::fs::write(&path, bytes)?;
            tracing::info!(path = %path.display(), "Saved pattern image");
            paths.push(path);
        }

        Ok(paths)
    }
}

/// The detailed, explicit prompt template used for every culture
pub fn build_pattern_prompt(culture: &str, details: &str) -> String {
    let culture_title = title_case(culture);
    format!(
        "Generate a seamless {culture_title} textile pattern. \
         Include the most iconic motifs, symbols, and artistic elements associated with \
         {culture_title} culture. {details} \
         Use a color palette that is traditional for this culture. \
         Arrange motifs in a style typical of this culture's textiles \
         (e.g., rows, bands, grids, or all-over). \
         Reference traditional techniques (e.g., weaving, resist-dyeing, embroidery) if relevant. \
         The design must fill the entire square canvas, with no borders, white space, or empty \
         areas at the edges. \
         Do not include any text, watermarks, signatures, or logos. \
         The pattern should be highly detailed, vibrant, and culturally authentic, with \
         consistent spacing and no blank or plain areas. \
         Avoid modern or anachronistic elements; reference real artifacts or museum pieces \
         where possible. \
         The style should be professional, visually balanced, museum-quality, and suitable \
         for use in high-end design applications. \
         Create the pattern as if by a professional textile designer."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiSettings;
    use axum::{extract::State, routing::post, Json, Router};
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn details_reply(State(calls): State<Arc<AtomicU32>>) -> Json<serde_json::Value> {
        calls.fetch_add(1, Ordering::SeqCst);
        Json(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "Indigo adire motifs in bands."}]}}
            ]
        }))
    }

    async fn spawn_details_server(calls: Arc<AtomicU32>) -> String {
        let app = Router::new()
            .route("/models/:model", post(details_reply))
            .with_state(calls);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_culture_details_fetched_once_per_culture() {
        let calls = Arc::new(AtomicU32::new(0));
        let base_url = spawn_details_server(calls.clone()).await;

        let settings = GeminiSettings {
            api_keys: vec!["k1".to_string()],
            base_url: Some(base_url),
            ..Default::default()
        };
        let client = Arc::new(GeminiClient::new(&settings).unwrap());
        let dir = tempfile::tempdir().unwrap();
        let generator = PatternGenerator::new(client, dir.path());

        let first = generator.culture_details("Yoruba").await.unwrap();
        // Case-insensitive cache key: same culture, no second fetch
        let second = generator.culture_details("YORUBA").await.unwrap();

        assert_eq!(first, "Indigo adire motifs in bands.");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prompt_contains_culture_and_details() {
        let prompt = build_pattern_prompt("yoruba", "Adire motifs in indigo.");
        assert!(prompt.contains("Yoruba textile pattern"));
        assert!(prompt.contains("Adire motifs in indigo."));
        assert!(prompt.contains("no borders"));
    }

    #[test]
    fn test_prompt_without_details() {
        let prompt = build_pattern_prompt("maori", "");
        assert!(prompt.contains("Maori"));
    }
}
