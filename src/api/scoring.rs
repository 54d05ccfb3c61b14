//! Image/prompt scoring endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::state::AppState;
use crate::services::scoring::{mime_type_for, score_image};

/// Request body for scoring
#[derive(Debug, Deserialize)]
pub struct ClipScoreRequest {
    pub prompt: String,
}

/// Score for one image
#[derive(Serialize)]
pub struct ImageScore {
    pub image: String,
    /// Absent when scoring this image failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Response for the scoring endpoint
#[derive(Serialize)]
pub struct ClipScoreResponse {
    pub prompt: String,
    pub results: Vec<ImageScore>,
}

/// Score every PNG in the asset directory against a prompt
///
/// POST /api/clip-score
pub async fn clip_score(
    State(state): State<AppState>,
    Json(request): Json<ClipScoreRequest>,
) -> Result<Json<ClipScoreResponse>, ApiError> {
    let prompt = request.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(ApiError::InvalidRequest("prompt must not be empty".to_string()));
    }

    let assets_dir = &state.settings.assets_dir;
    let mut image_paths: Vec<_> = match std::fs::read_dir(assets_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("png"))
            })
            .collect(),
        Err(_) => {
            return Err(ApiError::NotFound(format!(
                "Asset directory not found: {}",
                assets_dir.display()
            )));
        }
    };
    image_paths.sort();

    if image_paths.is_empty() {
        return Err(ApiError::NotFound(
            "No images found in the asset directory".to_string(),
        ));
    }

    let mut results = Vec::with_capacity(image_paths.len());
    for path in image_paths {
        let image = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let score = match std::fs::read(&path) {
            Ok(bytes) => {
                match score_image(&state.client, &bytes, mime_type_for(&path), &prompt).await {
                    Ok(score) => Some(score),
                    Err(err) => {
                        tracing::warn!(image = %image, error = %err, "Scoring failed");
                        None
                    }
                }
            }
            Err(err) => {
                tracing::warn!(image = %image, error = %err, "Could not read image");
                None
            }
        };

        results.push(ImageScore { image, score });
    }

    Ok(Json(ClipScoreResponse { prompt, results }))
}
