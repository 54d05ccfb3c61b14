//! Culture metadata analysis endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::ApiError;
use crate::schemas::kit::CultureMetadata;
use crate::server::state::AppState;

/// Generate culture metadata from an uploaded image
///
/// Multipart form with an `image` file part and a `culture` text part.
///
/// POST /api/generate-culture-metadata
pub async fn generate_culture_metadata(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CultureMetadata>, ApiError> {
    let mut culture: Option<String> = None;
    let mut image: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::InvalidRequest(format!("Malformed multipart body: {}", err)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("culture") => {
                let value = field.text().await.map_err(|err| {
                    ApiError::InvalidRequest(format!("Could not read culture field: {}", err))
                })?;
                culture = Some(value.trim().to_lowercase());
            }
            Some("image") | Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("image/png")
                    .to_string();
                let bytes = field.bytes().await.map_err(|err| {
                    ApiError::InvalidRequest(format!("Could not read image field: {}", err))
                })?;
                image = Some((bytes.to_vec(), mime_type, filename));
            }
            _ => {}
        }
    }

    let culture = culture
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("Missing culture field".to_string()))?;
    let (bytes, mime_type, filename) = image
        .filter(|(bytes, _, _)| !bytes.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("Missing image file".to_string()))?;

    tracing::info!(culture, image = %filename, size = bytes.len(), "Analyzing uploaded image");

    let metadata = state
        .analyzer
        .analyze_bytes(&culture, &bytes, &mime_type, filename)
        .await;

    Ok(Json(metadata))
}
