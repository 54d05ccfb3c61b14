//! Kit generation and download endpoints

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::schemas::kit::KitMetadata;
use crate::server::state::AppState;
use crate::services::archive::{self, ArchiveError};
use crate::services::kit::KitError;

/// Request body for kit generation
#[derive(Debug, Deserialize)]
pub struct GenerateKitRequest {
    pub culture: String,
}

/// Response for a generated kit
#[derive(Serialize)]
pub struct GenerateKitResponse {
    pub status: String,
    pub culture: String,
    pub kit_dir: String,
    pub exports: BTreeMap<String, String>,
    pub metadata: KitMetadata,
}

/// Generate a complete design kit for a culture
///
/// POST /api/generate-kit
pub async fn generate_kit(
    State(state): State<AppState>,
    Json(request): Json<GenerateKitRequest>,
) -> Result<Json<GenerateKitResponse>, ApiError> {
    let culture = request.culture.trim().to_lowercase();
    validate_culture(&culture)?;

    let summary = state
        .kit_builder
        .build_kit(&culture)
        .await
        .map_err(kit_error_to_api)?;

    Ok(Json(GenerateKitResponse {
        status: "success".to_string(),
        culture,
        kit_dir: summary.kit_dir.display().to_string(),
        exports: summary
            .exports
            .into_iter()
            .map(|(format, path)| (format, path.display().to_string()))
            .collect(),
        metadata: summary.metadata,
    }))
}

/// Download a previously generated kit as a zip archive
///
/// GET /api/download-kit/:culture
pub async fn download_kit(
    State(state): State<AppState>,
    Path(culture): Path<String>,
) -> Result<Response, ApiError> {
    let culture = culture.trim().to_lowercase();
    validate_culture(&culture)?;
    let kit_dir = state.settings.kit_dir(&culture);

    let bytes = match archive::zip_kit_dir(&kit_dir) {
        Ok(bytes) => bytes,
        Err(ArchiveError::NotFound(_)) => {
            return Err(ApiError::NotFound(format!(
                "No kit has been generated for culture '{}'",
                culture
            )));
        }
        Err(err) => return Err(ApiError::Internal(err.into())),
    };

    let filename = format!("{}_design_kit.zip", culture);
    let response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response();

    Ok(response)
}

/// Culture names become directory names under the asset tree; anything
/// that could traverse outside it is rejected before any path is built.
fn validate_culture(culture: &str) -> Result<(), ApiError> {
    if culture.is_empty() || culture.contains(['/', '\\']) || culture.contains("..") {
        return Err(ApiError::InvalidRequest(
            "culture must be a plain name without path separators".to_string(),
        ));
    }
    Ok(())
}

fn kit_error_to_api(err: KitError) -> ApiError {
    match err {
        KitError::Client(err) => ApiError::Upstream(err),
        other => ApiError::Internal(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traversal_culture_names_rejected() {
        for bad in ["", "..", "a/../b", "../../etc", "a\\b", "/etc", "kit/.."] {
            assert!(
                matches!(validate_culture(bad), Err(ApiError::InvalidRequest(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_plain_culture_names_accepted() {
        for good in ["yoruba", "edo", "maori", "new zealand maori"] {
            assert!(validate_culture(good).is_ok(), "rejected {:?}", good);
        }
    }
}
