//! Supported culture listing endpoint

use axum::Json;
use serde::Serialize;

/// A culture the generator has been exercised against
#[derive(Serialize)]
pub struct CultureInfo {
    pub name: String,
    pub description: String,
    pub region: String,
}

/// Response for the culture listing
#[derive(Serialize)]
pub struct CulturesResponse {
    pub default_cultures: Vec<CultureInfo>,
    pub popular_cultures: Vec<CultureInfo>,
    pub note: String,
}

/// List default and popular cultures
///
/// Any culture name is accepted by the generation endpoints; this list
/// is a starting point, not a whitelist.
///
/// GET /api/cultures
pub async fn list_cultures() -> Json<CulturesResponse> {
    let default_cultures = vec![
        culture("yoruba", "West African culture known for Adire textiles and vibrant geometric patterns", "Nigeria"),
        culture("edo", "Culture of the historic Benin Kingdom, famous for bronze work and royal motifs", "Nigeria"),
        culture("maori", "Indigenous Polynesian culture with distinctive koru and kowhaiwhai patterns", "New Zealand"),
    ];

    let popular_cultures = vec![
        culture("celtic", "Ancient European culture known for knotwork and interlaced patterns", "Ireland, Scotland, Wales"),
        culture("aztec", "Mesoamerican civilization with bold geometric and symbolic designs", "Mexico"),
        culture("japanese", "East Asian culture with refined patterns like seigaiha and asanoha", "Japan"),
        culture("persian", "Middle Eastern culture renowned for intricate carpet and tile patterns", "Iran"),
    ];

    Json(CulturesResponse {
        default_cultures,
        popular_cultures,
        note: "Any culture name can be used for generation; these are curated starting points."
            .to_string(),
    })
}

fn culture(name: &str, description: &str, region: &str) -> CultureInfo {
    CultureInfo {
        name: name.to_string(),
        description: description.to_string(),
        region: region.to_string(),
    }
}
