//! Application state container
//!
//! Shared state passed to all request handlers via Axum's state
//! extraction. Cheaply cloneable via Arc.

use crate::config::Settings;
use crate::services::{CultureAnalyzer, GeminiClient, KitBuilder, PatternGenerator};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Gemini API client shared by all services
    pub client: Arc<GeminiClient>,

    /// Culture metadata analyzer
    pub analyzer: Arc<CultureAnalyzer>,

    /// Design kit assembler
    pub kit_builder: Arc<KitBuilder>,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    ///
    /// Fails when no API credentials are configured.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);
        let start_time = Instant::now();

        tracing::debug!(
            keys = settings.gemini.api_keys.len(),
            "Initializing Gemini client"
        );
        let client = Arc::new(GeminiClient::new(&settings.gemini)?);

        // The generator carries the per-process culture-details cache; the
        // kit builder shares it so repeat builds skip the details refetch
        let generator = Arc::new(PatternGenerator::new(
            client.clone(),
            settings.assets_dir.clone(),
        ));
        let analyzer = Arc::new(CultureAnalyzer::new(client.clone()));
        let kit_builder = Arc::new(KitBuilder::new(
            client.clone(),
            generator,
            settings.clone(),
        ));

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            settings,
            client,
            analyzer,
            kit_builder,
            start_time,
        })
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
