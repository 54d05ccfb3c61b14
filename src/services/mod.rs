//! Business logic services

pub mod analysis;
pub mod archive;
pub mod export;
pub mod gemini;
pub mod generator;
pub mod kit;
pub mod notes;
pub mod palette;
pub mod scoring;

pub use analysis::CultureAnalyzer;
pub use gemini::{AspectRatio, ClientError, GeminiClient};
pub use generator::PatternGenerator;
pub use kit::KitBuilder;
