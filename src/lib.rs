//! HeritageAI library
//!
//! Generates culturally-themed design assets (pattern images, color
//! palettes, cultural notes, and design metadata) through the Gemini and
//! Imagen APIs, with key rotation and fixed-delay retries on transient
//! upstream failures.

// Public modules
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod schemas;
pub mod server;
pub mod services;

// Re-export commonly used types
pub use config::Settings;
pub use error::ApiError;
pub use server::App;
