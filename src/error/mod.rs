//! Error handling module
//!
//! Contains the HTTP-facing error type; the client-level taxonomy lives in
//! `services::gemini`.

pub mod types;

pub use types::ApiError;
