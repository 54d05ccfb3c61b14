//! Resilient Gemini API client
//!
//! Issues outbound requests to the Gemini / Imagen REST APIs, rotating
//! through a pool of API keys on rate-limit responses and retrying
//! transient failures with fixed delays before surfacing a terminal error.

pub mod client;
pub mod keys;
pub mod retry;

pub use client::{AspectRatio, ClientError, GeminiClient};
pub use keys::KeyRing;
pub use retry::{FailureClass, RetryPolicy};
