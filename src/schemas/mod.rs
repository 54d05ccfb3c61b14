//! Schema module
//!
//! Contains request/response models for the Gemini wire formats and the
//! kit/culture metadata written to disk.

pub mod gemini;
pub mod kit;
