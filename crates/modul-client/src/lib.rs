//! Modul Client: the network edge of the pipeline
//!
//! - [`GenerationClient`]: prompt in, raw generated text out
//! - [`GroqClient`]: OpenAI-compatible chat-completions implementation
//! - [`HeaderImageSource`]: letterhead bytes for exports, over HTTP or disk
//!
//! The credential travels inside [`modul_core::GenerationSettings`] and is
//! handed to the constructor; nothing here reads the environment.

mod groq;
mod image;

pub use groq::GroqClient;
pub use image::{source_for, FileImageSource, HeaderImageSource, HttpImageSource, MAX_IMAGE_BYTES};

use async_trait::async_trait;
use modul_core::{GenerationRequest, ModulError};

/// External generation service.
///
/// Implementations return the raw response text untouched; fence stripping
/// and JSON parsing belong to the normalizer. Every failure is reported as
/// [`ModulError::GenerationFailed`].
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModulError>;

    /// Model identifier, for logs and traces
    fn model(&self) -> &str;
}
