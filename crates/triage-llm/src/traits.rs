use crate::error::Result;
use async_trait::async_trait;

/// Trait for plain-text generation against a single model.
///
/// This is the whole reasoner boundary: given a fully rendered prompt and a
/// model identifier, return the provider's raw text or a provider error.
/// Model fallback, structured-output parsing and safe defaults live above
/// this seam, in `triage-core`.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}
