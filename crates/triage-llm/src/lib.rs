pub mod error;
pub mod gemini;
pub mod traits;

pub use error::ProviderError;
pub use gemini::GeminiClient;
pub use traits::GenerationClient;
