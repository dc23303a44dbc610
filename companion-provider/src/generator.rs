use async_trait::async_trait;

use crate::error::Result;
use crate::params::GenerationParams;

/// The external text generation capability.
///
/// Given a prompt and generation parameters it returns generated text. Calls
/// may be slow and may fail; callers go through
/// [`crate::GenerationInvoker`] for timeouts and retries.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short name for logs, e.g. `"ollama"`.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}
