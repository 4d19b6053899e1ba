use async_trait::async_trait;

use crate::providers::ProviderError;

/// Remote language-model backend used by the message generator.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// One-shot completion: system prompt + user prompt in, text out.
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError>;
}
