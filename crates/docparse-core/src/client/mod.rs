pub mod openai;
pub mod retry;

use crate::error::ModelClientError;
use async_trait::async_trait;

pub use openai::OpenAiClient;
pub use retry::{RetryPolicy, RetryingClient};

/// One chat completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    /// Base64-encoded PNG page images, empty for text prompts.
    pub images: Vec<String>,
    /// Field names the reply is expected to contain.
    pub expected_fields: Vec<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A hosted completion API. Implementations return the raw reply text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelClientError>;

    /// Name of this client (for diagnostics).
    fn backend_name(&self) -> &str;
}
