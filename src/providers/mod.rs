//! Remote chat-completion transports

pub mod openai;

use async_trait::async_trait;

// Re-export for convenience
pub use openai::OpenAiClient;

/// One network round trip to a chat-completion endpoint.
///
/// Implementations return the raw response body on success and a
/// classified `Error` on failure; retrying is the executor's job.
#[async_trait]
pub trait ChatTransport: Send + Sync
{   async fn create_chat_completion(
      &self
    , params: &crate::request::ChatCompletionParams
    ) -> Result<serde_json::Value, crate::error::Error>;
}
