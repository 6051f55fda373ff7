use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, trace, error};

pub const OPENAI_API_BASE: &str
  = "https://api.openai.com/v1";

/// OpenAI-compatible chat-completion client.
///
/// Built once from resolved credentials and reused for every chunk.
pub struct OpenAiClient
{   api_key: String
  , api_base: String
  , http_client: reqwest::Client
}

impl fmt::Debug for OpenAiClient
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("OpenAiClient")
          .field("api_base", &self.api_base)
          .field("api_key", &"<redacted>")
          .finish()
    }
}

impl OpenAiClient
{   /// Create a client for `api_base` (trailing slash tolerated)
    pub fn new(
      api_key: String
    , api_base: Option<String>
    , timeout: Option<Duration>
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating OpenAiClient");
        if api_key.trim().is_empty()
        {   return Err(crate::error::Error::MissingApiKey(
              "empty API key".to_string()
            ));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout
        {   builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("HTTP client: {}", e)
          )
        })?;
        let api_base = api_base
          .unwrap_or_else(|| OPENAI_API_BASE.to_string())
          .trim_end_matches('/')
          .to_string();
        reqwest::Url::parse(&api_base).map_err(|e| {
          error!("Invalid API base {:?}: {}", api_base, e);
          crate::error::Error::InvalidConfiguration(
            format!("API base {:?}: {}", api_base, e)
          )
        })?;
        Ok(OpenAiClient
        {   api_key
          , api_base
          , http_client
        })
    }

    pub fn api_base(&self) -> &str
    {   &self.api_base
    }
}

#[async_trait]
impl crate::providers::ChatTransport for OpenAiClient
{   async fn create_chat_completion(
      &self
    , params: &crate::request::ChatCompletionParams
    ) -> Result<serde_json::Value, crate::error::Error>
    {   debug!("Sending chat completion for: {}", params.model);
        trace!("Chat request: {:?}", params);

        let response = self.http_client
          .post(format!("{}/chat/completions", self.api_base))
          .bearer_auth(&self.api_key)
          .json(params)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::from(e)
          })?;

        let status = response.status();
        trace!("Chat response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("API error {}: {}", status, error_text);
            return Err(crate::error::Error::from_status(
              status.as_u16()
            , error_text
            ));
        }

        let body = response.text().await.map_err(|e| {
          error!("Body read error: {}", e);
          crate::error::Error::from(e)
        })?;

        serde_json::from_str(&body).map_err(|e| {
          error!("Parse error: {}", e);
          crate::error::Error::ParseError(e.to_string())
        })
    }
}
