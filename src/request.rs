//! Chat-completion request parameters and response extraction

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
  , Assistant
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: Role
  , pub content: String
}

impl ChatMessage
{   pub fn system(content: impl Into<String>) -> Self
    {   ChatMessage { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self
    {   ChatMessage { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self
    {   ChatMessage { role: Role::Assistant, content: content.into() }
    }
}

/// Stop sequence(s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Stop
{   One(String)
  , Many(Vec<String>)
}

/// Optional tuning fields. Unset members never reach the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<Value>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<Value>>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<BTreeMap<String, f32>>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Stop>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>
}

/// One chat-completion request as sent to the endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionParams
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(flatten)]
    pub options: RequestOptions
}

impl ChatCompletionParams
{   /// Build params for the default model with no tuning fields
    pub fn new(messages: Vec<ChatMessage>) -> Self
    {   ChatCompletionParams
        {   model: DEFAULT_MODEL.to_string()
          , messages
          , options: RequestOptions::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self
    {   self.model = model.into();
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self
    {   self.options = options;
        self
    }

    /// Reject params that cannot form a valid request
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   if self.messages.is_empty()
        {   return Err(crate::error::Error::InvalidRequest(
              "messages must not be empty".to_string()
            ));
        }
        if self.model.trim().is_empty()
        {   return Err(crate::error::Error::InvalidRequest(
              "model must not be empty".to_string()
            ));
        }
        if self.options.stream == Some(true)
        {   return Err(crate::error::Error::InvalidRequest(
              "streaming completions are not supported".to_string()
            ));
        }
        Ok(())
    }
}

/// Extract the trimmed content of the primary choice.
/// Everything else in the response is left alone.
pub fn completion_text(response: &Value)
  -> Result<String, crate::error::Error>
{   response.pointer("/choices/0/message/content")
      .and_then(Value::as_str)
      .map(|content| content.trim().to_string())
      .ok_or(crate::error::Error::NoChoicesInResponse)
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn unset_options_are_omitted()
    {   let params = ChatCompletionParams::new(
          vec![ChatMessage::system("summarize")]
        );
        let wire = serde_json::to_value(&params).unwrap();
        assert_eq!(
          wire
        , json!({
            "model": "gpt-3.5-turbo",
            "messages": [{"role": "system", "content": "summarize"}]
          })
        );
    }

    #[test]
    fn set_options_are_flattened()
    {   let params = ChatCompletionParams::new(
          vec![ChatMessage::user("hi")]
        ).with_options(RequestOptions
          {   temperature: Some(0.5)
            , stop: Some(Stop::Many(vec!["END".into()]))
            , ..RequestOptions::default()
          });
        let wire = serde_json::to_value(&params).unwrap();
        assert_eq!(wire["temperature"], json!(0.5));
        assert_eq!(wire["stop"], json!(["END"]));
        assert!(wire.get("max_tokens").is_none());
        assert!(wire.get("options").is_none());
    }

    #[test]
    fn empty_messages_rejected()
    {   let params = ChatCompletionParams::new(vec![]);
        assert!(matches!(
          params.validate()
        , Err(crate::error::Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn extracts_trimmed_primary_content()
    {   let response = json!({
          "id": "chatcmpl-1",
          "unexpected": {"nested": true},
          "choices": [
            {"message": {"role": "assistant", "content": "  first \n"}},
            {"message": {"role": "assistant", "content": "second"}}
          ]
        });
        assert_eq!(completion_text(&response).unwrap(), "first");
    }

    #[test]
    fn missing_content_is_reported()
    {   for response in [
          json!({}),
          json!({"choices": []}),
          json!({"choices": [{"message": {"content": null}}]}),
        ]
        {   assert!(matches!(
              completion_text(&response)
            , Err(crate::error::Error::NoChoicesInResponse)
            ));
        }
    }
}
