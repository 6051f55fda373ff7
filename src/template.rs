//! Prompt template loading and per-chunk message building

use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::request::ChatMessage;

pub const DEFAULT_MARKER: &str = "<<TEXT TO SUMMARIZE>>";

/// How a chunk is placed into the conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode
{   /// Replace the marker inside a single system message
    #[default]
    Substitute
  , /// Send the template as system message and the chunk as user message
    UserMessage
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate
{   text: String
  , marker: String
  , mode: PromptMode
}

impl PromptTemplate
{   pub fn new(
      text: impl Into<String>
    , marker: impl Into<String>
    , mode: PromptMode
    ) -> Result<Self, crate::error::Error>
    {   let text = text.into();
        let marker = marker.into();
        if mode == PromptMode::Substitute
        {   if marker.is_empty()
            {   return Err(crate::error::Error::InvalidConfiguration(
                  "prompt marker must not be empty".to_string()
                ));
            }
            if !text.contains(&marker)
            {   return Err(crate::error::Error::InvalidConfiguration(
                  format!("prompt template does not contain marker {}", marker)
                ));
            }
        }
        Ok(PromptTemplate { text, marker, mode })
    }

    /// Read a template file; blank files are rejected
    pub fn load(
      path: &Path
    , marker: &str
    , mode: PromptMode
    ) -> Result<Self, crate::error::Error>
    {   let text = crate::config::read_non_empty(path)?;
        PromptTemplate::new(text, marker, mode)
    }

    pub fn mode(&self) -> PromptMode
    {   self.mode
    }

    /// Messages for one chunk
    pub fn messages_for(&self, chunk: &str) -> Vec<ChatMessage>
    {   match self.mode
        {   PromptMode::Substitute => vec![
              ChatMessage::system(self.text.replace(&self.marker, chunk))
            ]
          , PromptMode::UserMessage => vec![
              ChatMessage::system(self.text.clone())
            , ChatMessage::user(chunk)
            ]
        }
    }
}
