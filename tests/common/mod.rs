#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use serde_json::{json, Value};

use chunksum::error::Error;
use chunksum::request::ChatCompletionParams;

/// Successful chat-completion body with `content` as primary choice
pub fn completion_body(content: &str) -> Value
{   json!({
      "id": "chatcmpl-123",
      "object": "chat.completion",
      "created": 1677652288,
      "model": "gpt-3.5-turbo",
      "choices": [{
        "index": 0,
        "message": {"role": "assistant", "content": content},
        "finish_reason": "stop"
      }],
      "usage": {"prompt_tokens": 9, "completion_tokens": 12, "total_tokens": 21}
    })
}

/// Replays a fixed list of results, one per call
pub struct ScriptedTransport
{   script: Mutex<VecDeque<Result<Value, Error>>>
  , calls: AtomicUsize
}

impl ScriptedTransport
{   pub fn new(script: Vec<Result<Value, Error>>) -> Self
    {   ScriptedTransport
        {   script: Mutex::new(script.into())
          , calls: AtomicUsize::new(0)
        }
    }

    /// `failures` transient errors followed by one success
    pub fn succeed_after(failures: usize, content: &str) -> Self
    {   let mut script: Vec<Result<Value, Error>> = (0..failures)
          .map(|_| Err(Error::RateLimitExceeded("slow down".into())))
          .collect();
        script.push(Ok(completion_body(content)));
        ScriptedTransport::new(script)
    }

    pub fn calls(&self) -> usize
    {   self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl chunksum::ChatTransport for ScriptedTransport
{   async fn create_chat_completion(
      &self
    , _params: &ChatCompletionParams
    ) -> Result<Value, Error>
    {   self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap()
          .pop_front()
          .unwrap_or_else(|| Err(Error::InvalidRequest("script exhausted".into())))
    }
}

/// Answers with the content of the last message, uppercased
#[derive(Default)]
pub struct EchoTransport
{   pub seen: Mutex<Vec<ChatCompletionParams>>
}

#[async_trait]
impl chunksum::ChatTransport for EchoTransport
{   async fn create_chat_completion(
      &self
    , params: &ChatCompletionParams
    ) -> Result<Value, Error>
    {   self.seen.lock().unwrap().push(params.clone());
        let last = params.messages.last()
          .map(|m| m.content.to_uppercase())
          .unwrap_or_default();
        Ok(completion_body(&format!("  {}  ", last)))
    }
}

/// Records delays instead of waiting
#[derive(Clone, Default)]
pub struct RecordingSleeper
{   pub slept: Arc<Mutex<Vec<Duration>>>
}

impl RecordingSleeper
{   pub fn delays(&self) -> Vec<Duration>
    {   self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl chunksum::Sleeper for RecordingSleeper
{   async fn sleep(&self, duration: Duration)
    {   self.slept.lock().unwrap().push(duration);
    }
}

/// Audit files in `dir` whose names end with `suffix`
pub fn count_records(dir: &Path, suffix: &str) -> usize
{   std::fs::read_dir(dir)
      .map(|entries| entries
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
        .count())
      .unwrap_or(0)
}
