//! Retry policy, per-attempt outcomes and the sleep seam

use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::debug;
use serde::Serialize;

pub const DEFAULT_MAX_RETRIES: usize = 10;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1100);

/// Linear backoff: attempt `i` waits `(i + 1) * base_delay`
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy
{   pub max_retries: usize
  , pub base_delay: Duration
}

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      max_retries: usize
    , base_delay: Duration
    ) -> Self
    {   RetryPolicy
        {   max_retries
          , base_delay
        }
    }

    /// Calculate backoff duration after a failed attempt
    pub fn backoff_for_attempt(
      &self
    , attempt: usize
    ) -> Duration
    {   debug!("Calculating backoff for attempt {}", attempt);
        let factor = u32::try_from(attempt + 1).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::new(DEFAULT_MAX_RETRIES, DEFAULT_BASE_DELAY)
    }
}

/// Result of a single attempt, before the retry loop decides what to do
#[derive(Debug)]
pub enum AttemptOutcome
{   Success
    {   text: String
      , response: serde_json::Value
    }
  , TransientFailure(crate::error::Error)
  , TerminalFailure(crate::error::Error)
}

impl AttemptOutcome
{   /// Classify a raw transport result
    pub fn from_response(
      result: Result<serde_json::Value, crate::error::Error>
    ) -> Self
    {   let classify = |e: crate::error::Error| {
          if e.is_transient()
          {   AttemptOutcome::TransientFailure(e)
          } else
          {   AttemptOutcome::TerminalFailure(e)
          }
        };
        match result
        {   Ok(response) => match crate::request::completion_text(&response)
            {   Ok(text) => AttemptOutcome::Success { text, response }
              , Err(e) => classify(e)
            }
          , Err(e) => classify(e)
        }
    }

    pub fn kind(&self) -> OutcomeKind
    {   match self
        {   AttemptOutcome::Success { .. } => OutcomeKind::Success
          , AttemptOutcome::TransientFailure(_) => OutcomeKind::TransientFailure
          , AttemptOutcome::TerminalFailure(_) => OutcomeKind::TerminalFailure
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind
{   Success
  , TransientFailure
  , TerminalFailure
}

/// What happened on one attempt; kept for failure audit records
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord
{   pub attempt: usize
  , pub timestamp: DateTime<Local>
  , pub outcome: OutcomeKind
  , pub detail: String
}

impl AttemptRecord
{   pub fn new(attempt: usize, outcome: &AttemptOutcome) -> Self
    {   let detail = match outcome
        {   AttemptOutcome::Success { text, .. } => text.clone()
          , AttemptOutcome::TransientFailure(e)
          | AttemptOutcome::TerminalFailure(e) => e.to_string()
        };
        AttemptRecord
        {   attempt
          , timestamp: Local::now()
          , outcome: outcome.kind()
          , detail
        }
    }
}

/// Where backoff delays are spent
#[async_trait]
pub trait Sleeper: Send + Sync
{   async fn sleep(&self, duration: Duration);
}

/// Blocks the current task on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper
{   async fn sleep(&self, duration: Duration)
    {   tokio::time::sleep(duration).await;
    }
}
