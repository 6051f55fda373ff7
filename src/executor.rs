//! Resilient single-request executor

use log::{debug, info, warn, error};

use crate::audit::AuditLogger;
use crate::error::Error;
use crate::providers::ChatTransport;
use crate::request::ChatCompletionParams;
use crate::retry::{AttemptOutcome, AttemptRecord, RetryPolicy, Sleeper, TokioSleeper};

/// Runs one chat-completion request to completion or permanent failure,
/// sleeping a linearly growing delay between transient failures and
/// auditing the terminal outcome.
pub struct RequestExecutor<T, S = TokioSleeper>
{   transport: T
  , sleeper: S
  , audit: AuditLogger
  , policy: RetryPolicy
}

impl<T: ChatTransport> RequestExecutor<T, TokioSleeper>
{   pub fn new(
      transport: T
    , audit: AuditLogger
    , policy: RetryPolicy
    ) -> Self
    {   RequestExecutor::with_sleeper(transport, audit, policy, TokioSleeper)
    }
}

impl<T: ChatTransport, S: Sleeper> RequestExecutor<T, S>
{   pub fn with_sleeper(
      transport: T
    , audit: AuditLogger
    , policy: RetryPolicy
    , sleeper: S
    ) -> Self
    {   debug!(
          "Creating RequestExecutor: {} retries, base delay {:?}"
        , policy.max_retries
        , policy.base_delay
        );
        RequestExecutor
        {   transport
          , sleeper
          , audit
          , policy
        }
    }

    pub fn policy(&self) -> &RetryPolicy
    {   &self.policy
    }

    pub fn transport(&self) -> &T
    {   &self.transport
    }

    /// Execute with the configured retry count
    pub async fn chat_completion(
      &self
    , params: &ChatCompletionParams
    ) -> Result<String, Error>
    {   self.chat_completion_with_retries(params, self.policy.max_retries)
          .await
    }

    /// Execute with up to `max_retries` retries (`max_retries + 1` attempts)
    pub async fn chat_completion_with_retries(
      &self
    , params: &ChatCompletionParams
    , max_retries: usize
    ) -> Result<String, Error>
    {   params.validate()?;

        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut attempt = 0usize;
        loop
        {   let outcome = AttemptOutcome::from_response(
              self.transport.create_chat_completion(params).await
            );
            attempts.push(AttemptRecord::new(attempt, &outcome));

            match outcome
            {   AttemptOutcome::Success { text, response } => {
                  debug!("Attempt {} succeeded", attempt);
                  self.audit.record_success(&params.messages, &response)
                    .await?;
                  return Ok(text);
                }
              , AttemptOutcome::TransientFailure(e) if attempt < max_retries => {
                  warn!("API error: {}", e);
                  let delay = self.policy.backoff_for_attempt(attempt);
                  info!(
                    "Sleeping for {:.2} seconds before retrying..."
                  , delay.as_secs_f64()
                  );
                  self.sleeper.sleep(delay).await;
                  attempt += 1;
                }
              , AttemptOutcome::TransientFailure(e) => {
                  warn!("API error: {}", e);
                  error!("Maximum retries reached. Unable to complete the request.");
                  let err = Error::RetriesExhausted
                  {   retries: max_retries
                    , last: Box::new(e)
                  };
                  self.record_failure(params, &err, &attempts).await;
                  return Err(err);
                }
              , AttemptOutcome::TerminalFailure(e) => {
                  error!("Non-retryable error: {}", e);
                  self.record_failure(params, &e, &attempts).await;
                  return Err(e);
                }
            }
        }
    }

    /// The request error wins over a failed failure-record write
    async fn record_failure(
      &self
    , params: &ChatCompletionParams
    , err: &Error
    , attempts: &[AttemptRecord]
    )
    {   if !self.audit.logs_failures()
        {   return;
        }
        if let Err(log_err) = self.audit
          .record_failure(&params.messages, err, attempts)
          .await
        {   error!("Could not audit failed request: {}", log_err);
        }
    }
}
