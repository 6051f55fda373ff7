use std::path::PathBuf;

/// Custom error type for chunksum operations
#[derive(Debug, thiserror::Error)]
pub enum Error
{   /// API key could not be resolved
    #[error("Missing API key: {0}")]
    MissingApiKey(String)
  , /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
  , /// Request parameters rejected before sending
    #[error("Invalid request: {0}")]
    InvalidRequest(String)
  , /// Input or prompt file had no content
    #[error("Input file is empty: {}", .0.display())]
    EmptyInput(PathBuf)
  , /// Input or prompt file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    ReadInput
    {   path: PathBuf
      , source: std::io::Error
    }
  , /// HTTP transport error (connect, reset, body read)
    #[error("HTTP error: {0}")]
    HttpError(String)
  , /// Timeout error
    #[error("Request timed out")]
    Timeout
  , /// Rate limit exceeded
    #[error("API rate limit exceeded: {0}")]
    RateLimitExceeded(String)
  , /// 5xx-class response
    #[error("Server error ({status}): {body}")]
    ServerError
    {   status: u16
      , body: String
    }
  , /// Credentials rejected by the endpoint
    #[error("Authentication failed ({status}): {body}")]
    Authentication
    {   status: u16
      , body: String
    }
  , /// API returned a non-retryable error response
    #[error("API error ({status}): {body}")]
    ApiError
    {   status: u16
      , body: String
    }
  , /// Failed to parse API response
    #[error("Parse error: {0}")]
    ParseError(String)
  , /// Well-formed response without primary content
    /// (function call, content filter); retrying returns the same
    #[error("API response contained no completion content")]
    NoChoicesInResponse
  , /// Transient failures outlasted the retry budget
    #[error("Request failed permanently after {retries} retries: {last}")]
    RetriesExhausted
    {   retries: usize
      , last: Box<Error>
    }
  , /// Audit record could not be written
    #[error("Failed to write audit log {}: {source}", path.display())]
    AuditLog
    {   path: PathBuf
      , source: std::io::Error
    }
  , /// Final document could not be written
    #[error("Failed to write output {}: {source}", path.display())]
    Output
    {   path: PathBuf
      , source: std::io::Error
    }
  , /// Checkpoint could not be read or written
    #[error("Checkpoint error at {}: {source}", path.display())]
    Checkpoint
    {   path: PathBuf
      , source: std::io::Error
    }
  , /// User declined to continue
    #[error("Run aborted by user")]
    Aborted
}

impl Error
{   /// Whether waiting and retrying may resolve this error
    pub fn is_transient(&self) -> bool
    {   matches!(
          self
        , Error::HttpError(_)
          | Error::Timeout
          | Error::RateLimitExceeded(_)
          | Error::ServerError { .. }
          | Error::ParseError(_)
        )
    }

    /// Map a non-success HTTP status and body to an error
    pub fn from_status(status: u16, body: String) -> Self
    {   match status
        {   401 | 403 => Error::Authentication { status, body }
          , 408 => Error::Timeout
          , 429 => Error::RateLimitExceeded(body)
          , 409 | 500..=599 => Error::ServerError { status, body }
          , _ => Error::ApiError { status, body }
        }
    }
}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   if e.is_builder()
        {   Error::InvalidConfiguration(e.to_string())
        } else if e.is_timeout()
        {   Error::Timeout
        } else if e.is_decode()
        {   Error::ParseError(e.to_string())
        } else
        {   Error::HttpError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn status_classification()
    {   assert!(Error::from_status(429, "slow down".into()).is_transient());
        assert!(Error::from_status(503, "".into()).is_transient());
        assert!(Error::from_status(408, "".into()).is_transient());
        assert!(!Error::from_status(401, "bad key".into()).is_transient());
        assert!(!Error::from_status(400, "bad body".into()).is_transient());
        assert!(!Error::from_status(404, "".into()).is_transient());
    }

    #[test]
    fn request_build_failure_is_configuration()
    {   let build_err = reqwest::Client::new()
          .post("not a url")
          .build()
          .unwrap_err();
        let err = Error::from(build_err);
        assert!(matches!(err, Error::InvalidConfiguration(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn response_without_content_is_terminal()
    {   assert!(!Error::NoChoicesInResponse.is_transient());
        assert!(Error::ParseError("eof".into()).is_transient());
    }

    #[test]
    fn exhausted_retries_are_terminal()
    {   let err = Error::RetriesExhausted
        {   retries: 3
          , last: Box::new(Error::Timeout)
        };
        assert!(!err.is_transient());
        assert_eq!(
          err.to_string()
        , "Request failed permanently after 3 retries: Request timed out"
        );
    }
}
