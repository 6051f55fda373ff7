//! Write-only audit trail of prompts and responses

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use chrono::Local;
use log::{debug, error};
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;

pub const DEFAULT_LOG_DIR: &str = "gpt_logs";

/// Writes one file per completed request into a log directory.
///
/// Names combine a microsecond local timestamp with a per-logger
/// sequence number, and files are opened create-new, so two requests
/// finishing in the same instant never share a record.
#[derive(Debug)]
pub struct AuditLogger
{   dir: PathBuf
  , log_failures: bool
  , sequence: AtomicU64
}

impl AuditLogger
{   /// Create the log directory if needed
    pub fn create(
      dir: impl Into<PathBuf>
    , log_failures: bool
    ) -> Result<Self, crate::error::Error>
    {   let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| {
          error!("Cannot create log directory {}: {}", dir.display(), source);
          crate::error::Error::AuditLog { path: dir.clone(), source }
        })?;
        debug!("Audit logs go to {}", dir.display());
        Ok(AuditLogger
        {   dir
          , log_failures
          , sequence: AtomicU64::new(0)
        })
    }

    pub fn dir(&self) -> &Path
    {   &self.dir
    }

    pub fn logs_failures(&self) -> bool
    {   self.log_failures
    }

    /// Record a successful request
    pub async fn record_success(
      &self
    , messages: &[crate::request::ChatMessage]
    , response: &Value
    ) -> Result<PathBuf, crate::error::Error>
    {   let record = json!({
          "PROMPT": messages,
          "RESPONSE": response,
        });
        self.write_record("gpt", &record).await
    }

    /// Record a request that ended without a completion
    pub async fn record_failure(
      &self
    , messages: &[crate::request::ChatMessage]
    , error: &crate::error::Error
    , attempts: &[crate::retry::AttemptRecord]
    ) -> Result<PathBuf, crate::error::Error>
    {   let record = json!({
          "PROMPT": messages,
          "ERROR": error.to_string(),
          "ATTEMPTS": attempts,
        });
        self.write_record("gpt_error", &record).await
    }

    async fn write_record(
      &self
    , suffix: &str
    , record: &Value
    ) -> Result<PathBuf, crate::error::Error>
    {   let body = serde_json::to_string_pretty(record)
          .unwrap_or_else(|_| record.to_string());
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S%.6f");
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stem = format!("{}_{:04}_{}", stamp, seq, suffix);

        let mut disambiguator = 0u32;
        loop
        {   let name = if disambiguator == 0
            {   format!("{}.txt", stem)
            } else
            {   format!("{}-{}.txt", stem, disambiguator)
            };
            let path = self.dir.join(name);
            let opened = tokio::fs::OpenOptions::new()
              .write(true)
              .create_new(true)
              .open(&path)
              .await;
            match opened
            {   Ok(mut file) => {
                  let written = match file.write_all(body.as_bytes()).await
                  {   Ok(()) => file.flush().await
                    , Err(e) => Err(e)
                  };
                  return match written
                  {   Ok(()) => {
                        debug!("Wrote audit record {}", path.display());
                        Ok(path)
                      }
                    , Err(source) => {
                        error!("Audit write failed: {}", source);
                        Err(crate::error::Error::AuditLog { path, source })
                      }
                  };
                }
              , Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                  disambiguator += 1;
                }
              , Err(source) => {
                  error!("Audit open failed: {}", source);
                  return Err(crate::error::Error::AuditLog { path, source });
                }
            }
        }
    }
}
