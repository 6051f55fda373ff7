//! Configuration for the endpoint, retries, audit trail and output

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::collections::BTreeMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DEFAULT_CONFIG_FILE: &str = "chunksum.toml";

/// Endpoint and credential configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig
{   /// API base URL (if custom)
    pub base_url: Option<String>
  , /// Request timeout in seconds
    pub timeout_secs: Option<u64>
  , /// Environment variable holding the key
    pub api_key_env: String
  , /// Fallback file holding the key
    pub api_key_file: PathBuf
}

impl Default for ApiConfig
{   fn default() -> Self
    {   ApiConfig
        {   base_url: None
          , timeout_secs: None
          , api_key_env: "OPENAI_API_KEY".to_string()
          , api_key_file: PathBuf::from("openai_api_key.txt")
        }
    }
}

impl ApiConfig
{   pub fn timeout(&self) -> Option<Duration>
    {   self.timeout_secs.map(Duration::from_secs)
    }

    /// Environment variable first, key file second
    pub fn resolve_api_key(&self) -> Result<String, Error>
    {   resolve_api_key_from(
          std::env::var(&self.api_key_env).ok()
        , &self.api_key_file
        )
    }
}

/// Key resolution with the environment lookup already done
pub fn resolve_api_key_from(
  env_value: Option<String>
, key_file: &Path
) -> Result<String, Error>
{   if let Some(key) = env_value.map(|k| k.trim().to_string())
    {   if !key.is_empty()
        {   debug!("Using API key from environment");
            return Ok(key);
        }
    }
    match std::fs::read_to_string(key_file)
    {   Ok(contents) if !contents.trim().is_empty() => {
          debug!("Using API key from {}", key_file.display());
          Ok(contents.trim().to_string())
        }
      , Ok(_) => Err(Error::MissingApiKey(
          format!("{} is empty", key_file.display())
        ))
      , Err(e) => Err(Error::MissingApiKey(
          format!("no key in environment and {}: {}", key_file.display(), e)
        ))
    }
}

/// Default request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig
{   pub model: String
  , #[serde(flatten)]
    pub options: crate::request::RequestOptions
  , /// Keys matching no known option; never sent
    #[serde(flatten)]
    pub unknown: BTreeMap<String, toml::Value>
}

impl Default for RequestConfig
{   fn default() -> Self
    {   RequestConfig
        {   model: crate::request::DEFAULT_MODEL.to_string()
          , options: crate::request::RequestOptions::default()
          , unknown: BTreeMap::new()
        }
    }
}

impl RequestConfig
{   /// Params for one request using these defaults
    pub fn params(
      &self
    , messages: Vec<crate::request::ChatMessage>
    ) -> crate::request::ChatCompletionParams
    {   crate::request::ChatCompletionParams::new(messages)
          .with_model(self.model.clone())
          .with_options(self.options.clone())
    }

    /// Names of `[request]` keys that were ignored
    pub fn unknown_options(&self) -> Vec<&str>
    {   self.unknown.keys().map(String::as_str).collect()
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig
{   /// Retries after the first attempt
    pub max_retries: usize
  , /// Backoff unit in seconds; attempt i waits (i + 1) units
    pub base_delay_secs: f64
}

impl Default for RetryConfig
{   fn default() -> Self
    {   RetryConfig
        {   max_retries: crate::retry::DEFAULT_MAX_RETRIES
          , base_delay_secs: crate::retry::DEFAULT_BASE_DELAY.as_secs_f64()
        }
    }
}

impl RetryConfig
{   pub fn policy(&self) -> Result<crate::retry::RetryPolicy, Error>
    {   let base_delay = Duration::try_from_secs_f64(self.base_delay_secs)
          .map_err(|e| Error::InvalidConfiguration(
            format!("retry.base_delay_secs: {}", e)
          ))?;
        Ok(crate::retry::RetryPolicy::new(self.max_retries, base_delay))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig
{   pub log_dir: PathBuf
  , /// Also record requests that ended in an error
    pub log_failures: bool
}

impl Default for AuditConfig
{   fn default() -> Self
    {   AuditConfig
        {   log_dir: PathBuf::from(crate::audit::DEFAULT_LOG_DIR)
          , log_failures: true
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig
{   pub width: usize
}

impl Default for ChunkingConfig
{   fn default() -> Self
    {   ChunkingConfig { width: crate::chunk::DEFAULT_CHUNK_WIDTH }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig
{   pub marker: String
  , pub mode: crate::template::PromptMode
}

impl Default for PromptConfig
{   fn default() -> Self
    {   PromptConfig
        {   marker: crate::template::DEFAULT_MARKER.to_string()
          , mode: crate::template::PromptMode::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig
{   pub format: crate::output::OutputFormat
  , /// Placed between completions in text output
    pub separator: String
  , /// Persist each finished chunk here and reuse it on rerun
    pub checkpoint_dir: Option<PathBuf>
}

impl Default for OutputConfig
{   fn default() -> Self
    {   OutputConfig
        {   format: crate::output::OutputFormat::default()
          , separator: "\n\n".to_string()
          , checkpoint_dir: None
        }
    }
}

/// chunksum configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunksumConfig
{   pub api: ApiConfig
  , pub request: RequestConfig
  , pub retry: RetryConfig
  , pub audit: AuditConfig
  , pub chunking: ChunkingConfig
  , pub prompt: PromptConfig
  , pub output: OutputConfig
}

impl ChunksumConfig
{   /// Parse and validate TOML text
    pub fn from_toml(raw: &str) -> Result<Self, Error>
    {   let config: ChunksumConfig = toml::from_str(raw)
          .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given (it must exist), otherwise the default
    /// file when present, otherwise built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self, Error>
    {   let (path, required) = match path
        {   Some(p) => (p.to_path_buf(), true)
          , None => (PathBuf::from(DEFAULT_CONFIG_FILE), false)
        };
        if !required && !path.exists()
        {   debug!("No {} found, using defaults", path.display());
            let config = ChunksumConfig::default();
            config.validate()?;
            return Ok(config);
        }
        let raw = std::fs::read_to_string(&path)
          .map_err(|e| Error::InvalidConfiguration(
            format!("failed to read {}: {}", path.display(), e)
          ))?;
        info!("Loaded configuration from {}", path.display());
        ChunksumConfig::from_toml(&raw)
    }

    pub fn validate(&self) -> Result<(), Error>
    {   crate::chunk::Chunker::new(self.chunking.width)?;
        self.retry.policy()?;
        if self.prompt.mode == crate::template::PromptMode::Substitute
          && self.prompt.marker.is_empty()
        {   return Err(Error::InvalidConfiguration(
              "prompt.marker must not be empty".to_string()
            ));
        }
        if self.request.model.trim().is_empty()
        {   return Err(Error::InvalidConfiguration(
              "request.model must not be empty".to_string()
            ));
        }
        if self.request.options.stream == Some(true)
        {   return Err(Error::InvalidConfiguration(
              "request.stream is not supported".to_string()
            ));
        }
        if let Some(base_url) = &self.api.base_url
        {   reqwest::Url::parse(base_url).map_err(|e| Error::InvalidConfiguration(
              format!("api.base_url {:?}: {}", base_url, e)
            ))?;
        }
        for key in self.request.unknown_options()
        {   warn!("Ignoring unknown request option `{}`", key);
        }
        Ok(())
    }
}

/// Read a text file that must contain something besides whitespace
pub fn read_non_empty(path: &Path) -> Result<String, Error>
{   let text = std::fs::read_to_string(path)
      .map_err(|source| Error::ReadInput
        {   path: path.to_path_buf()
          , source
        })?;
    if text.trim().is_empty()
    {   return Err(Error::EmptyInput(path.to_path_buf()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::output::OutputFormat;
    use crate::template::PromptMode;

    #[test]
    fn empty_document_gives_defaults()
    {   let config = ChunksumConfig::from_toml("").unwrap();
        assert_eq!(config.request.model, "gpt-3.5-turbo");
        assert_eq!(config.retry.max_retries, 10);
        assert_eq!(
          config.retry.policy().unwrap().base_delay
        , Duration::from_millis(1100)
        );
        assert_eq!(config.chunking.width, 2000);
        assert_eq!(config.audit.log_dir, PathBuf::from("gpt_logs"));
        assert!(config.audit.log_failures);
        assert_eq!(config.output.separator, "\n\n");
    }

    #[test]
    fn parses_all_sections()
    {   let config = ChunksumConfig::from_toml(r#"
          [api]
          base_url = "http://localhost:8080/v1"
          timeout_secs = 30

          [request]
          model = "gpt-4"
          temperature = 0.2
          max_tokens = 512
          stop = ["END"]

          [retry]
          max_retries = 3
          base_delay_secs = 0.5

          [prompt]
          mode = "user_message"

          [output]
          format = "json"
          checkpoint_dir = "work"
        "#).unwrap();
        assert_eq!(config.api.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.request.model, "gpt-4");
        assert_eq!(config.request.options.temperature, Some(0.2));
        assert_eq!(config.request.options.max_tokens, Some(512));
        assert_eq!(
          config.request.options.stop
        , Some(crate::request::Stop::Many(vec!["END".to_string()]))
        );
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.prompt.mode, PromptMode::UserMessage);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.checkpoint_dir, Some(PathBuf::from("work")));

        let params = config.request.params(vec![
          crate::request::ChatMessage::user("x")
        ]);
        let wire = serde_json::to_value(&params).unwrap();
        assert_eq!(wire["model"], "gpt-4");
        assert!(wire.get("top_p").is_none());
    }

    #[test]
    fn invalid_values_rejected()
    {   assert!(ChunksumConfig::from_toml("[chunking]\nwidth = 0").is_err());
        assert!(ChunksumConfig::from_toml("[retry]\nbase_delay_secs = -1.0").is_err());
        assert!(ChunksumConfig::from_toml("[request]\nstream = true").is_err());
        assert!(ChunksumConfig::from_toml("[retry]\nmax_retries = \"many\"").is_err());
    }

    #[test]
    fn misspelled_request_option_is_ignored_not_sent()
    {   let config = ChunksumConfig::from_toml(
          "[request]\ntemprature = 0.2\ntop_p = 0.9"
        ).unwrap();
        assert_eq!(config.request.unknown_options(), vec!["temprature"]);
        assert_eq!(config.request.options.top_p, Some(0.9));
        assert_eq!(config.request.options.temperature, None);

        let wire = serde_json::to_value(&config.request.params(vec![
          crate::request::ChatMessage::user("x")
        ])).unwrap();
        assert!(wire.get("temprature").is_none());
        assert!(wire.get("unknown").is_none());
    }

    #[test]
    fn malformed_base_url_rejected()
    {   let err = ChunksumConfig::from_toml("[api]\nbase_url = \"not a url\"")
          .unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn explicit_missing_file_is_an_error()
    {   let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(ChunksumConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn environment_key_wins()
    {   let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("key.txt");
        std::fs::write(&file, "sk-from-file\n").unwrap();
        assert_eq!(
          resolve_api_key_from(Some("sk-env".into()), &file).unwrap()
        , "sk-env"
        );
        assert_eq!(
          resolve_api_key_from(None, &file).unwrap()
        , "sk-from-file"
        );
        assert_eq!(
          resolve_api_key_from(Some("  ".into()), &file).unwrap()
        , "sk-from-file"
        );
    }

    #[test]
    fn missing_key_reported()
    {   let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("absent.txt");
        assert!(matches!(
          resolve_api_key_from(None, &file)
        , Err(Error::MissingApiKey(_))
        ));
        std::fs::write(&file, "\n").unwrap();
        assert!(matches!(
          resolve_api_key_from(None, &file)
        , Err(Error::MissingApiKey(_))
        ));
    }

    #[test]
    fn blank_input_file_rejected()
    {   let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("input.txt");
        std::fs::write(&file, "  \n\t").unwrap();
        assert!(matches!(read_non_empty(&file), Err(Error::EmptyInput(_))));
    }
}
