//! Command-line surface and end-to-end run

use std::path::PathBuf;
use clap::Parser;
use log::{debug, info};

use crate::audit::AuditLogger;
use crate::checkpoint::Checkpoint;
use crate::chunk::Chunker;
use crate::config::{read_non_empty, ChunksumConfig};
use crate::error::Error;
use crate::executor::RequestExecutor;
use crate::output::{render, write_atomic, OutputFormat};
use crate::pipeline::Pipeline;
use crate::providers::OpenAiClient;
use crate::template::PromptTemplate;

/// Summarize a long document chunk by chunk through a chat-completion API
#[derive(Debug, Clone, Parser)]
#[command(name = "chunksum", version)]
pub struct Args
{   /// Text to split and process
    #[arg(short, long, default_value = "input.txt")]
    pub input: PathBuf
  , /// Prompt template file
    #[arg(short, long, default_value = "prompt.txt")]
    pub prompt: PathBuf
  , /// Output file [default: output.txt or output.json]
    #[arg(short, long)]
    pub output: Option<PathBuf>
  , /// Configuration file [default: chunksum.toml if present]
    #[arg(short, long, env = "CHUNKSUM_CONFIG")]
    pub config: Option<PathBuf>
  , /// Override output.format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>
  , /// Override request.model
    #[arg(long)]
    pub model: Option<String>
  , /// Override retry.max_retries
    #[arg(long)]
    pub max_retries: Option<usize>
  , /// Override chunking.width
    #[arg(long)]
    pub width: Option<usize>
  , /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool
}

impl Args
{   /// Config file with command-line overrides applied
    pub fn resolve_config(&self) -> Result<ChunksumConfig, Error>
    {   let mut config = ChunksumConfig::load(self.config.as_deref())?;
        if let Some(format) = self.format
        {   config.output.format = format;
        }
        if let Some(model) = &self.model
        {   config.request.model = model.clone();
        }
        if let Some(max_retries) = self.max_retries
        {   config.retry.max_retries = max_retries;
        }
        if let Some(width) = self.width
        {   config.chunking.width = width;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn output_path(&self, format: OutputFormat) -> PathBuf
    {   self.output.clone().unwrap_or_else(|| match format
        {   OutputFormat::Text => PathBuf::from("output.txt")
          , OutputFormat::Json => PathBuf::from("output.json")
        })
    }
}

/// Run the whole job. `confirm` sees the chunk count before any request
/// is sent and may decline. Returns the written output path.
pub async fn run<F>(args: &Args, confirm: F) -> Result<PathBuf, Error>
where
  F: FnOnce(usize) -> Result<bool, Error>
{   let config = args.resolve_config()?;
    debug!("Effective configuration: {:?}", config);

    let input = read_non_empty(&args.input)?;
    let template = PromptTemplate::load(
      &args.prompt
    , &config.prompt.marker
    , config.prompt.mode
    )?;
    let api_key = config.api.resolve_api_key()?;

    let chunks = Chunker::new(config.chunking.width)?.split(&input);
    info!("Number of chunks: {}", chunks.len());
    if !confirm(chunks.len())?
    {   return Err(Error::Aborted);
    }

    let client = OpenAiClient::new(
      api_key
    , config.api.base_url.clone()
    , config.api.timeout()
    )?;
    let audit = AuditLogger::create(
      &config.audit.log_dir
    , config.audit.log_failures
    )?;
    let executor = RequestExecutor::new(client, audit, config.retry.policy()?);

    let mut pipeline = Pipeline::new(&executor, &template, &config.request);
    if let Some(dir) = &config.output.checkpoint_dir
    {   pipeline = pipeline.with_checkpoint(Checkpoint::open(dir)?);
    }
    let completions = pipeline.run(&chunks).await?;

    let path = args.output_path(config.output.format);
    write_atomic(
      &path
    , &render(&completions, config.output.format, &config.output.separator)
    )?;
    Ok(path)
}
