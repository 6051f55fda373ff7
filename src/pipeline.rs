//! Sequential chunk-by-chunk driver

use log::{debug, info};

use crate::checkpoint::Checkpoint;
use crate::config::RequestConfig;
use crate::error::Error;
use crate::executor::RequestExecutor;
use crate::providers::ChatTransport;
use crate::retry::Sleeper;
use crate::template::PromptTemplate;

/// Sends every chunk through the executor in order.
/// The first error ends the run; nothing is skipped.
pub struct Pipeline<'a, T, S>
{   executor: &'a RequestExecutor<T, S>
  , template: &'a PromptTemplate
  , request: &'a RequestConfig
  , checkpoint: Option<Checkpoint>
}

impl<'a, T: ChatTransport, S: Sleeper> Pipeline<'a, T, S>
{   pub fn new(
      executor: &'a RequestExecutor<T, S>
    , template: &'a PromptTemplate
    , request: &'a RequestConfig
    ) -> Self
    {   Pipeline
        {   executor
          , template
          , request
          , checkpoint: None
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self
    {   self.checkpoint = Some(checkpoint);
        self
    }

    /// Completions in chunk order
    pub async fn run(&self, chunks: &[String]) -> Result<Vec<String>, Error>
    {   let total = chunks.len();
        let mut results = Vec::with_capacity(total);

        for (index, chunk) in chunks.iter().enumerate()
        {   let completion = match self.cached(index, chunk)?
            {   Some(done) => {
                  info!("Chunk {} of {} restored from checkpoint", index + 1, total);
                  done
                }
              , None => {
                  let params = self.request.params(
                    self.template.messages_for(chunk)
                  );
                  debug!("Dispatching chunk {} ({} chars)", index + 1, chunk.chars().count());
                  let completion = self.executor.chat_completion(&params).await?;
                  info!("-- COMPLETION --\n\n{}\n", completion);
                  if let Some(checkpoint) = &self.checkpoint
                  {   checkpoint.store(index, chunk, &completion)?;
                  }
                  info!("Chunk {} of {} completed", index + 1, total);
                  completion
                }
            };
            results.push(completion);
        }

        Ok(results)
    }

    fn cached(&self, index: usize, chunk: &str) -> Result<Option<String>, Error>
    {   match &self.checkpoint
        {   Some(checkpoint) => checkpoint.load(index, chunk)
          , None => Ok(None)
        }
    }
}
