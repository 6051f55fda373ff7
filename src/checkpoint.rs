//! Per-chunk checkpoints so an aborted run can resume

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Entry
{   chunk: String
  , completion: String
}

/// Directory of finished chunks keyed by position.
/// An entry is only reused when its stored chunk text still matches.
#[derive(Debug, Clone)]
pub struct Checkpoint
{   dir: PathBuf
}

impl Checkpoint
{   pub fn open(dir: impl Into<PathBuf>) -> Result<Self, crate::error::Error>
    {   let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| {
          crate::error::Error::Checkpoint { path: dir.clone(), source }
        })?;
        Ok(Checkpoint { dir })
    }

    pub fn dir(&self) -> &Path
    {   &self.dir
    }

    fn entry_path(&self, index: usize) -> PathBuf
    {   self.dir.join(format!("chunk_{:05}.json", index))
    }

    /// Stored completion for `chunk` at `index`, if any
    pub fn load(
      &self
    , index: usize
    , chunk: &str
    ) -> Result<Option<String>, crate::error::Error>
    {   let path = self.entry_path(index);
        let raw = match std::fs::read_to_string(&path)
        {   Ok(raw) => raw
          , Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None)
          , Err(source) => {
              return Err(crate::error::Error::Checkpoint { path, source });
            }
        };
        match serde_json::from_str::<Entry>(&raw)
        {   Ok(entry) if entry.chunk == chunk => {
              debug!("Reusing checkpoint {}", path.display());
              Ok(Some(entry.completion))
            }
          , Ok(_) => {
              warn!("Checkpoint {} is for different text, ignoring", path.display());
              Ok(None)
            }
          , Err(e) => {
              warn!("Unreadable checkpoint {}: {}", path.display(), e);
              Ok(None)
            }
        }
    }

    pub fn store(
      &self
    , index: usize
    , chunk: &str
    , completion: &str
    ) -> Result<(), crate::error::Error>
    {   let path = self.entry_path(index);
        let entry = Entry
        {   chunk: chunk.to_string()
          , completion: completion.to_string()
        };
        let body = serde_json::to_string(&entry)
          .unwrap_or_default();
        std::fs::write(&path, body).map_err(|source| {
          crate::error::Error::Checkpoint { path, source }
        })
    }
}
