//! Final document rendering and atomic write

use std::io::Write;
use std::path::{Path, PathBuf};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat
{   /// Completions joined by the separator
    #[default]
    Text
  , /// `{"chunks": [{"index", "completion"}]}`
    Json
}

/// Render completions in chunk order
pub fn render(
  completions: &[String]
, format: OutputFormat
, separator: &str
) -> String
{   match format
    {   OutputFormat::Text => completions.join(separator)
      , OutputFormat::Json => {
          let chunks: Vec<_> = completions.iter()
            .enumerate()
            .map(|(i, completion)| json!({
              "index": i + 1,
              "completion": completion,
            }))
            .collect();
          let doc = json!({ "chunks": chunks });
          serde_json::to_string_pretty(&doc)
            .unwrap_or_else(|_| doc.to_string())
        }
    }
}

/// Replace `path` in one step; the old file stays intact on any failure
pub fn write_atomic(path: &Path, contents: &str)
  -> Result<(), crate::error::Error>
{   let output_err = |source| crate::error::Error::Output
    {   path: path.to_path_buf()
      , source
    };
    let dir = match path.parent()
    {   Some(p) if !p.as_os_str().is_empty() => p.to_path_buf()
      , _ => PathBuf::from(".")
    };
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(output_err)?;
    tmp.write_all(contents.as_bytes()).map_err(output_err)?;
    tmp.flush().map_err(output_err)?;
    tmp.persist(path).map_err(|e| output_err(e.error))?;
    info!("Wrote {}", path.display());
    Ok(())
}
