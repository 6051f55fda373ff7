use std::io::{BufRead, Write};
use std::process::ExitCode;
use clap::Parser;
use log::{error, info};

use chunksum::cli::Args;
use chunksum::error::Error;

fn confirm_on_stdin(chunks: usize) -> Result<bool, Error>
{   println!("Number of chunks: {}", chunks);
    print!("Press Enter to continue (n to abort)...");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)
      .map_err(|source| Error::ReadInput
        {   path: "<stdin>".into()
          , source
        })?;
    println!("\n");
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer != "n" && answer != "no")
}

#[tokio::main]
async fn main() -> ExitCode
{   env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    let args = Args::parse();
    let skip_prompt = args.yes;
    let outcome = chunksum::cli::run(&args, |chunks| {
      if skip_prompt
      {   Ok(true)
      } else
      {   confirm_on_stdin(chunks)
      }
    }).await;

    match outcome
    {   Ok(path) => {
          info!("Done, output written to {}", path.display());
          ExitCode::SUCCESS
        }
      , Err(e) => {
          error!("{}", e);
          ExitCode::FAILURE
        }
    }
}
