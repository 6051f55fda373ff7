pub mod error;
pub mod config;
pub mod request;
pub mod providers;
pub mod retry;
pub mod audit;
pub mod executor;
pub mod chunk;
pub mod template;
pub mod checkpoint;
pub mod pipeline;
pub mod output;
pub mod cli;

/*

chunksum: split a long document into chunks, run each chunk through a
chat-completion endpoint, and join the completions into one document.

chunksum/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports
│   ├── main.rs         # Binary: logging setup, confirmation, exit code
│   ├── cli.rs          # Arguments and the end-to-end run
│   ├── error.rs        # Error type and transient/terminal classification
│   ├── config.rs       # TOML configuration and credential lookup
│   ├── request.rs      # Request parameters, completion extraction
│   ├── providers/      # ChatTransport trait and the OpenAI client
│   ├── retry.rs        # Linear backoff, attempt outcomes, sleeper
│   ├── audit.rs        # Prompt/response audit files
│   ├── executor.rs     # One request to completion or permanent failure
│   ├── chunk.rs        # Word-wrapping chunker
│   ├── template.rs     # Prompt template and per-chunk messages
│   ├── checkpoint.rs   # Resume support
│   ├── pipeline.rs     # Sequential driver
│   └── output.rs       # Rendering and atomic write
└── tests/

*/

pub use audit::AuditLogger;
pub use chunk::Chunker;
pub use config::ChunksumConfig;
pub use error::Error;
pub use executor::RequestExecutor;
pub use pipeline::Pipeline;
pub use providers::{ChatTransport, OpenAiClient};
pub use request::{ChatCompletionParams, ChatMessage, RequestOptions, Role};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use template::{PromptMode, PromptTemplate};
