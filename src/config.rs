use std::time::Duration;

use clap::Args;
use tracing_subscriber::EnvFilter;

use crate::ollama::DEFAULT_HOST;

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Base URL of the Ollama server
    #[arg(long, global = true, env = "OLLAMA_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Seconds to wait for a complete non-streaming response
    #[arg(long, global = true, env = "OLLAMA_SMOKE_TIMEOUT", default_value_t = 600)]
    pub timeout: u64,

    /// Seconds to wait for the response head and for each streamed chunk
    #[arg(long, global = true, env = "OLLAMA_SMOKE_STREAM_TIMEOUT", default_value_t = 30)]
    pub stream_timeout: u64,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalOpts {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout)
    }

    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// `RUST_LOG` wins over `-v`. Logs go to stderr so stdout only carries
    /// generated text.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level()));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}
