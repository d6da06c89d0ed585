mod config;
mod error;
mod models;
mod ollama;
mod render;
mod response;
mod stream;
mod translate;

use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use config::GlobalOpts;
use console::{style, Term};
use futures_util::Stream;
use indicatif::ProgressBar;
use models::{ChatRequest, GenerateRequest, Message, StreamChunk};
use ollama::Ollama;
use tokio::runtime::Runtime;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ollama-smoke")]
#[command(about = "Send one request to a local Ollama server and print the answer")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a chat model through /api/chat
    Chat(ChatArgs),
    /// Complete a prompt through /api/generate
    Generate(GenerateArgs),
    /// Translate text with a TranslateGemma model
    Translate(TranslateArgs),
}

#[derive(Args)]
struct ChatArgs {
    #[arg(default_value = "Write a Python function to parse CSV")]
    prompt: String,

    #[arg(long, default_value = "qwen2.5-coder:14b")]
    model: String,

    /// System message sent before the prompt
    #[arg(long)]
    system: Option<String>,

    /// Print fragments as they arrive
    #[arg(long)]
    stream: bool,

    /// Syntax-highlight fenced code blocks in the answer
    #[arg(long, conflicts_with = "stream")]
    highlight: bool,
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(default_value = "Explain transformers")]
    prompt: String,

    #[arg(long, default_value = "llama3")]
    model: String,

    /// Print fragments as they arrive
    #[arg(long)]
    stream: bool,
}

#[derive(Args)]
struct TranslateArgs {
    #[arg(default_value = "Hello, how are you?")]
    text: String,

    #[arg(long, default_value = "translategemma:latest")]
    model: String,

    /// Source language code
    #[arg(long, default_value = "en")]
    from: String,

    /// Target language code
    #[arg(long, default_value = "es")]
    to: String,

    /// Print fragments as they arrive
    #[arg(long)]
    stream: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.opts.init_logging();

    let rt = Runtime::new().context("failed to start the async runtime")?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let opts = cli.opts;
    let client = Ollama::new(&opts.host);

    match cli.command {
        Commands::Chat(args) => {
            let mut messages = Vec::new();
            if let Some(system) = args.system {
                messages.push(Message::system(system));
            }
            messages.push(Message::user(args.prompt));
            let request = ChatRequest {
                model: args.model,
                messages,
                stream: args.stream,
            };

            if request.stream {
                let chunks = client.chat_stream(&request, opts.stream_timeout()).await?;
                announce("/api/chat", &request.model)?;
                print_streamed(chunks).await?;
            } else {
                let text = with_spinner(
                    &request.model,
                    client.chat(&request, opts.request_timeout()),
                )
                .await?;
                render::print_answer(&text, args.highlight)?;
            }
        }
        Commands::Generate(args) => {
            let request = GenerateRequest {
                model: args.model,
                prompt: args.prompt,
                stream: args.stream,
            };
            generate(&client, &opts, &request).await?;
        }
        Commands::Translate(args) => {
            let source = translate::language(&args.from)?;
            let target = translate::language(&args.to)?;
            let request = GenerateRequest {
                model: args.model,
                prompt: translate::translation_prompt(source, target, &args.text),
                stream: args.stream,
            };
            info!(from = source.code, to = target.code, "translating");
            generate(&client, &opts, &request).await?;
        }
    }

    Ok(())
}

async fn generate(client: &Ollama, opts: &GlobalOpts, request: &GenerateRequest) -> anyhow::Result<()> {
    if request.stream {
        let chunks = client.generate_stream(request, opts.stream_timeout()).await?;
        announce("/api/generate", &request.model)?;
        print_streamed(chunks).await?;
    } else {
        let text = with_spinner(&request.model, client.generate(request, opts.request_timeout())).await?;
        render::print_answer(&text, false)?;
    }
    Ok(())
}

async fn print_streamed(chunks: impl Stream<Item = error::Result<StreamChunk>>) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let summary = response::print_stream(chunks, &mut out).await?;
    writeln!(out)?;

    if !summary.terminated {
        warn!(
            chunks = summary.chunks,
            "stream ended before the server marked it done"
        );
    }
    info!(
        model = ?summary.model,
        chars = summary.text.chars().count(),
        prompt_eval_count = ?summary.prompt_eval_count,
        eval_count = ?summary.eval_count,
        "stream finished"
    );
    Ok(())
}

/// Dim one-line header on stderr so stdout stays pure generated text.
/// Only printed once the server has answered.
fn announce(endpoint: &str, model: &str) -> io::Result<()> {
    Term::stderr().write_line(&header(endpoint, model))
}

fn header(endpoint: &str, model: &str) -> String {
    style(format!("{endpoint} · {model}")).dim().to_string()
}

async fn with_spinner<F>(model: &str, call: F) -> error::Result<String>
where
    F: Future<Output = error::Result<String>>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("waiting for {model}"));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = call.await;
    spinner.finish_and_clear();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn chat_defaults_match_the_smoke_request() {
        let cli = Cli::try_parse_from(["ollama-smoke", "chat"]).unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.model, "qwen2.5-coder:14b");
                assert_eq!(args.prompt, "Write a Python function to parse CSV");
                assert!(!args.stream);
                assert!(args.system.is_none());
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn generate_accepts_stream_and_timeouts() {
        let cli = Cli::try_parse_from([
            "ollama-smoke",
            "generate",
            "--stream",
            "--stream-timeout",
            "5",
            "Why is the sky blue?",
        ])
        .unwrap();
        assert_eq!(cli.opts.stream_timeout(), Duration::from_secs(5));
        match cli.command {
            Commands::Generate(args) => {
                assert!(args.stream);
                assert_eq!(args.model, "llama3");
                assert_eq!(args.prompt, "Why is the sky blue?");
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn translate_defaults_to_english_spanish() {
        let cli = Cli::try_parse_from(["ollama-smoke", "translate"]).unwrap();
        match cli.command {
            Commands::Translate(args) => {
                assert_eq!(args.model, "translategemma:latest");
                assert_eq!(args.from, "en");
                assert_eq!(args.to, "es");
                assert_eq!(args.text, "Hello, how are you?");
            }
            _ => panic!("expected translate"),
        }
    }

    #[test]
    fn header_names_endpoint_and_model() {
        let header = console::strip_ansi_codes(&header("/api/generate", "llama3")).into_owned();
        assert_eq!(header, "/api/generate · llama3");
    }

    #[test]
    fn highlight_conflicts_with_stream() {
        assert!(Cli::try_parse_from(["ollama-smoke", "chat", "--stream", "--highlight"]).is_err());
    }
}
