//! Inspect a memory snapshot from the command line.
//!
//! # Examples
//!
//! ```sh
//! # What the model would see with a tighter screenshot budget
//! memoir render session.json --max-screenshots 8
//!
//! # Per-record visibility decisions
//! memoir mask session.json --thought-limit 5
//!
//! # Everything, ignoring the mask
//! memoir dump session.json
//!
//! # JSON Schema of the snapshot format
//! memoir schema
//! ```
//!
//! Each invocation loads the snapshot into a fresh engine and renders once.
//! Loading resets the frozen mask, so that render is always a full recompute
//! and a `promptCaching` key in `--config` does not change the output.
//!
//! Set `RUST_LOG=memoir=debug` (or pass `--verbose`) to see mask decisions.

use clap::{Args, Parser, Subcommand};
use memoir::prelude::*;
use memoir::RenderReport;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Inspect agent memory snapshots.
#[derive(Parser)]
#[command(name = "memoir")]
struct Cli {
    /// Log mask decisions to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the model-facing render as JSON (media summarized by size).
    Render {
        file: PathBuf,
        #[command(flatten)]
        options: MemoryOptions,
    },
    /// Print every content part of every record, ignoring the mask.
    Dump { file: PathBuf },
    /// Print one line per record with its visibility decision.
    Mask {
        file: PathBuf,
        #[command(flatten)]
        options: MemoryOptions,
    },
    /// Print the snapshot JSON Schema.
    Schema,
}

#[derive(Args, Default)]
struct MemoryOptions {
    /// JSON file with memory options (camelCase keys). Flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Default number of thoughts kept visible.
    #[arg(long)]
    thought_limit: Option<usize>,

    /// Screenshots kept after a batch drop.
    #[arg(long)]
    min_screenshots: Option<usize>,

    /// Visible screenshots that trigger a batch drop.
    #[arg(long)]
    max_screenshots: Option<usize>,
}

impl MemoryOptions {
    fn build(&self) -> Result<MemoryConfig, MemoryError> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => MemoryConfig::default(),
        };
        if let Some(limit) = self.thought_limit {
            config = config.with_thought_limit(limit);
        }
        let min = self.min_screenshots.unwrap_or(config.min_screenshots);
        let max = self.max_screenshots.unwrap_or(config.max_screenshots);
        Ok(config.with_screenshot_bounds(min, max))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "memoir=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), MemoryError> {
    match command {
        Command::Render { file, options } => {
            let report = load(&file, &options)?.render_with_report().await?;
            let messages: Vec<serde_json::Value> =
                report.messages.iter().map(summarize_message).collect();
            println!("{}", serde_json::to_string_pretty(&messages)?);
        }
        Command::Dump { file } => {
            let memory = load(&file, &MemoryOptions::default())?;
            for part in memory.render_flat()? {
                match part {
                    MessagePart::Text { text } => println!("{text}"),
                    MessagePart::Image { media_type, data } => {
                        println!("<{media_type}, {} base64 chars>", data.len())
                    }
                }
            }
        }
        Command::Mask { file, options } => {
            let mut memory = load(&file, &options)?;
            let report = memory.render_with_report().await?;
            print_mask(&memory, &report);
        }
        Command::Schema => {
            println!(
                "{}",
                serde_json::to_string_pretty(&MemorySnapshot::json_schema())?
            );
        }
    }
    Ok(())
}

fn load(path: &Path, options: &MemoryOptions) -> Result<AgentMemory, MemoryError> {
    let snapshot = MemorySnapshot::read_from(path)?;
    AgentMemory::from_snapshot(options.build()?, &snapshot)
}

/// A rendered message with image payloads replaced by their size.
fn summarize_message(message: &MultiMediaMessage) -> serde_json::Value {
    let content: Vec<serde_json::Value> = message
        .content
        .iter()
        .map(|part| match part {
            MessagePart::Text { text } => serde_json::json!({"type": "text", "text": text}),
            MessagePart::Image { media_type, data } => serde_json::json!({
                "type": "image",
                "mimeType": media_type,
                "data": format!("<{} base64 chars>", data.len()),
            }),
        })
        .collect();
    serde_json::json!({"role": message.role, "content": content})
}

fn print_mask(memory: &AgentMemory, report: &RenderReport) {
    println!(
        "{:?}: {}/{} records visible",
        report.outcome,
        report.mask.visible_count(),
        report.mask.len()
    );
    for (index, (obs, visible)) in memory.log().iter().zip(report.mask.iter()).enumerate() {
        let policy = match obs.retention() {
            Some(RetentionPolicy::Thought { limit: Some(n) }) => format!("thought({n})"),
            Some(RetentionPolicy::Thought { limit: None }) => "thought".to_string(),
            Some(RetentionPolicy::Screenshot) => "screenshot".to_string(),
            None => "-".to_string(),
        };
        let mark = if visible { "+" } else { " " };
        println!("{mark} {index:>4}  {:<24} {policy}", obs.source().to_string());
    }
}
