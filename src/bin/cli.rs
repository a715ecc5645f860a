//! FlashStore CLI
//!
//! Command-line interface for reading and editing a store file.

use clap::{Parser, Subcommand, ValueEnum};
use flashstore::{Config, Engine, Key, SlackPolicy};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// FlashStore CLI
#[derive(Parser, Debug)]
#[command(name = "flashstore-cli")]
#[command(about = "CLI for FlashStore single-file JSON stores")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./flashstore_data")]
    data_dir: String,

    /// Store file name inside the data directory
    #[arg(short, long, default_value = "presets.json")]
    file: String,

    /// Largest value, in serialized bytes
    #[arg(short, long, default_value = "1024")]
    capacity: usize,

    /// How deleted space is reused
    #[arg(long, value_enum, default_value = "first-fit")]
    slack: Slack,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Slack {
    FirstFit,
    BestFit,
    AppendOnly,
}

impl From<Slack> for SlackPolicy {
    fn from(s: Slack) -> Self {
        match s {
            Slack::FirstFit => SlackPolicy::FirstFit,
            Slack::BestFit => SlackPolicy::BestFit,
            Slack::AppendOnly => SlackPolicy::AppendOnly,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key (a number is an id, anything else a name)
        key: Key,
    },

    /// Set a key to a JSON value (`null` deletes)
    Set {
        /// The key to set
        key: Key,

        /// The value, as JSON text
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: Key,
    },

    /// Print every entry
    Dump,

    /// Print file length and slack usage
    Stats,

    /// Rewrite the file without slack
    Compact,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> flashstore::Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .store_file(&args.file)
        .document_capacity(args.capacity)
        .slack_policy(args.slack.into())
        .build();
    let engine = Engine::open_disk(config)?;

    match args.command {
        Commands::Get { key } => match engine.get(&key)? {
            Some(value) => println!("{}", value),
            None => {
                eprintln!("not found: {}", key);
                std::process::exit(2);
            }
        },
        Commands::Set { key, value } => {
            let value: Value = serde_json::from_str(&value)?;
            let outcome = engine.upsert(&key, Some(&value))?;
            println!("{:?}", outcome);
        }
        Commands::Del { key } => {
            if engine.delete(&key)? {
                println!("deleted {}", key);
            } else {
                println!("not found: {}", key);
            }
        }
        Commands::Dump => {
            for (key, value) in engine.entries()? {
                println!("{}\t{}", key, value);
            }
        }
        Commands::Stats => {
            let stats = engine.stats()?;
            println!("file_len      {}", stats.file_len);
            println!("slack_bytes   {}", stats.slack_bytes);
            println!("largest_run   {}", stats.largest_slack_run);
            println!("slack_runs    {}", stats.slack_runs);
        }
        Commands::Compact => {
            let reclaimed = engine.compact()?;
            println!("reclaimed {} bytes", reclaimed);
        }
    }

    Ok(())
}
