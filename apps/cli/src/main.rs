//! Babel CLI - Command-line client for the Babel translation server
//!
//! This CLI provides a `babel` command for translating text, inspecting the
//! configured models and managing resident models on a running server.

mod client;
mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use client::BabelClient;
use commands::{admin, models, translate};

/// Babel CLI - Client for the Babel translation server
#[derive(Parser, Debug)]
#[command(name = "babel", author, version, about = "Babel - Cached machine translation client")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Server base URL
    #[arg(long, env = "BABEL_URL", default_value = "http://127.0.0.1:8000", global = true)]
    url: String,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured models and language pairs
    Models,

    /// List supported translation directions
    Supported,

    /// Translate one or more texts
    ///
    /// Prints one translation per line, in the order the texts were given.
    Translate {
        /// Source language (e.g. heb, he)
        #[arg(long)]
        from: String,

        /// Target language (e.g. arb, ar)
        #[arg(long)]
        to: String,

        /// Texts to translate
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Back-translation augmentation
    ///
    /// Translates TEXT into each target language and back into the source language.
    Augment {
        /// Source language
        #[arg(long)]
        from: String,

        /// Pivot language; repeat for several
        #[arg(long = "to", required = true)]
        targets: Vec<String>,

        /// Text to augment
        text: String,
    },

    /// Free the model serving a language pair
    Free {
        /// Source language
        #[arg(long)]
        from: String,

        /// Target language
        #[arg(long)]
        to: String,
    },

    /// Flush the caches of every resident model
    Flush,

    /// Show registry and cache statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client = BabelClient::new(&args.url)?;

    match args.command {
        Command::Models => models::list(&client, args.json).await?,
        Command::Supported => models::supported(&client, args.json).await?,
        Command::Translate { from, to, texts } => {
            translate::translate(&client, &from, &to, &texts, args.json).await?;
        }
        Command::Augment { from, targets, text } => {
            translate::augment(&client, &from, &targets, &text, args.json).await?;
        }
        Command::Free { from, to } => admin::free(&client, &from, &to).await?,
        Command::Flush => admin::flush(&client).await?,
        Command::Stats => admin::stats(&client, args.json).await?,
    }

    Ok(())
}
