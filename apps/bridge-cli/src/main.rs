//! PDF.js bridge inspection tool
//!
//! Shows the bootstrap URL, the queued command plan, or a full simulated
//! load for a viewer configuration file.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pdfjs-bridge")]
#[command(version, about = "Inspect the PDF.js viewer bridge for a configuration")]
struct Args {
    /// Viewer configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Document URL, overriding `source` from the config
    #[arg(short, long, global = true)]
    file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the viewer bootstrap URL
    Url,
    /// Print the commands queued on load, grouped by readiness bucket
    Plan,
    /// Load against an in-memory viewer and print every posted message
    Simulate {
        /// Page count the simulated document reports
        #[arg(long, default_value = "10")]
        pages: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the command output; logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = commands::load_options(args.config.as_deref(), args.file)?;

    let output = match args.command {
        Command::Url => format!("{}\n", commands::url(&options)),
        Command::Plan => commands::plan(&options),
        Command::Simulate { pages } => commands::simulate(options, pages).await?,
    };
    print!("{}", output);
    Ok(())
}
