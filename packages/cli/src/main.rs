mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, tag, InitArgs, TagArgs};

/// Live edit CLI - stamp JSX/TSX sources for click-to-edit
#[derive(Parser, Debug)]
#[command(name = "liveedit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a liveedit.config.json for this project
    Init(InitArgs),

    /// Tag JSX/TSX files with source-location identities
    Tag(TagArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|dir| {
            let cwd = dir.display().to_string();
            match cli.command {
                Command::Init(args) => init(args, &cwd),
                Command::Tag(args) => tag(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
