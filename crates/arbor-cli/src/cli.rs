use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "Arbor -- content-addressed value store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Chunk store directory
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show a stored value
    Show(ShowArgs),
    /// Load a JSON document into the store
    Put(PutArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// Object to show: `#<hash>` or `<store-dir>::#<hash>`
    pub object: String,
    /// Write the canonical encoding to stdout
    #[arg(long)]
    pub raw: bool,
    /// Report statistics for the value and everything it references
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args)]
pub struct PutArgs {
    /// JSON file to read; stdin when omitted
    pub file: Option<PathBuf>,
}
