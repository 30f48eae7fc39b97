use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "resume_api")]
#[command(about = "Resume Builder API server", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file (created with defaults if missing)
    #[arg(long, global = true, default_value = "resume_api.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the effective configuration with secrets masked
    ShowConfig,
}
