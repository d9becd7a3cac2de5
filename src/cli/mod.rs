//! CLI interface for Schoolgate

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "schoolgate")]
#[command(version)]
#[command(about = "Session refresh and admin route guard for the school website", long_about = None)]
pub struct Cli {
    /// Path to schoolgate.toml (defaults to searching upward from the current directory)
    #[arg(short, long, global = true, env = "SCHOOLGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new schoolgate.toml configuration file
    Init,

    /// Start the gateway in front of the website
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show how the guard treats the given paths
    Routes {
        /// Request paths to check, e.g. /admin/notices
        #[arg(required = true)]
        paths: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Decode an access token and show its claims and expiry
    Token {
        /// The access token (JWT)
        token: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
