//! Command-line interface.

mod commands;

use clap::{Parser, Subcommand};

/// College website backend
#[derive(Parser)]
#[command(name = "collegecms")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    Serve,

    /// Create an admin account unless the username already exists
    CreateAdmin {
        username: String,
        password: String,
    },

    /// Populate empty content tables with demo records
    Seed,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
