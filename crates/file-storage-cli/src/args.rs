use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// fstor - manage files kept in the broker's database-backed file storage
#[derive(Parser, Debug)]
#[command(name = "fstor")]
#[command(version)]
#[command(about = "Manage files stored in the broker database", long_about = None)]
pub struct Cli {
    /// PostgreSQL connection string (overrides DATABASE_URL)
    #[arg(long = "database-url", global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create or upgrade the file storage schema
    Migrate,

    /// Store a file, reading content from PATH or stdin
    Put {
        name: String,
        /// Source file; `-` or omitted reads stdin
        path: Option<PathBuf>,
    },

    /// Write a stored file to PATH or stdout
    Get {
        name: String,
        /// Destination file; `-` or omitted writes stdout
        path: Option<PathBuf>,
    },

    /// Delete a stored file
    Rm { name: String },

    /// Print `true` or `false`
    Exists { name: String },

    /// Print size, timestamps and URL as JSON
    Stat { name: String },

    /// Print the public URL of a stored file
    Url { name: String },
}
