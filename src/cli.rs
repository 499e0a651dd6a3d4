use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a single text from English
    Translate {
        /// Text to translate
        #[arg(long)]
        text: String,

        /// Target language (defaults to the configured one)
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Translate every item of an input object into one or more languages
    Bulk {
        /// Input object (s3://bucket/key)
        #[arg(short, long)]
        input: String,

        /// Output object or prefix (s3://bucket/key)
        #[arg(short, long)]
        output: String,

        /// Target languages (comma-separated)
        #[arg(short, long, default_value = "fr,de")]
        target_langs: String,
    },

    /// Show the status of a managed batch translation job
    JobStatus {
        /// Job id returned by `bulk`
        #[arg(short, long)]
        job_id: String,
    },

    /// Manage the custom dictionary
    Dict {
        #[command(subcommand)]
        action: DictAction,
    },

    /// List objects in the configured bucket
    Objects {
        /// Key prefix
        #[arg(short, long, default_value = "")]
        prefix: String,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum DictAction {
    /// List dictionary entries
    List {
        /// Only entries for this language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Add an entry, or replace the translation of an existing one
    Add {
        /// English term
        #[arg(short, long)]
        source: String,

        /// Target language
        #[arg(short, long)]
        language: String,

        /// Preferred translation (leave empty to auto-fill later)
        #[arg(short, long, default_value = "")]
        translation: String,
    },

    /// Delete an entry
    Delete {
        /// English term
        #[arg(short, long)]
        source: String,

        /// Target language
        #[arg(short, long)]
        language: String,
    },

    /// Machine-translate entries that have no translation yet
    AutoFill,

    /// Export the entries for one language as a terminology CSV
    Export {
        /// Target language
        #[arg(short, long)]
        target: String,
    },

    /// Import a terminology CSV into the translation service
    Import {
        /// Target language
        #[arg(short, long)]
        target: String,

        /// CSV key in the configured bucket (defaults to the configured key)
        #[arg(long)]
        csv_key: Option<String>,
    },

    /// Export then import in one step
    Sync {
        /// Target language
        #[arg(short, long)]
        target: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init {
        /// Destination path
        #[arg(short, long, default_value = "termsync.toml")]
        path: PathBuf,
    },
}

/// Split a comma-separated language list
pub fn parse_languages(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
