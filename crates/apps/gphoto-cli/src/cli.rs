use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Upload files to the photo service and manage its collections.
#[derive(Parser, Debug)]
#[command(name = "gphoto", version, about)]
pub struct Cli {
    /// Configuration file (defaults to <config dir>/gphoto/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Cookie export file: a JSON array of {"name", "value"} objects
    #[arg(long, global = true)]
    pub cookies: Option<PathBuf>,

    /// Session token to use instead of reading it from the home page
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload one file and file it under a collection
    Upload {
        path: PathBuf,
        /// Display name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
        /// Target collection (defaults to the configured default collection)
        #[arg(long)]
        collection: Option<String>,
        /// Suppress progress output
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
    /// Work with collections
    Collections {
        #[command(subcommand)]
        action: CollectionsAction,
    },
    /// Remove an item from the collection it is in
    Remove { item_id: String },
}

#[derive(Subcommand, Debug)]
pub enum CollectionsAction {
    List,
    Create { name: String },
    Add { collection_id: String, item_id: String },
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
