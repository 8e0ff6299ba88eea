//! CLI argument parsing for docstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ds")]
#[command(author, version, about = "Inspect a tripplan document store", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Store directory (overrides config)
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List collections with document counts
    Collections,

    /// Print one document
    Get {
        /// Collection name
        #[arg(required = true)]
        collection: String,

        /// Document ID
        #[arg(required = true)]
        id: String,
    },

    /// Query documents by indexed fields
    Query {
        /// Collection name
        #[arg(required = true)]
        collection: String,

        /// Equality filters as field=value
        #[arg(short, long = "where")]
        filters: Vec<String>,
    },

    /// Delete one document
    Delete {
        /// Collection name
        #[arg(required = true)]
        collection: String,

        /// Document ID
        #[arg(required = true)]
        id: String,
    },
}

/// Parse a `field=value` filter argument
pub fn parse_filter(arg: &str) -> Option<crate::Filter> {
    let (field, value) = arg.split_once('=')?;
    if field.is_empty() {
        return None;
    }
    Some(crate::Filter::eq(field, value))
}
