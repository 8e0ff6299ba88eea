//! CLI command definitions and subcommands

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::{TimeField, TransportMode};
use crate::itinerary::ContainerId;

/// TripPlan - itinerary scheduling with travel-time annotation
#[derive(Parser)]
#[command(
    name = "tp",
    about = "Arrange candidate places onto trip days and annotate the legs between them",
    version,
    after_help = "Logs are written to: ~/.local/share/tripplan/logs/tripplan.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// User owning the trip
    #[arg(short, long, global = true, default_value = "local")]
    pub user: String,

    /// Trip to operate on
    #[arg(short, long, global = true)]
    pub trip: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Write a trip and its candidate lists from a YAML fixture
    Import {
        /// Fixture file
        #[arg(value_name = "FILE")]
        fixture: PathBuf,
    },

    /// Show the itinerary with leg travel times
    Show {
        /// Only show this day
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Also list candidates and whether they are scheduled
        #[arg(short, long)]
        lists: bool,
    },

    /// Move a candidate (from a list) or an occurrence (from a day) onto a day
    ///
    /// Containers are a date (YYYY-MM-DD) or a list ID; prefix a list ID with
    /// `list:` if it looks like a date. Indexes are zero-based.
    Move {
        source: ContainerId,
        source_index: usize,
        dest: ContainerId,
        dest_index: usize,
    },

    /// Remove an occurrence from a day
    Remove { date: NaiveDate, occurrence: String },

    /// Set or clear an arrival or departure time
    Time {
        date: NaiveDate,
        occurrence: String,
        /// arrival or departure
        field: TimeField,
        /// HH:MM; omit to clear
        value: Option<String>,
    },

    /// Change the transport mode of the leg between two adjacent occurrences
    Mode {
        date: NaiveDate,
        from: String,
        to: String,
        /// driving, walking or transit
        mode: TransportMode,
    },
}

impl Command {
    /// Whether the command edits the itinerary and needs directions
    pub fn is_edit(&self) -> bool {
        matches!(
            self,
            Self::Move { .. } | Self::Remove { .. } | Self::Time { .. } | Self::Mode { .. }
        )
    }
}
