//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use lt_core::{ItemRule, SpeedClass};

/// Lap time tracker.
///
/// Records time-trial lap times per track and derives ranked timesheets
/// against world records and tier standards.
#[derive(Debug, Parser)]
#[command(name = "lt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the database and load the track list.
    Init {
        /// CSV file with lines of `number,cup,cup_type,name,abbrev`.
        tracks: PathBuf,
    },

    /// Record a lap time for a track.
    Add {
        /// Full track name.
        track: String,

        /// Lap time in `M:SS.mmm` format.
        time: String,

        /// Speed class.
        #[arg(long, default_value = "150cc")]
        speed: SpeedClass,

        /// Item ruleset.
        #[arg(long, default_value = "shrooms")]
        items: ItemRule,
    },

    /// Delete a recorded time by its ID.
    Delete {
        /// Row ID as shown by `lt recent`.
        id: i64,
    },

    /// Bulk-load times from a CSV file of `track_name,time` lines.
    Import {
        times: PathBuf,

        /// Speed class the imported times were set in.
        #[arg(long, default_value = "150cc")]
        speed: SpeedClass,

        /// Item ruleset the imported times were set under.
        #[arg(long, default_value = "shrooms")]
        items: ItemRule,
    },

    /// Show the personal-best timesheet for a category.
    Timesheet {
        /// Speed class.
        #[arg(long, default_value = "150cc")]
        speed: SpeedClass,

        /// Item ruleset.
        #[arg(long, default_value = "shrooms")]
        items: ItemRule,

        /// Output rows and statistics as JSON.
        #[arg(long)]
        json: bool,

        /// Sort by a numeric column: time, standard, standard-diff, wr,
        /// wr-diff, wr-diff-norm.
        #[arg(long)]
        sort: Option<String>,

        /// Keep only the first N rows after sorting.
        #[arg(long)]
        top: Option<usize>,

        /// Sort descending instead of ascending.
        #[arg(long, requires = "sort")]
        bottom: bool,
    },

    /// Show the most recently recorded times.
    Recent {
        /// Number of entries to show.
        #[arg(default_value_t = 10)]
        n: usize,
    },

    /// Show every recorded time for one track with improvement gaps.
    Track {
        /// Full track name.
        name: String,

        /// Speed class.
        #[arg(long, default_value = "150cc")]
        speed: SpeedClass,

        /// Item ruleset.
        #[arg(long, default_value = "shrooms")]
        items: ItemRule,
    },
}
