//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::reference::Gender;

/// Expected range command arguments.
#[derive(Debug, Args)]
pub struct RangeCommand {
    /// Age in whole years
    #[arg(short, long)]
    pub age: u32,

    /// Reference curve to use
    #[arg(short, long, value_enum)]
    pub gender: GenderArg,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Classify command arguments.
#[derive(Debug, Args)]
pub struct ClassifyCommand {
    /// Age in whole years
    #[arg(short, long)]
    pub age: u32,

    /// Reference curve to use
    #[arg(short, long, value_enum)]
    pub gender: GenderArg,

    /// Height to classify, in centimetres
    #[arg(short = 'H', long)]
    pub height: f64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Assess command arguments.
#[derive(Debug, Args)]
pub struct AssessCommand {
    /// Current age in whole years (0-18)
    #[arg(short, long)]
    pub age: u32,

    /// Reference curve to use
    #[arg(short, long, value_enum)]
    pub gender: GenderArg,

    /// Current height in centimetres (50-200)
    #[arg(short = 'H', long)]
    pub height: f64,

    /// Current weight in kilograms (5-100)
    #[arg(short = 'W', long)]
    pub weight: f64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Reference data commands.
#[derive(Debug, Subcommand)]
pub enum ReferenceCommand {
    /// Import an LMS table file for one gender
    Import {
        /// Curve the file describes
        #[arg(short, long, value_enum)]
        gender: GenderArg,

        /// Path to the table (tab, comma or space delimited, with a header)
        file: PathBuf,
    },

    /// List stored reference rows
    List {
        /// Only list rows for this gender
        #[arg(short, long, value_enum)]
        gender: Option<GenderArg>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete stored reference rows
    Delete {
        /// Curve to delete from
        #[arg(short, long, value_enum)]
        gender: GenderArg,

        /// Only delete the row for this month of age
        #[arg(short, long)]
        month: Option<u32>,

        /// Skip confirmation when deleting a whole curve
        #[arg(short, long)]
        yes: bool,
    },

    /// Show reference store status
    Status {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Gender argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GenderArg {
    /// Boys reference curve
    #[value(alias = "m", alias = "boy")]
    Male,
    /// Girls reference curve
    #[value(alias = "f", alias = "girl")]
    Female,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Self::Male,
            GenderArg::Female => Self::Female,
        }
    }
}
