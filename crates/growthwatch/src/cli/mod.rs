//! Command-line interface for growthwatch.
//!
//! This module provides the CLI structure for the `growthwatch` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AssessCommand, ClassifyCommand, ConfigCommand, GenderArg, RangeCommand, ReferenceCommand,
};

/// growthwatch - Check a child's growth against WHO reference standards
///
/// Computes the expected height range for an age and gender from WHO LMS
/// growth tables and classifies heights as normal, undergrowth or overgrowth.
#[derive(Debug, Parser)]
#[command(name = "growthwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the expected height range for an age and gender
    Range(RangeCommand),

    /// Classify a height against the expected range
    Classify(ClassifyCommand),

    /// Predict next height from current measurements and classify it
    Assess(AssessCommand),

    /// Manage stored reference tables
    #[command(subcommand)]
    Reference(ReferenceCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
