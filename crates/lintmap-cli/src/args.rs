//! Command-line argument definitions for the Lintmap CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the projects to scan, paths to leave
//! out, the lint output to overlay, configuration, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Lintmap diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Project directories or Python files to scan
    #[arg(required = true, help = "Project paths to scan")]
    pub projects: Vec<String>,

    /// Paths or base names to leave out of the scan
    #[arg(short = 'x', long = "exclude")]
    pub exclude: Vec<String>,

    /// Pylint output in `parseable` format to overlay on the diagram
    #[arg(short, long)]
    pub lint: Option<String>,

    /// Ignored findings store (TOML)
    #[arg(long)]
    pub ignored: Option<String>,

    /// Path to the diagram report to write
    #[arg(short, long, default_value = "lintmap.txt")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Seconds to wait for the scan to finish
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
