//! Command-line argument definitions for the Trellis CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments pick the generated graph, the layout and its
//! bounds, the output path, configuration file selection, and logging
//! verbosity.

use clap::Parser;

use crate::generate::Shape;

/// Command-line arguments for the Trellis layout harness
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Shape of the generated graph
    #[arg(long, value_enum, default_value_t = Shape::Balanced)]
    pub shape: Shape,

    /// Number of generated nodes
    #[arg(short = 'n', long, default_value_t = 31)]
    pub nodes: usize,

    /// Children per node for balanced trees
    #[arg(long, default_value_t = 2)]
    pub fanout: usize,

    /// Layout engine; overrides the configuration file
    #[arg(short, long)]
    pub layout: Option<String>,

    /// Width of the layout bounds
    #[arg(long, default_value_t = 800.0)]
    pub width: f32,

    /// Height of the layout bounds
    #[arg(long, default_value_t = 600.0)]
    pub height: f32,

    /// Only show nodes within this many levels of the root
    #[arg(long)]
    pub fisheye: Option<usize>,

    /// Seed for graph generation and random placement
    #[arg(long)]
    pub seed: Option<u64>,

    /// Path to the output TOML snapshot
    #[arg(short, long, default_value = "layout.toml")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
