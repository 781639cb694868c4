//! Command-line argument definitions for the Trustmap CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Two positional arguments name the input document and the
//! base path of the SVG and PNG outputs.

use clap::Parser;

/// Command-line arguments for the Trustmap diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input threat-model document
    #[arg(help = "Path to the input threat-model document")]
    pub input_file: String,

    /// Output path without extension; `.svg` and `.png` are appended
    #[arg(help = "Output path without extension")]
    pub output_basename: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Path of the SVG output.
    pub fn svg_path(&self) -> String {
        format!("{}.svg", self.output_basename)
    }

    /// Path of the PNG output.
    pub fn png_path(&self) -> String {
        format!("{}.png", self.output_basename)
    }
}
