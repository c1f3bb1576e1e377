//! Command-line arguments and run settings

use crate::core::BitDepth;
use crate::error::{SectionizeError, SectionizeResult};
use clap::Parser;
use std::path::PathBuf;

/// Analyse an audio file, describe its sections and write each one to its own file
#[derive(Parser, Debug)]
#[command(name = "sectionize")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Audio file to analyse
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Directory for the numbered section files
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Ignore an existing analysis cache and recompute
    #[arg(long)]
    pub refresh: bool,

    /// Accept a cached analysis even if the input file changed since
    #[arg(long)]
    pub trust_cache: bool,

    /// Print the report without writing section files
    #[arg(long)]
    pub no_export: bool,

    /// List every section in the report
    #[arg(long)]
    pub details: bool,

    /// Sample format of rendered sections: 16, 24 or 32 (float)
    #[arg(long, value_name = "BITS", default_value = "16")]
    #[arg(value_parser = clap::value_parser!(u16).range(16..=32))]
    pub bit_depth: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings for one run, validated from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Audio file to analyse
    pub input: PathBuf,
    /// Where section files go
    pub output_dir: PathBuf,
    /// Skip the cache lookup
    pub refresh: bool,
    /// Skip the source fingerprint check on cached analyses
    pub trust_cache: bool,
    /// Render and write sections
    pub export: bool,
    /// Include the per-section table in the report
    pub details: bool,
    /// Sample format of rendered sections
    pub bit_depth: BitDepth,
}

impl Settings {
    /// Settings for analysing `input` with every option at its default
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Settings {
            input: input.into(),
            output_dir: PathBuf::from("."),
            refresh: false,
            trust_cache: false,
            export: true,
            details: false,
            bit_depth: BitDepth::default(),
        }
    }

    /// Validate the command line; a missing or empty input is a usage error
    pub fn from_cli(cli: &Cli) -> SectionizeResult<Self> {
        let input = match &cli.input {
            Some(input) if !input.as_os_str().is_empty() => input.clone(),
            _ => return Err(SectionizeError::Usage),
        };

        Ok(Settings {
            input,
            output_dir: cli.output_dir.clone(),
            refresh: cli.refresh,
            trust_cache: cli.trust_cache,
            export: !cli.no_export,
            details: cli.details,
            bit_depth: BitDepth::from_bits(cli.bit_depth)?,
        })
    }

    /// Name of the input as shown in the report heading
    pub fn input_name(&self) -> String {
        self.input.display().to_string()
    }
}
