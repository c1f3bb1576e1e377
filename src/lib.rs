#![warn(missing_docs)]

//! # sectionize
//!
//! Describe the musical structure of an audio file and cut it into its sections.
//!
//! ## Features
//!
//! - **Analyse** - tempo, beats, bars, key, segments and sections of any format symphonia decodes
//! - **Cache** - analyses are kept in a versioned JSON sidecar next to the input
//! - **Report** - fixed-layout summary on stdout
//! - **Export** - every section rendered to its own numbered WAV file
//!
//! ## Quick Start
//!
//! ```ignore
//! use sectionize::{LocalAnalyzer, Sectionizer, Settings, SidecarStore, WavSectionRenderer};
//!
//! let settings = Settings::new("song.mp3");
//! let mut renderer = WavSectionRenderer::new(&settings.input, settings.bit_depth);
//! let sectionizer = Sectionizer::new(LocalAnalyzer::default(), SidecarStore::new(), settings);
//! let summary = sectionizer.run(&mut renderer, &mut std::io::stdout())?;
//! println!("{} sections", summary.sections);
//! ```

/// Track structure analysis
pub mod analysis;
/// Sidecar analysis cache
pub mod cache;
/// Command-line arguments and settings
pub mod config;
/// Core audio types and structures
pub mod core;
/// Audio decoder implementations
pub mod decoder;
/// Audio encoder implementations
pub mod encoder;
/// Error types
pub mod error;
/// Writing sections to files
pub mod export;
/// Audio filter implementations
pub mod filter;
/// Cache-or-compute, report and export workflow
pub mod pipeline;
/// Cutting sections out of decoded audio
pub mod processor;
/// Section rendering
pub mod render;
/// Text report
pub mod report;

// Export public types
pub use analysis::{Analyzer, LocalAnalyzer, Section, Track};
pub use cache::{AnalysisStore, CacheLookup, SidecarStore};
pub use config::{Cli, Settings};
pub use core::{AudioFrame, BitDepth, Channels};
pub use error::{SectionizeError, SectionizeResult};
pub use pipeline::{AnalysisSource, RunSummary, Sectionizer};
pub use render::{SectionRenderer, WavSectionRenderer};
pub use report::ReportLayout;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
