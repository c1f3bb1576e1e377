//! sectionize command line interface

use clap::Parser;
use log::debug;
use sectionize::report::USAGE;
use sectionize::{
    Cli, LocalAnalyzer, SectionizeError, Sectionizer, Settings, SidecarStore, WavSectionRenderer,
};
use std::process::ExitCode;

/// Exit status for a missing input, the 8-bit form of -1
const USAGE_EXIT: u8 = 255;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(SectionizeError::Usage) => {
            println!("{}", USAGE);
            ExitCode::from(USAGE_EXIT)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), SectionizeError> {
    let settings = Settings::from_cli(cli)?;
    debug!("sectionize {} {:?}", sectionize::VERSION, settings);

    let store = if settings.trust_cache {
        SidecarStore::trusting()
    } else {
        SidecarStore::new()
    };
    let mut renderer = WavSectionRenderer::new(&settings.input, settings.bit_depth);
    let sectionizer = Sectionizer::new(LocalAnalyzer::default(), store, settings);

    let summary = sectionizer.run(&mut renderer, &mut std::io::stdout().lock())?;
    debug!(
        "{:?} analysis, {} sections, {} files written",
        summary.source,
        summary.sections,
        summary.files.len()
    );
    Ok(())
}
