//! One run: load or compute the analysis, report it, export its sections

use crate::analysis::{Analyzer, Track};
use crate::cache::{AnalysisStore, CacheLookup};
use crate::config::Settings;
use crate::error::{SectionizeError, SectionizeResult};
use crate::export;
use crate::render::SectionRenderer;
use crate::report::{self, ReportLayout};
use log::{debug, info, warn};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Where the analysis of a run came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSource {
    /// Read back from the store
    Cache,
    /// Computed by the analyzer and then stored
    Computed,
}

/// What a run did
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Origin of the analysis
    pub source: AnalysisSource,
    /// Duration of the track in seconds
    pub duration: f64,
    /// Number of detected sections
    pub sections: usize,
    /// Section files written, in order
    pub files: Vec<PathBuf>,
}

/// Drives an analyzer and a store for the configured input
pub struct Sectionizer<A, S> {
    analyzer: A,
    store: S,
    settings: Settings,
    layout: ReportLayout,
}

impl<A: Analyzer, S: AnalysisStore> Sectionizer<A, S> {
    /// Combine the collaborators of a run
    pub fn new(analyzer: A, store: S, settings: Settings) -> Self {
        Sectionizer {
            analyzer,
            store,
            settings,
            layout: ReportLayout::default(),
        }
    }

    /// Cached analysis of the input if usable, otherwise a fresh one that is then saved
    pub fn load_or_compute(&self) -> SectionizeResult<(Track, AnalysisSource)> {
        let input = &self.settings.input;

        if self.settings.refresh {
            debug!("Cache lookup skipped for {}", input.display());
        } else {
            match self.store.load(input) {
                CacheLookup::Hit(track) => {
                    info!("Using cached analysis of {}", input.display());
                    return Ok((track, AnalysisSource::Cache));
                }
                CacheLookup::Miss => {}
                CacheLookup::Invalid { reason } => {
                    warn!("Ignoring analysis cache of {}: {}", input.display(), reason);
                }
            }
        }

        let track = self.analyzer.analyze(input)?;
        self.store.save(input, self.analyzer.name(), &track)?;
        Ok((track, AnalysisSource::Computed))
    }

    /// Run the whole workflow, writing the report to `out`
    pub fn run<R: SectionRenderer, W: Write>(
        &self,
        renderer: &mut R,
        out: &mut W,
    ) -> SectionizeResult<RunSummary> {
        let (track, source) = self.load_or_compute()?;

        report::write_track_details(out, &self.layout, &self.settings.input_name(), &track)?;
        if self.settings.details && track.has_sections() {
            report::write_section_table(out, &self.layout, &track.sections)?;
        }
        out.flush()?;

        let files = if self.settings.export && track.has_sections() {
            let out_dir = &self.settings.output_dir;
            fs::create_dir_all(out_dir).map_err(|source| SectionizeError::OutputError {
                path: out_dir.clone(),
                source,
            })?;
            export::export_sections(&track.sections, renderer, out_dir)?
        } else {
            Vec::new()
        };

        report::write_footer(out, &self.layout)?;
        out.flush()?;

        Ok(RunSummary {
            source,
            duration: track.duration,
            sections: track.sections.len(),
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::path::Path;

    fn track(sections: usize) -> Track {
        Track {
            duration: 30.0,
            sample_rate: 22050,
            loudness: -12.0,
            tempo: 120.0,
            tempo_confidence: 0.5,
            key: None,
            time_signature: 4,
            time_signature_confidence: 0.5,
            tatums: Vec::new(),
            beats: Vec::new(),
            bars: Vec::new(),
            segments: Vec::new(),
            sections: (0..sections)
                .map(|i| crate::analysis::Section {
                    start: i as f64 * 10.0,
                    duration: 10.0,
                    confidence: 1.0,
                    loudness: -12.0,
                    tempo: 120.0,
                    tempo_confidence: 0.5,
                    key: None,
                    time_signature: 4,
                    time_signature_confidence: 0.5,
                })
                .collect(),
        }
    }

    struct Fixed {
        calls: Cell<usize>,
        result: Option<Track>,
    }

    impl Analyzer for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn analyze(&self, path: &Path) -> SectionizeResult<Track> {
            self.calls.set(self.calls.get() + 1);
            self.result
                .clone()
                .ok_or_else(|| SectionizeError::analysis(path, "unsupported format"))
        }
    }

    struct Memory {
        lookup: CacheLookup,
        saved: RefCell<Vec<String>>,
    }

    impl AnalysisStore for Memory {
        fn load(&self, _input: &Path) -> CacheLookup {
            self.lookup.clone()
        }

        fn save(&self, input: &Path, analyzer: &str, _track: &Track) -> SectionizeResult<PathBuf> {
            self.saved.borrow_mut().push(analyzer.to_string());
            Ok(input.with_extension("cache"))
        }
    }

    fn memory(lookup: CacheLookup) -> Memory {
        Memory {
            lookup,
            saved: RefCell::new(Vec::new()),
        }
    }

    fn fixed(result: Option<Track>) -> Fixed {
        Fixed {
            calls: Cell::new(0),
            result,
        }
    }

    #[test]
    fn test_hit_skips_analyzer() {
        let analyzer = fixed(Some(track(1)));
        let store = memory(CacheLookup::Hit(track(2)));
        let sectionizer = Sectionizer::new(&analyzer, &store, Settings::new("a.wav"));

        let (loaded, source) = sectionizer.load_or_compute().unwrap();
        assert_eq!(source, AnalysisSource::Cache);
        assert_eq!(loaded.sections.len(), 2);
        assert_eq!(analyzer.calls.get(), 0);
        assert!(store.saved.borrow().is_empty());
    }

    #[test]
    fn test_miss_and_invalid_compute_once() {
        for lookup in [
            CacheLookup::Miss,
            CacheLookup::Invalid {
                reason: "corrupt".to_string(),
            },
        ] {
            let analyzer = fixed(Some(track(1)));
            let store = memory(lookup);
            let sectionizer = Sectionizer::new(&analyzer, &store, Settings::new("a.wav"));

            let (_, source) = sectionizer.load_or_compute().unwrap();
            assert_eq!(source, AnalysisSource::Computed);
            assert_eq!(analyzer.calls.get(), 1);
            assert_eq!(*store.saved.borrow(), vec!["fixed".to_string()]);
        }
    }

    #[test]
    fn test_refresh_ignores_cache() {
        let analyzer = fixed(Some(track(1)));
        let store = memory(CacheLookup::Hit(track(2)));
        let mut settings = Settings::new("a.wav");
        settings.refresh = true;

        let (loaded, source) = Sectionizer::new(&analyzer, &store, settings)
            .load_or_compute()
            .unwrap();
        assert_eq!(source, AnalysisSource::Computed);
        assert_eq!(loaded.sections.len(), 1);
        assert_eq!(store.saved.borrow().len(), 1);
    }

    #[test]
    fn test_analyzer_failure_is_fatal_and_not_saved() {
        let analyzer = fixed(None);
        let store = memory(CacheLookup::Miss);
        let err = Sectionizer::new(&analyzer, &store, Settings::new("a.wav"))
            .load_or_compute()
            .unwrap_err();
        assert!(matches!(err, SectionizeError::AnalysisError { .. }));
        assert!(store.saved.borrow().is_empty());
    }

    #[test]
    fn test_run_without_export() {
        struct Unused;
        impl SectionRenderer for Unused {
            fn extension(&self) -> &'static str {
                "bin"
            }
            fn render(&mut self, _section: &crate::analysis::Section) -> SectionizeResult<Vec<u8>> {
                panic!("export disabled")
            }
        }

        let analyzer = fixed(Some(track(3)));
        let store = memory(CacheLookup::Miss);
        let mut settings = Settings::new("a.wav");
        settings.export = false;
        settings.details = true;

        let mut out = Vec::new();
        let summary = Sectionizer::new(&analyzer, &store, settings)
            .run(&mut Unused, &mut out)
            .unwrap();

        assert_eq!(summary.sections, 3);
        assert!(summary.files.is_empty());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("* Counted      3 sections"));
        assert!(text.contains("   3    20.000    10.000"));
        assert!(text.ends_with(&format!(" \n {}\n", "*".repeat(60))));
    }
}
