//! Sidecar analysis cache
//!
//! A computed [`Track`] is stored next to its audio file as
//! `<input>.analysis.en`, a versioned JSON record carrying a fingerprint of the
//! source file. Records that cannot be read back, carry another format version
//! or describe a different version of the source are reported as
//! [`CacheLookup::Invalid`] so the caller can recompute instead of failing.

use crate::analysis::Track;
use crate::error::{SectionizeError, SectionizeResult};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Appended to the input file name to form the sidecar name
pub const SIDECAR_SUFFIX: &str = ".analysis.en";

/// Current record layout
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Sidecar location for `input`: `song.mp3` -> `song.mp3.analysis.en`
pub fn sidecar_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Identity of the source file an analysis was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    /// File size in bytes
    pub size_bytes: u64,
    /// Modification time, milliseconds since the Unix epoch (0 if unknown)
    pub modified_unix_ms: u64,
}

impl SourceFingerprint {
    /// Fingerprint the file at `path`
    pub fn from_path(path: &Path) -> SectionizeResult<Self> {
        let metadata = fs::metadata(path)?;
        let modified_unix_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Ok(SourceFingerprint {
            size_bytes: metadata.len(),
            modified_unix_ms,
        })
    }
}

/// On-disk cache record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAnalysis {
    /// Record layout version, see [`CACHE_FORMAT_VERSION`]
    pub format_version: u32,
    /// Program that wrote the record
    pub generator: String,
    /// Analyzer that produced the track
    pub analyzer: String,
    /// Source file the track describes
    pub source: SourceFingerprint,
    /// The analysis itself
    pub track: Track,
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// A usable analysis was found
    Hit(Track),
    /// No sidecar could be opened
    Miss,
    /// A sidecar exists but cannot be used
    Invalid {
        /// Why the record was rejected
        reason: String,
    },
}

/// Persistent storage for computed analyses
pub trait AnalysisStore {
    /// Look up the analysis of `input`
    fn load(&self, input: &Path) -> CacheLookup;

    /// Store `track` as the analysis of `input`, returning where it went
    fn save(&self, input: &Path, analyzer: &str, track: &Track) -> SectionizeResult<PathBuf>;
}

impl<S: AnalysisStore + ?Sized> AnalysisStore for &S {
    fn load(&self, input: &Path) -> CacheLookup {
        (**self).load(input)
    }

    fn save(&self, input: &Path, analyzer: &str, track: &Track) -> SectionizeResult<PathBuf> {
        (**self).save(input, analyzer, track)
    }
}

/// JSON sidecar next to the input file
#[derive(Debug, Clone)]
pub struct SidecarStore {
    validate_source: bool,
}

impl SidecarStore {
    /// Store that rejects records whose fingerprint no longer matches the input
    pub fn new() -> Self {
        SidecarStore {
            validate_source: true,
        }
    }

    /// Store that accepts any well-formed record of the current version
    pub fn trusting() -> Self {
        SidecarStore {
            validate_source: false,
        }
    }

    fn read_record(path: &Path, file: File) -> Result<CachedAnalysis, String> {
        let value: serde_json::Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| e.to_string())?;

        match value.get("format_version").and_then(|v| v.as_u64()) {
            Some(v) if v == CACHE_FORMAT_VERSION as u64 => {}
            Some(v) => return Err(format!("format version {} (expected {})", v, CACHE_FORMAT_VERSION)),
            None => return Err("no format version".to_string()),
        }

        let record: CachedAnalysis = serde_json::from_value(value).map_err(|e| e.to_string())?;
        debug!(
            "Read {} (analyzer '{}', written by {})",
            path.display(),
            record.analyzer,
            record.generator
        );
        Ok(record)
    }
}

impl Default for SidecarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisStore for SidecarStore {
    fn load(&self, input: &Path) -> CacheLookup {
        let path = sidecar_path(input);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                debug!("No analysis cache at {}: {}", path.display(), e);
                return CacheLookup::Miss;
            }
        };

        let record = match Self::read_record(&path, file) {
            Ok(record) => record,
            Err(reason) => return CacheLookup::Invalid { reason },
        };

        if self.validate_source {
            match SourceFingerprint::from_path(input) {
                Ok(current) if current != record.source => {
                    return CacheLookup::Invalid {
                        reason: format!(
                            "source changed ({} bytes, modified {} ms; cache has {} bytes, {} ms)",
                            current.size_bytes,
                            current.modified_unix_ms,
                            record.source.size_bytes,
                            record.source.modified_unix_ms
                        ),
                    };
                }
                Ok(_) => {}
                Err(e) => warn!(
                    "Cannot check {} against its cache, trusting it: {}",
                    input.display(),
                    e
                ),
            }
        }

        CacheLookup::Hit(record.track)
    }

    fn save(&self, input: &Path, analyzer: &str, track: &Track) -> SectionizeResult<PathBuf> {
        let path = sidecar_path(input);
        let write_error = |reason: String| SectionizeError::CacheWriteError {
            path: path.clone(),
            reason,
        };

        let source = SourceFingerprint::from_path(input).map_err(|e| write_error(e.to_string()))?;
        let record = CachedAnalysis {
            format_version: CACHE_FORMAT_VERSION,
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            analyzer: analyzer.to_string(),
            source,
            track: track.clone(),
        };

        // Write beside the target and rename so a failed write never leaves a truncated record
        let mut temp_name = OsString::from(path.as_os_str());
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let result = File::create(&temp_path)
            .map_err(|e| e.to_string())
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, &record).map_err(|e| e.to_string())?;
                writer.flush().map_err(|e| e.to_string())
            })
            .and_then(|_| fs::rename(&temp_path, &path).map_err(|e| e.to_string()));

        if let Err(reason) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(write_error(reason));
        }

        info!("Saved analysis to {}", path.display());
        Ok(path)
    }
}
