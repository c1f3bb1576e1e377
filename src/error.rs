use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sectionize operations
pub type SectionizeResult<T> = Result<T, SectionizeError>;

/// Error types for loading, analysing, reporting and exporting a track
#[derive(Error, Debug)]
pub enum SectionizeError {
    /// No usable input file was given on the command line
    #[error("missing input filename")]
    Usage,

    /// IO error (file operations, disk access)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported audio format
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Invalid audio metadata
    #[error("Invalid audio metadata: {0}")]
    InvalidMetadata(String),

    /// Decoding failed
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Encoding failed
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Resampling operation failed
    #[error("Resampling error: {0}")]
    ResamplingError(String),

    /// Invalid channel configuration
    #[error("Invalid channel configuration: expected {expected}, got {got}")]
    InvalidChannels {
        /// Expected number of channels
        expected: u32,
        /// Got number of channels
        got: u32,
    },

    /// Invalid sample rate
    #[error("Invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate
        rate: u32,
    },

    /// Buffer-related error
    #[error("Buffer error: {0}")]
    BufferError(String),

    /// A section does not fit the decoded audio
    #[error("Section {start:.3}s..{end:.3}s is outside the audio ({available:.3}s long)")]
    SectionOutOfRange {
        /// Section start in seconds
        start: f64,
        /// Section end in seconds
        end: f64,
        /// Length of the decoded audio in seconds
        available: f64,
    },

    /// The analyzer could not produce a track analysis
    #[error("Analysis failed for '{path}': {reason}")]
    AnalysisError {
        /// Input file being analysed
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// The sidecar cache could not be written
    #[error("Cannot write analysis cache '{path}': {reason}")]
    CacheWriteError {
        /// Sidecar path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// A rendered section could not be written
    #[error("Cannot write section file '{path}': {source}")]
    OutputError {
        /// Output file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SectionizeError {
    /// Wrap any displayable failure as an analysis error for `path`
    pub fn analysis(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SectionizeError::AnalysisError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for the missing-argument case that prints usage instead of a diagnostic
    pub fn is_usage(&self) -> bool {
        matches!(self, SectionizeError::Usage)
    }
}

impl From<symphonia::core::errors::Error> for SectionizeError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        SectionizeError::DecodeError(err.to_string())
    }
}

impl From<hound::Error> for SectionizeError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => SectionizeError::Io(e),
            e => SectionizeError::EncodeError(e.to_string()),
        }
    }
}
