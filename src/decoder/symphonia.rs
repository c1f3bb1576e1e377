use crate::core::{AudioFrame, Channels};
use crate::error::{SectionizeError, SectionizeResult};
use log::{debug, trace, warn};
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Symphonia-based audio decoder
pub struct SymphoniaDecoder {
    /// Current reader for the audio source
    reader: Box<dyn symphonia::core::formats::FormatReader>,
    /// Track information
    track_id: u32,
    /// Sample rate
    sample_rate: u32,
    /// Number of channels
    channels: Channels,
    /// Samples per channel handed out so far
    position: u64,
    /// Whether decoding is finished
    finished: bool,
    /// Current decoder state
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
}

impl SymphoniaDecoder {
    /// Create decoder from file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> SectionizeResult<Self> {
        let path = path.as_ref();

        let file = Box::new(File::open(path)?);
        let mss = MediaSourceStream::new(file, Default::default());

        // Probe the file to detect format
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| SectionizeError::UnsupportedFormat(e.to_string()))?;

        let reader = probed.format;

        // Find the first audio track
        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
            .ok_or_else(|| SectionizeError::InvalidMetadata("No audio track found".to_string()))?
            .clone();

        let track_id = track.id;
        let codec_params = &track.codec_params;

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| SectionizeError::InvalidMetadata("Unknown sample rate".to_string()))?;

        let channels = match codec_params.channels {
            Some(channels) => Channels::from_count(channels.count() as u32)?,
            None => {
                return Err(SectionizeError::InvalidMetadata(
                    "Unknown channel count".to_string(),
                ));
            }
        };

        let decoder = symphonia::default::get_codecs()
            .make(codec_params, &DecoderOptions::default())
            .map_err(|e| SectionizeError::DecodeError(e.to_string()))?;

        debug!(
            "Opened {} @ {}Hz, {}",
            path.display(),
            sample_rate,
            channels
        );

        Ok(SymphoniaDecoder {
            reader,
            track_id,
            sample_rate,
            channels,
            position: 0,
            finished: false,
            decoder,
        })
    }

    /// Get sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get channels
    pub fn channels(&self) -> Channels {
        self.channels
    }
}

impl super::Decoder for SymphoniaDecoder {
    fn decode_frame(&mut self) -> SectionizeResult<Option<AudioFrame>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.finished = true;
                    return Ok(None);
                }
                Err(symphonia::core::errors::Error::ResetRequired) => {
                    // Track list or codec parameters changed mid-stream
                    warn!(
                        "Stream reset after {:.2}s, remaining audio is ignored",
                        self.position as f64 / self.sample_rate as f64
                    );
                    self.finished = true;
                    return Ok(None);
                }
                Err(e) => return Err(SectionizeError::DecodeError(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(symphonia::core::errors::Error::DecodeError(e)) => {
                    trace!("Skipping corrupted packet: {}", e);
                    continue;
                }
                Err(e) => return Err(SectionizeError::DecodeError(e.to_string())),
            };

            let spec = *decoded.spec();
            let num_frames = decoded.frames();
            if num_frames == 0 {
                continue;
            }

            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            let start = Duration::from_secs_f64(self.position as f64 / self.sample_rate as f64);
            let frame = AudioFrame::starting_at(
                sample_buf.samples().to_vec(),
                self.sample_rate,
                self.channels,
                start,
            )?;

            self.position += frame.samples_per_channel() as u64;

            return Ok(Some(frame));
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
