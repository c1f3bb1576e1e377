//! Core audio types and structures

/// Audio frame and format types
pub mod audio;

pub use audio::{AudioFrame, BitDepth, Channels};
