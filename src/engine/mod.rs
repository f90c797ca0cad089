//! Audio Engine Module
//!
//! Signal acquisition for the write pipeline:
//! - Mono signal buffers and stereo downmix
//! - WAV and AIFF decoding
//! - Sample rate conversion

pub mod buffer;
pub mod decode;
pub mod resample;

pub use buffer::{downmix_stereo, Midpoint, SignalBuffer};
pub use decode::{decode_file, Decoded};
pub use resample::Resampler;
