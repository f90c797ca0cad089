//! Writer Module
//!
//! Orchestrates conversion of a batch of audio files and their transfer to
//! the playback card.

pub mod confirm;
pub mod pipeline;

pub use confirm::{AssumeYes, Confirmation, PromptConfirmation};
pub use pipeline::{
    check_space, convert_all, load_audio_files, resample_all, write_all, ConvertedAudio, DeviceWriter, LoadedAudio,
    WriteOutcome, WriteReport,
};
