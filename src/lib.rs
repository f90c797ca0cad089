//! Rawdeck - Raw Audio Writer for Playback Cards
//!
//! Rawdeck prepares audio for hardware playback units that stream
//! header-less sample words straight off a FAT-formatted storage card.
//!
//! # Architecture
//!
//! A write runs as a fail-fast pipeline:
//! - Device: the destination must be the mounted first partition of its drive
//! - Engine: decode to mono, then resample to the output rate
//! - DSP: remap each sample into an unsigned word of the configured size and
//!   byte order
//! - Writer: check free space, confirm, and write one `.raw` file per input

pub mod cli;
pub mod config;
pub mod device;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod writer;

pub use error::{RawdeckError, Result};
