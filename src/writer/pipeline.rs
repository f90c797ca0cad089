//! Write pipeline
//!
//! Converts a batch of audio files and writes them to a playback card.
//! The stages run strictly in order and the first error ends the run:
//!
//! 1. validate the block device
//! 2. load every input
//! 3. resample every signal to the output rate
//! 4. quantize every signal into device words
//! 5. check the card has room for all files
//! 6. ask for confirmation
//! 7. write the files
//!
//! Nothing is written before step 7. Free space is not reserved between
//! steps 5 and 7, so another writer filling the card in that window still
//! surfaces as a write failure.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::ConvertConfig;
use crate::device::{validate_device, DeviceInspector, Mounting};
use crate::dsp::quantize;
use crate::engine::{decode_file, Resampler, SignalBuffer};
use crate::error::{RawdeckError, Result};
use crate::writer::confirm::Confirmation;

/// A decoded input
#[derive(Debug, Clone)]
pub struct LoadedAudio {
    pub path: PathBuf,
    pub buffer: SignalBuffer,
}

/// An input converted to device words
#[derive(Debug, Clone)]
pub struct ConvertedAudio {
    pub source: PathBuf,
    /// File name on the card
    pub file_name: PathBuf,
    pub data: Vec<u8>,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Written { files: Vec<PathBuf>, bytes: u64 },
    Declined,
}

/// Outcome of a run plus any non-fatal problems met along the way
#[derive(Debug)]
pub struct WriteReport {
    pub outcome: WriteOutcome,
    pub warnings: Vec<RawdeckError>,
}

/// Runs the write pipeline for one configuration
pub struct DeviceWriter<I, C> {
    config: ConvertConfig,
    inspector: I,
    confirmation: C,
}

impl<I: DeviceInspector, C: Confirmation> DeviceWriter<I, C> {
    pub fn new(config: ConvertConfig, inspector: I, confirmation: C) -> Self {
        Self {
            config,
            inspector,
            confirmation,
        }
    }

    /// Run every stage in order
    ///
    /// Returns `WriteOutcome::Declined` if the user says no; that is not
    /// an error.
    pub fn run(&mut self) -> Result<WriteReport> {
        let config = &self.config;

        info!("Validating {}", config.block_device.display());
        let mounting = validate_device(&self.inspector, &config.block_device, &config.filesystem)?;

        info!("Loading {} audio file(s)", config.audio_files.len());
        let (loaded, warnings) = load_audio_files(&config.audio_files)?;

        info!("Resampling to {}Hz", config.sample_rate);
        let resampled = resample_all(loaded, config.sample_rate)?;

        info!(
            "Converting to {}-bit words of {} byte(s)",
            config.bit_depth,
            config.word_size.bytes()
        );
        let converted = convert_all(&resampled, config)?;

        let sizes: Vec<u64> = converted.iter().map(|c| c.data.len() as u64).collect();
        let available = self
            .inspector
            .available_space(&mounting.mount_point)
            .map_err(|source| RawdeckError::DeviceInaccessible {
                path: mounting.mount_point.clone(),
                source,
            })?;
        let needed = check_space(&sizes, available, &mounting.mount_point)?;

        let prompt = format!(
            "Write {} raw audio file(s) onto {}",
            converted.len(),
            mounting.mount_point.display()
        );
        if !self.confirmation.confirm(&prompt)? {
            warn!("Write declined, nothing was written");
            return Ok(WriteReport {
                outcome: WriteOutcome::Declined,
                warnings,
            });
        }

        let files = write_all(&converted, &mounting)?;
        info!(
            "Wrote {} file(s), {} bytes, to {}",
            files.len(),
            needed,
            mounting.mount_point.display()
        );

        Ok(WriteReport {
            outcome: WriteOutcome::Written { files, bytes: needed },
            warnings,
        })
    }
}

/// Stage 2: decode every input
///
/// Truncated files are kept; their warnings are logged and returned.
pub fn load_audio_files(paths: &[PathBuf]) -> Result<(Vec<LoadedAudio>, Vec<RawdeckError>)> {
    let mut loaded = Vec::with_capacity(paths.len());
    let mut warnings = Vec::new();

    for path in paths {
        let decoded = decode_file(path)?;
        if let Some(warning) = decoded.warning {
            warn!("{}", warning);
            warnings.push(warning);
        }
        info!(
            "Loaded {} ({:.2}s at {}Hz)",
            path.display(),
            decoded.buffer.duration_secs(),
            decoded.buffer.sample_rate()
        );
        loaded.push(LoadedAudio {
            path: path.clone(),
            buffer: decoded.buffer,
        });
    }

    Ok((loaded, warnings))
}

/// Stage 3: bring every signal to `sample_rate`
pub fn resample_all(loaded: Vec<LoadedAudio>, sample_rate: u32) -> Result<Vec<LoadedAudio>> {
    loaded
        .into_iter()
        .map(|audio| {
            let buffer = Resampler::resample_file(&audio.path, &audio.buffer, sample_rate)?;
            Ok(LoadedAudio {
                path: audio.path,
                buffer,
            })
        })
        .collect()
}

/// Stage 4: quantize every signal
pub fn convert_all(loaded: &[LoadedAudio], config: &ConvertConfig) -> Result<Vec<ConvertedAudio>> {
    loaded
        .iter()
        .map(|audio| {
            Ok(ConvertedAudio {
                source: audio.path.clone(),
                file_name: config.output_file_name(&audio.path)?,
                data: quantize(&audio.buffer, config)?,
            })
        })
        .collect()
}

/// Stage 5: compare the total size against the space available
///
/// Returns the total number of bytes needed.
pub fn check_space(sizes: &[u64], available: u64, mount_point: &Path) -> Result<u64> {
    let needed: u64 = sizes.iter().sum();
    if needed > available {
        return Err(RawdeckError::InsufficientSpace {
            mount_point: mount_point.to_path_buf(),
            needed_bytes: needed,
            available_bytes: available,
        });
    }
    Ok(needed)
}

/// Stage 7: write each file under the mount point
///
/// Files are created or truncated, written and synced one at a time. On
/// failure the files already written stay on the card and are listed in
/// the error.
pub fn write_all(converted: &[ConvertedAudio], mounting: &Mounting) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(converted.len());

    for audio in converted {
        let path = mounting.mount_point.join(&audio.file_name);
        if let Err(source) = write_file(&path, &audio.data) {
            return Err(RawdeckError::WriteIoFailure {
                path,
                written,
                source,
            });
        }
        info!("Wrote {} ({} bytes)", path.display(), audio.data.len());
        written.push(path);
    }

    Ok(written)
}

fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}
